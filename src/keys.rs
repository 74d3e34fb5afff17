//! Content-addressed keys for cached snapshots.
//!
//! A [`RenderKey`] names one cached bitmap: the rendering of one content item, by one kind of
//! surface, in one display variant. All render keys built from the same item share an
//! [`InvalidationKey`], so a single change notification can force every variant to re-render.

use std::fmt;
use std::hash::Hash;

use crate::foundation::hash::stable_hash;

/// Identity-derived key shared by every [`RenderKey`] of one content item.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InvalidationKey(String);

impl InvalidationKey {
    /// Derive the key from the item's identity hash.
    pub fn for_item<T: Hash + ?Sized>(item: &T) -> Self {
        Self(format!("{:016x}", stable_hash(item)))
    }

    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvalidationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Cache key for one (content, surface kind, variant) combination.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderKey(String);

impl RenderKey {
    pub fn new(invalidation: &InvalidationKey, surface_kind: &str, variant: &str) -> Self {
        Self(format!("{}:{surface_kind}:{variant}", invalidation.0))
    }

    /// Wrap an already-composed key. Keys built this way have no invalidation key of their own;
    /// pair them with one explicitly on the request if they should react to `mark_dirty`.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RenderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Build the `(render key, invalidation key)` pair for displaying `item` on a surface of kind
/// `surface_kind` in display variant `variant`.
pub fn keys_for<T: Hash + ?Sized>(
    item: &T,
    surface_kind: &str,
    variant: &str,
) -> (RenderKey, InvalidationKey) {
    let invalidation = InvalidationKey::for_item(item);
    let key = RenderKey::new(&invalidation, surface_kind, variant);
    (key, invalidation)
}
