use std::collections::HashMap;

use crate::keys::RenderKey;

type DeferredAction = Box<dyn FnOnce()>;

/// Process-wide record of which render keys are mid-transition, plus one deferred action that
/// waits for all of them to settle.
///
/// Several surfaces may fade the same key at once, so each key holds a count of active
/// transitions. Every `set_animating(key, true)` must be balanced by one `set_animating(key,
/// false)`.
#[derive(Default)]
pub struct AnimatingRegistry {
    animating: HashMap<RenderKey, usize>,
    deferred: Option<DeferredAction>,
}

impl AnimatingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any key has an active transition.
    pub fn is_animating(&self) -> bool {
        !self.animating.is_empty()
    }

    pub fn is_key_animating(&self, key: &RenderKey) -> bool {
        self.animating.contains_key(key)
    }

    /// Start or finish one transition of `key`. Finishing the last transition anywhere runs the
    /// deferred action.
    pub fn set_animating(&mut self, key: &RenderKey, animating: bool) {
        if animating {
            *self.animating.entry(key.clone()).or_insert(0) += 1;
            return;
        }
        // Keys with no active transition are removed, so the map only holds animating keys.
        match self.animating.get_mut(key) {
            Some(count) if *count > 1 => {
                *count -= 1;
                return;
            }
            Some(_) => {
                self.animating.remove(key);
            }
            None => {}
        }
        if !self.is_animating()
            && let Some(action) = self.deferred.take()
        {
            tracing::trace!("animations settled, running deferred action");
            action();
        }
    }

    /// Run `action` now when nothing animates, otherwise keep it (replacing any earlier one)
    /// until everything settles.
    pub fn run_after_all_animations(&mut self, action: impl FnOnce() + 'static) {
        if self.is_animating() {
            if self.deferred.is_some() {
                tracing::trace!("replacing pending deferred action");
            }
            self.deferred = Some(Box::new(action));
        } else {
            action();
        }
    }

    pub fn has_deferred_action(&self) -> bool {
        self.deferred.is_some()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/animation/registry.rs"]
mod tests;
