use std::hash::{Hash, Hasher};

use xxhash_rust::xxh3::Xxh3;

const XXH3_SEED: u64 = 0x5d1e_7a3c_9b04_e2f1;

/// Seeded xxh3 hasher with output that is stable across runs and platforms.
///
/// Render keys and disk cache file names are derived from it, so the seed must never change.
pub(crate) struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    pub(crate) fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    pub(crate) fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    pub(crate) fn finish128(&self) -> u128 {
        self.inner.digest128()
    }
}

impl Hasher for StableHasher {
    fn write(&mut self, bytes: &[u8]) {
        self.write_bytes(bytes);
    }

    fn write_usize(&mut self, v: usize) {
        self.write_bytes(&(v as u64).to_le_bytes());
    }

    fn finish(&self) -> u64 {
        self.inner.digest()
    }
}

/// Stable 64-bit digest of any `Hash` value.
pub(crate) fn stable_hash<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut h = StableHasher::new();
    value.hash(&mut h);
    h.finish()
}

/// Stable 128-bit digest of raw bytes, rendered as lowercase hex.
pub(crate) fn stable_hex128(bytes: &[u8]) -> String {
    let mut h = StableHasher::new();
    h.write_bytes(bytes);
    format!("{:032x}", h.finish128())
}
