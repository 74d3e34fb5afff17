pub(crate) mod disk;
pub(crate) mod memory;
pub(crate) mod render_cache;
