pub(crate) mod backend;
pub(crate) mod fetch;
pub(crate) mod loader;
pub(crate) mod map;
