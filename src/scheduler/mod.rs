pub(crate) mod arena;
pub(crate) mod renderer;
pub(crate) mod tasks;
