pub(crate) mod composite;
pub(crate) mod executor;
pub(crate) mod nodes;
pub(crate) mod rasterizer;
pub(crate) mod surface;
