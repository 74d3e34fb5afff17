#![forbid(unsafe_code)]
//! Snapshot render cache.
//!
//! Surfaces are rendered into bitmaps off the interactive thread, cached by content key and
//! re-rendered only when their content is invalidated or their image resources arrive. See
//! [`RenderScheduler`] for the entry point.

mod animation;
mod cache;
mod config;
mod doc;
mod foundation;
mod keys;
mod render;
mod resource;
mod scheduler;

pub use animation::registry::AnimatingRegistry;
pub use animation::sequencer::{TransitionState, TransitionStep};
pub use cache::disk::FsImageCache;
pub use cache::memory::MemoryImageCache;
pub use cache::render_cache::RenderCache;
pub use config::{ResourceOpts, SchedulerOpts, SlideConfig};
pub use doc::{DocSurface, FrameDoc, NodeDoc, SurfaceDoc};
pub use foundation::core::{Bitmap, MAX_SURFACE_EXTENT, Point, Rect, Rgba8, Size};
pub use foundation::error::{SlideError, SlideResult};
pub use keys::{InvalidationKey, RenderKey, keys_for};
pub use render::composite::{crossfade, crossfade_bitmaps};
pub use render::executor::{BoundedExecutor, CancelFlag, JobOutcome};
pub use render::nodes::{BlurNode, FillNode, ImageNode};
pub use render::rasterizer::{CompositingRasterizer, Rasterizer};
pub use render::surface::{
    BackdropCapture, BackgroundImageHost, InputEvent, InputKind, Presentation, RenderNode,
    RenderTarget, SurfaceAdapter, SurfaceTree,
};
pub use resource::backend::{DefaultResourceBackend, ResourceBackend};
pub use resource::fetch::HttpFetcher;
pub use resource::loader::{ResolveOutcome, ResolvedFrom, ResourceLoader};
pub use resource::map::{DisplayerId, ImageResource, ImageSize, ResourceEntry, ResourceMap};
pub use scheduler::arena::SurfaceId;
pub use scheduler::renderer::{RenderRequest, RenderScheduler, SchedulerStats, SurfacePhase};
