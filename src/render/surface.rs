use std::time::Duration;

use crate::foundation::core::{Bitmap, Point, Rect, Rgba8};
use crate::resource::map::DisplayerId;

/// A renderable element in a surface's content tree.
///
/// The tree is captured on the interactive thread and moved to a render worker, so nodes must be
/// `Send` and own (or share via [`Bitmap`]) everything they draw.
pub trait RenderNode: Send {
    /// Frame relative to the parent node (or to the surface for top-level nodes).
    fn frame(&self) -> Rect;

    /// Paint this node (not its children) with its top-left corner at `origin` in canvas space.
    fn draw(&self, canvas: &mut image::RgbaImage, origin: Point);

    fn children(&self) -> &[Box<dyn RenderNode>] {
        &[]
    }

    fn children_mut(&mut self) -> &mut [Box<dyn RenderNode>] {
        &mut []
    }

    /// Capability: wants the composited canvas right before it is drawn.
    fn as_backdrop_capture(&mut self) -> Option<&mut dyn BackdropCapture> {
        None
    }

    /// Capability: holds a staged background image that must be committed before drawing.
    fn as_background_image(&mut self) -> Option<&mut dyn BackgroundImageHost> {
        None
    }
}

pub trait BackdropCapture {
    fn capture_backdrop(&mut self, backdrop: Bitmap);
}

pub trait BackgroundImageHost {
    fn commit_background_image(&mut self);
}

/// Everything a rasterizer needs to produce one snapshot.
pub struct SurfaceTree {
    pub bounds: Rect,
    pub background: Option<Rgba8>,
    /// Paint `background` before any content. False when the surface blends with what is behind.
    pub opaque: bool,
    pub nodes: Vec<Box<dyn RenderNode>>,
}

/// Description of the dedicated render target a surface is detached into.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderTarget {
    pub frame: Rect,
    pub background: Option<Rgba8>,
    pub corner_radius: f64,
    pub masks_to_bounds: bool,
}

/// What the render target should show.
#[derive(Clone, Debug)]
pub enum Presentation {
    /// Swap the displayed snapshot without animation. `None` clears it.
    Immediate(Option<Bitmap>),
    /// Cross-fade from whatever is displayed to `to`.
    CrossFade { to: Bitmap, duration: Duration },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Began,
    Moved,
    Ended,
    Cancelled,
}

/// Raw input received by a render target, forwarded to its original surface.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputEvent {
    pub kind: InputKind,
    pub position: Point,
}

/// Caller-side boundary of a renderable surface.
pub trait SurfaceAdapter {
    fn bounds(&self) -> Rect;

    fn template_color(&self) -> Option<Rgba8>;

    fn corner_radius(&self) -> f64 {
        0.0
    }

    fn blends_with_background(&self) -> bool {
        false
    }

    /// Capture the content subviews as an owned render tree.
    fn content_nodes(&self) -> Vec<Box<dyn RenderNode>>;

    /// Move content hosting into `target`. Called once per surface, before the first render.
    fn attach_render_target(&mut self, target: RenderTarget);

    fn displayer_image(&self, displayer: DisplayerId) -> Option<&Bitmap>;

    fn set_displayer_image(&mut self, displayer: DisplayerId, image: Option<Bitmap>);

    fn present(&mut self, presentation: Presentation);

    fn handle_input(&mut self, _event: InputEvent) {}
}

impl<S: SurfaceAdapter + ?Sized> SurfaceAdapter for Box<S> {
    fn bounds(&self) -> Rect {
        (**self).bounds()
    }

    fn template_color(&self) -> Option<Rgba8> {
        (**self).template_color()
    }

    fn corner_radius(&self) -> f64 {
        (**self).corner_radius()
    }

    fn blends_with_background(&self) -> bool {
        (**self).blends_with_background()
    }

    fn content_nodes(&self) -> Vec<Box<dyn RenderNode>> {
        (**self).content_nodes()
    }

    fn attach_render_target(&mut self, target: RenderTarget) {
        (**self).attach_render_target(target)
    }

    fn displayer_image(&self, displayer: DisplayerId) -> Option<&Bitmap> {
        (**self).displayer_image(displayer)
    }

    fn set_displayer_image(&mut self, displayer: DisplayerId, image: Option<Bitmap>) {
        (**self).set_displayer_image(displayer, image)
    }

    fn present(&mut self, presentation: Presentation) {
        (**self).present(presentation)
    }

    fn handle_input(&mut self, event: InputEvent) {
        (**self).handle_input(event)
    }
}

pub(crate) fn render_target_for<S: SurfaceAdapter + ?Sized>(surface: &S) -> RenderTarget {
    let corner_radius = surface.corner_radius();
    RenderTarget {
        frame: surface.bounds(),
        background: surface.template_color(),
        corner_radius,
        masks_to_bounds: corner_radius > 0.0,
    }
}

pub(crate) fn capture_tree<S: SurfaceAdapter + ?Sized>(surface: &S) -> SurfaceTree {
    SurfaceTree {
        bounds: surface.bounds(),
        background: surface.template_color(),
        opaque: !surface.blends_with_background(),
        nodes: surface.content_nodes(),
    }
}
