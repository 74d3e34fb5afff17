//! Built-in render nodes used by document surfaces, the CLI and tests.

use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::{Bitmap, Point, Rect, Rgba8, pixel_extent};
use crate::render::surface::{BackdropCapture, BackgroundImageHost, RenderNode};

/// Solid color rectangle, alpha-blended over the canvas.
pub struct FillNode {
    pub frame: Rect,
    pub color: Rgba8,
    pub children: Vec<Box<dyn RenderNode>>,
}

impl FillNode {
    pub fn new(frame: Rect, color: Rgba8) -> Self {
        Self {
            frame,
            color,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: impl RenderNode + 'static) -> Self {
        self.children.push(Box::new(child));
        self
    }
}

impl RenderNode for FillNode {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn draw(&self, canvas: &mut RgbaImage, origin: Point) {
        let (w, h) = pixel_extent(self.frame.size());
        let patch = RgbaImage::from_pixel(w, h, self.color.to_pixel());
        imageops::overlay(canvas, &patch, origin.x.round() as i64, origin.y.round() as i64);
    }

    fn children(&self) -> &[Box<dyn RenderNode>] {
        &self.children
    }

    fn children_mut(&mut self) -> &mut [Box<dyn RenderNode>] {
        &mut self.children
    }
}

/// Image slot backed by a resource.
///
/// Images handed to the node are staged and only become visible once committed, which the
/// rasterizer does right before drawing.
pub struct ImageNode {
    pub frame: Rect,
    staged: Option<Bitmap>,
    committed: Option<Bitmap>,
}

impl ImageNode {
    pub fn new(frame: Rect, image: Option<Bitmap>) -> Self {
        Self {
            frame,
            staged: image,
            committed: None,
        }
    }

    pub fn stage(&mut self, image: Option<Bitmap>) {
        self.staged = image;
    }

    pub fn committed(&self) -> Option<&Bitmap> {
        self.committed.as_ref()
    }
}

impl BackgroundImageHost for ImageNode {
    fn commit_background_image(&mut self) {
        self.committed = self.staged.clone();
    }
}

impl RenderNode for ImageNode {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn draw(&self, canvas: &mut RgbaImage, origin: Point) {
        let Some(image) = &self.committed else {
            return;
        };
        let (w, h) = pixel_extent(self.frame.size());
        let x = origin.x.round() as i64;
        let y = origin.y.round() as i64;
        if image.width() == w && image.height() == h {
            imageops::overlay(canvas, image.as_image(), x, y);
        } else {
            let scaled = imageops::resize(image.as_image(), w, h, FilterType::Triangle);
            imageops::overlay(canvas, &scaled, x, y);
        }
    }

    fn as_background_image(&mut self) -> Option<&mut dyn BackgroundImageHost> {
        Some(self)
    }
}

/// Frosted region: blurs whatever was composited beneath it.
pub struct BlurNode {
    pub frame: Rect,
    pub sigma: f32,
    pub tint: Option<Rgba8>,
    backdrop: Option<Bitmap>,
}

impl BlurNode {
    pub fn new(frame: Rect, sigma: f32) -> Self {
        Self {
            frame,
            sigma,
            tint: None,
            backdrop: None,
        }
    }

    pub fn with_tint(mut self, tint: Rgba8) -> Self {
        self.tint = Some(tint);
        self
    }
}

impl BackdropCapture for BlurNode {
    fn capture_backdrop(&mut self, backdrop: Bitmap) {
        self.backdrop = Some(backdrop);
    }
}

impl RenderNode for BlurNode {
    fn frame(&self) -> Rect {
        self.frame
    }

    fn draw(&self, canvas: &mut RgbaImage, origin: Point) {
        let (w, h) = pixel_extent(self.frame.size());
        let x = origin.x.round().max(0.0) as u32;
        let y = origin.y.round().max(0.0) as u32;

        if let Some(backdrop) = &self.backdrop
            && x < backdrop.width()
            && y < backdrop.height()
        {
            let cw = w.min(backdrop.width() - x);
            let ch = h.min(backdrop.height() - y);
            let region = imageops::crop_imm(backdrop.as_image(), x, y, cw, ch).to_image();
            let blurred = if self.sigma > 0.0 && self.sigma.is_finite() {
                imageops::blur(&region, self.sigma)
            } else {
                region
            };
            imageops::replace(canvas, &blurred, i64::from(x), i64::from(y));
        }

        if let Some(tint) = self.tint {
            let patch = RgbaImage::from_pixel(w, h, tint.to_pixel());
            imageops::overlay(canvas, &patch, i64::from(x), i64::from(y));
        }
    }

    fn as_backdrop_capture(&mut self) -> Option<&mut dyn BackdropCapture> {
        Some(self)
    }
}
