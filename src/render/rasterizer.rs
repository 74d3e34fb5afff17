use image::RgbaImage;

use crate::foundation::core::{Bitmap, Point, pixel_extent};
use crate::foundation::error::SlideResult;
use crate::render::surface::{RenderNode, SurfaceTree};

/// Turns a captured surface tree into one bitmap. Runs on render workers.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, tree: SurfaceTree) -> SlideResult<Bitmap>;
}

/// CPU rasterizer compositing nodes in tree order.
///
/// - An opaque surface is filled with its background before any content.
/// - A top-level node exposing [`BackdropCapture`](crate::BackdropCapture) receives the canvas as
///   composited so far, immediately before that node is drawn.
/// - Every staged background image in a subtree is committed before the subtree is drawn.
#[derive(Clone, Copy, Debug, Default)]
pub struct CompositingRasterizer;

impl Rasterizer for CompositingRasterizer {
    fn rasterize(&self, mut tree: SurfaceTree) -> SlideResult<Bitmap> {
        let (w, h) = pixel_extent(tree.bounds.size());
        let mut canvas = RgbaImage::new(w, h);
        if tree.opaque
            && let Some(bg) = tree.background
        {
            let px = bg.to_pixel();
            for p in canvas.pixels_mut() {
                *p = px;
            }
        }

        for node in &mut tree.nodes {
            let origin = node.frame().origin();
            if let Some(capture) = node.as_backdrop_capture() {
                capture.capture_backdrop(Bitmap::new(canvas.clone()));
            }
            commit_background_images(&mut **node);
            draw_subtree(&**node, &mut canvas, origin);
        }

        Ok(Bitmap::new(canvas))
    }
}

fn commit_background_images(node: &mut dyn RenderNode) {
    if let Some(host) = node.as_background_image() {
        host.commit_background_image();
    }
    for child in node.children_mut() {
        commit_background_images(&mut **child);
    }
}

fn draw_subtree(node: &dyn RenderNode, canvas: &mut RgbaImage, origin: Point) {
    node.draw(canvas, origin);
    for child in node.children() {
        let o = child.frame().origin();
        draw_subtree(&**child, canvas, Point::new(origin.x + o.x, origin.y + o.y));
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/rasterizer.rs"]
mod tests;
