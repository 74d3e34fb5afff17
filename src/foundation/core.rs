use std::sync::Arc;

pub use kurbo::{Point, Rect, Size};

/// Straight-alpha RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8 {
    /// Construct a color from its channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Fully transparent black.
    pub const fn transparent() -> Self {
        Self::new(0, 0, 0, 0)
    }

    /// Opaque color from its RGB channels.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    pub fn to_pixel(self) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, self.a])
    }

    pub fn from_pixel(px: image::Rgba<u8>) -> Self {
        let [r, g, b, a] = px.0;
        Self { r, g, b, a }
    }
}

/// Immutable RGBA8 bitmap shared by reference.
///
/// Cloning is cheap: the pixel buffer lives behind an `Arc`, so the same snapshot can sit in the
/// render cache, in a transition queue and on screen at once.
#[derive(Clone)]
pub struct Bitmap {
    image: Arc<image::RgbaImage>,
}

impl Bitmap {
    pub fn new(image: image::RgbaImage) -> Self {
        Self {
            image: Arc::new(image),
        }
    }

    /// A `width`×`height` bitmap filled with one color.
    pub fn solid(width: u32, height: u32, color: Rgba8) -> Self {
        Self::new(image::RgbaImage::from_pixel(
            width.max(1),
            height.max(1),
            color.to_pixel(),
        ))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn as_image(&self) -> &image::RgbaImage {
        &self.image
    }

    /// Color at `(x, y)`, or `None` outside the bitmap.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgba8> {
        if x >= self.width() || y >= self.height() {
            return None;
        }
        Some(Rgba8::from_pixel(*self.image.get_pixel(x, y)))
    }

    /// Return `true` when both handles share the same pixel buffer.
    pub fn ptr_eq(&self, other: &Bitmap) -> bool {
        Arc::ptr_eq(&self.image, &other.image)
    }

    pub fn byte_len(&self) -> usize {
        self.image.as_raw().len()
    }
}

impl std::fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Bitmap({}x{})", self.width(), self.height())
    }
}

impl From<image::RgbaImage> for Bitmap {
    fn from(image: image::RgbaImage) -> Self {
        Self::new(image)
    }
}

/// Largest snapshot side, in pixels. Bounds a single canvas to 256 MiB of RGBA.
pub const MAX_SURFACE_EXTENT: u32 = 8192;

/// Pixel dimensions covering `size`, between 1×1 and [`MAX_SURFACE_EXTENT`] per side.
pub(crate) fn pixel_extent(size: Size) -> (u32, u32) {
    fn dim(v: f64) -> u32 {
        if !v.is_finite() || v <= 1.0 {
            1
        } else {
            v.ceil().min(f64::from(MAX_SURFACE_EXTENT)) as u32
        }
    }
    (dim(size.width), dim(size.height))
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
