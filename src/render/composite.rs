use image::RgbaImage;
use image::imageops::{self, FilterType};

use crate::foundation::core::Bitmap;

type Rgba8Px = [u8; 4];

/// Per-channel linear blend: `t = 0` is `a`, `t = 1` is `b`.
pub fn crossfade(a: Rgba8Px, b: Rgba8Px, t: f32) -> Rgba8Px {
    let t = if t.is_finite() { t.clamp(0.0, 1.0) } else { 1.0 };
    let tt = ((t * 255.0).round() as i32).clamp(0, 255) as u16;
    let it = 255u16 - tt;

    let mut out = [0u8; 4];
    for i in 0..4 {
        let av = mul_div255(u16::from(a[i]), it);
        let bv = mul_div255(u16::from(b[i]), tt);
        out[i] = av.saturating_add(bv);
    }
    out
}

/// One intermediate frame of a cross-fade, for render targets without a native cross-dissolve.
///
/// `from` is scaled to `to`'s dimensions when they differ; a missing `from` fades in from
/// transparent.
pub fn crossfade_bitmaps(from: Option<&Bitmap>, to: &Bitmap, t: f32) -> Bitmap {
    let (w, h) = (to.width(), to.height());
    let scaled;
    let from_img: Option<&RgbaImage> = match from {
        Some(f) if f.width() == w && f.height() == h => Some(f.as_image()),
        Some(f) => {
            scaled = imageops::resize(f.as_image(), w, h, FilterType::Triangle);
            Some(&scaled)
        }
        None => None,
    };

    let mut out = RgbaImage::new(w, h);
    for (x, y, px) in out.enumerate_pixels_mut() {
        let a = from_img.map(|f| f.get_pixel(x, y).0).unwrap_or([0, 0, 0, 0]);
        let b = to.as_image().get_pixel(x, y).0;
        px.0 = crossfade(a, b, t);
    }
    Bitmap::new(out)
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
