use std::io::Cursor;
use std::path::{Path, PathBuf};

use url::Url;

use crate::foundation::core::Bitmap;
use crate::foundation::error::SlideResult;
use crate::foundation::hash::stable_hex128;

/// Persistent image cache: one PNG file per resource URL under a root directory.
///
/// File names are the stable 128-bit hash of the URL, so entries survive restarts.
#[derive(Clone, Debug)]
pub struct FsImageCache {
    root: PathBuf,
}

impl FsImageCache {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, url: &Url) -> PathBuf {
        self.root
            .join(format!("{}.png", stable_hex128(url.as_str().as_bytes())))
    }

    /// Load a cached image. Missing or undecodable files are both treated as a miss.
    pub async fn get(&self, url: &Url) -> Option<Bitmap> {
        let path = self.path_for(url);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::trace!(%url, error = %e, "disk cache miss");
                return None;
            }
        };
        match image::load_from_memory(&bytes) {
            Ok(img) => Some(Bitmap::new(img.to_rgba8())),
            Err(e) => {
                tracing::warn!(%url, path = %path.display(), error = %e, "corrupt disk cache entry");
                None
            }
        }
    }

    pub async fn put(&self, url: &Url, image: &Bitmap) -> SlideResult<()> {
        let mut buf = Vec::with_capacity(image.byte_len() / 2);
        image
            .as_image()
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)?;
        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.path_for(url), buf).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/disk.rs"]
mod tests;
