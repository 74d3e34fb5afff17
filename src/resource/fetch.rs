use crate::config::ResourceOpts;
use crate::foundation::core::Bitmap;
use crate::foundation::error::{SlideError, SlideResult};
use crate::resource::map::{ImageResource, ImageSize};

/// Network image fetcher.
///
/// Downloads the resource, decodes it and scales it down to fit the requested size variant.
#[derive(Clone, Debug)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(opts: &ResourceOpts) -> SlideResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(opts.request_timeout())
            .user_agent(opts.user_agent.clone())
            .build()?;
        Ok(Self { client })
    }

    pub async fn fetch(&self, resource: &ImageResource) -> SlideResult<Bitmap> {
        let res = self
            .client
            .get(resource.url.clone())
            .send()
            .await?
            .error_for_status()?;

        // Note: no streaming decode, the body is buffered whole.
        let body = res.bytes().await?;
        decode_image(&body, resource.size)
    }
}

/// Decode encoded image bytes, downscaling (never upscaling) to fit `size` when given.
pub(crate) fn decode_image(bytes: &[u8], size: Option<ImageSize>) -> SlideResult<Bitmap> {
    if bytes.is_empty() {
        return Err(SlideError::resource("empty image body"));
    }
    let img = image::load_from_memory(bytes)?;
    let img = match size {
        Some(s)
            if s.width > 0
                && s.height > 0
                && (img.width() > s.width || img.height() > s.height) =>
        {
            img.resize(s.width, s.height, image::imageops::FilterType::Triangle)
        }
        _ => img,
    };
    Ok(Bitmap::new(img.to_rgba8()))
}
