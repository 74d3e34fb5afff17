use futures::FutureExt as _;
use futures::future::BoxFuture;
use url::Url;

use crate::cache::disk::FsImageCache;
use crate::cache::memory::MemoryImageCache;
use crate::config::ResourceOpts;
use crate::foundation::core::Bitmap;
use crate::foundation::error::SlideResult;
use crate::resource::fetch::HttpFetcher;
use crate::resource::map::ImageResource;

/// The three storage layers an image resource is resolved through.
///
/// Implementations are shared between the interactive thread and resolution tasks, so they must be
/// `Send + Sync`. The memory layer is synchronous; disk and network are asynchronous.
pub trait ResourceBackend: Send + Sync {
    fn memory_get(&self, url: &Url) -> Option<Bitmap>;

    fn memory_put(&self, url: &Url, image: Bitmap);

    fn disk_get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Option<Bitmap>>;

    fn disk_put<'a>(&'a self, url: &'a Url, image: Bitmap) -> BoxFuture<'a, SlideResult<()>>;

    fn network_fetch<'a>(
        &'a self,
        resource: &'a ImageResource,
    ) -> BoxFuture<'a, SlideResult<Bitmap>>;
}

/// Memory LRU + optional PNG directory + HTTP.
pub struct DefaultResourceBackend {
    memory: MemoryImageCache,
    disk: Option<FsImageCache>,
    http: HttpFetcher,
}

impl DefaultResourceBackend {
    pub fn new(opts: &ResourceOpts) -> SlideResult<Self> {
        opts.validate()?;
        Ok(Self {
            memory: MemoryImageCache::new(opts.memory_capacity)?,
            disk: opts.disk_dir.clone().map(FsImageCache::new),
            http: HttpFetcher::new(opts)?,
        })
    }

    pub fn memory(&self) -> &MemoryImageCache {
        &self.memory
    }

    pub fn disk(&self) -> Option<&FsImageCache> {
        self.disk.as_ref()
    }
}

impl ResourceBackend for DefaultResourceBackend {
    fn memory_get(&self, url: &Url) -> Option<Bitmap> {
        self.memory.get(url)
    }

    fn memory_put(&self, url: &Url, image: Bitmap) {
        self.memory.put(url, image);
    }

    fn disk_get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Option<Bitmap>> {
        async move {
            match &self.disk {
                Some(disk) => disk.get(url).await,
                None => None,
            }
        }
        .boxed()
    }

    fn disk_put<'a>(&'a self, url: &'a Url, image: Bitmap) -> BoxFuture<'a, SlideResult<()>> {
        async move {
            match &self.disk {
                Some(disk) => disk.put(url, &image).await,
                None => Ok(()),
            }
        }
        .boxed()
    }

    fn network_fetch<'a>(
        &'a self,
        resource: &'a ImageResource,
    ) -> BoxFuture<'a, SlideResult<Bitmap>> {
        self.http.fetch(resource).boxed()
    }
}
