use std::future::Future;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use url::Url;

use crate::foundation::core::Bitmap;
use crate::resource::backend::ResourceBackend;
use crate::resource::map::ImageResource;

/// Which storage layer satisfied a resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResolvedFrom {
    Memory,
    Disk,
    Network,
}

/// Result of one resolution task.
#[derive(Clone, Debug)]
pub enum ResolveOutcome {
    Resolved(Bitmap, ResolvedFrom),
    /// Every layer missed or failed; the displayer keeps its placeholder.
    Missing,
    Cancelled,
}

/// Resolves image resources through memory, then disk, then network.
#[derive(Clone)]
pub struct ResourceLoader {
    backend: Arc<dyn ResourceBackend>,
    runtime: tokio::runtime::Handle,
}

impl ResourceLoader {
    pub fn new(backend: Arc<dyn ResourceBackend>, runtime: tokio::runtime::Handle) -> Self {
        Self { backend, runtime }
    }

    /// Synchronous memory-layer lookup.
    pub fn cached(&self, url: &Url) -> Option<Bitmap> {
        self.backend.memory_get(url)
    }

    /// Resolve one resource. Yields at most one image; failures yield `None`.
    pub fn resolve(&self, resource: ImageResource) -> impl Future<Output = Option<Bitmap>> + Send {
        let backend = Arc::clone(&self.backend);
        async move {
            resolve_layers(backend.as_ref(), &resource)
                .await
                .map(|(image, _)| image)
        }
    }

    /// Run a resolution on the runtime and report exactly one outcome through `done`.
    pub(crate) fn spawn_resolve<F>(
        &self,
        resource: ImageResource,
        cancel: CancellationToken,
        done: F,
    ) where
        F: FnOnce(ResolveOutcome) + Send + 'static,
    {
        let backend = Arc::clone(&self.backend);
        self.runtime.spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => ResolveOutcome::Cancelled,
                r = resolve_layers(backend.as_ref(), &resource) => match r {
                    Some((image, from)) => ResolveOutcome::Resolved(image, from),
                    None => ResolveOutcome::Missing,
                },
            };
            done(outcome);
        });
    }
}

async fn resolve_layers(
    backend: &dyn ResourceBackend,
    resource: &ImageResource,
) -> Option<(Bitmap, ResolvedFrom)> {
    let url = &resource.url;
    if let Some(image) = backend.memory_get(url) {
        return Some((image, ResolvedFrom::Memory));
    }

    if let Some(image) = backend.disk_get(url).await {
        backend.memory_put(url, image.clone());
        return Some((image, ResolvedFrom::Disk));
    }

    match backend.network_fetch(resource).await {
        Ok(image) => {
            backend.memory_put(url, image.clone());
            if let Err(e) = backend.disk_put(url, image.clone()).await {
                tracing::warn!(%url, error = %e, "failed to persist fetched image");
            }
            Some((image, ResolvedFrom::Network))
        }
        Err(e) => {
            tracing::debug!(%url, error = %e, "image resource unavailable");
            None
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/resource/loader.rs"]
mod tests;
