use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::FutureExt as _;
use futures::future::BoxFuture;
use parking_lot::Mutex;

use super::*;
use crate::foundation::core::Rgba8;
use crate::foundation::error::{SlideError, SlideResult};

#[derive(Default)]
struct LayeredBackend {
    memory: Mutex<HashMap<Url, Bitmap>>,
    disk: Mutex<HashMap<Url, Bitmap>>,
    network: Mutex<HashMap<Url, Bitmap>>,
    network_delay: Option<Duration>,
    disk_reads: AtomicUsize,
    network_fetches: AtomicUsize,
}

impl ResourceBackend for LayeredBackend {
    fn memory_get(&self, url: &Url) -> Option<Bitmap> {
        self.memory.lock().get(url).cloned()
    }

    fn memory_put(&self, url: &Url, image: Bitmap) {
        self.memory.lock().insert(url.clone(), image);
    }

    fn disk_get<'a>(&'a self, url: &'a Url) -> BoxFuture<'a, Option<Bitmap>> {
        self.disk_reads.fetch_add(1, Ordering::SeqCst);
        let hit = self.disk.lock().get(url).cloned();
        async move { hit }.boxed()
    }

    fn disk_put<'a>(&'a self, url: &'a Url, image: Bitmap) -> BoxFuture<'a, SlideResult<()>> {
        self.disk.lock().insert(url.clone(), image);
        async { Ok(()) }.boxed()
    }

    fn network_fetch<'a>(
        &'a self,
        resource: &'a ImageResource,
    ) -> BoxFuture<'a, SlideResult<Bitmap>> {
        self.network_fetches.fetch_add(1, Ordering::SeqCst);
        let hit = self.network.lock().get(&resource.url).cloned();
        let delay = self.network_delay;
        async move {
            if let Some(d) = delay {
                tokio::time::sleep(d).await;
            }
            hit.ok_or_else(|| SlideError::resource("404"))
        }
        .boxed()
    }
}

fn url(name: &str) -> Url {
    Url::parse(&format!("https://img.example/{name}")).unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

#[test]
fn disk_hit_populates_memory_and_skips_network() {
    let rt = runtime();
    let backend = Arc::new(LayeredBackend::default());
    backend
        .disk
        .lock()
        .insert(url("a.png"), Bitmap::solid(1, 1, Rgba8::opaque(1, 1, 1)));
    let loader = ResourceLoader::new(backend.clone(), rt.handle().clone());

    assert!(loader.cached(&url("a.png")).is_none());
    let got = rt.block_on(loader.resolve(ImageResource::new(url("a.png"), None)));
    assert!(got.is_some());
    assert!(loader.cached(&url("a.png")).is_some());
    assert_eq!(backend.network_fetches.load(Ordering::SeqCst), 0);
}

#[test]
fn network_hit_populates_memory_and_disk() {
    let rt = runtime();
    let backend = Arc::new(LayeredBackend::default());
    backend
        .network
        .lock()
        .insert(url("b.png"), Bitmap::solid(1, 1, Rgba8::opaque(2, 2, 2)));
    let loader = ResourceLoader::new(backend.clone(), rt.handle().clone());

    let got = rt.block_on(loader.resolve(ImageResource::new(url("b.png"), None)));
    assert!(got.is_some());
    assert_eq!(backend.disk_reads.load(Ordering::SeqCst), 1);
    assert!(backend.memory.lock().contains_key(&url("b.png")));
    assert!(backend.disk.lock().contains_key(&url("b.png")));
}

#[test]
fn memory_hit_touches_no_async_layer() {
    let rt = runtime();
    let backend = Arc::new(LayeredBackend::default());
    backend.memory_put(&url("c.png"), Bitmap::solid(1, 1, Rgba8::transparent()));
    let loader = ResourceLoader::new(backend.clone(), rt.handle().clone());

    assert!(rt
        .block_on(loader.resolve(ImageResource::new(url("c.png"), None)))
        .is_some());
    assert_eq!(backend.disk_reads.load(Ordering::SeqCst), 0);
    assert_eq!(backend.network_fetches.load(Ordering::SeqCst), 0);
}

#[test]
fn network_failure_yields_nothing() {
    let rt = runtime();
    let backend = Arc::new(LayeredBackend::default());
    let loader = ResourceLoader::new(backend.clone(), rt.handle().clone());

    let got = rt.block_on(loader.resolve(ImageResource::new(url("missing.png"), None)));
    assert!(got.is_none());
    assert!(backend.memory.lock().is_empty());
}

#[test]
fn spawned_resolution_reports_exactly_once() {
    let rt = runtime();
    let backend = Arc::new(LayeredBackend::default());
    backend
        .network
        .lock()
        .insert(url("d.png"), Bitmap::solid(1, 1, Rgba8::opaque(4, 4, 4)));
    let loader = ResourceLoader::new(backend, rt.handle().clone());

    let (tx, rx) = std::sync::mpsc::channel();
    loader.spawn_resolve(
        ImageResource::new(url("d.png"), None),
        CancellationToken::new(),
        move |outcome| {
            tx.send(outcome).unwrap();
        },
    );
    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(
        outcome,
        ResolveOutcome::Resolved(_, ResolvedFrom::Network)
    ));
    assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
}

#[test]
fn cancelled_resolution_reports_cancelled() {
    let rt = runtime();
    let backend = Arc::new(LayeredBackend {
        network_delay: Some(Duration::from_secs(30)),
        ..Default::default()
    });
    backend
        .network
        .lock()
        .insert(url("slow.png"), Bitmap::solid(1, 1, Rgba8::transparent()));
    let loader = ResourceLoader::new(backend.clone(), rt.handle().clone());

    let cancel = CancellationToken::new();
    let (tx, rx) = std::sync::mpsc::channel();
    loader.spawn_resolve(
        ImageResource::new(url("slow.png"), None),
        cancel.clone(),
        move |outcome| {
            tx.send(outcome).unwrap();
        },
    );
    cancel.cancel();
    let outcome = rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(matches!(outcome, ResolveOutcome::Cancelled));
    assert!(backend.memory.lock().is_empty());
}
