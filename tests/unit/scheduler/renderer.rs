use futures::FutureExt as _;
use futures::future::BoxFuture;
use url::Url;

use super::*;
use crate::foundation::core::{Rect, Rgba8};
use crate::foundation::error::SlideError;
use crate::render::nodes::FillNode;
use crate::render::rasterizer::CompositingRasterizer;
use crate::render::surface::{RenderNode, RenderTarget};
use crate::resource::map::ImageResource;

struct NoResources;

impl ResourceBackend for NoResources {
    fn memory_get(&self, _url: &Url) -> Option<Bitmap> {
        None
    }

    fn memory_put(&self, _url: &Url, _image: Bitmap) {}

    fn disk_get<'a>(&'a self, _url: &'a Url) -> BoxFuture<'a, Option<Bitmap>> {
        async { None }.boxed()
    }

    fn disk_put<'a>(&'a self, _url: &'a Url, _image: Bitmap) -> BoxFuture<'a, SlideResult<()>> {
        async { Ok(()) }.boxed()
    }

    fn network_fetch<'a>(
        &'a self,
        _resource: &'a ImageResource,
    ) -> BoxFuture<'a, SlideResult<Bitmap>> {
        async { Err(SlideError::resource("offline")) }.boxed()
    }
}

#[derive(Default)]
struct Plain {
    shown: Option<Bitmap>,
}

impl SurfaceAdapter for Plain {
    fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, 2.0, 2.0)
    }

    fn template_color(&self) -> Option<Rgba8> {
        None
    }

    fn content_nodes(&self) -> Vec<Box<dyn RenderNode>> {
        vec![Box::new(FillNode::new(
            Rect::new(0.0, 0.0, 2.0, 2.0),
            Rgba8::opaque(1, 2, 3),
        ))]
    }

    fn attach_render_target(&mut self, _target: RenderTarget) {}

    fn displayer_image(&self, _displayer: DisplayerId) -> Option<&Bitmap> {
        None
    }

    fn set_displayer_image(&mut self, _displayer: DisplayerId, _image: Option<Bitmap>) {}

    fn present(&mut self, presentation: Presentation) {
        self.shown = match presentation {
            Presentation::Immediate(b) => b,
            Presentation::CrossFade { to, .. } => Some(to),
        };
    }
}

fn scheduler(rt: &tokio::runtime::Runtime) -> RenderScheduler<Plain> {
    let opts = SchedulerOpts {
        cache_capacity: 4,
        max_concurrent_renders: 1,
        cross_fade_ms: 0,
    };
    RenderScheduler::new(
        &opts,
        Arc::new(CompositingRasterizer),
        Arc::new(NoResources),
        rt.handle().clone(),
    )
    .unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap()
}

const WAIT: Duration = Duration::from_secs(10);

#[test]
fn invalid_options_are_rejected() {
    let rt = runtime();
    let opts = SchedulerOpts {
        max_concurrent_renders: 0,
        ..SchedulerOpts::default()
    };
    let res = RenderScheduler::<Plain>::new(
        &opts,
        Arc::new(CompositingRasterizer),
        Arc::new(NoResources),
        rt.handle().clone(),
    );
    assert!(matches!(res, Err(SlideError::Validation(_))));
}

#[test]
fn unknown_surfaces_report_nothing() {
    let rt = runtime();
    let mut sched = scheduler(&rt);
    let id = sched.insert_surface(Plain::default());
    sched.remove_surface(id);
    assert_eq!(sched.phase(id), None);
    assert!(!sched.is_transitioning(id));
    assert_eq!(sched.transition_progress(id, Instant::now()), None);
    assert_eq!(sched.surface_count(), 0);
}

#[test]
fn phase_follows_the_render_cycle() {
    let rt = runtime();
    let mut sched = scheduler(&rt);
    let id = sched.insert_surface(Plain::default());
    assert_eq!(sched.phase(id), Some(SurfacePhase::Idle));

    sched.render(id, RenderRequest::new(RenderKey::from_raw("p")));
    assert_eq!(sched.phase(id), Some(SurfacePhase::Rendering));
    assert_eq!(sched.in_flight(), 1);

    assert!(sched.settle(Instant::now(), WAIT));
    assert_eq!(sched.phase(id), Some(SurfacePhase::Rendered));
    assert_eq!(sched.in_flight(), 0);
}

#[test]
fn zero_length_crossfade_settles_on_the_same_pump() {
    let rt = runtime();
    let mut sched = scheduler(&rt);
    let id = sched.insert_surface(Plain::default());
    let now = Instant::now();

    sched.render(id, RenderRequest::new(RenderKey::from_raw("z")));
    assert!(sched.settle(now, WAIT));
    assert!(!sched.is_transitioning(id));
    assert!(!sched.is_animating());
    assert!(sched.surface(id).unwrap().shown.is_some());
}

#[test]
fn resolution_failures_count_as_missed() {
    let rt = runtime();
    let mut sched = scheduler(&rt);
    let id = sched.insert_surface(Plain::default());
    let resources = ResourceMap::new().with(
        DisplayerId(3),
        Url::parse("https://img.test/x.png").unwrap(),
        None,
    );

    sched.render(
        id,
        RenderRequest::new(RenderKey::from_raw("r")).with_resources(resources),
    );
    assert_eq!(sched.in_flight(), 2);
    assert!(sched.settle(Instant::now(), WAIT));
    assert_eq!(sched.stats().resources_missed, 1);
    // The displayer never receives an image, so the snapshot stays incomplete.
    assert!(!sched.is_fully_rendered(&RenderKey::from_raw("r")));
    assert_eq!(sched.phase(id), Some(SurfacePhase::Rendered));
}

#[test]
fn request_debug_omits_the_hook_body() {
    let req = RenderRequest::<Plain>::for_item(&42u32, "cell", "small").before_snapshot(|_| {});
    let dbg = format!("{req:?}");
    assert!(dbg.contains("before_snapshot: true"));
    assert!(req.clone().invalidation.is_some());
}
