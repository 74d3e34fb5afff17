use std::collections::HashSet;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::{Arc, mpsc};
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;

use crate::animation::registry::AnimatingRegistry;
use crate::animation::sequencer::{TransitionState, TransitionStep};
use crate::cache::render_cache::RenderCache;
use crate::config::SchedulerOpts;
use crate::foundation::core::Bitmap;
use crate::foundation::error::SlideResult;
use crate::keys::{InvalidationKey, RenderKey, keys_for};
use crate::render::executor::{BoundedExecutor, CancelFlag, JobOutcome};
use crate::render::rasterizer::Rasterizer;
use crate::render::surface::{
    InputEvent, Presentation, SurfaceAdapter, capture_tree, render_target_for,
};
use crate::resource::backend::ResourceBackend;
use crate::resource::loader::{ResolveOutcome, ResourceLoader};
use crate::resource::map::{DisplayerId, ResourceMap};
use crate::scheduler::arena::{SurfaceArena, SurfaceId};
use crate::scheduler::tasks::{ProcessTask, RenderTask};

/// What to display on a surface and what it depends on.
pub struct RenderRequest<S> {
    pub key: RenderKey,
    /// Content identity used by [`RenderScheduler::mark_dirty`]. `None` opts out of invalidation.
    pub invalidation: Option<InvalidationKey>,
    pub resources: ResourceMap,
    /// Runs against the surface on the interactive thread right before its tree is captured.
    pub before_snapshot: Option<Rc<dyn Fn(&mut S)>>,
}

impl<S> RenderRequest<S> {
    pub fn new(key: RenderKey) -> Self {
        Self {
            key,
            invalidation: None,
            resources: ResourceMap::new(),
            before_snapshot: None,
        }
    }

    /// Request keyed by `item`'s identity, invalidatable through
    /// [`RenderScheduler::notify_changed`].
    pub fn for_item<T: Hash + ?Sized>(item: &T, surface_kind: &str, variant: &str) -> Self {
        let (key, invalidation) = keys_for(item, surface_kind, variant);
        Self::new(key).with_invalidation(invalidation)
    }

    pub fn with_invalidation(mut self, invalidation: InvalidationKey) -> Self {
        self.invalidation = Some(invalidation);
        self
    }

    pub fn with_resources(mut self, resources: ResourceMap) -> Self {
        self.resources = resources;
        self
    }

    pub fn before_snapshot(mut self, hook: impl Fn(&mut S) + 'static) -> Self {
        self.before_snapshot = Some(Rc::new(hook));
        self
    }
}

impl<S> Clone for RenderRequest<S> {
    fn clone(&self) -> Self {
        Self {
            key: self.key.clone(),
            invalidation: self.invalidation.clone(),
            resources: self.resources.clone(),
            before_snapshot: self.before_snapshot.clone(),
        }
    }
}

impl<S> std::fmt::Debug for RenderRequest<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderRequest")
            .field("key", &self.key)
            .field("invalidation", &self.invalidation)
            .field("resources", &self.resources.len())
            .field("before_snapshot", &self.before_snapshot.is_some())
            .finish()
    }
}

/// Where a surface is in its render cycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SurfacePhase {
    /// No request yet, or the last render was cancelled before anything was cached.
    Idle,
    ResourcesPending,
    Rendering,
    /// A snapshot for the current key is cached and nothing is outstanding.
    Rendered,
}

/// Counters accumulated over the scheduler's lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SchedulerStats {
    /// Rasterization jobs handed to the executor.
    pub renders_submitted: u64,
    /// Jobs whose snapshot reached the cache.
    pub renders_applied: u64,
    /// Jobs cancelled, superseded or addressed to a removed surface.
    pub renders_discarded: u64,
    /// Jobs whose rasterizer returned an error.
    pub renders_failed: u64,
    /// Requests served from the cache without a job.
    pub cache_reuses: u64,
    pub resources_resolved: u64,
    pub resources_missed: u64,
}

enum Event {
    Rendered {
        surface: SurfaceId,
        task: u64,
        outcome: JobOutcome<SlideResult<Bitmap>>,
    },
    Resolved {
        surface: SurfaceId,
        task: u64,
        displayer: DisplayerId,
        outcome: ResolveOutcome,
    },
}

struct SurfaceSlot<S> {
    adapter: S,
    attached: bool,
    request: Option<RenderRequest<S>>,
    render_task: Option<RenderTask>,
    process_task: Option<ProcessTask>,
    transition: TransitionState,
}

/// Coordinates snapshot rendering for every registered surface.
///
/// Lives on the interactive thread. Rasterization runs on a bounded worker pool and resource
/// resolution on the supplied tokio runtime; their results come back over a channel and are
/// applied only inside [`pump`](Self::pump), [`wait_event`](Self::wait_event) or
/// [`settle`](Self::settle).
pub struct RenderScheduler<S: SurfaceAdapter> {
    surfaces: SurfaceArena<SurfaceSlot<S>>,
    cache: RenderCache,
    fully_rendered: HashSet<RenderKey>,
    pending_invalidations: HashSet<InvalidationKey>,
    animating: AnimatingRegistry,
    executor: BoundedExecutor,
    rasterizer: Arc<dyn Rasterizer>,
    loader: ResourceLoader,
    tx: mpsc::Sender<Event>,
    rx: mpsc::Receiver<Event>,
    in_flight: usize,
    next_task: u64,
    cross_fade: Duration,
    stats: SchedulerStats,
}

impl<S: SurfaceAdapter> RenderScheduler<S> {
    pub fn new(
        opts: &SchedulerOpts,
        rasterizer: Arc<dyn Rasterizer>,
        backend: Arc<dyn ResourceBackend>,
        runtime: tokio::runtime::Handle,
    ) -> SlideResult<Self> {
        opts.validate()?;
        let (tx, rx) = mpsc::channel();
        Ok(Self {
            surfaces: SurfaceArena::new(),
            cache: RenderCache::new(opts.cache_capacity)?,
            fully_rendered: HashSet::new(),
            pending_invalidations: HashSet::new(),
            animating: AnimatingRegistry::new(),
            executor: BoundedExecutor::new(opts.max_concurrent_renders)?,
            rasterizer,
            loader: ResourceLoader::new(backend, runtime),
            tx,
            rx,
            in_flight: 0,
            next_task: 0,
            cross_fade: opts.cross_fade(),
            stats: SchedulerStats::default(),
        })
    }

    pub fn insert_surface(&mut self, adapter: S) -> SurfaceId {
        self.surfaces.insert(SurfaceSlot {
            adapter,
            attached: false,
            request: None,
            render_task: None,
            process_task: None,
            transition: TransitionState::new(self.cross_fade),
        })
    }

    /// Unregister a surface, cancelling its tasks. Late results addressed to it are dropped.
    pub fn remove_surface(&mut self, id: SurfaceId) -> Option<S> {
        let slot = self.surfaces.remove(id)?;
        if slot.transition.is_transitioning()
            && let Some(request) = slot.request.as_ref()
        {
            self.animating.set_animating(&request.key, false);
        }
        Some(slot.adapter)
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&S> {
        self.surfaces.get(id).map(|slot| &slot.adapter)
    }

    pub fn surface_mut(&mut self, id: SurfaceId) -> Option<&mut S> {
        self.surfaces.get_mut(id).map(|slot| &mut slot.adapter)
    }

    pub fn surface_count(&self) -> usize {
        self.surfaces.len()
    }

    /// Display `request` on the surface, rendering only when the cached snapshot is missing,
    /// incomplete or invalidated. Never fails; problems are logged and absorbed.
    #[tracing::instrument(level = "debug", skip_all, fields(surface = ?id, key = %request.key))]
    pub fn render(&mut self, id: SurfaceId, request: RenderRequest<S>) {
        let process_id = self.next_task_id();
        let Some(slot) = self.surfaces.get_mut(id) else {
            tracing::warn!("render requested for a removed surface");
            return;
        };

        slot.render_task = None;

        if !slot.attached {
            let target = render_target_for(&slot.adapter);
            slot.adapter.attach_render_target(target);
            slot.attached = true;
        }

        if slot.transition.reset()
            && let Some(previous) = slot.request.as_ref()
        {
            self.animating.set_animating(&previous.key, false);
        }
        slot.adapter
            .present(Presentation::Immediate(self.cache.get(&request.key)));

        slot.process_task = None;
        let mut missing = Vec::new();
        for entry in &request.resources {
            let cached = self.loader.cached(&entry.resource.url);
            if cached.is_none() {
                missing.push(entry.clone());
            }
            slot.adapter.set_displayer_image(entry.displayer, cached);
        }

        if !missing.is_empty() {
            tracing::debug!(pending = missing.len(), "resolving resources");
            let token = CancellationToken::new();
            slot.process_task = Some(ProcessTask::new(process_id, token.clone(), missing.len()));
            for entry in missing {
                self.in_flight += 1;
                let tx = self.tx.clone();
                let displayer = entry.displayer;
                self.loader
                    .spawn_resolve(entry.resource, token.clone(), move |outcome| {
                        let _ = tx.send(Event::Resolved {
                            surface: id,
                            task: process_id,
                            displayer,
                            outcome,
                        });
                    });
            }
        }

        slot.request = Some(request);
        self.render_if_due(id);
    }

    /// Cancel the surface's in-flight rasterization. Resource resolution keeps going.
    pub fn cancel(&mut self, id: SurfaceId) {
        if let Some(slot) = self.surfaces.get_mut(id)
            && slot.render_task.take().is_some()
        {
            tracing::debug!(surface = ?id, "render cancelled");
        }
    }

    /// Force exactly one re-render the next time a request carrying `invalidation` is rendered.
    pub fn mark_dirty(&mut self, invalidation: InvalidationKey) {
        tracing::trace!(%invalidation, "marked dirty");
        self.pending_invalidations.insert(invalidation);
    }

    pub fn notify_changed<T: Hash + ?Sized>(&mut self, item: &T) {
        self.mark_dirty(InvalidationKey::for_item(item));
    }

    pub fn is_fully_rendered(&self, key: &RenderKey) -> bool {
        self.fully_rendered.contains(key)
    }

    pub fn is_dirty(&self, invalidation: &InvalidationKey) -> bool {
        self.pending_invalidations.contains(invalidation)
    }

    pub fn cache(&self) -> &RenderCache {
        &self.cache
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    /// Rasterization jobs and resource resolutions whose result has not been received yet.
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn phase(&self, id: SurfaceId) -> Option<SurfacePhase> {
        let slot = self.surfaces.get(id)?;
        let phase = if slot.render_task.is_some() {
            SurfacePhase::Rendering
        } else if slot.process_task.is_some() {
            SurfacePhase::ResourcesPending
        } else {
            match slot.request.as_ref() {
                Some(request) if self.cache.contains(&request.key) => SurfacePhase::Rendered,
                _ => SurfacePhase::Idle,
            }
        };
        Some(phase)
    }

    pub fn is_transitioning(&self, id: SurfaceId) -> bool {
        self.surfaces
            .get(id)
            .is_some_and(|slot| slot.transition.is_transitioning())
    }

    pub fn transition_progress(&self, id: SurfaceId, now: Instant) -> Option<f32> {
        self.surfaces.get(id)?.transition.progress(now)
    }

    /// True while any surface is cross-fading.
    pub fn is_animating(&self) -> bool {
        self.animating.is_animating()
    }

    /// Run `action` once no surface is cross-fading. Only the latest pending action is kept.
    pub fn run_after_all_animations(&mut self, action: impl FnOnce() + 'static) {
        self.animating.run_after_all_animations(action);
    }

    /// Forward input received by a surface's render target to the surface itself.
    pub fn dispatch_input(&mut self, id: SurfaceId, event: InputEvent) {
        if let Some(slot) = self.surfaces.get_mut(id) {
            slot.adapter.handle_input(event);
        }
    }

    /// Apply every result that has arrived and advance cross-fades to `now`. Returns the number
    /// of results handled.
    pub fn pump(&mut self, now: Instant) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.rx.try_recv() {
            self.handle_event(event, now);
            handled += 1;
        }
        self.advance_transitions(now);
        handled
    }

    /// Block up to `timeout` for one result, then pump. Returns whether a result arrived.
    pub fn wait_event(&mut self, now: Instant, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => {
                self.handle_event(event, now);
                self.pump(now);
                true
            }
            Err(_) => {
                self.advance_transitions(now);
                false
            }
        }
    }

    /// Wait until no work is in flight, applying results as they arrive. Returns false when
    /// `timeout` elapses first.
    pub fn settle(&mut self, now: Instant, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        self.pump(now);
        while self.in_flight > 0 {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                tracing::warn!(in_flight = self.in_flight, "settle timed out");
                return false;
            }
            self.wait_event(now, remaining);
        }
        true
    }

    fn next_task_id(&mut self) -> u64 {
        self.next_task += 1;
        self.next_task
    }

    fn render_if_due(&mut self, id: SurfaceId) {
        let Some(request) = self.surfaces.get(id).and_then(|slot| slot.request.as_ref()) else {
            return;
        };
        let key = &request.key;

        // An evicted snapshot is no longer complete no matter what was recorded for it.
        let mut due = !self.fully_rendered.contains(key) || !self.cache.contains(key);
        if let Some(invalidation) = request.invalidation.as_ref()
            && self.pending_invalidations.remove(invalidation)
        {
            tracing::debug!(%key, %invalidation, "consuming invalidation");
            self.fully_rendered.remove(key);
            due = true;
        }

        if due {
            self.submit_render(id);
        } else {
            tracing::trace!(%key, "reusing cached snapshot");
            self.stats.cache_reuses += 1;
        }
    }

    fn submit_render(&mut self, id: SurfaceId) {
        let task_id = self.next_task_id();
        let Some(slot) = self.surfaces.get_mut(id) else {
            return;
        };
        let Some(hook) = slot.request.as_ref().map(|r| r.before_snapshot.clone()) else {
            return;
        };

        slot.render_task = None;
        if let Some(hook) = hook {
            hook(&mut slot.adapter);
        }
        let tree = capture_tree(&slot.adapter);

        let cancel = CancelFlag::new();
        slot.render_task = Some(RenderTask::new(task_id, cancel.clone()));
        self.in_flight += 1;
        self.stats.renders_submitted += 1;
        tracing::debug!(surface = ?id, task = task_id, "render submitted");

        let rasterizer = Arc::clone(&self.rasterizer);
        let tx = self.tx.clone();
        self.executor.submit(
            cancel,
            move || rasterizer.rasterize(tree),
            move |outcome| {
                let _ = tx.send(Event::Rendered {
                    surface: id,
                    task: task_id,
                    outcome,
                });
            },
        );
    }

    fn handle_event(&mut self, event: Event, now: Instant) {
        self.in_flight = self.in_flight.saturating_sub(1);
        match event {
            Event::Rendered {
                surface,
                task,
                outcome,
            } => self.apply_render(surface, task, outcome, now),
            Event::Resolved {
                surface,
                task,
                displayer,
                outcome,
            } => self.apply_resource(surface, task, displayer, outcome),
        }
    }

    fn apply_render(
        &mut self,
        id: SurfaceId,
        task: u64,
        outcome: JobOutcome<SlideResult<Bitmap>>,
        now: Instant,
    ) {
        let Some(slot) = self.surfaces.get_mut(id) else {
            tracing::trace!(surface = ?id, task, "render result for removed surface dropped");
            self.stats.renders_discarded += 1;
            return;
        };
        if slot.render_task.as_ref().map(|t| t.id) != Some(task) {
            tracing::trace!(surface = ?id, task, "stale render result dropped");
            self.stats.renders_discarded += 1;
            return;
        }
        slot.render_task = None;
        let Some(request) = slot.request.as_ref() else {
            self.stats.renders_discarded += 1;
            return;
        };

        let bitmap = match outcome {
            JobOutcome::Cancelled => {
                self.stats.renders_discarded += 1;
                return;
            }
            JobOutcome::Done(Err(e)) => {
                tracing::warn!(key = %request.key, error = %e, "rasterization failed");
                self.stats.renders_failed += 1;
                return;
            }
            JobOutcome::Panicked(msg) => {
                tracing::error!(key = %request.key, panic = %msg, "rasterizer panicked");
                self.stats.renders_failed += 1;
                return;
            }
            JobOutcome::Done(Ok(bitmap)) => bitmap,
        };

        let key = request.key.clone();
        self.cache.put(key.clone(), bitmap.clone());
        if let Some(to) = slot.transition.play(bitmap, now) {
            self.animating.set_animating(&key, true);
            slot.adapter.present(Presentation::CrossFade {
                to,
                duration: slot.transition.duration(),
            });
        }

        let complete = request
            .resources
            .displayers()
            .all(|d| slot.adapter.displayer_image(d).is_some());
        if complete {
            self.fully_rendered.insert(key.clone());
        }
        self.stats.renders_applied += 1;
        tracing::debug!(%key, complete, "render applied");
    }

    fn apply_resource(
        &mut self,
        id: SurfaceId,
        task: u64,
        displayer: DisplayerId,
        outcome: ResolveOutcome,
    ) {
        let Some(slot) = self.surfaces.get_mut(id) else {
            return;
        };
        let Some(process) = slot.process_task.as_mut().filter(|p| p.id == task) else {
            tracing::trace!(surface = ?id, task, "stale resource result dropped");
            return;
        };
        process.pending = process.pending.saturating_sub(1);
        if process.pending == 0 {
            slot.process_task = None;
        }

        match outcome {
            ResolveOutcome::Resolved(image, from) => {
                tracing::trace!(surface = ?id, ?displayer, ?from, "resource arrived");
                slot.adapter.set_displayer_image(displayer, Some(image));
                self.stats.resources_resolved += 1;
                self.submit_render(id);
            }
            ResolveOutcome::Missing => {
                self.stats.resources_missed += 1;
            }
            ResolveOutcome::Cancelled => {}
        }
    }

    fn advance_transitions(&mut self, now: Instant) {
        for (_, slot) in self.surfaces.iter_mut() {
            for step in slot.transition.advance(now) {
                match step {
                    TransitionStep::Started(to) => slot.adapter.present(Presentation::CrossFade {
                        to,
                        duration: slot.transition.duration(),
                    }),
                    TransitionStep::Settled => {
                        if let Some(request) = slot.request.as_ref() {
                            self.animating.set_animating(&request.key, false);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scheduler/renderer.rs"]
mod tests;
