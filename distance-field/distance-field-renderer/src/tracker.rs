//! Live resource accounting for effects and render targets.
//!
//! A `ResourceTracker` is shared (cheap clone) between a generator and whoever
//! wants to observe it. Tracked objects hold a `TrackedResource` guard whose
//! drop decrements the matching counter, so the counts reflect real lifetimes.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Default, Debug)]
struct Counters {
    live_effects: AtomicUsize,
    live_render_targets: AtomicUsize,
    texture_allocations: AtomicUsize,
}

#[derive(Clone, Default, Debug)]
pub struct ResourceTracker {
    counters: Arc<Counters>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    Effect,
    RenderTarget,
}

impl ResourceTracker {
    pub fn new() -> Self { Self::default() }

    pub fn live_effects(&self) -> usize {
        self.counters.live_effects.load(Ordering::Acquire)
    }

    pub fn live_render_targets(&self) -> usize {
        self.counters.live_render_targets.load(Ordering::Acquire)
    }

    /// Total backing texture allocations made by tracked render targets (never decremented).
    pub fn texture_allocations(&self) -> usize {
        self.counters.texture_allocations.load(Ordering::Acquire)
    }

    pub(crate) fn track(&self, kind: ResourceKind) -> TrackedResource {
        self.counter(kind).fetch_add(1, Ordering::AcqRel);
        TrackedResource { tracker: self.clone(), kind }
    }

    pub(crate) fn record_texture_allocation(&self) {
        self.counters.texture_allocations.fetch_add(1, Ordering::AcqRel);
    }

    fn counter(&self, kind: ResourceKind) -> &AtomicUsize {
        match kind {
            ResourceKind::Effect => &self.counters.live_effects,
            ResourceKind::RenderTarget => &self.counters.live_render_targets,
        }
    }
}

/// Drop guard held by a tracked resource.
#[derive(Debug)]
pub(crate) struct TrackedResource {
    tracker: ResourceTracker,
    kind: ResourceKind,
}

impl TrackedResource {
    pub(crate) fn tracker(&self) -> &ResourceTracker { &self.tracker }
}

impl Drop for TrackedResource {
    fn drop(&mut self) {
        self.tracker.counter(self.kind).fetch_sub(1, Ordering::AcqRel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_counts_lifetime() {
        let tracker = ResourceTracker::new();
        let effect = tracker.track(ResourceKind::Effect);
        let rt_a = tracker.track(ResourceKind::RenderTarget);
        let rt_b = tracker.track(ResourceKind::RenderTarget);
        assert_eq!(tracker.live_effects(), 1);
        assert_eq!(tracker.live_render_targets(), 2);
        drop(rt_a);
        assert_eq!(tracker.live_render_targets(), 1);
        drop(effect);
        drop(rt_b);
        assert_eq!(tracker.live_effects(), 0);
        assert_eq!(tracker.live_render_targets(), 0);
    }

    #[test]
    fn clones_share_counters() {
        let tracker = ResourceTracker::new();
        let observer = tracker.clone();
        tracker.record_texture_allocation();
        tracker.record_texture_allocation();
        assert_eq!(observer.texture_allocations(), 2);
    }
}
