//! Frame-callback and timer bookkeeping for mounted renderers.
//!
//! The window's redraw loop is the only clock. Renderers do not own threads or
//! timers; they register callbacks here while mounted and the [`Stage`](crate::scene::Stage)
//! drives them. Every callback belongs to an [`OwnerId`] (one per mount), so
//! unmounting can cancel everything a renderer ever registered in one call.

use std::collections::BTreeMap;

/// Identifies one mount of one renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OwnerId(u64);

/// Handle to a registered frame callback or timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CallbackId(u64);

#[derive(Clone, Copy, Debug)]
enum CallbackKind {
    /// Runs every display frame until cancelled.
    Frame,
    /// Fires every `period` seconds until cancelled.
    Interval { period: f32, remaining: f32 },
    /// Fires once after the delay, then completes on its own.
    Timeout { remaining: f32 },
}

#[derive(Clone, Copy, Debug)]
struct Callback {
    owner: OwnerId,
    kind: CallbackKind,
}

/// Registry of live callbacks with lifetime counters.
///
/// Invariant: `registered == pending + cancelled + completed`.
#[derive(Debug, Default)]
pub struct FrameScheduler {
    callbacks: BTreeMap<CallbackId, Callback>,
    next_owner: u64,
    next_callback: u64,
    registered: u64,
    cancelled: u64,
    completed: u64,
}

impl FrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh owner for a new mount.
    pub fn new_owner(&mut self) -> OwnerId {
        self.next_owner += 1;
        OwnerId(self.next_owner)
    }

    fn register(&mut self, owner: OwnerId, kind: CallbackKind) -> CallbackId {
        self.next_callback += 1;
        let id = CallbackId(self.next_callback);
        self.callbacks.insert(id, Callback { owner, kind });
        self.registered += 1;
        id
    }

    /// Register a per-frame callback.
    pub fn request_frame(&mut self, owner: OwnerId) -> CallbackId {
        self.register(owner, CallbackKind::Frame)
    }

    /// Register a repeating timer. Periods are clamped to at least one millisecond.
    pub fn set_interval(&mut self, owner: OwnerId, period: f32) -> CallbackId {
        let period = period.max(0.001);
        log::debug!("[scheduler] interval every {period:.2}s for {owner:?}");
        self.register(
            owner,
            CallbackKind::Interval {
                period,
                remaining: period,
            },
        )
    }

    /// Register a one-shot timer.
    pub fn set_timeout(&mut self, owner: OwnerId, delay: f32) -> CallbackId {
        log::debug!("[scheduler] timeout in {delay:.2}s for {owner:?}");
        self.register(
            owner,
            CallbackKind::Timeout {
                remaining: delay.max(0.0),
            },
        )
    }

    /// Cancel a single callback. Returns false if it already completed or was cancelled.
    pub fn cancel(&mut self, id: CallbackId) -> bool {
        if self.callbacks.remove(&id).is_some() {
            self.cancelled += 1;
            true
        } else {
            false
        }
    }

    /// Cancel every live callback registered by `owner`. Returns how many were cancelled.
    pub fn cancel_owner(&mut self, owner: OwnerId) -> usize {
        let before = self.callbacks.len();
        self.callbacks.retain(|_, cb| cb.owner != owner);
        let removed = before - self.callbacks.len();
        self.cancelled += removed as u64;
        removed
    }

    pub fn is_active(&self, id: CallbackId) -> bool {
        self.callbacks.contains_key(&id)
    }

    /// Advance all timers by `dt` seconds and return the ones that fired, in
    /// registration order. An interval fires at most once per call, so a long
    /// stall does not produce a burst.
    pub fn advance(&mut self, dt: f32) -> Vec<(OwnerId, CallbackId)> {
        let mut fired = Vec::new();
        let mut finished = Vec::new();

        for (id, cb) in self.callbacks.iter_mut() {
            match &mut cb.kind {
                CallbackKind::Frame => {}
                CallbackKind::Interval { period, remaining } => {
                    *remaining -= dt;
                    if *remaining <= 0.0 {
                        fired.push((cb.owner, *id));
                        *remaining = *period - (-*remaining % *period);
                    }
                }
                CallbackKind::Timeout { remaining } => {
                    *remaining -= dt;
                    if *remaining <= 0.0 {
                        fired.push((cb.owner, *id));
                        finished.push(*id);
                    }
                }
            }
        }

        for id in finished {
            self.callbacks.remove(&id);
            self.completed += 1;
        }
        fired
    }

    /// Number of live callbacks.
    pub fn pending(&self) -> usize {
        self.callbacks.len()
    }

    /// Number of live callbacks belonging to `owner`.
    pub fn pending_for(&self, owner: OwnerId) -> usize {
        self.callbacks.values().filter(|cb| cb.owner == owner).count()
    }

    pub fn registered(&self) -> u64 {
        self.registered
    }

    pub fn cancelled(&self) -> u64 {
        self.cancelled
    }

    /// Timeouts that fired and retired on their own.
    pub fn completed(&self) -> u64 {
        self.completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_owner_clears_everything_it_registered() {
        let mut scheduler = FrameScheduler::new();
        let a = scheduler.new_owner();
        let b = scheduler.new_owner();

        scheduler.request_frame(a);
        scheduler.set_interval(a, 1.0);
        scheduler.set_timeout(a, 5.0);
        let other = scheduler.request_frame(b);

        assert_eq!(scheduler.cancel_owner(a), 3);
        assert_eq!(scheduler.pending_for(a), 0);
        assert!(scheduler.is_active(other));
        assert_eq!(scheduler.registered(), 4);
        assert_eq!(scheduler.cancelled(), 3);
    }

    #[test]
    fn interval_fires_once_per_period() {
        let mut scheduler = FrameScheduler::new();
        let owner = scheduler.new_owner();
        let id = scheduler.set_interval(owner, 0.5);

        assert!(scheduler.advance(0.3).is_empty());
        assert_eq!(scheduler.advance(0.3), vec![(owner, id)]);
        assert!(scheduler.advance(0.3).is_empty());
        assert_eq!(scheduler.advance(0.3), vec![(owner, id)]);
        assert!(scheduler.is_active(id));
    }

    #[test]
    fn long_stall_does_not_burst() {
        let mut scheduler = FrameScheduler::new();
        let owner = scheduler.new_owner();
        scheduler.set_interval(owner, 0.1);
        assert_eq!(scheduler.advance(5.0).len(), 1);
    }

    #[test]
    fn timeout_completes_after_firing() {
        let mut scheduler = FrameScheduler::new();
        let owner = scheduler.new_owner();
        let id = scheduler.set_timeout(owner, 1.0);

        assert!(scheduler.advance(0.5).is_empty());
        assert_eq!(scheduler.advance(0.6), vec![(owner, id)]);
        assert!(!scheduler.is_active(id));
        assert!(!scheduler.cancel(id));
        assert_eq!(scheduler.completed(), 1);
        assert_eq!(scheduler.cancelled(), 0);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn counters_balance() {
        let mut scheduler = FrameScheduler::new();
        let owner = scheduler.new_owner();
        scheduler.request_frame(owner);
        scheduler.set_timeout(owner, 0.1);
        scheduler.set_interval(owner, 0.1);
        scheduler.advance(0.2);
        scheduler.cancel_owner(owner);

        assert_eq!(
            scheduler.registered(),
            scheduler.pending() as u64 + scheduler.cancelled() + scheduler.completed()
        );
    }
}
