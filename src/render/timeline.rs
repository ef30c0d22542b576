//! Staged, time-gated sequences for the longer scenes.
//!
//! A [`Timeline`] walks an ordered list of [`StageDef`]s by elapsed time since
//! mount. Stages only ever advance. Each stage carries a zoom target and the
//! timeline eases from the previous stage's zoom to the new one over a fixed
//! window, so stage changes never pop.
//!
//! A [`Reveal`] is a one-shot switch for overlay text that appears once and stays.

use crate::scene::Easing;

/// One stage of a timeline.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StageDef<S> {
    pub stage: S,
    /// Seconds after mount at which this stage begins.
    pub starts_at: f32,
    /// Zoom the scene settles on during this stage.
    pub zoom: f32,
}

impl<S> StageDef<S> {
    pub const fn new(stage: S, starts_at: f32, zoom: f32) -> Self {
        Self {
            stage,
            starts_at,
            zoom,
        }
    }
}

/// Elapsed-time driven stage tracker.
#[derive(Clone, Debug)]
pub struct Timeline<S: 'static> {
    stages: &'static [StageDef<S>],
    elapsed: f32,
    current: usize,
    window: f32,
    easing: Easing,
}

impl<S: Copy + PartialEq + 'static> Timeline<S> {
    /// `stages` must be sorted by `starts_at` and non-empty.
    pub fn new(stages: &'static [StageDef<S>], window: f32) -> Self {
        debug_assert!(!stages.is_empty(), "timeline needs at least one stage");
        debug_assert!(
            stages.windows(2).all(|w| w[0].starts_at <= w[1].starts_at),
            "timeline stages must be sorted"
        );
        Self {
            stages,
            elapsed: 0.0,
            current: 0,
            window: window.max(0.0),
            easing: Easing::EaseInOut,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    /// Advance by `dt` seconds. Returns the stage just entered, if any. When a
    /// long frame skips over several stages, the last one is returned.
    pub fn advance(&mut self, dt: f32) -> Option<S> {
        self.elapsed += dt.max(0.0);
        let mut entered = None;
        while self.current + 1 < self.stages.len()
            && self.elapsed >= self.stages[self.current + 1].starts_at
        {
            self.current += 1;
            entered = Some(self.stages[self.current].stage);
        }
        if entered.is_some() {
            log::debug!(
                "[timeline] stage {} at {:.2}s",
                self.current,
                self.elapsed
            );
        }
        entered
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn stage(&self) -> S {
        self.stages[self.current].stage
    }

    pub fn stage_index(&self) -> usize {
        self.current
    }

    pub fn is_terminal(&self) -> bool {
        self.current + 1 == self.stages.len()
    }

    /// Seconds spent in the current stage.
    pub fn stage_elapsed(&self) -> f32 {
        self.elapsed - self.stages[self.current].starts_at
    }

    /// Linear progress through the current stage's transition window (0 to 1).
    pub fn transition_progress(&self) -> f32 {
        if self.current == 0 || self.window <= 0.0 {
            return 1.0;
        }
        (self.stage_elapsed() / self.window).clamp(0.0, 1.0)
    }

    /// Zoom, eased from the previous stage's target to the current one.
    pub fn zoom(&self) -> f32 {
        let target = self.stages[self.current].zoom;
        if self.current == 0 {
            return target;
        }
        let from = self.stages[self.current - 1].zoom;
        let t = self.easing.apply(self.transition_progress());
        from + (target - from) * t
    }

    /// Blend weight of the current stage against the previous one, for crossfading
    /// stage-specific visuals.
    pub fn blend(&self) -> f32 {
        self.easing.apply(self.transition_progress())
    }

    /// Stage before the current one, if any.
    pub fn previous_stage(&self) -> Option<S> {
        self.current
            .checked_sub(1)
            .map(|i| self.stages[i].stage)
    }
}

/// Overlay text that appears once and stays.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Reveal {
    shown_at: Option<f32>,
}

impl Reveal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the text at time `now`. Returns true only the first time.
    pub fn trigger(&mut self, now: f32) -> bool {
        if self.shown_at.is_some() {
            return false;
        }
        self.shown_at = Some(now);
        true
    }

    pub fn is_shown(&self) -> bool {
        self.shown_at.is_some()
    }

    /// Opacity at `now`, fading in over `fade` seconds after the trigger.
    pub fn opacity(&self, now: f32, fade: f32) -> f32 {
        match self.shown_at {
            None => 0.0,
            Some(at) => ramp(now, at, fade),
        }
    }
}

/// 0 before `delay`, rising linearly to 1 over `duration` seconds.
pub fn ramp(t: f32, delay: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return if t >= delay { 1.0 } else { 0.0 };
    }
    ((t - delay) / duration).clamp(0.0, 1.0)
}
