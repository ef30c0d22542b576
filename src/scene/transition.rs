//! Transition timing, easing, and directional poses for scene switching.
//!
//! Transitions run in "wait" mode: the outgoing scene plays its exit animation to
//! completion, and only then does the incoming scene mount and play its enter
//! animation. Both animations are parameterized by the navigation [`Direction`].

/// Easing functions for smooth transitions.
///
/// These control the acceleration curve of transition animations.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum Easing {
    /// Constant speed throughout.
    #[default]
    Linear,
    /// Start slow, accelerate.
    EaseIn,
    /// Start fast, decelerate.
    EaseOut,
    /// Start slow, speed up, then slow down.
    EaseInOut,
    /// CSS-style `cubic-bezier(x1, y1, x2, y2)` with fixed end points (0,0) and (1,1).
    CubicBezier(f32, f32, f32, f32),
}

impl Easing {
    /// The soft "expo-out" curve the journey uses for every scene change.
    pub const JOURNEY: Easing = Easing::CubicBezier(0.16, 1.0, 0.3, 1.0);

    /// Apply the easing function to a linear progress value (0.0 to 1.0).
    pub fn apply(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Easing::Linear => t,
            Easing::EaseIn => t * t,
            Easing::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Easing::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(x1, y1, x2, y2, t),
        }
    }
}

/// One coordinate of a cubic bezier with end points 0 and 1.
fn bezier_axis(p1: f32, p2: f32, s: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
}

fn bezier_axis_slope(p1: f32, p2: f32, s: f32) -> f32 {
    let inv = 1.0 - s;
    3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
}

/// Solve the curve parameter for `x` (Newton, falling back to bisection), then
/// evaluate `y` there.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, x: f32) -> f32 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let mut s = x;
    for _ in 0..8 {
        let err = bezier_axis(x1, x2, s) - x;
        if err.abs() < 1e-6 {
            return bezier_axis(y1, y2, s);
        }
        let slope = bezier_axis_slope(x1, x2, s);
        if slope.abs() < 1e-6 {
            break;
        }
        s -= err / slope;
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    s = x;
    for _ in 0..32 {
        let value = bezier_axis(x1, x2, s);
        if (value - x).abs() < 1e-6 {
            break;
        }
        if value < x {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bezier_axis(y1, y2, s)
}

/// Which way the user moved through the journey.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Forward,
    Backward,
}

/// Visual state of the mounted scene as a whole: a uniform zoom around the
/// screen center plus an opacity multiplier.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub scale: f32,
    pub opacity: f32,
}

impl Pose {
    /// Fully settled on screen.
    pub const CENTER: Pose = Pose {
        scale: 1.0,
        opacity: 1.0,
    };

    /// Where an entering scene starts. Moving forward it grows out of the
    /// distance, moving backward it shrinks down from in front of the viewer.
    pub fn enter_from(direction: Direction) -> Pose {
        match direction {
            Direction::Forward => Pose {
                scale: 0.2,
                opacity: 0.0,
            },
            Direction::Backward => Pose {
                scale: 1.8,
                opacity: 0.0,
            },
        }
    }

    /// Where an exiting scene ends, mirroring [`Pose::enter_from`].
    pub fn exit_to(direction: Direction) -> Pose {
        match direction {
            Direction::Forward => Pose {
                scale: 1.8,
                opacity: 0.0,
            },
            Direction::Backward => Pose {
                scale: 0.2,
                opacity: 0.0,
            },
        }
    }

    pub fn lerp(self, other: Pose, t: f32) -> Pose {
        Pose {
            scale: self.scale + (other.scale - self.scale) * t,
            opacity: self.opacity + (other.opacity - self.opacity) * t,
        }
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Timing of each half of a scene change.
///
/// # Example
///
/// ```ignore
/// let spec = TransitionSpec::new(0.8).easing(Easing::EaseInOut);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TransitionSpec {
    /// Duration of one phase (exit or enter) in seconds.
    pub duration: f32,
    pub easing: Easing,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            duration: 1.2,
            easing: Easing::JOURNEY,
        }
    }
}

impl TransitionSpec {
    pub fn new(duration: f32) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// A transition that completes on the first frame.
    pub fn instant() -> Self {
        Self {
            duration: 0.0,
            easing: Easing::Linear,
        }
    }

    pub fn easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn duration(mut self, duration: f32) -> Self {
        self.duration = duration;
        self
    }
}

/// Phase of an in-flight transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransitionPhase {
    /// The mounted scene is animating out.
    Exiting,
    /// The mounted scene is animating in.
    Entering,
}

/// State of one running phase.
#[derive(Clone, Copy, Debug)]
pub struct ActiveTransition {
    pub phase: TransitionPhase,
    pub direction: Direction,
    /// Seconds since this phase started.
    pub elapsed: f32,
    /// Pose the phase animates away from.
    from: Pose,
    spec: TransitionSpec,
}

impl ActiveTransition {
    /// Exit a settled scene.
    pub fn exit(spec: TransitionSpec, direction: Direction) -> Self {
        Self::exit_from(spec, direction, Pose::CENTER)
    }

    /// Exit starting at `from`, the pose the scene has right now.
    pub fn exit_from(spec: TransitionSpec, direction: Direction, from: Pose) -> Self {
        Self {
            phase: TransitionPhase::Exiting,
            direction,
            elapsed: 0.0,
            from,
            spec,
        }
    }

    pub fn enter(spec: TransitionSpec, direction: Direction) -> Self {
        Self {
            phase: TransitionPhase::Entering,
            direction,
            elapsed: 0.0,
            from: Pose::enter_from(direction),
            spec,
        }
    }

    /// Point the phase at a new direction. The animation restarts from the
    /// current pose so nothing jumps.
    pub fn retarget(&mut self, direction: Direction) {
        if direction != self.direction {
            self.from = self.pose();
            self.direction = direction;
            self.elapsed = 0.0;
        }
    }

    /// Advance by `dt` seconds. Returns `true` once the phase is complete.
    pub fn update(&mut self, dt: f32) -> bool {
        self.elapsed += dt.max(0.0);
        self.is_complete()
    }

    pub fn is_complete(&self) -> bool {
        self.elapsed >= self.spec.duration
    }

    /// Linear progress within the phase (0.0 to 1.0).
    pub fn progress(&self) -> f32 {
        if self.spec.duration <= 0.0 {
            1.0
        } else {
            (self.elapsed / self.spec.duration).clamp(0.0, 1.0)
        }
    }

    /// Pose of the mounted scene at this point of the phase.
    pub fn pose(&self) -> Pose {
        let t = self.spec.easing.apply(self.progress());
        match self.phase {
            TransitionPhase::Exiting => self.from.lerp(Pose::exit_to(self.direction), t),
            TransitionPhase::Entering => self.from.lerp(Pose::CENTER, t),
        }
    }

    pub fn is_exiting(&self) -> bool {
        self.phase == TransitionPhase::Exiting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn journey_curve_hits_end_points_and_is_monotone() {
        let ease = Easing::JOURNEY;
        assert_eq!(ease.apply(0.0), 0.0);
        assert_eq!(ease.apply(1.0), 1.0);

        let mut last = 0.0;
        for i in 1..=100 {
            let y = ease.apply(i as f32 / 100.0);
            assert!(y + 1e-4 >= last, "curve dipped at step {i}: {y} < {last}");
            last = y;
        }
        // Strong ease-out: most of the motion happens early.
        assert!(ease.apply(0.3) > 0.7);
    }

    #[test]
    fn linear_bezier_is_identity() {
        let ease = Easing::CubicBezier(0.25, 0.25, 0.75, 0.75);
        for i in 0..=10 {
            let t = i as f32 / 10.0;
            assert!((ease.apply(t) - t).abs() < 1e-3);
        }
    }

    #[test]
    fn poses_mirror_by_direction() {
        assert_eq!(Pose::enter_from(Direction::Forward).scale, 0.2);
        assert_eq!(Pose::exit_to(Direction::Forward).scale, 1.8);
        assert_eq!(Pose::enter_from(Direction::Backward).scale, 1.8);
        assert_eq!(Pose::exit_to(Direction::Backward).scale, 0.2);
    }

    #[test]
    fn enter_phase_settles_at_center() {
        let mut t = ActiveTransition::enter(TransitionSpec::default(), Direction::Forward);
        let start = t.pose();
        assert_eq!(start.opacity, 0.0);
        assert!((start.scale - 0.2).abs() < 1e-6);

        assert!(!t.update(0.6));
        assert!(t.update(0.7));
        let end = t.pose();
        assert!((end.scale - 1.0).abs() < 1e-5);
        assert!((end.opacity - 1.0).abs() < 1e-5);
    }

    #[test]
    fn exit_phase_ends_invisible() {
        let mut t = ActiveTransition::exit(TransitionSpec::new(1.0), Direction::Backward);
        assert_eq!(t.pose(), Pose::CENTER);
        t.update(1.0);
        let end = t.pose();
        assert!(end.opacity.abs() < 1e-6);
        assert!((end.scale - 0.2).abs() < 1e-6);
    }

    #[test]
    fn exit_from_midway_pose_is_continuous() {
        let mut enter = ActiveTransition::enter(TransitionSpec::new(1.0), Direction::Forward);
        enter.update(0.1);
        let midway = enter.pose();

        let mut exit =
            ActiveTransition::exit_from(TransitionSpec::new(1.0), Direction::Forward, midway);
        assert_eq!(exit.pose(), midway);
        exit.update(1.0);
        assert!(exit.pose().opacity.abs() < 1e-6);
        assert!((exit.pose().scale - 1.8).abs() < 1e-6);
    }

    #[test]
    fn retarget_restarts_from_current_pose() {
        let mut exit = ActiveTransition::exit(TransitionSpec::new(1.0), Direction::Forward);
        exit.update(0.2);
        let before = exit.pose();

        exit.retarget(Direction::Forward);
        assert_eq!(exit.elapsed, 0.2);

        exit.retarget(Direction::Backward);
        assert_eq!(exit.direction, Direction::Backward);
        assert_eq!(exit.elapsed, 0.0);
        assert_eq!(exit.pose(), before);
        exit.update(1.0);
        assert!((exit.pose().scale - 0.2).abs() < 1e-6);
    }

    #[test]
    fn instant_spec_completes_immediately() {
        let t = ActiveTransition::enter(TransitionSpec::instant(), Direction::Forward);
        assert!(t.is_complete());
        assert_eq!(t.progress(), 1.0);
    }
}
