//! Scene stage: owns the mounted renderer and runs wait-mode transitions.
//!
//! Only one renderer is ever mounted. A scene change first plays the exit
//! phase on the outgoing renderer, unmounts it (cancelling every callback it
//! registered), then mounts the incoming renderer and plays its enter phase.

use glam::Vec2;

use super::scene::SceneId;
use super::transition::{ActiveTransition, Direction, Pose, TransitionPhase, TransitionSpec};
use crate::canvas::Canvas;
use crate::render::{FrameScheduler, MountedScene, RendererFactory, SceneAction, Viewport};

/// Mounts one scene renderer at a time and animates between them.
pub struct Stage {
    factory: RendererFactory,
    scheduler: FrameScheduler,
    viewport: Viewport,
    spec: TransitionSpec,
    mounted: Option<MountedScene>,
    transition: Option<ActiveTransition>,
    /// Scene to mount once the running exit completes.
    pending: Option<(SceneId, Direction)>,
    mounts: u64,
}

impl Stage {
    pub fn new(factory: RendererFactory, viewport: Viewport, spec: TransitionSpec) -> Self {
        Self {
            factory,
            scheduler: FrameScheduler::new(),
            viewport,
            spec,
            mounted: None,
            transition: None,
            pending: None,
            mounts: 0,
        }
    }

    /// Bring `scene` on stage, moving in `direction`.
    ///
    /// With nothing mounted the scene enters straight away. Otherwise the
    /// mounted scene exits first; a request arriving during that exit replaces
    /// the pending scene, and a request during an enter turns it into an exit.
    pub fn show(&mut self, scene: SceneId, direction: Direction) {
        if self.mounted.is_none() {
            self.mount(scene, direction);
            return;
        }

        self.pending = Some((scene, direction));
        let from = match &mut self.transition {
            Some(transition) if transition.is_exiting() => {
                log::debug!("[stage] retargeting pending scene to {scene}");
                transition.retarget(direction);
                return;
            }
            Some(transition) => transition.pose(),
            None => Pose::CENTER,
        };
        self.transition = Some(ActiveTransition::exit_from(self.spec, direction, from));
    }

    fn mount(&mut self, scene: SceneId, direction: Direction) {
        let Some(renderer) = self.factory.create(scene) else {
            log::warn!("[stage] no renderer registered for {scene}");
            self.transition = None;
            return;
        };
        self.mounted = Some(MountedScene::mount(
            scene,
            renderer,
            self.viewport,
            &mut self.scheduler,
        ));
        self.mounts += 1;
        self.transition = Some(ActiveTransition::enter(self.spec, direction));
    }

    fn unmount(&mut self) -> usize {
        match self.mounted.take() {
            Some(mounted) => mounted.unmount(&mut self.scheduler),
            None => 0,
        }
    }

    /// Advance transitions, timers and the mounted renderer by `dt` seconds.
    pub fn update(&mut self, dt: f32) {
        if let Some(transition) = &mut self.transition {
            if transition.update(dt) {
                match transition.phase {
                    TransitionPhase::Exiting => {
                        self.transition = None;
                        self.unmount();
                        if let Some((scene, direction)) = self.pending.take() {
                            self.mount(scene, direction);
                        }
                    }
                    TransitionPhase::Entering => {
                        self.transition = None;
                    }
                }
            }
        }

        let fired = self.scheduler.advance(dt);
        let Some(mounted) = &mut self.mounted else {
            return;
        };
        mounted.frame(dt, &mut self.scheduler);
        for (owner, id) in fired {
            if owner == mounted.owner() {
                mounted.fire(id);
            }
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if let Some(mounted) = &self.mounted {
            mounted.draw(canvas);
        }
    }

    /// Pose of the mounted scene for compositing.
    pub fn pose(&self) -> Pose {
        match &self.transition {
            Some(transition) => transition.pose(),
            None => Pose::CENTER,
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        if let Some(mounted) = &mut self.mounted {
            mounted.resize(viewport, &mut self.scheduler);
        }
    }

    /// Forward a click to the mounted renderer. Ignored while it exits.
    pub fn pointer(&mut self, position: Vec2) -> Option<SceneAction> {
        if self.is_exiting() {
            return None;
        }
        self.mounted.as_mut()?.pointer(position)
    }

    /// Unmount whatever is on stage and drop any pending scene.
    pub fn shutdown(&mut self) -> usize {
        self.pending = None;
        self.transition = None;
        self.unmount()
    }

    /// Scene whose renderer is currently mounted.
    pub fn current(&self) -> Option<SceneId> {
        self.mounted.as_ref().map(MountedScene::scene)
    }

    pub fn pending(&self) -> Option<SceneId> {
        self.pending.map(|(scene, _)| scene)
    }

    pub fn phase(&self) -> Option<TransitionPhase> {
        self.transition.map(|t| t.phase)
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_some()
    }

    pub fn is_exiting(&self) -> bool {
        self.transition.is_some_and(|t| t.is_exiting())
    }

    /// Seconds the mounted renderer has been animating.
    pub fn scene_elapsed(&self) -> f32 {
        self.mounted.as_ref().map_or(0.0, MountedScene::elapsed)
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn scheduler(&self) -> &FrameScheduler {
        &self.scheduler
    }

    pub fn mounted(&self) -> Option<&MountedScene> {
        self.mounted.as_ref()
    }

    /// Total renderers mounted over the stage's lifetime.
    pub fn mounts(&self) -> u64 {
        self.mounts
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STEP: f32 = 1.0 / 60.0;

    fn stage() -> Stage {
        Stage::new(
            RendererFactory::journey(),
            Viewport::new(800.0, 600.0),
            TransitionSpec::new(0.5),
        )
    }

    fn run(stage: &mut Stage, seconds: f32) {
        let frames = (seconds / STEP).ceil() as usize;
        for _ in 0..frames {
            stage.update(STEP);
        }
    }

    #[test]
    fn first_scene_enters_then_settles() {
        let mut stage = stage();
        stage.show(SceneId::Opening, Direction::Forward);
        assert_eq!(stage.current(), Some(SceneId::Opening));
        assert_eq!(stage.phase(), Some(TransitionPhase::Entering));
        assert_eq!(stage.pose().opacity, 0.0);

        run(&mut stage, 0.6);
        assert!(!stage.is_transitioning());
        assert_eq!(stage.pose(), Pose::CENTER);
    }

    #[test]
    fn exit_finishes_before_next_scene_mounts() {
        let mut stage = stage();
        stage.show(SceneId::Opening, Direction::Forward);
        run(&mut stage, 0.6);

        stage.show(SceneId::Earth, Direction::Forward);
        assert!(stage.is_exiting());
        assert_eq!(stage.current(), Some(SceneId::Opening));
        assert_eq!(stage.pending(), Some(SceneId::Earth));

        run(&mut stage, 0.25);
        assert_eq!(stage.current(), Some(SceneId::Opening));

        run(&mut stage, 0.3);
        assert_eq!(stage.current(), Some(SceneId::Earth));
        assert_eq!(stage.phase(), Some(TransitionPhase::Entering));
        assert_eq!(stage.mounts(), 2);
    }

    #[test]
    fn old_callbacks_are_cancelled_before_new_ones_register() {
        let mut stage = stage();
        stage.show(SceneId::Opening, Direction::Forward);
        run(&mut stage, 0.6);
        let opening = stage.mounted().map(MountedScene::owner);
        assert!(stage.scheduler().pending() > 0);

        stage.show(SceneId::Earth, Direction::Forward);
        run(&mut stage, 0.6);

        let earth = stage.mounted().map(MountedScene::owner);
        assert_ne!(opening, earth);
        let opening = opening.unwrap();
        assert_eq!(stage.scheduler().pending_for(opening), 0);
        // Everything still pending belongs to the one mounted renderer.
        assert_eq!(
            stage.scheduler().pending(),
            stage.scheduler().pending_for(earth.unwrap())
        );
    }

    #[test]
    fn latest_request_wins_during_exit() {
        let mut stage = stage();
        stage.show(SceneId::Earth, Direction::Forward);
        run(&mut stage, 0.6);

        stage.show(SceneId::SolarSystem, Direction::Forward);
        run(&mut stage, 0.1);
        stage.show(SceneId::Opening, Direction::Backward);
        assert_eq!(stage.pending(), Some(SceneId::Opening));

        run(&mut stage, 0.6);
        assert_eq!(stage.current(), Some(SceneId::Opening));
        assert_eq!(stage.mounts(), 2);
    }

    #[test]
    fn request_during_enter_starts_exit() {
        let mut stage = stage();
        stage.show(SceneId::Opening, Direction::Forward);
        run(&mut stage, 0.1);
        assert_eq!(stage.phase(), Some(TransitionPhase::Entering));

        stage.show(SceneId::Earth, Direction::Forward);
        assert!(stage.is_exiting());
        run(&mut stage, 0.6);
        assert_eq!(stage.current(), Some(SceneId::Earth));
    }

    #[test]
    fn exit_starts_from_the_current_entrance_pose() {
        let mut stage = stage();
        stage.show(SceneId::Opening, Direction::Forward);
        stage.update(STEP);
        stage.update(STEP);
        let before = stage.pose();
        assert!(before.opacity < 1.0);

        stage.show(SceneId::Earth, Direction::Forward);
        let after = stage.pose();
        assert!((after.scale - before.scale).abs() < 1e-5);
        assert!((after.opacity - before.opacity).abs() < 1e-5);

        stage.update(STEP);
        assert!(stage.pose().opacity <= before.opacity);
    }

    #[test]
    fn retargeted_exit_follows_latest_direction() {
        let mut stage = stage();
        stage.show(SceneId::Earth, Direction::Forward);
        run(&mut stage, 0.6);
        stage.show(SceneId::SolarSystem, Direction::Forward);
        run(&mut stage, 0.1);
        let before = stage.pose();
        assert!(before.scale > 1.0);

        stage.show(SceneId::Opening, Direction::Backward);
        let after = stage.pose();
        assert!((after.scale - before.scale).abs() < 1e-5);
        assert!((after.opacity - before.opacity).abs() < 1e-5);

        run(&mut stage, 0.3);
        assert!(stage.is_exiting());
        assert!(stage.pose().scale < before.scale);
        assert!(stage.pose().scale < 1.0);
    }

    #[test]
    fn exactly_one_renderer_is_mounted_throughout() {
        let mut stage = stage();
        stage.show(SceneId::Opening, Direction::Forward);
        for scene in [SceneId::Earth, SceneId::SolarSystem, SceneId::MilkyWay] {
            stage.show(scene, Direction::Forward);
            for _ in 0..80 {
                stage.update(STEP);
                assert!(stage.current().is_some());
            }
        }
        assert_eq!(stage.current(), Some(SceneId::MilkyWay));
    }

    #[test]
    fn backward_exit_shrinks_away() {
        let mut stage = stage();
        stage.show(SceneId::Earth, Direction::Forward);
        run(&mut stage, 0.6);
        stage.show(SceneId::Opening, Direction::Backward);
        run(&mut stage, 0.25);
        let pose = stage.pose();
        assert!(pose.scale < 1.0);
        assert!(pose.opacity < 1.0);
    }

    #[test]
    fn shutdown_cancels_everything() {
        let mut stage = stage();
        stage.show(SceneId::Universe, Direction::Forward);
        run(&mut stage, 0.2);
        assert!(stage.scheduler().pending() > 0);

        stage.shutdown();
        assert_eq!(stage.current(), None);
        assert_eq!(stage.scheduler().pending(), 0);
        assert_eq!(
            stage.scheduler().registered(),
            stage.scheduler().cancelled() + stage.scheduler().completed()
        );
    }

    #[test]
    fn resize_reaches_mounted_surface() {
        let mut stage = stage();
        stage.show(SceneId::MilkyWay, Direction::Forward);
        stage.resize(Viewport::new(1024.0, 768.0));
        let surface = stage.mounted().map(MountedScene::surface);
        assert_eq!(surface.map(|s| s.width()), Some(1024.0));
        assert_eq!(surface.map(|s| s.height()), Some(768.0));
    }
}
