//! The scene sequencer: single owner of "which scene is current".
//!
//! Navigation state changes immediately on every accepted intent. The
//! [`Stage`] catches up visually (exit, unmount, mount, enter) and the audio
//! collaborator is signalled without waiting for anything.

use glam::Vec2;
use winit::keyboard::KeyCode;

use super::navigation::{MuteIndicator, NavIntent, Navigate, NavigationBar};
use super::scene::SceneId;
use super::stage::Stage;
use super::transition::{Direction, Pose, TransitionSpec};
use crate::audio::AudioCollaborator;
use crate::canvas::{Canvas, Layer};
use crate::render::{RendererFactory, SceneAction, Viewport};

/// Current scene plus the direction of the move that got there.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NavigationState {
    pub current: SceneId,
    pub direction: Direction,
}

impl Default for NavigationState {
    fn default() -> Self {
        Self {
            current: SceneId::FIRST,
            direction: Direction::Forward,
        }
    }
}

impl NavigationState {
    /// One step forward, or `None` at the last scene.
    pub fn next(self) -> Option<Self> {
        self.current.next().map(|current| Self {
            current,
            direction: Direction::Forward,
        })
    }

    /// One step back, or `None` at the first scene.
    pub fn prev(self) -> Option<Self> {
        self.current.prev().map(|current| Self {
            current,
            direction: Direction::Backward,
        })
    }

    /// Back to the first scene, always moving backward.
    pub fn restarted(self) -> Self {
        Self {
            current: SceneId::FIRST,
            direction: Direction::Backward,
        }
    }
}

/// Arrow-key handler bound to one scene.
///
/// Replaced (never accumulated) on every scene change; `generation` counts
/// how many times that has happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyBinding {
    scene: SceneId,
    generation: u64,
}

impl KeyBinding {
    pub fn bind(scene: SceneId) -> Self {
        Self {
            scene,
            generation: 0,
        }
    }

    pub fn rebind(self, scene: SceneId) -> Self {
        Self {
            scene,
            generation: self.generation + 1,
        }
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn resolve(&self, key: KeyCode) -> Option<NavIntent> {
        match key {
            KeyCode::ArrowRight | KeyCode::ArrowDown => Some(NavIntent::Next),
            KeyCode::ArrowLeft | KeyCode::ArrowUp => Some(NavIntent::Prev),
            _ => None,
        }
    }
}

/// Drives the journey: navigation state, key binding, stage and audio.
pub struct SceneSequencer<A: AudioCollaborator> {
    state: NavigationState,
    binding: KeyBinding,
    audio: A,
    stage: Stage,
    nav: NavigationBar,
    mute: MuteIndicator,
    viewport: Viewport,
}

impl<A: AudioCollaborator> SceneSequencer<A> {
    /// Start at the first scene and ask for its sound.
    pub fn new(
        mut audio: A,
        factory: RendererFactory,
        viewport: Viewport,
        spec: TransitionSpec,
    ) -> Self {
        let state = NavigationState::default();
        let mut stage = Stage::new(factory, viewport, spec);
        stage.show(state.current, state.direction);
        audio.play_scene_sound(state.current);
        log::info!("[scene] starting at {}", state.current);

        Self {
            state,
            binding: KeyBinding::bind(state.current),
            audio,
            stage,
            nav: NavigationBar::for_scene(state.current, viewport),
            mute: MuteIndicator::new(viewport),
            viewport,
        }
    }

    fn change(&mut self, next: NavigationState) {
        let from = self.state.current;
        self.state = next;
        log::info!(
            "[scene] {} -> {} ({})",
            from.key(),
            next.current.key(),
            match next.direction {
                Direction::Forward => "forward",
                Direction::Backward => "backward",
            }
        );
        self.binding = self.binding.rebind(next.current);
        self.stage.show(next.current, next.direction);
        self.audio.play_scene_sound(next.current);
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn current(&self) -> SceneId {
        self.state.current
    }

    pub fn direction(&self) -> Direction {
        self.state.direction
    }

    pub fn binding(&self) -> KeyBinding {
        self.binding
    }

    pub fn audio(&self) -> &A {
        &self.audio
    }

    pub fn audio_mut(&mut self) -> &mut A {
        &mut self.audio
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn navigation_bar(&self) -> &NavigationBar {
        &self.nav
    }

    /// Handle a key press. Returns true if the key was consumed.
    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        if key == KeyCode::KeyM {
            self.toggle_mute();
            return true;
        }
        match self.binding.resolve(key) {
            Some(intent) => {
                self.dispatch(intent);
                true
            }
            None => false,
        }
    }

    /// Handle a click at `position`. Controls take priority over the scene;
    /// anything the scene wants done outside the app is returned.
    pub fn handle_click(&mut self, position: Vec2) -> Option<SceneAction> {
        if self.mute.contains(position) {
            self.toggle_mute();
            return None;
        }
        if let Some(intent) = self.nav.hit(position) {
            self.audio.play_click_sound();
            self.dispatch(intent);
            return None;
        }
        self.stage.pointer(position)
    }

    pub fn toggle_mute(&mut self) {
        self.audio.toggle_mute();
    }

    pub fn frame(&mut self, dt: f32) {
        self.stage.update(dt);
        // Controls belong to whatever is on stage, so they exit with it.
        if let Some(scene) = self.stage.current() {
            if scene != self.nav.scene() {
                self.nav = NavigationBar::for_scene(scene, self.viewport);
            }
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.stage.resize(viewport);
        self.nav = NavigationBar::for_scene(self.nav.scene(), viewport);
        self.mute = MuteIndicator::new(viewport);
    }

    /// Draw the scene and its controls into `canvas` and the mute indicator into `hud`.
    pub fn draw(&self, canvas: &mut Canvas, hud: &mut Layer) {
        self.stage.draw(canvas);
        self.nav.draw(canvas.overlay(), self.stage.scene_elapsed());
        self.mute.draw(hud, self.audio.is_muted());
    }

    pub fn pose(&self) -> Pose {
        self.stage.pose()
    }

    /// Unmount the active renderer. Returns the number of callbacks cancelled.
    pub fn shutdown(&mut self) -> usize {
        self.stage.shutdown()
    }
}

impl<A: AudioCollaborator> Navigate for SceneSequencer<A> {
    fn navigate_next(&mut self) {
        if let Some(next) = self.state.next() {
            self.change(next);
        }
    }

    fn navigate_prev(&mut self) {
        if let Some(prev) = self.state.prev() {
            self.change(prev);
        }
    }

    fn restart(&mut self) {
        self.change(self.state.restarted());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SEQUENCE;

    #[derive(Debug, Default)]
    struct FakeAudio {
        scenes: Vec<SceneId>,
        clicks: usize,
        muted: bool,
    }

    impl AudioCollaborator for FakeAudio {
        fn play_scene_sound(&mut self, scene: SceneId) {
            self.scenes.push(scene);
        }
        fn play_click_sound(&mut self) {
            self.clicks += 1;
        }
        fn toggle_mute(&mut self) {
            self.muted = !self.muted;
        }
        fn is_muted(&self) -> bool {
            self.muted
        }
    }

    fn sequencer() -> SceneSequencer<FakeAudio> {
        SceneSequencer::new(
            FakeAudio::default(),
            RendererFactory::journey(),
            Viewport::new(800.0, 600.0),
            TransitionSpec::new(0.2),
        )
    }

    fn settle(seq: &mut SceneSequencer<FakeAudio>) {
        for _ in 0..40 {
            seq.frame(1.0 / 60.0);
        }
    }

    #[test]
    fn starts_at_opening_moving_forward() {
        let seq = sequencer();
        assert_eq!(seq.state(), NavigationState::default());
        assert_eq!(seq.current(), SceneId::Opening);
        assert_eq!(seq.direction(), Direction::Forward);
        assert_eq!(seq.audio().scenes, vec![SceneId::Opening]);
    }

    #[test]
    fn full_journey_then_restart() {
        let mut seq = sequencer();
        seq.navigate_next();
        assert_eq!(seq.current(), SceneId::Earth);
        assert_eq!(seq.direction(), Direction::Forward);

        for _ in 0..4 {
            seq.navigate_next();
        }
        assert_eq!(seq.current(), SceneId::Final);

        seq.navigate_next();
        assert_eq!(seq.current(), SceneId::Final);

        seq.restart();
        assert_eq!(seq.current(), SceneId::Opening);
        assert_eq!(seq.direction(), Direction::Backward);
    }

    #[test]
    fn prev_at_opening_is_ignored() {
        let mut seq = sequencer();
        let before = seq.state();
        seq.navigate_prev();
        assert_eq!(seq.state(), before);
        assert_eq!(seq.binding().generation(), 0);
        assert_eq!(seq.audio().scenes.len(), 1);
    }

    #[test]
    fn restart_from_every_scene_goes_backward_to_opening() {
        for (i, _) in SEQUENCE.iter().enumerate() {
            let mut seq = sequencer();
            for _ in 0..i {
                seq.navigate_next();
            }
            seq.restart();
            assert_eq!(seq.current(), SceneId::Opening);
            assert_eq!(seq.direction(), Direction::Backward);
        }
    }

    #[test]
    fn direction_follows_every_move() {
        let mut seq = sequencer();
        let moves = [
            NavIntent::Next,
            NavIntent::Next,
            NavIntent::Prev,
            NavIntent::Next,
            NavIntent::Prev,
            NavIntent::Prev,
            NavIntent::Next,
        ];
        for intent in moves {
            seq.dispatch(intent);
            let expected = match intent {
                NavIntent::Next => Direction::Forward,
                NavIntent::Prev | NavIntent::Restart => Direction::Backward,
            };
            assert_eq!(seq.direction(), expected);
            assert!(SEQUENCE.contains(&seq.current()));
        }
    }

    #[test]
    fn each_change_rebinds_keys_and_signals_audio_once() {
        let mut seq = sequencer();
        seq.navigate_next();
        seq.navigate_next();
        seq.navigate_prev();
        seq.navigate_prev();
        seq.navigate_prev();

        assert_eq!(seq.binding().generation(), 4);
        assert_eq!(seq.binding().scene(), seq.current());
        assert_eq!(
            seq.audio().scenes,
            vec![
                SceneId::Opening,
                SceneId::Earth,
                SceneId::SolarSystem,
                SceneId::Earth,
                SceneId::Opening,
            ]
        );
    }

    #[test]
    fn arrow_keys_navigate() {
        let mut seq = sequencer();
        assert!(seq.handle_key(KeyCode::ArrowRight));
        assert!(seq.handle_key(KeyCode::ArrowDown));
        assert_eq!(seq.current(), SceneId::SolarSystem);
        assert!(seq.handle_key(KeyCode::ArrowUp));
        assert!(seq.handle_key(KeyCode::ArrowLeft));
        assert_eq!(seq.current(), SceneId::Opening);
        assert!(!seq.handle_key(KeyCode::Space));
    }

    #[test]
    fn m_key_and_indicator_toggle_mute() {
        let mut seq = sequencer();
        assert!(seq.handle_key(KeyCode::KeyM));
        assert!(seq.audio().is_muted());

        let indicator = MuteIndicator::new(Viewport::new(800.0, 600.0)).center();
        assert_eq!(seq.handle_click(indicator), None);
        assert!(!seq.audio().is_muted());
    }

    #[test]
    fn clicking_a_button_plays_click_then_navigates() {
        let mut seq = sequencer();
        settle(&mut seq);
        let arrow = seq.navigation_bar().buttons()[0].center;
        seq.handle_click(arrow);
        assert_eq!(seq.audio().clicks, 1);
        assert_eq!(seq.current(), SceneId::Earth);

        settle(&mut seq);
        assert_eq!(seq.navigation_bar().scene(), SceneId::Earth);
        let prev = seq.navigation_bar().buttons()[0];
        assert_eq!(prev.intent, NavIntent::Prev);
        seq.handle_click(prev.center);
        assert_eq!(seq.current(), SceneId::Opening);
        assert_eq!(seq.audio().clicks, 2);
    }

    #[test]
    fn stage_catches_up_with_rapid_navigation() {
        let mut seq = sequencer();
        seq.navigate_next();
        seq.navigate_next();
        seq.navigate_next();
        assert_eq!(seq.current(), SceneId::MilkyWay);
        settle(&mut seq);
        assert_eq!(seq.stage().current(), Some(SceneId::MilkyWay));
    }

    #[test]
    fn shutdown_leaves_no_callbacks() {
        let mut seq = sequencer();
        settle(&mut seq);
        seq.shutdown();
        assert_eq!(seq.stage().scheduler().pending(), 0);
    }
}
