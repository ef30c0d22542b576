//! On-screen navigation: prev/next/restart buttons and the mute indicator.
//!
//! Buttons carry no state of their own. Hitting one yields a [`NavIntent`],
//! and whether that intent is legal is decided by whoever implements
//! [`Navigate`].

use glam::Vec2;
use std::f32::consts::PI;

use super::scene::SceneId;
use super::transition::Easing;
use crate::canvas::Layer;
use crate::render::Viewport;
use crate::render::timeline::ramp;
use crate::ui::{Color, Rect};

/// What a navigation control asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavIntent {
    Next,
    Prev,
    Restart,
}

/// Receiver of navigation intents.
pub trait Navigate {
    fn navigate_next(&mut self);
    fn navigate_prev(&mut self);
    fn restart(&mut self);

    fn dispatch(&mut self, intent: NavIntent) {
        match intent {
            NavIntent::Next => self.navigate_next(),
            NavIntent::Prev => self.navigate_prev(),
            NavIntent::Restart => self.restart(),
        }
    }
}

/// Diameter of a round navigation button.
pub const BUTTON_SIZE: f32 = 48.0;
/// Horizontal gap between buttons.
pub const BUTTON_GAP: f32 = 40.0;
/// Distance from the bottom edge to the bottom of the buttons.
pub const BOTTOM_MARGIN: f32 = 40.0;

/// The opening arrow fades in after this many seconds.
const ARROW_DELAY: f32 = 1.0;
const ARROW_SIZE: f32 = 48.0;
/// Bounce period of the opening arrow.
const BOUNCE_PERIOD: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonStyle {
    /// White translucent disc with an icon.
    Round,
    /// Bare bouncing down-arrow below the opening title.
    BouncingArrow,
}

/// One clickable control.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NavButton {
    pub intent: NavIntent,
    pub center: Vec2,
    pub radius: f32,
    pub style: ButtonStyle,
}

impl NavButton {
    pub fn contains(&self, point: Vec2) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    /// Draw at `time` seconds after the scene mounted.
    pub fn draw(&self, layer: &mut Layer, time: f32) {
        match self.style {
            ButtonStyle::Round => {
                layer.fill_circle(self.center, self.radius, Color::WHITE.with_alpha(0.2));
                let icon = Icon::new(self.center, 1.0);
                match self.intent {
                    NavIntent::Prev => {
                        icon.stroke(layer, &[(19.0, 12.0), (5.0, 12.0)]);
                        icon.stroke(layer, &[(12.0, 19.0), (5.0, 12.0), (12.0, 5.0)]);
                    }
                    NavIntent::Next => {
                        icon.stroke(layer, &[(5.0, 12.0), (19.0, 12.0)]);
                        icon.stroke(layer, &[(12.0, 5.0), (19.0, 12.0), (12.0, 19.0)]);
                    }
                    NavIntent::Restart => icon.restart(layer),
                }
            }
            ButtonStyle::BouncingArrow => {
                let appear = Easing::EaseOut.apply(ramp(time, ARROW_DELAY, 1.0));
                if appear <= 0.0 {
                    return;
                }
                let bounce = ((time / BOUNCE_PERIOD) * PI).sin().abs() * ARROW_SIZE * 0.25;
                let slide = (1.0 - appear) * -10.0;
                let center = self.center + Vec2::new(0.0, slide - bounce);
                let icon = Icon::new(center, ARROW_SIZE / 24.0).alpha(appear);
                icon.stroke(layer, &[(12.0, 5.0), (12.0, 19.0)]);
                icon.stroke(layer, &[(5.0, 12.0), (12.0, 19.0), (19.0, 12.0)]);
            }
        }
    }
}

/// Stroked line icon on a 24x24 grid centered on a point.
#[derive(Clone, Copy, Debug)]
struct Icon {
    center: Vec2,
    scale: f32,
    color: Color,
}

impl Icon {
    fn new(center: Vec2, scale: f32) -> Self {
        Self {
            center,
            scale,
            color: Color::WHITE,
        }
    }

    fn alpha(mut self, alpha: f32) -> Self {
        self.color = self.color.with_alpha(alpha);
        self
    }

    fn point(&self, x: f32, y: f32) -> Vec2 {
        self.center + (Vec2::new(x, y) - Vec2::splat(12.0)) * self.scale
    }

    fn polyline(&self, layer: &mut Layer, points: &[Vec2]) {
        let width = 3.0 * self.scale;
        for pair in points.windows(2) {
            layer.line(pair[0], pair[1], width, self.color);
        }
        // Round joins and caps.
        for p in points {
            layer.fill_circle(*p, width / 2.0, self.color);
        }
    }

    fn stroke(&self, layer: &mut Layer, points: &[(f32, f32)]) {
        let points: Vec<Vec2> = points.iter().map(|&(x, y)| self.point(x, y)).collect();
        self.polyline(layer, &points);
    }

    /// Counter-clockwise arrow: most of a circle ending in an arrowhead at the top left.
    fn restart(&self, layer: &mut Layer) {
        let start = PI;
        let end = -0.75 * PI;
        let steps = 20;
        let arc: Vec<Vec2> = (0..=steps)
            .map(|i| {
                let a = start + (end - start) * i as f32 / steps as f32;
                self.point(12.0 + 9.0 * a.cos(), 12.0 + 9.0 * a.sin())
            })
            .collect();
        self.polyline(layer, &arc);
        self.stroke(layer, &[(3.0, 3.0), (3.0, 8.0), (8.0, 8.0)]);
    }
}

/// The buttons shown for one scene.
#[derive(Clone, Debug, PartialEq)]
pub struct NavigationBar {
    scene: SceneId,
    buttons: Vec<NavButton>,
}

impl NavigationBar {
    /// Opening gets a single forward arrow, the final scene swaps next for
    /// restart, and every scene in between gets prev and next.
    pub fn for_scene(scene: SceneId, viewport: Viewport) -> Self {
        let buttons = if scene.is_first() {
            vec![NavButton {
                intent: NavIntent::Next,
                center: viewport.center() + Vec2::new(0.0, 110.0),
                radius: ARROW_SIZE / 2.0,
                style: ButtonStyle::BouncingArrow,
            }]
        } else {
            let forward = if scene.is_last() {
                NavIntent::Restart
            } else {
                NavIntent::Next
            };
            Self::row(&[NavIntent::Prev, forward], viewport)
        };
        Self { scene, buttons }
    }

    fn row(intents: &[NavIntent], viewport: Viewport) -> Vec<NavButton> {
        let count = intents.len() as f32;
        let total = count * BUTTON_SIZE + (count - 1.0).max(0.0) * BUTTON_GAP;
        let left = viewport.width / 2.0 - total / 2.0;
        let y = viewport.height - BOTTOM_MARGIN - BUTTON_SIZE / 2.0;
        intents
            .iter()
            .enumerate()
            .map(|(i, &intent)| NavButton {
                intent,
                center: Vec2::new(
                    left + BUTTON_SIZE / 2.0 + i as f32 * (BUTTON_SIZE + BUTTON_GAP),
                    y,
                ),
                radius: BUTTON_SIZE / 2.0,
                style: ButtonStyle::Round,
            })
            .collect()
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn buttons(&self) -> &[NavButton] {
        &self.buttons
    }

    /// Intent of the button under `point`, if any.
    pub fn hit(&self, point: Vec2) -> Option<NavIntent> {
        self.buttons
            .iter()
            .find(|b| b.contains(point))
            .map(|b| b.intent)
    }

    pub fn draw(&self, layer: &mut Layer, time: f32) {
        for button in &self.buttons {
            button.draw(layer, time);
        }
    }
}

// ============================================================================
// Mute indicator
// ============================================================================

const MUTE_RADIUS: f32 = 20.0;
const MUTE_INSET: f32 = 16.0;

/// Round toggle in the top-right corner showing whether sound is on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MuteIndicator {
    center: Vec2,
}

impl MuteIndicator {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            center: Vec2::new(
                viewport.width - MUTE_INSET - MUTE_RADIUS,
                MUTE_INSET + MUTE_RADIUS,
            ),
        }
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.distance_squared(self.center) <= MUTE_RADIUS * MUTE_RADIUS
    }

    pub fn draw(&self, layer: &mut Layer, muted: bool) {
        layer.fill_circle(self.center, MUTE_RADIUS, Color::BLACK.with_alpha(0.5));
        let icon = Icon::new(self.center, 0.75);
        let width = 2.0 * icon.scale;

        // Headphones: band over the top, cups on both sides.
        let band: Vec<Vec2> = (0..=16)
            .map(|i| {
                let a = PI + PI * i as f32 / 16.0;
                icon.point(12.0 + 9.0 * a.cos(), 12.0 + 9.0 * a.sin())
            })
            .collect();
        for pair in band.windows(2) {
            layer.line(pair[0], pair[1], width, icon.color);
        }
        for x in [3.0, 16.0] {
            let min = icon.point(x, 14.0);
            let max = icon.point(x + 5.0, 21.0);
            layer.fill_rect(
                Rect::new(min.x, min.y, max.x - min.x, max.y - min.y),
                icon.color,
            );
        }
        if muted {
            layer.line(icon.point(1.0, 1.0), icon.point(23.0, 23.0), width * 1.5, icon.color);
        } else {
            // Small sound wave above the band.
            let wave = icon.point(12.0, 0.0);
            layer.fill_circle(wave, width, icon.color.with_alpha(0.6));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SEQUENCE;

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    #[derive(Default)]
    struct Recorder(Vec<NavIntent>);

    impl Navigate for Recorder {
        fn navigate_next(&mut self) {
            self.0.push(NavIntent::Next);
        }
        fn navigate_prev(&mut self) {
            self.0.push(NavIntent::Prev);
        }
        fn restart(&mut self) {
            self.0.push(NavIntent::Restart);
        }
    }

    #[test]
    fn button_sets_follow_position_in_journey() {
        for scene in SEQUENCE {
            let bar = NavigationBar::for_scene(scene, viewport());
            let intents: Vec<NavIntent> = bar.buttons().iter().map(|b| b.intent).collect();
            let expected = match scene {
                SceneId::Opening => vec![NavIntent::Next],
                SceneId::Final => vec![NavIntent::Prev, NavIntent::Restart],
                _ => vec![NavIntent::Prev, NavIntent::Next],
            };
            assert_eq!(intents, expected, "{scene}");
        }
    }

    #[test]
    fn row_is_centered_above_bottom_edge() {
        let bar = NavigationBar::for_scene(SceneId::Earth, viewport());
        let [prev, next] = bar.buttons() else {
            panic!("expected two buttons");
        };
        assert_eq!(prev.center.y, 600.0 - 40.0 - 24.0);
        assert_eq!(next.center.x - prev.center.x, BUTTON_SIZE + BUTTON_GAP);
        assert!(((prev.center.x + next.center.x) / 2.0 - 400.0).abs() < 1e-4);
    }

    #[test]
    fn hit_testing_is_circular() {
        let bar = NavigationBar::for_scene(SceneId::Final, viewport());
        let restart = bar.buttons()[1];
        assert_eq!(bar.hit(restart.center), Some(NavIntent::Restart));
        assert_eq!(
            bar.hit(restart.center + Vec2::new(23.0, 0.0)),
            Some(NavIntent::Restart)
        );
        // Inside the bounding square but outside the circle.
        assert_eq!(bar.hit(restart.center + Vec2::new(20.0, 20.0)), None);
        assert_eq!(bar.hit(Vec2::ZERO), None);
    }

    #[test]
    fn dispatch_routes_each_intent() {
        let mut recorder = Recorder::default();
        for intent in [NavIntent::Next, NavIntent::Restart, NavIntent::Prev] {
            recorder.dispatch(intent);
        }
        assert_eq!(
            recorder.0,
            vec![NavIntent::Next, NavIntent::Restart, NavIntent::Prev]
        );
    }

    #[test]
    fn opening_arrow_waits_before_appearing() {
        let bar = NavigationBar::for_scene(SceneId::Opening, viewport());
        let mut layer = Layer::new();
        bar.draw(&mut layer, 0.5);
        assert!(layer.is_empty());
        bar.draw(&mut layer, 1.5);
        assert!(!layer.is_empty());
    }

    #[test]
    fn mute_indicator_sits_top_right() {
        let mute = MuteIndicator::new(viewport());
        assert!(mute.contains(Vec2::new(764.0, 36.0)));
        assert!(!mute.contains(Vec2::new(400.0, 36.0)));

        let mut on = Layer::new();
        let mut off = Layer::new();
        mute.draw(&mut on, false);
        mute.draw(&mut off, true);
        assert!(on.vertex_count() > 0 && off.vertex_count() > 0);
    }
}
