//! Title screen: a warp starfield with occasional shooting stars.

use glam::Vec2;
use rand::Rng;
use rand::rngs::ThreadRng;

use crate::canvas::Canvas;
use crate::scene::SceneId;
use crate::ui::{Color, TextRun, TextStyle};

use super::particles::{Particle, ParticleShape, ParticleSystem};
use super::starfield::DepthStarfield;
use super::timeline::ramp;
use super::{CallbackId, FrameContext, MountContext, SceneRenderer, Viewport};

const STAR_COUNT: usize = 400;
const STAR_DEPTH: f32 = 1000.0;
const WARP_SPEED: f32 = 120.0;
const SHOOTING_STAR_PERIOD: f32 = 2.5;

pub struct OpeningRenderer {
    viewport: Viewport,
    stars: Option<DepthStarfield>,
    shooting_stars: ParticleSystem,
    shooting_timer: Option<CallbackId>,
    elapsed: f32,
    frames: u64,
    rng: ThreadRng,
}

impl OpeningRenderer {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(0.0, 0.0),
            stars: None,
            shooting_stars: ParticleSystem::new(16),
            shooting_timer: None,
            elapsed: 0.0,
            frames: 0,
            rng: rand::rng(),
        }
    }

    fn spawn_shooting_star(&mut self) {
        let Viewport { width, height } = self.viewport;
        let start = Vec2::new(
            self.rng.random_range(0.0..width * 0.7 + 1.0),
            self.rng.random_range(0.0..height * 0.4 + 1.0),
        );
        let speed = self.rng.random_range(500.0..800.0);
        let velocity = Vec2::new(1.0, self.rng.random_range(0.3..0.6)).normalize() * speed;
        self.shooting_stars.spawn(
            Particle::new(
                ParticleShape::Streak,
                start,
                velocity,
                self.rng.random_range(0.8..1.4),
            )
            .size(self.rng.random_range(80.0..160.0)),
        );
    }
}

impl Default for OpeningRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer for OpeningRenderer {
    fn mount(&mut self, ctx: &mut MountContext<'_>) {
        self.viewport = ctx.viewport();
        self.stars = Some(DepthStarfield::new(
            STAR_COUNT,
            self.viewport,
            STAR_DEPTH,
            WARP_SPEED,
        ));
        self.shooting_timer = Some(ctx.every(SHOOTING_STAR_PERIOD));
        self.elapsed = 0.0;
        self.frames = 0;
    }

    fn resize(&mut self, viewport: Viewport) {
        self.shooting_stars.rescale(self.viewport, viewport);
        if let Some(stars) = &mut self.stars {
            stars.resize(viewport);
        }
        self.viewport = viewport;
    }

    fn update(&mut self, frame: &FrameContext) {
        self.elapsed = frame.elapsed;
        self.frames += 1;
        if let Some(stars) = &mut self.stars {
            stars.update(frame.dt);
        }
        self.shooting_stars.update(frame.dt);
    }

    fn on_timer(&mut self, timer: CallbackId) {
        if self.shooting_timer == Some(timer) {
            self.spawn_shooting_star();
        }
    }

    fn draw(&self, canvas: &mut Canvas) {
        if self.frames <= 1 {
            canvas.clear(Color::BLACK);
        } else {
            canvas.fade(Color::BLACK.with_alpha(0.25));
        }

        let layer = canvas.effects();
        if let Some(stars) = &self.stars {
            stars.draw(layer, Color::WHITE, true);
        }
        self.shooting_stars.draw(layer);

        let center = canvas.center();
        let radius = canvas.width().min(canvas.height()) * 0.45;
        let opacity = ramp(self.elapsed, 0.0, 2.0);
        canvas.overlay().glow(
            center,
            radius,
            Color::rgba(0.35, 0.25, 0.6, 0.25 * opacity),
            Color::TRANSPARENT,
        );
        canvas.text(
            TextRun::new(
                SceneId::Opening.caption().title,
                center.x,
                center.y - TextStyle::Title.pixel_size(),
                TextStyle::Title,
            )
            .color(Color::WHITE.fade(opacity))
            .centered(),
        );
    }

    fn unmount(&mut self) {
        self.stars = None;
        self.shooting_stars.clear();
        self.shooting_timer = None;
    }

    fn entity_count(&self) -> usize {
        self.stars.as_ref().map_or(0, DepthStarfield::len) + self.shooting_stars.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::LoadAction;
    use crate::render::{FrameScheduler, MountedScene};

    #[test]
    fn shooting_stars_follow_the_interval() {
        let mut scheduler = FrameScheduler::new();
        let mut mounted = MountedScene::mount(
            SceneId::Opening,
            Box::new(OpeningRenderer::new()),
            Viewport::new(800.0, 600.0),
            &mut scheduler,
        );
        assert_eq!(mounted.entity_count(), STAR_COUNT);

        for _ in 0..160 {
            mounted.frame(1.0 / 60.0, &mut scheduler);
            for (_, id) in scheduler.advance(1.0 / 60.0) {
                mounted.fire(id);
            }
        }
        // One streak spawned at 2.5s, still alive shortly after.
        assert_eq!(mounted.entity_count(), STAR_COUNT + 1);
        mounted.unmount(&mut scheduler);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn first_frame_clears_then_trails() {
        let mut scheduler = FrameScheduler::new();
        let mut mounted = MountedScene::mount(
            SceneId::Opening,
            Box::new(OpeningRenderer::new()),
            Viewport::new(640.0, 480.0),
            &mut scheduler,
        );

        let mut canvas = Canvas::new(640.0, 480.0);
        mounted.frame(0.016, &mut scheduler);
        mounted.draw(&mut canvas);
        assert_eq!(canvas.load_action(), LoadAction::Clear(Color::BLACK));

        canvas.begin(640.0, 480.0);
        mounted.frame(0.016, &mut scheduler);
        mounted.draw(&mut canvas);
        assert_eq!(canvas.load_action(), LoadAction::Load);
        assert!(!canvas.effects_layer().is_empty());
    }
}
