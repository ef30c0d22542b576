//! The galaxy: a thousand drifting stars over a glowing spiral core.

use glam::Vec2;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::f32::consts::PI;

use crate::canvas::{Canvas, GradientStop};
use crate::scene::SceneId;
use crate::ui::Color;

use super::{
    FrameContext, MountContext, SceneRenderer, Viewport, caption_entrance, draw_caption,
};

const STAR_COUNT: usize = 1000;
const CORE_STAR_COUNT: usize = 360;
/// Pixels per second.
const MAX_DRIFT: f32 = 3.0;
/// Radians per second.
const SPIRAL_RATE: f32 = 0.05;
const SPIRAL_TURNS: f32 = 3.5;
const CAPTION_DELAY: f32 = 0.5;

#[derive(Clone, Copy, Debug)]
struct DriftStar {
    position: Vec2,
    radius: f32,
    speed: f32,
    brightness: f32,
}

/// A star in one of the two spiral arms, in polar form around the core.
#[derive(Clone, Copy, Debug)]
struct ArmStar {
    arm: u8,
    /// 0 at the core, 1 at the arm tip.
    along: f32,
    jitter: Vec2,
    radius: f32,
}

fn background_stops() -> [GradientStop; 3] {
    [
        GradientStop::new(0.0, Color::rgba8(75, 0, 130, 0.8)),
        GradientStop::new(0.5, Color::rgba8(25, 0, 60, 0.6)),
        GradientStop::new(1.0, Color::rgba8(0, 0, 20, 0.4)),
    ]
}

pub struct MilkyWayRenderer {
    viewport: Viewport,
    stars: Vec<DriftStar>,
    arms: Vec<ArmStar>,
    rotation: f32,
    elapsed: f32,
    rng: ThreadRng,
}

impl MilkyWayRenderer {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(0.0, 0.0),
            stars: Vec::new(),
            arms: Vec::new(),
            rotation: 0.0,
            elapsed: 0.0,
            rng: rand::rng(),
        }
    }

    fn arm_position(&self, star: &ArmStar) -> Vec2 {
        let reach = self.viewport.min_side() * 0.38;
        let angle = star.arm as f32 * PI + star.along * SPIRAL_TURNS + self.rotation;
        let r = star.along * reach;
        // Flattened to look like a tilted disc.
        self.viewport.center() + Vec2::new(angle.cos() * r, angle.sin() * r * 0.55) + star.jitter * reach
    }
}

impl Default for MilkyWayRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer for MilkyWayRenderer {
    fn mount(&mut self, ctx: &mut MountContext<'_>) {
        self.viewport = ctx.viewport();
        let Viewport { width, height } = self.viewport;
        self.stars = (0..STAR_COUNT)
            .map(|_| DriftStar {
                position: Vec2::new(
                    self.rng.random::<f32>() * width,
                    self.rng.random::<f32>() * height,
                ),
                radius: self.rng.random::<f32>() * 1.5,
                speed: self.rng.random::<f32>() * MAX_DRIFT,
                brightness: self.rng.random::<f32>(),
            })
            .collect();

        self.arms = (0..CORE_STAR_COUNT)
            .map(|i| {
                let along: f32 = self.rng.random::<f32>().powf(0.7);
                let spread = 0.02 + 0.08 * along;
                ArmStar {
                    arm: (i % 2) as u8,
                    along,
                    jitter: Vec2::new(
                        self.rng.random_range(-spread..spread),
                        self.rng.random_range(-spread..spread),
                    ),
                    radius: self.rng.random_range(0.4..1.8),
                }
            })
            .collect();
        self.rotation = 0.0;
        self.elapsed = 0.0;
    }

    fn resize(&mut self, viewport: Viewport) {
        for star in &mut self.stars {
            star.position = self.viewport.rescale(star.position, viewport);
        }
        self.viewport = viewport;
    }

    fn update(&mut self, frame: &FrameContext) {
        self.elapsed = frame.elapsed;
        self.rotation += SPIRAL_RATE * frame.dt;
        let width = self.viewport.width;
        for star in &mut self.stars {
            star.position.x += star.speed * frame.dt;
            if star.position.x > width {
                star.position.x = 0.0;
            }
        }
    }

    fn draw(&self, canvas: &mut Canvas) {
        canvas.clear(Color::BLACK);
        let bounds = canvas.bounds();
        let center = canvas.center();
        let stops = background_stops();

        let layer = canvas.effects();
        layer.fill_rect(bounds, stops[2].color);
        layer.radial_gradient(center, bounds.width / 2.0, &stops);

        layer.glow(
            center,
            self.viewport.min_side() * 0.12,
            Color::rgba(1.0, 0.93, 0.8, 0.55),
            Color::TRANSPARENT,
        );
        let warm = Color::rgb(1.0, 0.95, 0.82);
        let lavender = Color::rgb(0.77, 0.71, 0.99);
        for star in &self.arms {
            let color = warm.lerp(lavender, star.along).with_alpha(0.3 + 0.5 * (1.0 - star.along));
            layer.fill_circle(self.arm_position(star), star.radius, color);
        }

        for star in &self.stars {
            layer.fill_circle(
                star.position,
                star.radius,
                Color::WHITE.with_alpha(star.brightness),
            );
        }

        let (opacity, rise) = caption_entrance(self.elapsed, CAPTION_DELAY);
        draw_caption(canvas, SceneId::MilkyWay.caption(), opacity, rise);
    }

    fn unmount(&mut self) {
        self.stars.clear();
        self.arms.clear();
    }

    fn entity_count(&self) -> usize {
        self.stars.len() + self.arms.len()
    }
}
