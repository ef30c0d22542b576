//! The Earth seen from orbit, with a clickable moon.

use glam::Vec2;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::f32::consts::{PI, TAU};

use crate::canvas::{Canvas, GradientStop, Layer};
use crate::scene::{Easing, SceneId};
use crate::ui::Color;

use super::starfield::TwinkleField;
use super::timeline::ramp;
use super::{
    FrameContext, MountContext, SceneAction, SceneRenderer, Viewport, caption_entrance,
    draw_caption,
};

/// Where clicking the moon takes you.
pub const MOON_LINK: &str = "https://science.nasa.gov/moon/";

const INTRO_DURATION: f32 = 1.5;
const CAPTION_DELAY: f32 = 0.5;
/// Radians per second.
const SPIN_RATE: f32 = 0.12;
const CLOUD_RATE: f32 = 0.18;
const MOON_ORBIT_RATE: f32 = 0.35;
/// Vertical squash of the moon's orbit ellipse.
const MOON_TILT: f32 = 0.3;

/// A patch of land or cloud on the globe, in spherical coordinates.
#[derive(Clone, Copy, Debug)]
struct SurfaceBlob {
    longitude: f32,
    /// -1 (south pole) to 1 (north pole), as a fraction of the radius.
    latitude: f32,
    /// Fraction of the globe radius.
    size: f32,
    color: Color,
}

impl SurfaceBlob {
    /// Screen placement for a globe at `center` with `radius`, rotated by `spin`.
    /// Returns `None` when the blob is on the far side.
    fn project(&self, center: Vec2, radius: f32, spin: f32) -> Option<(Vec2, f32, f32)> {
        let longitude = self.longitude + spin;
        let facing = longitude.cos();
        if facing <= 0.05 {
            return None;
        }
        let ring = (1.0 - self.latitude * self.latitude).max(0.0).sqrt();
        let position = center + Vec2::new(longitude.sin() * ring, -self.latitude) * radius;
        let size = self.size * radius;
        // Foreshortened toward the limb.
        Some((position, size * facing.max(0.2), size * ring.max(0.3)))
    }
}

pub struct EarthRenderer {
    viewport: Viewport,
    stars: TwinkleField,
    land: Vec<SurfaceBlob>,
    clouds: Vec<SurfaceBlob>,
    moon_angle: f32,
    elapsed: f32,
    rng: ThreadRng,
}

impl EarthRenderer {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(0.0, 0.0),
            stars: TwinkleField::default(),
            land: Vec::new(),
            clouds: Vec::new(),
            moon_angle: 0.0,
            elapsed: 0.0,
            rng: rand::rng(),
        }
    }

    fn generate_surface(&mut self) {
        let greens = [
            Color::hex("#22C55E"),
            Color::hex("#16A34A"),
            Color::hex("#65A30D"),
            Color::hex("#A16207"),
        ];
        self.land.clear();
        for _ in 0..7 {
            let longitude = self.rng.random_range(0.0..TAU);
            let latitude = self.rng.random_range(-0.7..0.7);
            for _ in 0..self.rng.random_range(3..6) {
                let color = greens[self.rng.random_range(0..greens.len())]
                    .unwrap_or(Color::WHITE);
                self.land.push(SurfaceBlob {
                    longitude: longitude + self.rng.random_range(-0.35..0.35),
                    latitude: (latitude + self.rng.random_range(-0.2f32..0.2)).clamp(-0.95, 0.95),
                    size: self.rng.random_range(0.08..0.18),
                    color: color.with_alpha(0.85),
                });
            }
        }

        self.clouds = (0..14)
            .map(|_| SurfaceBlob {
                longitude: self.rng.random_range(0.0..TAU),
                latitude: self.rng.random_range(-0.85..0.85),
                size: self.rng.random_range(0.05..0.14),
                color: Color::WHITE.with_alpha(0.45),
            })
            .collect();
    }

    fn intro(&self) -> f32 {
        Easing::EaseOut.apply(ramp(self.elapsed, 0.0, INTRO_DURATION))
    }

    fn globe_radius(&self) -> f32 {
        self.viewport.min_side() * 0.27
    }

    /// Moon center on screen and whether it is in front of the globe.
    fn moon(&self) -> (Vec2, f32, bool) {
        let center = self.viewport.center();
        let scale = 0.5 + 0.5 * self.intro();
        let orbit = self.globe_radius() * 1.7 * scale;
        let position = center
            + Vec2::new(
                self.moon_angle.cos() * orbit,
                self.moon_angle.sin() * orbit * MOON_TILT,
            );
        let radius = self.globe_radius() * 0.13 * scale;
        (position, radius, self.moon_angle.sin() >= 0.0)
    }

    fn draw_moon(&self, layer: &mut Layer, alpha: f32) {
        let (position, radius, _) = self.moon();
        layer.glow(
            position,
            radius * 1.6,
            Color::rgba(0.85, 0.85, 0.9, 0.25 * alpha),
            Color::TRANSPARENT,
        );
        layer.radial_gradient(
            position - Vec2::splat(radius * 0.3),
            radius * 1.3,
            &[
                GradientStop::new(0.0, Color::rgba(0.9, 0.9, 0.92, alpha)),
                GradientStop::new(0.75, Color::rgba(0.6, 0.6, 0.65, alpha)),
                GradientStop::new(1.0, Color::rgba(0.6, 0.6, 0.65, 0.0)),
            ],
        );
        layer.fill_circle(
            position + Vec2::new(radius * 0.25, radius * 0.1),
            radius * 0.2,
            Color::rgba(0.45, 0.45, 0.5, 0.6 * alpha),
        );
    }

    fn draw_globe(&self, layer: &mut Layer, alpha: f32) {
        let center = self.viewport.center();
        let radius = self.globe_radius();
        let spin = self.elapsed * SPIN_RATE;

        layer.glow(
            center,
            radius * 1.25,
            Color::rgba(0.4, 0.65, 1.0, 0.35 * alpha),
            Color::TRANSPARENT,
        );
        layer.radial_gradient(
            center,
            radius,
            &[
                GradientStop::new(0.0, Color::rgba(0.38, 0.65, 0.98, alpha)),
                GradientStop::new(0.7, Color::rgba(0.15, 0.39, 0.92, alpha)),
                GradientStop::new(1.0, Color::rgba(0.12, 0.23, 0.54, alpha)),
            ],
        );
        for blob in &self.land {
            if let Some((position, rx, ry)) = blob.project(center, radius, spin) {
                layer.fill_ellipse(position, rx, ry, blob.color.fade(alpha));
            }
        }
        for blob in &self.clouds {
            if let Some((position, rx, ry)) = blob.project(center, radius, self.elapsed * CLOUD_RATE)
            {
                layer.fill_ellipse(position, rx, ry, blob.color.fade(alpha));
            }
        }
        // Night side.
        layer.radial_gradient(
            center + Vec2::new(radius * 0.55, radius * 0.2),
            radius * 0.95,
            &[
                GradientStop::new(0.0, Color::rgba(0.0, 0.0, 0.05, 0.45 * alpha)),
                GradientStop::new(1.0, Color::rgba(0.0, 0.0, 0.05, 0.0)),
            ],
        );
        layer.glow(
            center - Vec2::splat(radius * 0.35),
            radius * 0.5,
            Color::WHITE.with_alpha(0.15 * alpha),
            Color::TRANSPARENT,
        );
    }
}

impl Default for EarthRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer for EarthRenderer {
    fn mount(&mut self, ctx: &mut MountContext<'_>) {
        self.viewport = ctx.viewport();
        self.stars = TwinkleField::new(&mut self.rng, 150, self.viewport, (0.2, 0.9), 1.2);
        self.generate_surface();
        self.moon_angle = self.rng.random_range(0.0..PI);
        self.elapsed = 0.0;
    }

    fn resize(&mut self, viewport: Viewport) {
        self.stars.resize(viewport);
        self.viewport = viewport;
    }

    fn update(&mut self, frame: &FrameContext) {
        self.elapsed = frame.elapsed;
        self.stars.update(frame.dt);
        self.moon_angle = (self.moon_angle + MOON_ORBIT_RATE * frame.dt) % TAU;
    }

    fn draw(&self, canvas: &mut Canvas) {
        canvas.clear(Color::rgb(0.118, 0.227, 0.541));
        let alpha = self.intro();
        let scale = 0.5 + 0.5 * alpha;
        let center = self.viewport.center();
        let (_, _, moon_in_front) = self.moon();

        let layer = canvas.effects();
        self.stars.draw(layer, 1.0);

        if !moon_in_front {
            self.draw_moon(layer, alpha);
        }
        layer.save();
        layer.translate(center);
        layer.scale(scale);
        layer.translate(-center);
        self.draw_globe(layer, alpha);
        layer.restore();
        if moon_in_front {
            self.draw_moon(layer, alpha);
        }

        let (opacity, rise) = caption_entrance(self.elapsed, CAPTION_DELAY);
        draw_caption(canvas, SceneId::Earth.caption(), opacity, rise);
    }

    fn pointer(&mut self, position: Vec2) -> Option<SceneAction> {
        let (moon, radius, in_front) = self.moon();
        if !in_front {
            let globe = self.globe_radius() * (0.5 + 0.5 * self.intro());
            if position.distance(self.viewport.center()) <= globe {
                return None;
            }
        }
        if position.distance(moon) <= radius * 1.3 {
            log::info!("[earth] moon clicked");
            Some(SceneAction::OpenLink(MOON_LINK))
        } else {
            None
        }
    }

    fn unmount(&mut self) {
        self.stars = TwinkleField::default();
        self.land.clear();
        self.clouds.clear();
    }

    fn entity_count(&self) -> usize {
        self.stars.len() + self.land.len() + self.clouds.len() + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{FrameScheduler, MountedScene};

    fn mounted() -> (MountedScene, FrameScheduler) {
        let mut scheduler = FrameScheduler::new();
        let mounted = MountedScene::mount(
            SceneId::Earth,
            Box::new(EarthRenderer::new()),
            Viewport::new(1280.0, 720.0),
            &mut scheduler,
        );
        (mounted, scheduler)
    }

    #[test]
    fn far_side_blobs_are_hidden() {
        let blob = SurfaceBlob {
            longitude: PI,
            latitude: 0.0,
            size: 0.1,
            color: Color::WHITE,
        };
        assert!(blob.project(Vec2::ZERO, 100.0, 0.0).is_none());
        let (position, _, _) = blob.project(Vec2::ZERO, 100.0, PI).unwrap();
        assert!(position.x.abs() < 1e-3);
    }

    #[test]
    fn clicking_the_moon_opens_the_link() {
        let mut renderer = EarthRenderer::new();
        renderer.viewport = Viewport::new(1280.0, 720.0);
        renderer.elapsed = 5.0;
        renderer.moon_angle = PI / 2.0;

        let (moon, _, in_front) = renderer.moon();
        assert!(in_front);
        assert_eq!(
            renderer.pointer(moon),
            Some(SceneAction::OpenLink(MOON_LINK))
        );
        assert_eq!(renderer.pointer(Vec2::new(5.0, 5.0)), None);
    }

    #[test]
    fn moon_behind_the_globe_is_not_clickable() {
        let mut renderer = EarthRenderer::new();
        renderer.viewport = Viewport::new(1280.0, 720.0);
        renderer.elapsed = 5.0;
        renderer.moon_angle = -PI / 2.0;

        let (moon, _, in_front) = renderer.moon();
        assert!(!in_front);
        assert_eq!(renderer.pointer(moon), None);
    }

    #[test]
    fn globe_scales_in_over_intro() {
        let (mut mounted, mut scheduler) = mounted();
        let mut canvas = Canvas::new(1280.0, 720.0);
        mounted.frame(0.01, &mut scheduler);
        mounted.draw(&mut canvas);
        assert!(canvas.texts().is_empty());

        for _ in 0..120 {
            mounted.frame(1.0 / 60.0, &mut scheduler);
        }
        canvas.begin(1280.0, 720.0);
        mounted.draw(&mut canvas);
        assert_eq!(canvas.texts().len(), 2);
        assert!(mounted.entity_count() > 150);
    }
}
