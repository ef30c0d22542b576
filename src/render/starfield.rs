//! Star backgrounds shared by several scenes.
//!
//! - [`DepthStarfield`]: pseudo-3D stars flying toward the camera. Each star keeps
//!   an `(x, y)` offset from the screen center and a depth `z`; the projection
//!   divides by `z`, and a star that reaches the camera plane (or leaves the
//!   screen) respawns at the far boundary.
//! - [`TwinkleField`]: static stars whose brightness oscillates.

use glam::Vec2;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::f32::consts::TAU;

use crate::canvas::Layer;
use crate::ui::Color;

use super::Viewport;

/// Depth at which a star counts as having passed the camera.
pub const NEAR_PLANE: f32 = 1.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DepthStar {
    /// Offset from the screen center at the far plane, in pixels.
    pub offset: Vec2,
    pub z: f32,
    /// Depth on the previous frame, for streaks.
    pub prev_z: f32,
}

/// A field of stars rushing toward the viewer.
pub struct DepthStarfield {
    stars: Vec<DepthStar>,
    viewport: Viewport,
    depth: f32,
    /// Depth units per second.
    speed: f32,
    rng: ThreadRng,
}

impl DepthStarfield {
    /// `count` stars spread uniformly through `depth` units.
    pub fn new(count: usize, viewport: Viewport, depth: f32, speed: f32) -> Self {
        let depth = depth.max(NEAR_PLANE * 2.0);
        let mut field = Self {
            stars: Vec::with_capacity(count),
            viewport,
            depth,
            speed,
            rng: rand::rng(),
        };
        for _ in 0..count {
            let z = field.rng.random_range(NEAR_PLANE..depth);
            let star = DepthStar {
                offset: field.random_offset(),
                z,
                prev_z: z,
            };
            field.stars.push(star);
        }
        field
    }

    fn random_offset(&mut self) -> Vec2 {
        let half = self.viewport.size() / 2.0;
        if half.x <= 0.0 || half.y <= 0.0 {
            return Vec2::ZERO;
        }
        Vec2::new(
            self.rng.random_range(-half.x..half.x),
            self.rng.random_range(-half.y..half.y),
        )
    }

    fn respawn(&mut self, index: usize) {
        let offset = self.random_offset();
        let depth = self.depth;
        let star = &mut self.stars[index];
        star.offset = offset;
        star.z = depth;
        star.prev_z = depth;
    }

    /// Screen position of a point at `offset` and depth `z`.
    fn project_at(&self, offset: Vec2, z: f32) -> Vec2 {
        self.viewport.center() + offset * (self.depth / z.max(NEAR_PLANE)) * 0.5
    }

    pub fn project(&self, star: &DepthStar) -> Vec2 {
        self.project_at(star.offset, star.z)
    }

    /// 0 at the far plane, 1 at the camera.
    pub fn closeness(&self, star: &DepthStar) -> f32 {
        (1.0 - star.z / self.depth).clamp(0.0, 1.0)
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn update(&mut self, dt: f32) {
        let step = self.speed * dt;
        for i in 0..self.stars.len() {
            let star = &mut self.stars[i];
            star.prev_z = star.z;
            star.z -= step;
            let passed = star.z <= NEAR_PLANE;
            let on_screen = !passed && self.viewport.contains(self.project(&self.stars[i]));
            if passed || !on_screen {
                self.respawn(i);
            }
        }
    }

    /// Draw stars as dots, or as streaks from last frame's position when `streaks` is set.
    pub fn draw(&self, layer: &mut Layer, color: Color, streaks: bool) {
        for star in &self.stars {
            let closeness = self.closeness(star);
            let position = self.project(star);
            let tint = color.fade(0.2 + 0.8 * closeness);
            if streaks && star.prev_z > star.z {
                let from = self.project_at(star.offset, star.prev_z);
                layer.line_gradient(from, position, 0.5 + 2.0 * closeness, tint.with_alpha(0.0), tint);
            } else {
                layer.fill_circle(position, 0.4 + 2.2 * closeness, tint);
            }
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        let from = self.viewport;
        self.viewport = viewport;
        if from.is_empty() {
            for i in 0..self.stars.len() {
                let offset = self.random_offset();
                self.stars[i].offset = offset;
            }
            return;
        }
        let ratio = viewport.size() / from.size();
        for star in &mut self.stars {
            star.offset *= ratio;
        }
    }

    pub fn stars(&self) -> &[DepthStar] {
        &self.stars
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct TwinkleStar {
    pub position: Vec2,
    pub radius: f32,
    pub base_alpha: f32,
    pub phase: f32,
    /// Radians per second.
    pub rate: f32,
}

/// Static background stars with a gentle brightness oscillation.
#[derive(Debug, Default)]
pub struct TwinkleField {
    stars: Vec<TwinkleStar>,
    viewport: Option<Viewport>,
}

impl TwinkleField {
    /// `count` stars with base opacity drawn from `alpha_range`.
    pub fn new(
        rng: &mut impl Rng,
        count: usize,
        viewport: Viewport,
        alpha_range: (f32, f32),
        max_radius: f32,
    ) -> Self {
        let (lo, hi) = alpha_range;
        let stars = (0..count)
            .map(|_| TwinkleStar {
                position: Vec2::new(
                    rng.random::<f32>() * viewport.width,
                    rng.random::<f32>() * viewport.height,
                ),
                radius: 0.3 + rng.random::<f32>() * max_radius,
                base_alpha: lo + rng.random::<f32>() * (hi - lo),
                phase: rng.random_range(0.0..TAU),
                rate: rng.random_range(0.5..3.0),
            })
            .collect();
        Self {
            stars,
            viewport: Some(viewport),
        }
    }

    pub fn update(&mut self, dt: f32) {
        for star in &mut self.stars {
            star.phase = (star.phase + star.rate * dt) % TAU;
        }
    }

    pub fn draw(&self, layer: &mut Layer, opacity: f32) {
        for star in &self.stars {
            let twinkle = 0.7 + 0.3 * star.phase.sin();
            layer.fill_circle(
                star.position,
                star.radius,
                Color::WHITE.with_alpha(star.base_alpha * twinkle * opacity),
            );
        }
    }

    pub fn resize(&mut self, viewport: Viewport) {
        if let Some(from) = self.viewport {
            for star in &mut self.stars {
                star.position = from.rescale(star.position, viewport);
            }
        }
        self.viewport = Some(viewport);
    }

    pub fn stars(&self) -> &[TwinkleStar] {
        &self.stars
    }

    pub fn len(&self) -> usize {
        self.stars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stars_never_reach_the_camera_plane() {
        let viewport = Viewport::new(800.0, 600.0);
        let mut field = DepthStarfield::new(300, viewport, 100.0, 60.0);
        for _ in 0..600 {
            field.update(1.0 / 60.0);
            for star in field.stars() {
                assert!(star.z > NEAR_PLANE);
                assert!(star.z <= 100.0);
            }
        }
    }

    #[test]
    fn recycled_stars_stay_inside_resized_viewport() {
        let mut field = DepthStarfield::new(200, Viewport::new(1920.0, 1080.0), 50.0, 200.0);
        let small = Viewport::new(400.0, 300.0);
        field.resize(small);

        for _ in 0..120 {
            field.update(1.0 / 30.0);
        }
        for star in field.stars() {
            assert!(star.offset.x.abs() <= 200.0 + 1e-3);
            assert!(star.offset.y.abs() <= 150.0 + 1e-3);
            assert!(small.contains(field.project(star)));
        }
    }

    #[test]
    fn far_stars_project_near_center() {
        let viewport = Viewport::new(200.0, 200.0);
        let field = DepthStarfield::new(0, viewport, 10.0, 1.0);
        let star = DepthStar {
            offset: Vec2::new(100.0, 0.0),
            z: 10.0,
            prev_z: 10.0,
        };
        assert_eq!(field.project(&star), Vec2::new(150.0, 100.0));
        assert_eq!(field.closeness(&star), 0.0);
    }

    #[test]
    fn twinkle_field_rescales_on_resize() {
        let mut rng = rand::rng();
        let mut field = TwinkleField::new(&mut rng, 50, Viewport::new(100.0, 100.0), (0.2, 1.0), 1.0);
        let before: Vec<Vec2> = field.stars().iter().map(|s| s.position).collect();
        field.resize(Viewport::new(200.0, 50.0));
        for (star, old) in field.stars().iter().zip(before) {
            assert!((star.position.x - old.x * 2.0).abs() < 1e-3);
            assert!((star.position.y - old.y * 0.5).abs() < 1e-3);
            assert!((0.2..=1.0).contains(&star.base_alpha));
        }
    }
}
