//! Lifetime-managed particles for transient effects.
//!
//! Shooting stars, climax bursts and rising hearts all go through this one
//! system: they are spawned into a [`ParticleSystem`], integrated every frame, and
//! dropped when their life runs out. Nothing outside the owning renderer ever
//! sees them.

use glam::Vec2;
use rand::Rng;
use std::f32::consts::TAU;

use crate::canvas::Layer;
use crate::ui::Color;

use super::Viewport;

/// How a particle is painted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParticleShape {
    /// Soft round dot.
    Spark,
    /// Bright head with a fading tail opposite the direction of travel.
    Streak,
    /// Small filled heart.
    Heart,
}

/// A single simulated particle.
#[derive(Clone, Copy, Debug)]
pub struct Particle {
    pub position: Vec2,
    /// Pixels per second.
    pub velocity: Vec2,
    /// Added to velocity every second.
    pub acceleration: Vec2,
    /// Radius for sparks and hearts, tail length for streaks.
    pub size: f32,
    pub color: Color,
    pub rotation: f32,
    /// Radians per second.
    pub spin: f32,
    /// Remaining lifetime in seconds (0 = dead).
    pub life: f32,
    /// Lifetime at spawn, used for fading.
    pub max_life: f32,
    pub shape: ParticleShape,
}

impl Particle {
    pub fn new(shape: ParticleShape, position: Vec2, velocity: Vec2, life: f32) -> Self {
        let life = life.max(f32::EPSILON);
        Self {
            position,
            velocity,
            acceleration: Vec2::ZERO,
            size: 2.0,
            color: Color::WHITE,
            rotation: 0.0,
            spin: 0.0,
            life,
            max_life: life,
            shape,
        }
    }

    pub fn size(mut self, size: f32) -> Self {
        self.size = size;
        self
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    pub fn acceleration(mut self, acceleration: Vec2) -> Self {
        self.acceleration = acceleration;
        self
    }

    pub fn spin(mut self, rotation: f32, spin: f32) -> Self {
        self.rotation = rotation;
        self.spin = spin;
        self
    }

    pub fn is_alive(&self) -> bool {
        self.life > 0.0
    }

    /// Fraction of life remaining, 1.0 at spawn.
    pub fn life_ratio(&self) -> f32 {
        (self.life / self.max_life).clamp(0.0, 1.0)
    }

    /// Opacity: quick fade in over the first 10% of life, then linear fade out.
    pub fn alpha(&self) -> f32 {
        let ratio = self.life_ratio();
        let age = 1.0 - ratio;
        (age / 0.1).min(1.0) * ratio.min(1.0)
    }

    fn draw(&self, layer: &mut Layer) {
        let alpha = self.alpha();
        if alpha <= 0.0 {
            return;
        }
        let color = self.color.fade(alpha);
        match self.shape {
            ParticleShape::Spark => {
                layer.glow(self.position, self.size * 2.5, color.fade(0.4), Color::TRANSPARENT);
                layer.fill_circle(self.position, self.size, color);
            }
            ParticleShape::Streak => {
                let heading = self.velocity.normalize_or_zero();
                if heading == Vec2::ZERO {
                    return;
                }
                let tail = self.position - heading * self.size;
                layer.line_gradient(tail, self.position, 2.0, color.with_alpha(0.0), color);
                layer.fill_circle(self.position, 1.5, color);
            }
            ParticleShape::Heart => {
                layer.save();
                layer.translate(self.position);
                layer.rotate(self.rotation);
                layer.fill_heart(Vec2::ZERO, self.size, color);
                layer.restore();
            }
        }
    }
}

/// A bounded pool of particles.
#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    capacity: usize,
}

impl ParticleSystem {
    pub fn new(capacity: usize) -> Self {
        Self {
            particles: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Add a particle. When full, the oldest particle is dropped to make room.
    pub fn spawn(&mut self, particle: Particle) {
        if self.capacity == 0 {
            return;
        }
        if self.particles.len() >= self.capacity {
            self.particles.remove(0);
        }
        self.particles.push(particle);
    }

    /// Spawn `count` sparks flying outward from `origin` in random directions.
    pub fn burst(
        &mut self,
        rng: &mut impl Rng,
        origin: Vec2,
        count: usize,
        speed: f32,
        palette: &[Color],
    ) {
        for _ in 0..count {
            let angle = rng.random_range(0.0..TAU);
            let velocity = Vec2::from_angle(angle) * speed * rng.random_range(0.3..1.0);
            let color = if palette.is_empty() {
                Color::WHITE
            } else {
                palette[rng.random_range(0..palette.len())]
            };
            self.spawn(
                Particle::new(
                    ParticleShape::Spark,
                    origin,
                    velocity,
                    rng.random_range(0.8..2.0),
                )
                .size(rng.random_range(1.0..3.0))
                .color(color),
            );
        }
    }

    /// Integrate motion and retire dead particles.
    pub fn update(&mut self, dt: f32) {
        self.particles.retain_mut(|p| {
            p.life -= dt;
            if p.life <= 0.0 {
                return false;
            }
            p.velocity += p.acceleration * dt;
            p.position += p.velocity * dt;
            p.rotation += p.spin * dt;
            true
        });
    }

    pub fn draw(&self, layer: &mut Layer) {
        for particle in &self.particles {
            particle.draw(layer);
        }
    }

    /// Move every particle proportionally into a resized viewport.
    pub fn rescale(&mut self, from: Viewport, to: Viewport) {
        for particle in &mut self.particles {
            particle.position = from.rescale(particle.position, to);
        }
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn clear(&mut self) {
        self.particles.clear();
    }
}
