//! The sun and its eight planets on their orbits.

use glam::Vec2;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::f32::consts::TAU;

use crate::canvas::{Canvas, Layer};
use crate::scene::{Easing, SceneId};
use crate::ui::Color;

use super::starfield::TwinkleField;
use super::timeline::ramp;
use super::{
    FrameContext, MountContext, SceneRenderer, Viewport, caption_entrance, draw_caption,
};

const CAPTION_DELAY: f32 = 2.0;
/// Delay between consecutive bodies appearing.
const STAGGER: f32 = 0.2;
const APPEAR_DURATION: f32 = 1.0;
/// Layout radius the planet table was designed for.
const DESIGN_EXTENT: f32 = 300.0;
/// Angular speed of the innermost orbit, radians per second.
const BASE_ORBIT_RATE: f32 = 0.9;

/// Static description of one planet.
#[derive(Clone, Copy, Debug)]
pub struct PlanetDef {
    pub name: &'static str,
    /// Diameter in design pixels.
    pub size: f32,
    /// Orbit radius in design pixels.
    pub distance: f32,
    pub color: &'static str,
    pub ringed: bool,
}

pub const SUN_SIZE: f32 = 40.0;

pub const PLANETS: [PlanetDef; 8] = [
    PlanetDef { name: "Mercúrio", size: 4.0, distance: 60.0, color: "#9CA3AF", ringed: false },
    PlanetDef { name: "Vênus", size: 6.0, distance: 80.0, color: "#FEF08A", ringed: false },
    PlanetDef { name: "Terra", size: 6.0, distance: 100.0, color: "#3B82F6", ringed: false },
    PlanetDef { name: "Marte", size: 5.0, distance: 120.0, color: "#EF4444", ringed: false },
    PlanetDef { name: "Júpiter", size: 20.0, distance: 160.0, color: "#CA8A04", ringed: false },
    PlanetDef { name: "Saturno", size: 18.0, distance: 200.0, color: "#FDE047", ringed: true },
    PlanetDef { name: "Urano", size: 12.0, distance: 240.0, color: "#93C5FD", ringed: false },
    PlanetDef { name: "Netuno", size: 12.0, distance: 280.0, color: "#1D4ED8", ringed: false },
];

/// Orbital angular speed for an orbit of `distance`; outer planets are slower.
pub fn orbit_rate(distance: f32) -> f32 {
    BASE_ORBIT_RATE * (PLANETS[0].distance / distance.max(1.0)).powf(1.5)
}

#[derive(Clone, Copy, Debug)]
struct Planet {
    def: PlanetDef,
    color: Color,
    angle: f32,
    rate: f32,
}

#[derive(Clone, Copy, Debug)]
struct Asteroid {
    angle: f32,
    /// Design pixels.
    distance: f32,
    size: f32,
    rate: f32,
    shade: f32,
}

pub struct SolarSystemRenderer {
    viewport: Viewport,
    stars: TwinkleField,
    planets: Vec<Planet>,
    belt: Vec<Asteroid>,
    elapsed: f32,
    rng: ThreadRng,
}

impl SolarSystemRenderer {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(0.0, 0.0),
            stars: TwinkleField::default(),
            planets: Vec::new(),
            belt: Vec::new(),
            elapsed: 0.0,
            rng: rand::rng(),
        }
    }

    /// Design pixels to screen pixels.
    fn unit(&self) -> f32 {
        (self.viewport.min_side() * 0.46 / DESIGN_EXTENT).clamp(0.4, 2.0)
    }

    /// Scale-in progress of the body at `order` (0 = sun).
    fn appearance(&self, order: usize) -> f32 {
        Easing::EaseOut.apply(ramp(self.elapsed, order as f32 * STAGGER, APPEAR_DURATION))
    }

    fn draw_sun(&self, layer: &mut Layer, center: Vec2, unit: f32) {
        let appear = self.appearance(0);
        let radius = SUN_SIZE / 2.0 * unit * appear;
        let pulse = 1.0 + 0.04 * (self.elapsed * 2.0).sin();
        layer.glow(
            center,
            radius * 3.0 * pulse,
            Color::rgba(1.0, 0.75, 0.2, 0.35 * appear),
            Color::TRANSPARENT,
        );
        layer.glow(
            center,
            radius,
            Color::rgba(1.0, 0.95, 0.7, appear),
            Color::rgba(0.92, 0.7, 0.03, appear),
        );
    }

    fn draw_planet(&self, layer: &mut Layer, planet: &Planet, order: usize, center: Vec2, unit: f32) {
        let appear = self.appearance(order);
        if appear <= 0.0 {
            return;
        }
        let orbit = planet.def.distance * unit;
        layer.stroke_circle(center, orbit, 1.0, Color::WHITE.with_alpha(0.08 * appear));

        let position = center + Vec2::from_angle(planet.angle) * orbit;
        let radius = (planet.def.size / 2.0 * unit).max(1.5) * appear;
        if planet.def.ringed {
            layer.stroke_ellipse(
                position,
                radius * 1.9,
                radius * 0.6,
                radius * 0.25,
                planet.color.with_alpha(0.6 * appear),
            );
        }
        layer.fill_circle(position, radius, planet.color.fade(appear));
        // Lit from the sun.
        let toward_sun = (center - position).normalize_or_zero();
        layer.fill_circle(
            position + toward_sun * radius * 0.35,
            radius * 0.45,
            Color::WHITE.with_alpha(0.25 * appear),
        );
    }
}

impl Default for SolarSystemRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer for SolarSystemRenderer {
    fn mount(&mut self, ctx: &mut MountContext<'_>) {
        self.viewport = ctx.viewport();
        self.stars = TwinkleField::new(&mut self.rng, 200, self.viewport, (0.2, 1.0), 1.0);
        self.planets = PLANETS
            .iter()
            .map(|def| Planet {
                def: *def,
                color: Color::hex(def.color).unwrap_or(Color::WHITE),
                angle: self.rng.random_range(0.0..TAU),
                rate: orbit_rate(def.distance),
            })
            .collect();

        let inner = PLANETS[3].distance + 8.0;
        let outer = PLANETS[4].distance - 14.0;
        self.belt = (0..160)
            .map(|_| {
                let distance = self.rng.random_range(inner..outer);
                Asteroid {
                    angle: self.rng.random_range(0.0..TAU),
                    distance,
                    size: self.rng.random_range(0.5..1.6),
                    rate: orbit_rate(distance) * self.rng.random_range(0.9..1.1),
                    shade: self.rng.random_range(0.35..0.7),
                }
            })
            .collect();
        self.elapsed = 0.0;
    }

    fn resize(&mut self, viewport: Viewport) {
        // Orbits are laid out from the live viewport; only the stars hold positions.
        self.stars.resize(viewport);
        self.viewport = viewport;
    }

    fn update(&mut self, frame: &FrameContext) {
        self.elapsed = frame.elapsed;
        for planet in &mut self.planets {
            planet.angle = (planet.angle + planet.rate * frame.dt) % TAU;
        }
        for rock in &mut self.belt {
            rock.angle = (rock.angle + rock.rate * frame.dt) % TAU;
        }
    }

    fn draw(&self, canvas: &mut Canvas) {
        canvas.clear(Color::BLACK);
        let center = self.viewport.center();
        let unit = self.unit();

        let layer = canvas.effects();
        self.stars.draw(layer, 1.0);

        let belt_alpha = self.appearance(5);
        for rock in &self.belt {
            let position = center + Vec2::from_angle(rock.angle) * rock.distance * unit;
            layer.fill_circle(
                position,
                rock.size * unit.sqrt(),
                Color::rgba(rock.shade, rock.shade * 0.95, rock.shade * 0.9, belt_alpha),
            );
        }

        self.draw_sun(layer, center, unit);
        for (i, planet) in self.planets.iter().enumerate() {
            self.draw_planet(layer, planet, i + 1, center, unit);
        }

        let (opacity, rise) = caption_entrance(self.elapsed, CAPTION_DELAY);
        draw_caption(canvas, SceneId::SolarSystem.caption(), opacity, rise);
    }

    fn unmount(&mut self) {
        self.stars = TwinkleField::default();
        self.planets.clear();
        self.belt.clear();
    }

    fn entity_count(&self) -> usize {
        self.stars.len() + self.planets.len() + self.belt.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outer_planets_orbit_slower() {
        for pair in PLANETS.windows(2) {
            assert!(orbit_rate(pair[0].distance) >= orbit_rate(pair[1].distance));
        }
        assert!((orbit_rate(60.0) - BASE_ORBIT_RATE).abs() < 1e-6);
    }

    #[test]
    fn planet_colors_parse() {
        for def in PLANETS {
            assert!(Color::hex(def.color).is_some(), "{} has a bad color", def.name);
        }
    }

    #[test]
    fn bodies_appear_in_order() {
        let mut renderer = SolarSystemRenderer::new();
        renderer.elapsed = 0.5;
        assert!(renderer.appearance(0) > 0.0);
        assert!(renderer.appearance(1) > 0.0);
        assert_eq!(renderer.appearance(3), 0.0);

        renderer.elapsed = 3.0;
        for order in 0..=PLANETS.len() {
            assert_eq!(renderer.appearance(order), 1.0);
        }
    }
}
