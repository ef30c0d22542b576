//! The universe: a staged flight from nebulae through an asteroid field and a
//! sky of galaxies to a warp-speed climax.
//!
//! ```text
//!  0s  Nebula         drifting gas clouds
//!  8s  AsteroidField  tumbling rocks rushing past
//! 16s  Galaxies       twenty rotating galaxies
//! 24s  Climax         warp streaks and bursts, closing line at +2s
//! ```
//!
//! Every frame is painted over a 5% fade of the stage background instead of a
//! clear, so everything leaves trails.

use glam::Vec2;
use rand::Rng;
use rand::rngs::ThreadRng;
use std::f32::consts::TAU;

use crate::canvas::{Canvas, GradientStop, Layer};
use crate::scene::SceneId;
use crate::ui::{Color, TextRun, TextStyle};

use super::particles::ParticleSystem;
use super::starfield::DepthStarfield;
use super::timeline::{Reveal, StageDef, Timeline};
use super::{
    CallbackId, FrameContext, MountContext, SceneRenderer, Viewport, caption_entrance,
    draw_caption,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum UniverseStage {
    Nebula,
    AsteroidField,
    Galaxies,
    Climax,
}

pub const STAGES: [StageDef<UniverseStage>; 4] = [
    StageDef::new(UniverseStage::Nebula, 0.0, 1.0),
    StageDef::new(UniverseStage::AsteroidField, 8.0, 1.15),
    StageDef::new(UniverseStage::Galaxies, 16.0, 0.85),
    StageDef::new(UniverseStage::Climax, 24.0, 1.3),
];

/// Seconds over which zoom and stage visuals blend.
const STAGE_WINDOW: f32 = 2.0;
const CLIMAX_LINE_DELAY: f32 = 2.0;
pub const CLIMAX_LINE: &str = "E mesmo assim, o universo é pequeno demais para este amor.";
const BURST_PERIOD: f32 = 1.2;
const TRAIL_FADE: f32 = 0.05;
const CAPTION_DELAY: f32 = 0.5;

pub const GALAXY_PALETTE: [&str; 6] = [
    "#FF5E5E", "#5E8AFF", "#5EFFFF", "#5EFF8A", "#FFFF5E", "#FF5EFF",
];
const NEBULA_PALETTE: [&str; 4] = ["#7C3AED", "#DB2777", "#2563EB", "#0EA5E9"];

/// How strongly each entity group shows in a stage.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Weights {
    nebula: f32,
    asteroids: f32,
    galaxies: f32,
    warp: f32,
}

impl Weights {
    fn lerp(self, other: Weights, t: f32) -> Weights {
        let mix = |a: f32, b: f32| a + (b - a) * t;
        Weights {
            nebula: mix(self.nebula, other.nebula),
            asteroids: mix(self.asteroids, other.asteroids),
            galaxies: mix(self.galaxies, other.galaxies),
            warp: mix(self.warp, other.warp),
        }
    }
}

impl UniverseStage {
    fn weights(self) -> Weights {
        match self {
            UniverseStage::Nebula => Weights {
                nebula: 1.0,
                asteroids: 0.0,
                galaxies: 0.0,
                warp: 0.0,
            },
            UniverseStage::AsteroidField => Weights {
                nebula: 0.4,
                asteroids: 1.0,
                galaxies: 0.0,
                warp: 0.0,
            },
            UniverseStage::Galaxies => Weights {
                nebula: 0.25,
                asteroids: 0.2,
                galaxies: 1.0,
                warp: 0.0,
            },
            UniverseStage::Climax => Weights {
                nebula: 0.15,
                asteroids: 0.0,
                galaxies: 1.0,
                warp: 1.0,
            },
        }
    }

    /// Top and bottom background colors.
    fn background(self) -> (Color, Color) {
        match self {
            UniverseStage::Nebula => (Color::rgb(0.08, 0.02, 0.16), Color::rgb(0.0, 0.0, 0.04)),
            UniverseStage::AsteroidField => {
                (Color::rgb(0.05, 0.05, 0.08), Color::rgb(0.12, 0.07, 0.04))
            }
            UniverseStage::Galaxies => (Color::rgb(0.0, 0.02, 0.1), Color::rgb(0.04, 0.0, 0.08)),
            UniverseStage::Climax => (Color::rgb(0.15, 0.03, 0.2), Color::rgb(0.02, 0.02, 0.12)),
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct NebulaCloud {
    position: Vec2,
    radius: f32,
    color: Color,
    drift: Vec2,
    phase: f32,
}

impl NebulaCloud {
    fn update(&mut self, dt: f32, viewport: Viewport) {
        self.position += self.drift * dt;
        self.position = wrap_around(self.position, self.radius, viewport);
        self.phase = (self.phase + 0.4 * dt) % TAU;
    }
}

/// Move a point that left the viewport by more than `margin` to the opposite edge.
fn wrap_around(mut position: Vec2, margin: f32, viewport: Viewport) -> Vec2 {
    let Viewport { width, height } = viewport;
    if position.x < -margin {
        position.x = width + margin;
    }
    if position.x > width + margin {
        position.x = -margin;
    }
    if position.y < -margin {
        position.y = height + margin;
    }
    if position.y > height + margin {
        position.y = -margin;
    }
    position
}

/// Irregular rock outline, radii relative to its size.
#[derive(Clone, Copy, Debug)]
struct AsteroidShape {
    radii: [f32; 7],
    rotation: f32,
    spin: f32,
}

#[derive(Clone, Debug)]
struct Galaxy {
    position: Vec2,
    size: f32,
    rotation: f32,
    color: Color,
    /// Pixels per second along x; y drifts at half the rate.
    speed: f32,
    /// Fixed sparkle stars in galaxy-local coordinates: (offset, radius).
    sparkles: Vec<(Vec2, f32)>,
}

impl Galaxy {
    fn update(&mut self, dt: f32, viewport: Viewport) {
        self.rotation += self.speed * 0.01 * dt;
        self.position += Vec2::new(self.speed, self.speed * 0.5) * dt;
        self.position = wrap_around(self.position, self.size, viewport);
    }

    fn draw(&self, layer: &mut Layer, alpha: f32) {
        layer.save();
        layer.translate(self.position);
        layer.rotate(self.rotation);
        layer.radial_gradient(
            Vec2::ZERO,
            self.size,
            &[
                GradientStop::new(0.0, self.color.fade(alpha)),
                GradientStop::new(0.5, self.color.with_alpha(0.5 * alpha)),
                GradientStop::new(1.0, Color::TRANSPARENT),
            ],
        );
        for (offset, radius) in &self.sparkles {
            layer.fill_circle(*offset, *radius, Color::WHITE.with_alpha(0.8 * alpha));
        }
        layer.restore();
    }
}

pub struct UniverseRenderer {
    viewport: Viewport,
    timeline: Timeline<UniverseStage>,
    clouds: Vec<NebulaCloud>,
    asteroids: Option<DepthStarfield>,
    asteroid_shapes: Vec<AsteroidShape>,
    galaxies: Vec<Galaxy>,
    warp: Option<DepthStarfield>,
    bursts: ParticleSystem,
    burst_timer: Option<CallbackId>,
    climax_timer: Option<CallbackId>,
    climax_line: Reveal,
    frames: u64,
    rng: ThreadRng,
}

fn palette(hexes: &[&str]) -> Vec<Color> {
    hexes.iter().filter_map(|hex| Color::hex(hex)).collect()
}

impl UniverseRenderer {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(0.0, 0.0),
            timeline: Timeline::new(&STAGES, STAGE_WINDOW),
            clouds: Vec::new(),
            asteroids: None,
            asteroid_shapes: Vec::new(),
            galaxies: Vec::new(),
            warp: None,
            bursts: ParticleSystem::new(400),
            burst_timer: None,
            climax_timer: None,
            climax_line: Reveal::new(),
            frames: 0,
            rng: rand::rng(),
        }
    }

    pub fn stage(&self) -> UniverseStage {
        self.timeline.stage()
    }

    pub fn zoom(&self) -> f32 {
        self.timeline.zoom()
    }

    fn weights(&self) -> Weights {
        let current = self.timeline.stage().weights();
        match self.timeline.previous_stage() {
            Some(previous) => previous.weights().lerp(current, self.timeline.blend()),
            None => current,
        }
    }

    fn background(&self) -> (Color, Color) {
        let (top, bottom) = self.timeline.stage().background();
        match self.timeline.previous_stage() {
            Some(previous) => {
                let (from_top, from_bottom) = previous.background();
                let t = self.timeline.blend();
                (from_top.lerp(top, t), from_bottom.lerp(bottom, t))
            }
            None => (top, bottom),
        }
    }

    fn spawn_entities(&mut self) {
        let Viewport { width, height } = self.viewport;
        let nebula_colors = palette(&NEBULA_PALETTE);
        self.clouds = (0..7)
            .map(|_| NebulaCloud {
                position: Vec2::new(
                    self.rng.random::<f32>() * width,
                    self.rng.random::<f32>() * height,
                ),
                radius: self.rng.random_range(120.0..260.0),
                color: nebula_colors[self.rng.random_range(0..nebula_colors.len())],
                drift: Vec2::new(
                    self.rng.random_range(-8.0..8.0),
                    self.rng.random_range(-5.0..5.0),
                ),
                phase: self.rng.random_range(0.0..TAU),
            })
            .collect();

        let asteroids = DepthStarfield::new(80, self.viewport, 600.0, 140.0);
        self.asteroid_shapes = (0..asteroids.len())
            .map(|_| AsteroidShape {
                radii: std::array::from_fn(|_| self.rng.random_range(0.65..1.0)),
                rotation: self.rng.random_range(0.0..TAU),
                spin: self.rng.random_range(-1.5..1.5),
            })
            .collect();
        self.asteroids = Some(asteroids);

        // Twenty galaxies from the six-color palette.
        let galaxy_colors = palette(&GALAXY_PALETTE);
        self.galaxies = (0..20)
            .map(|_| {
                let size = self.rng.random::<f32>() * 100.0 + 50.0;
                let sparkles = (0..20)
                    .map(|_| {
                        let angle = self.rng.random_range(0.0..TAU);
                        let distance = self.rng.random::<f32>() * size * 0.8;
                        (
                            Vec2::from_angle(angle) * distance,
                            self.rng.random::<f32>() * 2.0 + 0.5,
                        )
                    })
                    .collect();
                Galaxy {
                    position: Vec2::new(
                        self.rng.random::<f32>() * width,
                        self.rng.random::<f32>() * height,
                    ),
                    size,
                    rotation: self.rng.random_range(0.0..TAU),
                    color: galaxy_colors[self.rng.random_range(0..galaxy_colors.len())],
                    speed: (self.rng.random::<f32>() - 0.5) * 12.0,
                    sparkles,
                }
            })
            .collect();

        self.warp = Some(DepthStarfield::new(300, self.viewport, 800.0, 420.0));
    }

    fn draw_asteroids(&self, layer: &mut Layer, alpha: f32) {
        let Some(field) = &self.asteroids else {
            return;
        };
        for (star, shape) in field.stars().iter().zip(&self.asteroid_shapes) {
            let closeness = field.closeness(star);
            let size = 2.0 + 18.0 * closeness;
            let center = field.project(star);
            let points: Vec<Vec2> = shape
                .radii
                .iter()
                .enumerate()
                .map(|(i, r)| {
                    let angle = shape.rotation + i as f32 / shape.radii.len() as f32 * TAU;
                    center + Vec2::from_angle(angle) * r * size
                })
                .collect();
            let shade = 0.35 + 0.35 * closeness;
            layer.fill_polygon(
                &points,
                Color::rgba(shade, shade * 0.85, shade * 0.7, alpha * (0.3 + 0.7 * closeness)),
            );
        }
    }
}

impl Default for UniverseRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer for UniverseRenderer {
    fn mount(&mut self, ctx: &mut MountContext<'_>) {
        self.viewport = ctx.viewport();
        self.timeline = Timeline::new(&STAGES, STAGE_WINDOW);
        self.climax_line = Reveal::new();
        self.frames = 0;
        self.spawn_entities();
        self.burst_timer = Some(ctx.every(BURST_PERIOD));
        self.climax_timer = Some(ctx.after(STAGES[3].starts_at + CLIMAX_LINE_DELAY));
    }

    fn resize(&mut self, viewport: Viewport) {
        let from = self.viewport;
        for cloud in &mut self.clouds {
            cloud.position = from.rescale(cloud.position, viewport);
        }
        for galaxy in &mut self.galaxies {
            galaxy.position = from.rescale(galaxy.position, viewport);
        }
        if let Some(field) = &mut self.asteroids {
            field.resize(viewport);
        }
        if let Some(field) = &mut self.warp {
            field.resize(viewport);
        }
        self.bursts.rescale(from, viewport);
        self.viewport = viewport;
    }

    fn update(&mut self, frame: &FrameContext) {
        let dt = frame.dt;
        self.frames += 1;
        if let Some(stage) = self.timeline.advance(dt) {
            log::info!("[universe] entering {stage:?}");
        }
        let weights = self.weights();

        for cloud in &mut self.clouds {
            cloud.update(dt, self.viewport);
        }
        if let Some(field) = &mut self.asteroids {
            field.update(dt);
        }
        for shape in &mut self.asteroid_shapes {
            shape.rotation += shape.spin * dt;
        }
        for galaxy in &mut self.galaxies {
            galaxy.update(dt, self.viewport);
        }
        if let Some(field) = &mut self.warp {
            field.set_speed(120.0 + 600.0 * weights.warp);
            field.update(dt);
        }
        self.bursts.update(dt);
    }

    fn on_timer(&mut self, timer: CallbackId) {
        if self.burst_timer == Some(timer) {
            if self.timeline.stage() == UniverseStage::Climax {
                let origin = Vec2::new(
                    self.rng.random::<f32>() * self.viewport.width,
                    self.rng.random::<f32>() * self.viewport.height,
                );
                let colors = palette(&GALAXY_PALETTE);
                self.bursts.burst(&mut self.rng, origin, 36, 180.0, &colors);
            }
        } else if self.climax_timer == Some(timer) && self.climax_line.trigger(self.timeline.elapsed()) {
            log::info!("[universe] climax line revealed");
        }
    }

    fn draw(&self, canvas: &mut Canvas) {
        if self.frames <= 1 {
            canvas.clear(Color::BLACK);
        } else {
            let (top, bottom) = self.background();
            let bounds = canvas.bounds();
            canvas.effects().vertical_gradient(
                bounds,
                &[
                    GradientStop::new(0.0, top.with_alpha(TRAIL_FADE)),
                    GradientStop::new(1.0, bottom.with_alpha(TRAIL_FADE)),
                ],
            );
        }

        let weights = self.weights();
        let center = canvas.center();
        let layer = canvas.effects();
        layer.save();
        layer.translate(center);
        layer.scale(self.zoom());
        layer.translate(-center);

        if weights.nebula > 0.01 {
            for cloud in &self.clouds {
                let pulse = 0.8 + 0.2 * cloud.phase.sin();
                layer.glow(
                    cloud.position,
                    cloud.radius,
                    cloud.color.with_alpha(0.06 * weights.nebula * pulse),
                    Color::TRANSPARENT,
                );
            }
        }
        if weights.asteroids > 0.01 {
            self.draw_asteroids(layer, weights.asteroids);
        }
        if weights.galaxies > 0.01 {
            for galaxy in &self.galaxies {
                galaxy.draw(layer, weights.galaxies);
            }
        }
        if weights.warp > 0.01 {
            if let Some(field) = &self.warp {
                field.draw(layer, Color::WHITE.with_alpha(weights.warp), true);
            }
        }
        self.bursts.draw(layer);
        layer.restore();

        let (opacity, rise) = caption_entrance(self.timeline.elapsed(), CAPTION_DELAY);
        let panel = draw_caption(canvas, SceneId::Universe.caption(), opacity, rise);

        let line = self.climax_line.opacity(self.timeline.elapsed(), 1.0);
        canvas.text(
            TextRun::new(
                CLIMAX_LINE,
                panel.center().x,
                panel.y + panel.height + 24.0,
                TextStyle::Accent,
            )
            .color(Color::WHITE.fade(line))
            .centered()
            .wrap(panel.width),
        );
    }

    fn unmount(&mut self) {
        self.clouds.clear();
        self.asteroids = None;
        self.asteroid_shapes.clear();
        self.galaxies.clear();
        self.warp = None;
        self.bursts.clear();
        self.burst_timer = None;
        self.climax_timer = None;
    }

    fn entity_count(&self) -> usize {
        self.clouds.len()
            + self.asteroids.as_ref().map_or(0, DepthStarfield::len)
            + self.galaxies.len()
            + self.warp.as_ref().map_or(0, DepthStarfield::len)
            + self.bursts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{FrameScheduler, MountedScene};

    const DT: f32 = 1.0 / 30.0;

    fn run(mounted: &mut MountedScene, scheduler: &mut FrameScheduler, seconds: f32) {
        let frames = (seconds / DT).round() as usize;
        for _ in 0..frames {
            mounted.frame(DT, scheduler);
            for (_, id) in scheduler.advance(DT) {
                mounted.fire(id);
            }
        }
    }

    fn shows_climax_line(mounted: &MountedScene) -> bool {
        let mut canvas = Canvas::new(1280.0, 720.0);
        mounted.draw(&mut canvas);
        canvas.texts().iter().any(|run| run.text == CLIMAX_LINE)
    }

    #[test]
    fn stages_follow_the_clock() {
        let mut renderer = UniverseRenderer::new();
        let mut seen = vec![renderer.stage()];
        for _ in 0..(30.0 / DT) as usize {
            if let Some(stage) = renderer.timeline.advance(DT) {
                seen.push(stage);
            }
        }
        assert_eq!(
            seen,
            vec![
                UniverseStage::Nebula,
                UniverseStage::AsteroidField,
                UniverseStage::Galaxies,
                UniverseStage::Climax,
            ]
        );
        assert!((renderer.zoom() - 1.3).abs() < 1e-4);
    }

    #[test]
    fn galaxy_palette_is_complete() {
        assert_eq!(palette(&GALAXY_PALETTE).len(), 6);
        assert_eq!(palette(&NEBULA_PALETTE).len(), NEBULA_PALETTE.len());
    }

    #[test]
    fn galaxies_wrap_around_edges() {
        let viewport = Viewport::new(200.0, 100.0);
        let mut galaxy = Galaxy {
            position: Vec2::new(259.0, 50.0),
            size: 50.0,
            rotation: 0.0,
            color: Color::WHITE,
            speed: 6.0,
            sparkles: Vec::new(),
        };
        galaxy.update(1.0, viewport);
        assert_eq!(galaxy.position.x, -50.0);
    }

    #[test]
    fn clouds_stay_near_the_viewport() {
        let viewport = Viewport::new(400.0, 300.0);
        let mut cloud = NebulaCloud {
            position: Vec2::new(200.0, 150.0),
            radius: 120.0,
            color: Color::WHITE,
            drift: Vec2::new(-8.0, 5.0),
            phase: 0.0,
        };
        for _ in 0..(600.0 / DT) as usize {
            cloud.update(DT, viewport);
            assert!(cloud.position.x >= -cloud.radius - 1.0);
            assert!(cloud.position.x <= viewport.width + cloud.radius + 1.0);
            assert!(cloud.position.y >= -cloud.radius - 1.0);
            assert!(cloud.position.y <= viewport.height + cloud.radius + 1.0);
        }
    }

    #[test]
    fn climax_line_appears_two_seconds_into_climax() {
        let mut scheduler = FrameScheduler::new();
        let mut mounted = MountedScene::mount(
            SceneId::Universe,
            Box::new(UniverseRenderer::new()),
            Viewport::new(1280.0, 720.0),
            &mut scheduler,
        );

        run(&mut mounted, &mut scheduler, 25.5);
        assert!(!shows_climax_line(&mounted));

        run(&mut mounted, &mut scheduler, 1.5);
        assert!(shows_climax_line(&mounted));
        // The one-shot timer retired on its own; only the frame and burst timers remain.
        assert_eq!(scheduler.completed(), 1);
        assert_eq!(scheduler.pending_for(mounted.owner()), 2);

        mounted.unmount(&mut scheduler);
        assert_eq!(scheduler.pending(), 0);
    }

    #[test]
    fn bursts_only_during_climax() {
        let mut scheduler = FrameScheduler::new();
        let mut mounted = MountedScene::mount(
            SceneId::Universe,
            Box::new(UniverseRenderer::new()),
            Viewport::new(800.0, 600.0),
            &mut scheduler,
        );
        let baseline = mounted.entity_count();
        run(&mut mounted, &mut scheduler, 5.0);
        assert_eq!(mounted.entity_count(), baseline);

        run(&mut mounted, &mut scheduler, 22.0);
        assert!(mounted.entity_count() > baseline);
    }
}
