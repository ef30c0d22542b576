//! Closing scene: light rays, a cross, rising hearts and the last words.

use glam::Vec2;
use rand::Rng;
use rand::rngs::ThreadRng;

use crate::canvas::{Canvas, GradientStop, Layer};
use crate::scene::{Easing, SceneId};
use crate::ui::{Color, Rect, TextRun, TextStyle};

use super::particles::{Particle, ParticleShape, ParticleSystem};
use super::timeline::{Reveal, StageDef, Timeline, ramp};
use super::{CallbackId, FrameContext, MountContext, SceneRenderer, Viewport, draw_caption};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum FinalStage {
    Rays,
    Cross,
    Hearts,
    Eternity,
}

pub const STAGES: [StageDef<FinalStage>; 4] = [
    StageDef::new(FinalStage::Rays, 0.0, 1.0),
    StageDef::new(FinalStage::Cross, 2.0, 1.0),
    StageDef::new(FinalStage::Hearts, 4.0, 1.0),
    StageDef::new(FinalStage::Eternity, 7.0, 0.85),
];

const STAGE_WINDOW: f32 = 2.0;

pub const RAY_COUNT: usize = 12;
const RAY_SPACING_DEG: f32 = 30.0;
const RAY_STAGGER: f32 = 0.2;
const RAY_PERIOD: f32 = 3.0;
const RAY_WIDTH: f32 = 4.0;

const CROSS_DURATION: f32 = 2.0;
const CROSS_OPACITY: f32 = 0.2;
const HEART_PERIOD: f32 = 0.4;

const PANEL_DELAY: f32 = 1.0;
const PANEL_FADE: f32 = 1.5;
const QUOTE_DELAY: f32 = 2.0;
const QUOTE_FADE: f32 = 1.5;
const CLOSING_DELAY: f32 = 3.0;
const CLOSING_FADE: f32 = 1.0;

pub const QUOTE: &str = "\u{201C}O homem deve amar sua mulher assim como Cristo amou a igreja \
                         e se entregou por ela.\u{201D}";
pub const CLOSING_LINE: &str = "Eu te amo infinitamente.";

const HEART_PALETTE: [&str; 3] = ["#F472B6", "#EC4899", "#F9A8D4"];
const STARBURST_PALETTE: [&str; 3] = ["#FFFFFF", "#FDE68A", "#F9A8D4"];

/// Opacity and length (0 to 1) of ray `index` at `elapsed` seconds.
///
/// Each ray eases through opacity 0, 0.7, 0.5 while growing to full length over
/// three seconds, then plays the same motion backwards, forever. Rays start
/// 0.2 s apart.
pub fn ray_pulse(elapsed: f32, index: usize) -> (f32, f32) {
    let local = elapsed - index as f32 * RAY_STAGGER;
    if local <= 0.0 {
        return (0.0, 0.0);
    }
    let cycle = (local / RAY_PERIOD).floor() as u64;
    let mut phase = (local % RAY_PERIOD) / RAY_PERIOD;
    if cycle % 2 == 1 {
        phase = 1.0 - phase;
    }
    let t = Easing::EaseInOut.apply(phase);
    let opacity = if t < 0.5 {
        0.7 * t * 2.0
    } else {
        0.7 + (0.5 - 0.7) * (t - 0.5) * 2.0
    };
    (opacity, t)
}

fn palette(hexes: &[&str]) -> Vec<Color> {
    hexes.iter().filter_map(|hex| Color::hex(hex)).collect()
}

pub struct FinalRenderer {
    viewport: Viewport,
    timeline: Timeline<FinalStage>,
    hearts: ParticleSystem,
    sparks: ParticleSystem,
    heart_timer: Option<CallbackId>,
    closing_timer: Option<CallbackId>,
    closing_line: Reveal,
    rng: ThreadRng,
}

impl FinalRenderer {
    pub fn new() -> Self {
        Self {
            viewport: Viewport::new(0.0, 0.0),
            timeline: Timeline::new(&STAGES, STAGE_WINDOW),
            hearts: ParticleSystem::new(120),
            sparks: ParticleSystem::new(200),
            heart_timer: None,
            closing_timer: None,
            closing_line: Reveal::new(),
            rng: rand::rng(),
        }
    }

    pub fn stage(&self) -> FinalStage {
        self.timeline.stage()
    }

    fn elapsed(&self) -> f32 {
        self.timeline.elapsed()
    }

    fn spawn_heart(&mut self) {
        let colors = palette(&HEART_PALETTE);
        let Viewport { width, height } = self.viewport;
        let start = Vec2::new(self.rng.random::<f32>() * width, height + 20.0);
        let velocity = Vec2::new(
            self.rng.random_range(-20.0..20.0),
            -self.rng.random_range(60.0..120.0),
        );
        let color = colors[self.rng.random_range(0..colors.len())].with_alpha(0.8);
        let heart = Particle::new(
            ParticleShape::Heart,
            start,
            velocity,
            self.rng.random_range(5.0..8.0),
        )
        .size(self.rng.random_range(10.0..22.0))
        .color(color)
        .spin(self.rng.random_range(-0.3..0.3), self.rng.random_range(-0.4..0.4));
        self.hearts.spawn(heart);
    }

    fn starburst(&mut self) {
        let center = self.viewport.center();
        let colors = palette(&STARBURST_PALETTE);
        self.sparks.burst(&mut self.rng, center, 90, 240.0, &colors);
    }

    fn draw_rays(&self, layer: &mut Layer) {
        let origin = Vec2::new(self.viewport.width / 2.0, 0.0);
        let length = self.viewport.height;
        for i in 0..RAY_COUNT {
            let (opacity, extent) = ray_pulse(self.elapsed(), i);
            if opacity <= 0.0 || extent <= 0.0 {
                continue;
            }
            layer.save();
            layer.translate(origin);
            layer.rotate((i as f32 * RAY_SPACING_DEG).to_radians());
            layer.fill_rect(
                Rect::new(-RAY_WIDTH / 2.0, 0.0, RAY_WIDTH, length * extent),
                Color::WHITE.with_alpha(0.2 * opacity),
            );
            layer.restore();
        }
    }

    fn draw_cross(&self, layer: &mut Layer) {
        let progress = Easing::EaseOut.apply(ramp(
            self.elapsed(),
            STAGES[1].starts_at,
            CROSS_DURATION,
        ));
        if progress <= 0.0 {
            return;
        }
        let center = self.viewport.center();
        let color = Color::WHITE.with_alpha(CROSS_OPACITY * progress);
        layer.save();
        layer.translate(center);
        layer.scale(progress);
        // Upright 8x256, crossbar 160x8 a quarter of the way down.
        layer.fill_rect(Rect::new(-4.0, -128.0, 8.0, 256.0), color);
        layer.fill_rect(Rect::new(-80.0, -128.0 + 64.0, 160.0, 8.0), color);
        layer.restore();
    }

    fn draw_text(&self, canvas: &mut Canvas) {
        let now = self.elapsed();
        let panel_in = Easing::EaseOut.apply(ramp(now, PANEL_DELAY, PANEL_FADE));
        let panel = draw_caption(
            canvas,
            SceneId::Final.caption(),
            panel_in,
            50.0 * (1.0 - panel_in),
        );

        let quote = ramp(now, QUOTE_DELAY, QUOTE_FADE);
        let accent = TextStyle::Accent.pixel_size();
        canvas.text(
            TextRun::new(
                QUOTE,
                panel.center().x,
                panel.y - accent * 3.2,
                TextStyle::Accent,
            )
            .color(Color::WHITE.fade(quote))
            .centered()
            .wrap(panel.width),
        );
        canvas.text(
            TextRun::new(
                CLOSING_LINE,
                panel.center().x,
                panel.y + panel.height + 24.0,
                TextStyle::Accent,
            )
            .color(Color::WHITE.fade(self.closing_line.opacity(now, CLOSING_FADE)))
            .centered(),
        );
    }
}

impl Default for FinalRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneRenderer for FinalRenderer {
    fn mount(&mut self, ctx: &mut MountContext<'_>) {
        self.viewport = ctx.viewport();
        self.timeline = Timeline::new(&STAGES, STAGE_WINDOW);
        self.closing_line = Reveal::new();
        self.hearts.clear();
        self.sparks.clear();
        self.heart_timer = Some(ctx.every(HEART_PERIOD));
        self.closing_timer = Some(ctx.after(CLOSING_DELAY));
    }

    fn resize(&mut self, viewport: Viewport) {
        self.hearts.rescale(self.viewport, viewport);
        self.sparks.rescale(self.viewport, viewport);
        self.viewport = viewport;
    }

    fn update(&mut self, frame: &FrameContext) {
        if let Some(stage) = self.timeline.advance(frame.dt) {
            log::info!("[final] entering {stage:?}");
            if stage == FinalStage::Eternity {
                self.starburst();
            }
        }
        self.hearts.update(frame.dt);
        self.sparks.update(frame.dt);
    }

    fn on_timer(&mut self, timer: CallbackId) {
        if self.heart_timer == Some(timer) {
            if self.timeline.stage() >= FinalStage::Hearts {
                self.spawn_heart();
            }
        } else if self.closing_timer == Some(timer) {
            self.closing_line.trigger(self.elapsed());
        }
    }

    fn draw(&self, canvas: &mut Canvas) {
        canvas.clear(Color::BLACK);
        let bounds = canvas.bounds();
        let center = canvas.center();
        let zoom = self.timeline.zoom();

        let layer = canvas.effects();
        layer.vertical_gradient(
            bounds,
            &[
                GradientStop::new(0.0, Color::rgb(0.192, 0.18, 0.506)),
                GradientStop::new(0.5, Color::rgb(0.345, 0.11, 0.529)),
                GradientStop::new(1.0, Color::BLACK),
            ],
        );

        layer.save();
        layer.translate(center);
        layer.scale(zoom);
        layer.translate(-center);
        self.draw_rays(layer);
        if self.timeline.stage() == FinalStage::Eternity {
            let grow = Easing::EaseOut.apply((self.timeline.stage_elapsed() / 3.0).min(1.0));
            layer.glow(
                center,
                self.viewport.min_side() * (0.2 + 0.5 * grow),
                Color::rgba(1.0, 0.95, 0.85, 0.25 * grow),
                Color::TRANSPARENT,
            );
        }
        self.draw_cross(layer);
        self.sparks.draw(layer);
        self.hearts.draw(layer);
        layer.restore();

        self.draw_text(canvas);
    }

    fn unmount(&mut self) {
        self.hearts.clear();
        self.sparks.clear();
        self.heart_timer = None;
        self.closing_timer = None;
    }

    fn entity_count(&self) -> usize {
        RAY_COUNT + 1 + self.hearts.len() + self.sparks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{FrameScheduler, MountedScene};

    const DT: f32 = 1.0 / 30.0;

    fn run(mounted: &mut MountedScene, scheduler: &mut FrameScheduler, seconds: f32) {
        for _ in 0..(seconds / DT).round() as usize {
            mounted.frame(DT, scheduler);
            for (_, id) in scheduler.advance(DT) {
                mounted.fire(id);
            }
        }
    }

    fn texts(mounted: &MountedScene) -> Vec<String> {
        let mut canvas = Canvas::new(1280.0, 720.0);
        mounted.draw(&mut canvas);
        canvas.texts().iter().map(|run| run.text.clone()).collect()
    }

    #[test]
    fn rays_are_staggered_and_pulse() {
        assert_eq!(ray_pulse(0.1, 1), (0.0, 0.0));
        let (opacity, extent) = ray_pulse(1.5, 0);
        assert!((opacity - 0.7).abs() < 1e-4);
        assert!((extent - 0.5).abs() < 1e-4);

        // End of the first cycle settles at 0.5, then the motion reverses.
        let (end, full) = ray_pulse(2.999, 0);
        assert!((end - 0.5).abs() < 1e-2);
        assert!(full > 0.99);
        let (back, shorter) = ray_pulse(4.5, 0);
        assert!((back - 0.7).abs() < 1e-4);
        assert!(shorter < full);
    }

    #[test]
    fn text_reveals_in_order() {
        let mut scheduler = FrameScheduler::new();
        let mut mounted = MountedScene::mount(
            SceneId::Final,
            Box::new(FinalRenderer::new()),
            Viewport::new(1280.0, 720.0),
            &mut scheduler,
        );

        run(&mut mounted, &mut scheduler, 0.5);
        assert!(texts(&mounted).is_empty());

        run(&mut mounted, &mut scheduler, 1.0);
        let shown = texts(&mounted);
        assert!(shown.iter().any(|t| t == "Amor Infinito"));
        assert!(!shown.iter().any(|t| t == QUOTE));

        run(&mut mounted, &mut scheduler, 1.0);
        assert!(texts(&mounted).iter().any(|t| t == QUOTE));
        assert!(!texts(&mounted).iter().any(|t| t == CLOSING_LINE));

        run(&mut mounted, &mut scheduler, 1.0);
        assert!(texts(&mounted).iter().any(|t| t == CLOSING_LINE));
        assert_eq!(scheduler.completed(), 1);
    }

    #[test]
    fn hearts_rise_from_the_hearts_stage() {
        let mut scheduler = FrameScheduler::new();
        let mut mounted = MountedScene::mount(
            SceneId::Final,
            Box::new(FinalRenderer::new()),
            Viewport::new(800.0, 600.0),
            &mut scheduler,
        );
        run(&mut mounted, &mut scheduler, 3.5);
        assert_eq!(mounted.entity_count(), RAY_COUNT + 1);

        run(&mut mounted, &mut scheduler, 2.0);
        assert!(mounted.entity_count() > RAY_COUNT + 1);
    }

    #[test]
    fn eternity_bursts_once() {
        let mut renderer = FinalRenderer::new();
        renderer.viewport = Viewport::new(800.0, 600.0);
        let frame = |elapsed| FrameContext {
            dt: 0.5,
            elapsed,
            viewport: Viewport::new(800.0, 600.0),
        };
        for i in 1..=14 {
            renderer.update(&frame(i as f32 * 0.5));
            if renderer.stage() == FinalStage::Eternity {
                break;
            }
        }
        assert_eq!(renderer.stage(), FinalStage::Eternity);
        assert_eq!(renderer.sparks.len(), 90);

        renderer.update(&frame(7.5));
        assert!(renderer.sparks.len() <= 90);
    }
}
