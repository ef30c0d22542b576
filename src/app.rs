//! Native window host: winit event loop, GPU passes and the scene sequencer.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::assets::Fonts;
use crate::audio::{AudioController, LogBackend};
use crate::canvas::{Canvas, Layer};
use crate::draw2d::Draw2d;
use crate::error::AppError;
use crate::gpu::GpuContext;
use crate::input::Input;
use crate::link::{LinkOpener, SystemBrowser};
use crate::render::{RendererFactory, SceneAction, Viewport};
use crate::render_target::SceneTarget;
use crate::scene::{Pose, SceneSequencer, TransitionPass, TransitionSpec};

/// Longest step fed to the scene clock; longer stalls are clamped.
const MAX_FRAME_DT: f32 = 0.1;

/// Configuration for the app window.
#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub transition: TransitionSpec,
    pub start_muted: bool,
    /// Explicit TTF/OTF font. System fonts are probed when unset.
    pub font_path: Option<PathBuf>,
    /// Directory holding the scene tracks and `click.mp3`.
    pub sound_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            title: "Quanto Eu Te Amo?".to_string(),
            width: 1280,
            height: 720,
            transition: TransitionSpec::default(),
            start_muted: false,
            font_path: None,
            sound_dir: PathBuf::from("assets/sounds"),
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `LOVESCALE_FONT`, `LOVESCALE_SOUNDS` and `LOVESCALE_MUTED`.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from any key/value source.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(font) = lookup("LOVESCALE_FONT").filter(|v| !v.is_empty()) {
            self.font_path = Some(PathBuf::from(font));
        }
        if let Some(dir) = lookup("LOVESCALE_SOUNDS").filter(|v| !v.is_empty()) {
            self.sound_dir = PathBuf::from(dir);
        }
        if let Some(muted) = lookup("LOVESCALE_MUTED") {
            match parse_flag(&muted) {
                Some(flag) => self.start_muted = flag,
                None => log::warn!("[config] ignoring LOVESCALE_MUTED={muted:?}"),
            }
        }
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn transition(mut self, transition: TransitionSpec) -> Self {
        self.transition = transition;
        self
    }

    pub fn muted(mut self, muted: bool) -> Self {
        self.start_muted = muted;
        self
    }

    pub fn font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = Some(path.into());
        self
    }

    pub fn sound_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sound_dir = dir.into();
        self
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Run the journey with configuration taken from the environment.
pub fn run() -> Result<(), AppError> {
    run_with_config(AppConfig::from_env())
}

/// Run the journey with an explicit configuration.
///
/// # Example
/// ```ignore
/// lovescale::run_with_config(AppConfig::new().size(1920, 1080).muted(true))?;
/// ```
pub fn run_with_config(config: AppConfig) -> Result<(), AppError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = LovescaleApp {
        state: AppState::Pending { config },
        error: None,
    };
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct LovescaleApp {
    state: AppState,
    /// Startup failure to report once the loop has exited.
    error: Option<AppError>,
}

enum AppState {
    Pending { config: AppConfig },
    Running(Box<Running>),
    Exited,
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    fonts: Option<Fonts>,
    scene_draw: Draw2d,
    overlay_draw: Draw2d,
    hud_draw: Draw2d,
    target: SceneTarget,
    composite: TransitionPass,
    sequencer: SceneSequencer<AudioController<LogBackend>>,
    links: SystemBrowser,
    input: Input,
    canvas: Canvas,
    hud: Layer,
    last_frame: Instant,
}

impl Running {
    fn new(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self, AppError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));
        let window = Arc::new(event_loop.create_window(window_attrs)?);

        let gpu = GpuContext::new(window.clone())?;
        let fonts = Fonts::discover(&gpu, config.font_path.as_deref());
        let format = gpu.format();
        let scene_draw = Draw2d::new(&gpu, format, None);
        let overlay_draw = Draw2d::new(&gpu, format, fonts.as_ref());
        let hud_draw = Draw2d::new(&gpu, format, None);
        let target = SceneTarget::new(&gpu);
        let composite = TransitionPass::new(&gpu);

        let mut audio = AudioController::new(LogBackend, &config.sound_dir, config.start_muted);
        audio.load();

        let size = window.inner_size();
        let viewport = Viewport::new(size.width as f32, size.height as f32);
        let sequencer =
            SceneSequencer::new(audio, RendererFactory::journey(), viewport, config.transition);

        Ok(Self {
            window,
            canvas: Canvas::new(viewport.width, viewport.height),
            gpu,
            fonts,
            scene_draw,
            overlay_draw,
            hud_draw,
            target,
            composite,
            sequencer,
            links: SystemBrowser,
            input: Input::new(),
            hud: Layer::new(),
            last_frame: Instant::now(),
        })
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.gpu.resize(width, height);
        let viewport = Viewport::new(width as f32, height as f32);
        if viewport.is_empty() {
            log::warn!("[app] window is zero-sized, pausing scene frames");
        }
        self.sequencer.resize(viewport);
    }

    fn frame(&mut self) {
        let now = Instant::now();
        let dt = now
            .duration_since(self.last_frame)
            .as_secs_f32()
            .min(MAX_FRAME_DT);
        self.last_frame = now;

        for &key in self.input.keys_pressed() {
            self.sequencer.handle_key(key);
        }
        for &click in self.input.clicks() {
            if let Some(SceneAction::OpenLink(url)) = self.sequencer.handle_click(click) {
                if let Err(err) = self.links.open(url) {
                    log::warn!("[app] {err}");
                }
            }
        }
        self.input.begin_frame();

        self.sequencer.frame(dt);

        self.canvas
            .begin(self.gpu.width() as f32, self.gpu.height() as f32);
        self.hud.reset();
        self.sequencer.draw(&mut self.canvas, &mut self.hud);
        let pose = self.sequencer.pose();
        self.render(pose);
    }

    fn render(&mut self, pose: Pose) {
        let gpu = &self.gpu;
        self.target.ensure_size(gpu);

        let output = match gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.reconfigure();
                return;
            }
            Err(err) => {
                log::warn!("[app] skipping frame: {err}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let resolution = glam::Vec2::new(gpu.width() as f32, gpu.height() as f32);

        self.scene_draw.clear();
        self.scene_draw.layer(self.canvas.effects_layer());
        self.scene_draw.prepare(gpu, resolution, Pose::CENTER);

        self.overlay_draw.clear();
        self.overlay_draw.layer(self.canvas.overlay_layer());
        if let Some(fonts) = &self.fonts {
            for run in self.canvas.texts() {
                self.overlay_draw.text(fonts, run);
            }
        }
        self.overlay_draw.prepare(gpu, resolution, pose);

        self.hud_draw.clear();
        self.hud_draw.layer(&self.hud);
        self.hud_draw.prepare(gpu, resolution, Pose::CENTER);

        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let load = self.target.load_op(self.canvas.load_action());
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &self.target.view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load,
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.scene_draw.render(&mut pass);
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Screen Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            self.composite.render(gpu, &mut pass, &self.target, pose);
            self.overlay_draw.render(&mut pass);
            self.hud_draw.render(&mut pass);
        }

        gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }

    fn shutdown(&mut self) {
        let cancelled = self.sequencer.shutdown();
        self.sequencer.audio_mut().stop_all();
        log::info!("[app] closing ({cancelled} callbacks cancelled)");
    }
}

impl ApplicationHandler for LovescaleApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config } = &self.state else {
            return;
        };
        match Running::new(event_loop, config) {
            Ok(running) => {
                log::info!("[app] window ready");
                running.window.request_redraw();
                self.state = AppState::Running(Box::new(running));
            }
            Err(err) => {
                log::error!("[app] startup failed: {err}");
                self.error = Some(err);
                self.state = AppState::Exited;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(running) = &mut self.state else {
            return;
        };

        running.input.handle_event(&event);

        match event {
            WindowEvent::CloseRequested => {
                running.shutdown();
                self.state = AppState::Exited;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.resize(size.width, size.height);
            }
            WindowEvent::RedrawRequested => {
                running.frame();
                running.window.request_redraw();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_journey() {
        let config = AppConfig::new();
        assert_eq!(config.title, "Quanto Eu Te Amo?");
        assert_eq!((config.width, config.height), (1280, 720));
        assert_eq!(config.transition, TransitionSpec::default());
        assert!(!config.start_muted);
        assert_eq!(config.sound_dir, PathBuf::from("assets/sounds"));
    }

    #[test]
    fn environment_overrides_defaults() {
        let config = AppConfig::new().with_overrides(env(&[
            ("LOVESCALE_FONT", "/fonts/serif.ttf"),
            ("LOVESCALE_SOUNDS", "/srv/sounds"),
            ("LOVESCALE_MUTED", "yes"),
        ]));
        assert_eq!(config.font_path, Some(PathBuf::from("/fonts/serif.ttf")));
        assert_eq!(config.sound_dir, PathBuf::from("/srv/sounds"));
        assert!(config.start_muted);
    }

    #[test]
    fn bad_mute_flag_is_ignored() {
        let config = AppConfig::new()
            .muted(true)
            .with_overrides(env(&[("LOVESCALE_MUTED", "maybe")]));
        assert!(config.start_muted);
        assert_eq!(parse_flag(" OFF "), Some(false));
    }

    #[test]
    fn builder_sets_fields() {
        let config = AppConfig::new()
            .title("Teste")
            .size(640, 480)
            .font("a.ttf")
            .sound_dir("snd")
            .transition(TransitionSpec::instant());
        assert_eq!(config.title, "Teste");
        assert_eq!(config.width, 640);
        assert_eq!(config.font_path, Some(PathBuf::from("a.ttf")));
        assert_eq!(config.sound_dir, PathBuf::from("snd"));
        assert_eq!(config.transition.duration, 0.0);
    }
}
