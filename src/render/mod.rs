//! Procedural scene renderers and their mount lifecycle.
//!
//! Each scene of the journey is drawn by a [`SceneRenderer`]: an object that owns
//! its private entity set (stars, planets, particles...) for exactly as long as it
//! is mounted. The [`RendererFactory`] maps a [`SceneId`] to a constructor, and
//! [`MountedScene`] wraps a live renderer with its drawing surface and the frame
//! callback and timers it registered, so unmounting always cancels all of them.
//!
//! # Lifecycle
//!
//! ```text
//! factory.create(scene) -> MountedScene::mount -> (frame / fire / resize)* -> unmount
//! ```
//!
//! Renderers never see the GPU. They push shapes into a [`Canvas`] in
//! [`SceneRenderer::draw`].

mod earth;
mod finale;
mod milky_way;
mod opening;
pub mod particles;
pub mod scheduler;
mod solar_system;
pub mod starfield;
pub mod timeline;
mod universe;

use glam::Vec2;
use std::collections::HashMap;

use crate::canvas::Canvas;
use crate::scene::{Caption, Easing, SceneId};
use crate::ui::{Color, Rect, TextRun, TextStyle};

pub use earth::EarthRenderer;
pub use finale::FinalRenderer;
pub use milky_way::MilkyWayRenderer;
pub use opening::OpeningRenderer;
pub use scheduler::{CallbackId, FrameScheduler, OwnerId};
pub use solar_system::SolarSystemRenderer;
pub use universe::UniverseRenderer;

/// Live window dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }

    pub fn center(&self) -> Vec2 {
        self.size() / 2.0
    }

    pub fn min_side(&self) -> f32 {
        self.width.min(self.height)
    }

    /// True when there is nothing to draw into (e.g. a minimized window).
    pub fn is_empty(&self) -> bool {
        self.width < 1.0 || self.height < 1.0
    }

    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= 0.0 && point.y >= 0.0 && point.x <= self.width && point.y <= self.height
    }

    /// Map a point proportionally from this viewport into `to`.
    pub fn rescale(&self, point: Vec2, to: Viewport) -> Vec2 {
        if self.is_empty() {
            return point;
        }
        point * (to.size() / self.size())
    }
}

/// The drawing surface a mounted renderer owns, as far as the scene logic is concerned.
///
/// The GPU side keeps a matching render target; this records the dimensions the
/// renderer was last told about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    viewport: Viewport,
}

impl Surface {
    pub fn new(viewport: Viewport) -> Self {
        Self { viewport }
    }

    pub fn width(&self) -> f32 {
        self.viewport.width
    }

    pub fn height(&self) -> f32 {
        self.viewport.height
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// A zero-sized surface is not ready; frames are skipped until it is.
    pub fn is_ready(&self) -> bool {
        !self.viewport.is_empty()
    }

    fn resize(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }
}

/// What a renderer gets while mounting: the viewport and a way to register timers.
pub struct MountContext<'a> {
    viewport: Viewport,
    scheduler: &'a mut FrameScheduler,
    owner: OwnerId,
}

impl MountContext<'_> {
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Fire [`SceneRenderer::on_timer`] every `period` seconds while mounted.
    pub fn every(&mut self, period: f32) -> CallbackId {
        self.scheduler.set_interval(self.owner, period)
    }

    /// Fire [`SceneRenderer::on_timer`] once, `delay` seconds after mounting.
    pub fn after(&mut self, delay: f32) -> CallbackId {
        self.scheduler.set_timeout(self.owner, delay)
    }
}

/// Per-frame timing handed to [`SceneRenderer::update`].
#[derive(Clone, Copy, Debug)]
pub struct FrameContext {
    /// Seconds since the previous frame.
    pub dt: f32,
    /// Seconds since the renderer was mounted.
    pub elapsed: f32,
    pub viewport: Viewport,
}

/// Side effects a renderer can ask the host to perform on a click.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SceneAction {
    /// Open a fixed external link in the system browser.
    OpenLink(&'static str),
}

/// A procedurally animated scene.
///
/// Implementations own all their entities. `mount` creates them, `update` advances
/// them, `draw` paints them, and `unmount` drops them. Nothing is shared between
/// scenes or kept across remounts.
pub trait SceneRenderer {
    /// Allocate the entity set for `ctx.viewport()` and register any timers.
    fn mount(&mut self, ctx: &mut MountContext<'_>);

    /// The viewport changed size. Entities should be moved proportionally and
    /// must never reference the old dimensions afterwards.
    fn resize(&mut self, viewport: Viewport);

    /// Advance kinematics and timelines by one frame.
    fn update(&mut self, frame: &FrameContext);

    /// A timer registered during `mount` fired.
    fn on_timer(&mut self, _timer: CallbackId) {}

    /// Paint the current state.
    fn draw(&self, canvas: &mut Canvas);

    /// A click landed on the scene (outside the navigation controls).
    fn pointer(&mut self, _position: Vec2) -> Option<SceneAction> {
        None
    }

    /// Release the entity set.
    fn unmount(&mut self);

    /// Number of live simulated entities, for diagnostics.
    fn entity_count(&self) -> usize;
}

/// Constructor for a renderer, before it is mounted.
pub type RendererConstructor = fn() -> Box<dyn SceneRenderer>;

/// Maps each scene to the renderer that draws it.
pub struct RendererFactory {
    constructors: HashMap<SceneId, RendererConstructor>,
}

impl RendererFactory {
    /// An empty factory. Scenes without a constructor cannot be mounted.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// The six renderers of the journey.
    pub fn journey() -> Self {
        let mut factory = Self::new();
        factory.register(SceneId::Opening, || Box::new(OpeningRenderer::new()));
        factory.register(SceneId::Earth, || Box::new(EarthRenderer::new()));
        factory.register(SceneId::SolarSystem, || Box::new(SolarSystemRenderer::new()));
        factory.register(SceneId::MilkyWay, || Box::new(MilkyWayRenderer::new()));
        factory.register(SceneId::Universe, || Box::new(UniverseRenderer::new()));
        factory.register(SceneId::Final, || Box::new(FinalRenderer::new()));
        factory
    }

    pub fn register(&mut self, scene: SceneId, constructor: RendererConstructor) {
        self.constructors.insert(scene, constructor);
    }

    pub fn create(&self, scene: SceneId) -> Option<Box<dyn SceneRenderer>> {
        self.constructors.get(&scene).map(|construct| construct())
    }
}

impl Default for RendererFactory {
    fn default() -> Self {
        Self::journey()
    }
}

/// A renderer that is currently mounted, plus everything it registered.
pub struct MountedScene {
    scene: SceneId,
    owner: OwnerId,
    frame_callback: CallbackId,
    renderer: Box<dyn SceneRenderer>,
    surface: Surface,
    initialized: bool,
    elapsed: f32,
}

impl MountedScene {
    /// Mount `renderer` for `scene`. The frame callback is registered at once; the
    /// renderer's own `mount` runs as soon as the surface has a non-zero size.
    pub fn mount(
        scene: SceneId,
        renderer: Box<dyn SceneRenderer>,
        viewport: Viewport,
        scheduler: &mut FrameScheduler,
    ) -> Self {
        let owner = scheduler.new_owner();
        let frame_callback = scheduler.request_frame(owner);
        let mut mounted = Self {
            scene,
            owner,
            frame_callback,
            renderer,
            surface: Surface::new(viewport),
            initialized: false,
            elapsed: 0.0,
        };
        mounted.ensure_initialized(scheduler);
        log::debug!("[render] mounted {scene} as {owner:?}");
        mounted
    }

    fn ensure_initialized(&mut self, scheduler: &mut FrameScheduler) -> bool {
        if !self.initialized && self.surface.is_ready() {
            let mut ctx = MountContext {
                viewport: self.surface.viewport(),
                scheduler,
                owner: self.owner,
            };
            self.renderer.mount(&mut ctx);
            self.initialized = true;
        }
        self.initialized
    }

    pub fn scene(&self) -> SceneId {
        self.scene
    }

    pub fn owner(&self) -> OwnerId {
        self.owner
    }

    pub fn surface(&self) -> Surface {
        self.surface
    }

    /// Seconds of animation run since mounting (skipped frames excluded).
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn entity_count(&self) -> usize {
        self.renderer.entity_count()
    }

    /// Run one frame. Returns false if the frame was skipped because the surface
    /// is not ready or the frame callback is no longer registered.
    pub fn frame(&mut self, dt: f32, scheduler: &mut FrameScheduler) -> bool {
        if !scheduler.is_active(self.frame_callback)
            || !self.surface.is_ready()
            || !self.ensure_initialized(scheduler)
        {
            return false;
        }
        self.elapsed += dt;
        self.renderer.update(&FrameContext {
            dt,
            elapsed: self.elapsed,
            viewport: self.surface.viewport(),
        });
        true
    }

    /// Deliver a fired timer to the renderer. Dropped while the surface is not ready.
    pub fn fire(&mut self, timer: CallbackId) {
        if self.initialized && self.surface.is_ready() {
            self.renderer.on_timer(timer);
        }
    }

    pub fn resize(&mut self, viewport: Viewport, scheduler: &mut FrameScheduler) {
        if viewport == self.surface.viewport() {
            return;
        }
        self.surface.resize(viewport);
        if viewport.is_empty() {
            log::warn!("[render] {} surface is zero-sized, pausing", self.scene);
            return;
        }
        if self.initialized {
            self.renderer.resize(viewport);
        } else {
            self.ensure_initialized(scheduler);
        }
    }

    pub fn draw(&self, canvas: &mut Canvas) {
        if self.initialized && self.surface.is_ready() {
            self.renderer.draw(canvas);
        }
    }

    pub fn pointer(&mut self, position: Vec2) -> Option<SceneAction> {
        if self.initialized {
            self.renderer.pointer(position)
        } else {
            None
        }
    }

    /// Tear down the renderer and cancel every callback it registered.
    /// Returns the number of callbacks cancelled.
    pub fn unmount(mut self, scheduler: &mut FrameScheduler) -> usize {
        if self.initialized {
            self.renderer.unmount();
        }
        let cancelled = scheduler.cancel_owner(self.owner);
        log::debug!(
            "[render] unmounted {} ({} callbacks cancelled)",
            self.scene,
            cancelled
        );
        cancelled
    }
}

// ============================================================================
// Shared drawing helpers
// ============================================================================

/// Maximum width of a caption panel.
const CAPTION_MAX_WIDTH: f32 = 672.0;

/// Panel a caption occupies on a canvas of the given width.
pub fn caption_panel(caption: Caption, canvas_size: Vec2, rise: f32) -> Rect {
    let width = CAPTION_MAX_WIDTH.min(canvas_size.x - 48.0).max(120.0);
    let text_width = width - 48.0;
    let body_size = TextStyle::Body.pixel_size();
    // Rough line estimate for the panel height; exact wrapping happens at upload.
    let chars_per_line = (text_width / (body_size * 0.5)).max(1.0);
    let body_lines = if caption.body.is_empty() {
        0.0
    } else {
        (caption.body.chars().count() as f32 / chars_per_line).ceil()
    };
    let height = 48.0 + TextStyle::Title.pixel_size() * 1.3 + body_lines * body_size * 1.4;
    Rect::centered(canvas_size / 2.0 + Vec2::new(0.0, rise), width, height)
}

/// Draw a scene caption (title plus wrapped body) in a translucent panel and
/// return the panel's rectangle.
///
/// `opacity` fades the whole panel, `rise` shifts it down by that many pixels
/// (captions slide up into place as they appear).
pub fn draw_caption(canvas: &mut Canvas, caption: Caption, opacity: f32, rise: f32) -> Rect {
    let panel = caption_panel(caption, canvas.size(), rise);
    if opacity <= 0.0 {
        return panel;
    }
    canvas
        .overlay()
        .fill_rect(panel, Color::PANEL.fade(opacity));

    let center_x = panel.center().x;
    let title_y = panel.y + 24.0;
    canvas.text(
        TextRun::new(caption.title, center_x, title_y, TextStyle::Title)
            .color(Color::WHITE.fade(opacity))
            .centered(),
    );
    if !caption.body.is_empty() {
        canvas.text(
            TextRun::new(
                caption.body,
                center_x,
                title_y + TextStyle::Title.pixel_size() * 1.3,
                TextStyle::Body,
            )
            .color(Color::WHITE.fade(opacity))
            .centered()
            .wrap(panel.width - 48.0),
        );
    }
    panel
}

/// Standard caption entrance: fade in and slide up 50 px over one second after `delay`.
pub fn caption_entrance(elapsed: f32, delay: f32) -> (f32, f32) {
    let t = Easing::EaseOut.apply(timeline::ramp(elapsed, delay, 1.0));
    (t, 50.0 * (1.0 - t))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SEQUENCE;

    fn viewport() -> Viewport {
        Viewport::new(800.0, 600.0)
    }

    #[test]
    fn every_scene_has_a_renderer() {
        let factory = RendererFactory::journey();
        for scene in SEQUENCE {
            assert!(factory.create(scene).is_some(), "{scene} has no renderer");
        }
        assert!(RendererFactory::new().create(SceneId::Earth).is_none());
    }

    #[test]
    fn mount_then_unmount_leaves_no_pending_callbacks() {
        let factory = RendererFactory::journey();
        for scene in SEQUENCE {
            let mut scheduler = FrameScheduler::new();
            let renderer = factory.create(scene).unwrap();
            let mounted = MountedScene::mount(scene, renderer, viewport(), &mut scheduler);
            assert!(scheduler.pending() > 0);

            mounted.unmount(&mut scheduler);
            assert_eq!(scheduler.pending(), 0, "{scene} leaked callbacks");
            assert_eq!(scheduler.registered(), scheduler.cancelled());
        }
    }

    #[test]
    fn resize_updates_surface_for_every_scene() {
        let factory = RendererFactory::journey();
        for scene in SEQUENCE {
            let mut scheduler = FrameScheduler::new();
            let renderer = factory.create(scene).unwrap();
            let mut mounted = MountedScene::mount(scene, renderer, viewport(), &mut scheduler);
            mounted.frame(1.0 / 60.0, &mut scheduler);

            let resized = Viewport::new(1920.0, 1080.0);
            mounted.resize(resized, &mut scheduler);
            assert_eq!(mounted.surface().width(), 1920.0);
            assert_eq!(mounted.surface().height(), 1080.0);

            assert!(mounted.frame(1.0 / 60.0, &mut scheduler));
            let mut canvas = Canvas::new(1920.0, 1080.0);
            mounted.draw(&mut canvas);
            mounted.unmount(&mut scheduler);
        }
    }

    #[test]
    fn zero_sized_surface_skips_frames_until_ready() {
        let mut scheduler = FrameScheduler::new();
        let renderer = RendererFactory::journey().create(SceneId::MilkyWay).unwrap();
        let mut mounted = MountedScene::mount(
            SceneId::MilkyWay,
            renderer,
            Viewport::new(0.0, 0.0),
            &mut scheduler,
        );

        assert!(!mounted.surface().is_ready());
        assert!(!mounted.frame(0.016, &mut scheduler));
        assert_eq!(mounted.entity_count(), 0);

        let mut canvas = Canvas::new(0.0, 0.0);
        mounted.draw(&mut canvas);
        assert!(canvas.effects_layer().is_empty());

        mounted.resize(viewport(), &mut scheduler);
        assert!(mounted.frame(0.016, &mut scheduler));
        assert!(mounted.entity_count() > 0);
    }

    #[test]
    fn shrinking_to_zero_pauses_a_running_scene() {
        let mut scheduler = FrameScheduler::new();
        let renderer = RendererFactory::journey().create(SceneId::Universe).unwrap();
        let mut mounted =
            MountedScene::mount(SceneId::Universe, renderer, viewport(), &mut scheduler);
        assert!(mounted.frame(0.1, &mut scheduler));

        mounted.resize(Viewport::new(0.0, 0.0), &mut scheduler);
        assert!(!mounted.surface().is_ready());
        assert!(!mounted.frame(0.1, &mut scheduler));
        assert!((mounted.elapsed() - 0.1).abs() < 1e-6);

        let mut canvas = Canvas::new(0.0, 0.0);
        mounted.draw(&mut canvas);
        assert!(canvas.effects_layer().is_empty());

        mounted.resize(viewport(), &mut scheduler);
        assert!(mounted.frame(0.1, &mut scheduler));
        assert!((mounted.elapsed() - 0.2).abs() < 1e-6);
    }

    #[test]
    fn frames_stop_once_callback_is_cancelled() {
        let mut scheduler = FrameScheduler::new();
        let renderer = RendererFactory::journey().create(SceneId::Opening).unwrap();
        let mut mounted = MountedScene::mount(SceneId::Opening, renderer, viewport(), &mut scheduler);
        assert!(mounted.frame(0.016, &mut scheduler));

        scheduler.cancel_owner(mounted.owner());
        assert!(!mounted.frame(0.016, &mut scheduler));
    }

    #[test]
    fn viewport_rescale_is_proportional() {
        let from = Viewport::new(100.0, 50.0);
        let to = Viewport::new(200.0, 200.0);
        assert_eq!(from.rescale(Vec2::new(50.0, 25.0), to), Vec2::new(100.0, 100.0));
        assert_eq!(
            Viewport::new(0.0, 0.0).rescale(Vec2::new(3.0, 4.0), to),
            Vec2::new(3.0, 4.0)
        );
    }

    #[test]
    fn caption_draws_panel_and_text() {
        let mut canvas = Canvas::new(1280.0, 720.0);
        draw_caption(&mut canvas, SceneId::Earth.caption(), 1.0, 0.0);
        assert_eq!(canvas.overlay_layer().vertex_count(), 6);
        assert_eq!(canvas.texts().len(), 2);

        let mut hidden = Canvas::new(1280.0, 720.0);
        let panel = draw_caption(&mut hidden, SceneId::Earth.caption(), 0.0, 0.0);
        assert!(hidden.texts().is_empty());
        assert_eq!(panel.center(), Vec2::new(640.0, 360.0));
    }

    #[test]
    fn caption_entrance_settles() {
        assert_eq!(caption_entrance(0.0, 0.5), (0.0, 50.0));
        let (opacity, rise) = caption_entrance(2.0, 0.5);
        assert_eq!(opacity, 1.0);
        assert!(rise.abs() < 1e-6);
    }
}
