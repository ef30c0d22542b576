//! # Lovescale
//!
//! **An animated journey that answers "how much do I love you?" one scale at a time.**
//!
//! Six full-window scenes run in a fixed order: an opening starfield, the Earth and
//! its Moon, the solar system, the Milky Way, the observable universe and a
//! closing message. Each scene is a procedural renderer that draws itself every
//! frame into a 2D [`Canvas`]. A [`SceneSequencer`] owns the current scene,
//! drives animated transitions between them and keeps the audio in step.
//!
//! ## Quick Start
//!
//! ```no_run
//! fn main() -> Result<(), lovescale::AppError> {
//!     lovescale::run()
//! }
//! ```
//!
//! Arrow keys or the on-screen buttons move through the scenes and `M` toggles
//! sound. `LOVESCALE_FONT`, `LOVESCALE_SOUNDS` and `LOVESCALE_MUTED` override
//! the defaults in [`AppConfig`].

mod app;
mod assets;
mod audio;
mod canvas;
mod draw2d;
mod error;
mod gpu;
mod input;
mod link;
pub mod render;
mod render_target;
pub mod scene;
mod ui;

pub use app::{AppConfig, run, run_with_config};
pub use assets::{FontAtlas, Fonts};
pub use audio::{
    AudioBackend, AudioCollaborator, AudioController, CLICK_VOLUME, LogBackend, SCENE_VOLUME,
    Track, TrackId,
};
pub use canvas::{Canvas, GradientStop, Layer, LoadAction};
pub use draw2d::Draw2d;
pub use error::{AppError, FontError, LinkError};
pub use gpu::GpuContext;
pub use input::Input;
pub use link::{LinkOpener, SystemBrowser};
pub use render::{RendererFactory, SceneAction, SceneRenderer, Viewport};
pub use render_target::SceneTarget;
pub use scene::{Direction, SceneId, SceneSequencer, TransitionSpec};
pub use ui::{Align, Color, Rect, TextRun, TextStyle};

// Re-export glam math types for convenience
pub use glam::Vec2;

// Re-export commonly used winit types for convenience
pub use winit::keyboard::KeyCode;
