//! Error types.
//!
//! Scene logic never fails; these cover the host around it: the window, the
//! GPU, font discovery and handing links to the system browser.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal startup and event-loop failures.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("event loop error: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface supports no texture formats")]
    NoSurfaceFormat,
}

/// Font loading failures. All of them degrade to drawing without text.
#[derive(Error, Debug)]
pub enum FontError {
    #[error("failed to read font {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse font {path}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("no usable font among {0} candidates")]
    NotFound(usize),
}

/// Failures opening an external link.
#[derive(Error, Debug)]
pub enum LinkError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("opening links is not supported on this platform")]
    Unsupported,
}
