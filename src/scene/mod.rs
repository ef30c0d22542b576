//! The journey's scenes and how the app moves between them.
//!
//! # Overview
//!
//! - [`SceneId`] names the six scenes, ordered by [`SEQUENCE`].
//! - [`SceneSequencer`] owns the [`NavigationState`]. It is the only thing that
//!   changes the current scene, and it tells the audio collaborator about it.
//! - [`Stage`] keeps exactly one renderer mounted and plays the exit and enter
//!   phases of each change in turn.
//! - [`TransitionPass`] composites the mounted scene under the current [`Pose`].
//!
//! # Example
//!
//! ```ignore
//! use lovescale::scene::{Navigate, SceneSequencer, TransitionSpec};
//!
//! let mut seq = SceneSequencer::new(audio, RendererFactory::journey(), viewport, TransitionSpec::default());
//! seq.navigate_next();
//! seq.frame(1.0 / 60.0);
//! ```

mod navigation;
pub mod scene;
mod sequencer;
mod stage;
mod transition;
mod transition_pass;

pub use navigation::{
    BOTTOM_MARGIN, BUTTON_GAP, BUTTON_SIZE, ButtonStyle, MuteIndicator, NavButton, NavIntent,
    Navigate, NavigationBar,
};
pub use scene::{Caption, SEQUENCE, SceneId};
pub use sequencer::{KeyBinding, NavigationState, SceneSequencer};
pub use stage::Stage;
pub use transition::{
    ActiveTransition, Direction, Easing, Pose, TransitionPhase, TransitionSpec,
};
pub use transition_pass::TransitionPass;
