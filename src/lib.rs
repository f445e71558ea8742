//! Directional mouse-gesture recognition for text-editor hosts.
//!
//! A drag with the gesture button held produces a sequence of up to two
//! direction tokens; a completed gesture maps to one of a fixed set of
//! editor commands while an overlay draws the trail and the emerging token
//! label in real time. Recognition, rendering, and dispatch all run
//! synchronously inside the input-event callback.

pub mod commands;
pub mod engine;
pub mod hook;
pub mod logging;
pub mod overlay;
pub mod plugin;
pub mod recognizer;
pub mod settings;

pub use commands::{about_text, command_for, CommandSink, EditorCommand};
pub use engine::{classify_delta, Direction, GesturePhase, Point, SurfaceHandle};
pub use plugin::GesturePlugin;
pub use recognizer::{GestureRecognizer, SurfaceClassifier};
