pub mod collaborators;
pub mod controller;
pub mod cpal_engine;
pub mod error;
pub mod file_ref;
pub mod session;

#[cfg(test)]
pub(crate) mod testing;

pub use collaborators::{AudioEngine, Cancelled, EngineHandle, FileFilter, FileSelector, ShareService};
pub use controller::{PlaybackController, PlayerState, ThemeMode};
pub use cpal_engine::{CpalEngine, CpalHandle};
pub use error::{EngineError, LoadError, SessionError, ShareError, TransportOp};
pub use file_ref::FileRef;
pub use session::{PlaybackState, Session};
