//! Narrow interfaces to the platform services the controller drives.
//!
//! Every call may suspend. Implementations for the desktop live in
//! [`crate::cpal_engine`] and in the view crate.

use std::future::Future;

use crate::error::{EngineError, LoadError, ShareError};
use crate::file_ref::FileRef;

/// The user dismissed the file picker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("file selection cancelled")]
pub struct Cancelled;

/// Kind of file the picker should offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFilter {
    Audio,
}

pub trait FileSelector {
    fn select(&self, filter: FileFilter) -> impl Future<Output = Result<FileRef, Cancelled>>;
}

pub trait AudioEngine {
    type Handle: EngineHandle;

    /// Open `file` and return a handle that is loaded but not yet playing.
    fn create(&self, file: &FileRef) -> impl Future<Output = Result<Self::Handle, LoadError>>;
}

/// A live playback resource.
///
/// `release` consumes the handle. Implementations must also free the platform
/// resource when a handle is dropped without being released.
pub trait EngineHandle: Sized {
    fn play(&mut self) -> impl Future<Output = Result<(), EngineError>>;

    fn pause(&mut self) -> impl Future<Output = Result<(), EngineError>>;

    fn stop(&mut self) -> impl Future<Output = Result<(), EngineError>>;

    fn release(self) -> impl Future<Output = Result<(), EngineError>>;
}

pub trait ShareService {
    fn share(&self, file: &FileRef) -> impl Future<Output = Result<(), ShareError>>;
}
