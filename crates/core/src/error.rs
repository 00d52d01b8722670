use std::fmt;

use crate::file_ref::FileRef;

/// The engine could not open or decode the selected file.
#[derive(Debug, thiserror::Error)]
#[error("failed to load '{file}': {source}")]
pub struct LoadError {
    pub file: FileRef,
    pub source: anyhow::Error,
}

impl LoadError {
    pub fn new(file: FileRef, source: impl Into<anyhow::Error>) -> Self {
        Self {
            file,
            source: source.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportOp {
    Play,
    Pause,
    Stop,
    Release,
}

impl fmt::Display for TransportOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportOp::Play => "play",
            TransportOp::Pause => "pause",
            TransportOp::Stop => "stop",
            TransportOp::Release => "release",
        })
    }
}

/// A transport call failed at the platform layer.
#[derive(Debug, thiserror::Error)]
#[error("audio engine failed to {op}: {source}")]
pub struct EngineError {
    pub op: TransportOp,
    pub source: anyhow::Error,
}

impl EngineError {
    pub fn new(op: TransportOp, source: impl Into<anyhow::Error>) -> Self {
        Self {
            op,
            source: source.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("failed to share '{file}': {source}")]
pub struct ShareError {
    pub file: FileRef,
    pub source: anyhow::Error,
}

impl ShareError {
    pub fn new(file: FileRef, source: impl Into<anyhow::Error>) -> Self {
        Self {
            file,
            source: source.into(),
        }
    }
}

/// Everything a controller operation can surface to the view.
///
/// A cancelled file pick is not in here: it is a normal outcome, not an error.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Share(#[from] ShareError),

    #[error("no audio file is loaded")]
    NoActiveSession,
}
