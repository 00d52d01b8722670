use player_engine::AudioEngineHandle;
use player_transport::{AudioArc, frames_to_secs};
use tracing::{debug, info};

use crate::collaborators::{AudioEngine, EngineHandle};
use crate::error::{EngineError, LoadError, TransportOp};
use crate::file_ref::FileRef;

/// Decodes the whole file with symphonia and plays it on the default cpal
/// output device.
#[derive(Debug, Default, Clone, Copy)]
pub struct CpalEngine;

pub struct CpalHandle {
    file: FileRef,
    inner: AudioEngineHandle,
}

impl CpalHandle {
    fn command(
        &mut self,
        op: TransportOp,
        send: fn(&mut AudioEngineHandle) -> anyhow::Result<()>,
    ) -> Result<(), EngineError> {
        let status = self.inner.drain_status();
        if status.finished {
            info!(file = %self.file, "reached end of file");
        }
        if let Some(frame) = status.position {
            debug!(
                file = %self.file,
                position_secs = frames_to_secs(frame, self.inner.sample_rate()),
                %op,
                "transport command"
            );
        }

        send(&mut self.inner).map_err(|e| EngineError::new(op, e))
    }
}

impl AudioEngine for CpalEngine {
    type Handle = CpalHandle;

    async fn create(&self, file: &FileRef) -> Result<CpalHandle, LoadError> {
        let path = file
            .to_path()
            .ok_or_else(|| LoadError::new(file.clone(), anyhow::anyhow!("not a local file")))?;

        let inner = tokio::task::spawn_blocking(move || -> anyhow::Result<AudioEngineHandle> {
            let buffer = player_decode::decode_file(&path)?;
            let audio = AudioArc::from_buffer(buffer);
            debug!(path = %path.display(), ?audio, "decoded");
            player_engine::start(audio)
        })
        .await
        .map_err(|e| LoadError::new(file.clone(), e))?
        .map_err(|e| LoadError::new(file.clone(), e))?;

        info!(
            %file,
            duration_secs = frames_to_secs(inner.total_frames(), inner.sample_rate()),
            "audio output ready"
        );
        Ok(CpalHandle {
            file: file.clone(),
            inner,
        })
    }
}

impl EngineHandle for CpalHandle {
    async fn play(&mut self) -> Result<(), EngineError> {
        self.command(TransportOp::Play, AudioEngineHandle::play)
    }

    async fn pause(&mut self) -> Result<(), EngineError> {
        self.command(TransportOp::Pause, AudioEngineHandle::pause)
    }

    async fn stop(&mut self) -> Result<(), EngineError> {
        self.command(TransportOp::Stop, AudioEngineHandle::stop)
    }

    async fn release(self) -> Result<(), EngineError> {
        debug!(file = %self.file, "shutting down audio output");
        tokio::task::spawn_blocking(move || self.inner.shutdown())
            .await
            .map_err(|e| EngineError::new(TransportOp::Release, e))?
            .map_err(|e| EngineError::new(TransportOp::Release, e))
    }
}
