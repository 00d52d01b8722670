use tracing::{debug, info, warn};

use crate::collaborators::{AudioEngine, EngineHandle};
use crate::error::SessionError;
use crate::file_ref::FileRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Empty,
    Playing,
    Paused,
    Stopped,
}

impl PlaybackState {
    pub fn is_playing(&self) -> bool {
        matches!(self, PlaybackState::Playing)
    }

    pub fn is_loaded(&self) -> bool {
        !matches!(self, PlaybackState::Empty)
    }
}

struct Loaded<H> {
    file: FileRef,
    handle: H,
    state: PlaybackState,
}

/// The one file currently loaded, if any, and its transport state.
///
/// A file and its engine handle are stored together, so a handle can never
/// exist without the file it was created for. `state` is optimistic: it is
/// set by the action that causes a transition and never read back from the
/// engine.
pub struct Session<H: EngineHandle> {
    loaded: Option<Loaded<H>>,
}

impl<H: EngineHandle> Session<H> {
    pub fn new() -> Self {
        Self { loaded: None }
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.loaded
            .as_ref()
            .map_or(PlaybackState::Empty, |loaded| loaded.state)
    }

    pub fn is_playing(&self) -> bool {
        self.playback_state().is_playing()
    }

    pub fn file(&self) -> Option<&FileRef> {
        self.loaded.as_ref().map(|loaded| &loaded.file)
    }

    /// Replace whatever is loaded with `file` and start playing it.
    ///
    /// The previous handle is released before the new one is created. If the
    /// new file cannot be opened or started the session ends up empty.
    pub async fn load<E>(&mut self, engine: &E, file: FileRef) -> Result<(), SessionError>
    where
        E: AudioEngine<Handle = H>,
    {
        if let Err(e) = self.release().await {
            warn!("previous handle did not release cleanly: {e}");
        }

        let mut handle = engine.create(&file).await?;
        if let Err(e) = handle.play().await {
            if let Err(release_err) = handle.release().await {
                warn!(%file, "failed to release handle after play error: {release_err}");
            }
            return Err(e.into());
        }

        info!(%file, "loaded and playing");
        self.loaded = Some(Loaded {
            file,
            handle,
            state: PlaybackState::Playing,
        });
        Ok(())
    }

    /// Pause when playing, resume otherwise. Returns the new state.
    ///
    /// A failed engine call leaves the state as it was.
    pub async fn toggle_play_pause(&mut self) -> Result<PlaybackState, SessionError> {
        let loaded = self.loaded.as_mut().ok_or(SessionError::NoActiveSession)?;

        if loaded.state.is_playing() {
            loaded.handle.pause().await?;
            loaded.state = PlaybackState::Paused;
        } else {
            loaded.handle.play().await?;
            loaded.state = PlaybackState::Playing;
        }

        debug!(file = %loaded.file, state = ?loaded.state, "toggled");
        Ok(loaded.state)
    }

    /// Stop playback but keep the file loaded. No-op when empty.
    pub async fn stop(&mut self) -> Result<(), SessionError> {
        let Some(loaded) = self.loaded.as_mut() else {
            return Ok(());
        };

        loaded.handle.stop().await?;
        loaded.state = PlaybackState::Stopped;
        debug!(file = %loaded.file, "stopped");
        Ok(())
    }

    /// Release the engine handle, if any. The session is empty afterwards even
    /// when the engine reports an error.
    pub async fn release(&mut self) -> Result<(), SessionError> {
        let Some(loaded) = self.loaded.take() else {
            return Ok(());
        };

        debug!(file = %loaded.file, "releasing");
        loaded.handle.release().await?;
        Ok(())
    }
}

impl<H: EngineHandle> Default for Session<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: EngineHandle> Drop for Session<H> {
    fn drop(&mut self) {
        // handles free their platform resource on drop
        if let Some(loaded) = self.loaded.take() {
            debug!(file = %loaded.file, "session dropped with a live handle");
        }
    }
}
