//! The playback session controller.
//!
//! Ties the file picker, the audio engine and the share service to one
//! [`Session`], and publishes a [`PlayerState`] snapshot for the view after
//! every change.
//!
//! Operations are serialized: each one holds the session lock for its whole
//! duration, including while the file picker is open. Anything issued in the
//! meantime queues behind it (the lock is FIFO) and then sees the result, never
//! a half-replaced handle.

use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, MutexGuard, watch};
use tracing::{debug, info};

use crate::collaborators::{AudioEngine, Cancelled, FileFilter, FileSelector, ShareService};
use crate::error::SessionError;
use crate::file_ref::FileRef;
use crate::session::{PlaybackState, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn is_dark(self) -> bool {
        matches!(self, ThemeMode::Dark)
    }
}

/// Everything the view renders from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PlayerState {
    pub file: Option<FileRef>,
    pub playback: PlaybackState,
    pub theme: ThemeMode,
    /// An operation is running or queued; transport controls should be disabled.
    pub busy: bool,
}

impl PlayerState {
    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }
}

pub struct PlaybackController<S, E: AudioEngine, H> {
    selector: S,
    engine: E,
    sharer: H,
    session: Mutex<Session<E::Handle>>,
    in_flight: AtomicUsize,
    state: watch::Sender<PlayerState>,
}

/// Marks one operation as in flight until dropped, on every exit path.
struct InFlight<'a> {
    count: &'a AtomicUsize,
    state: &'a watch::Sender<PlayerState>,
}

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize, state: &'a watch::Sender<PlayerState>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        state.send_if_modified(|s| !std::mem::replace(&mut s.busy, true));
        Self { count, state }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.state
                .send_if_modified(|s| std::mem::replace(&mut s.busy, false));
        }
    }
}

impl<S, E, H> PlaybackController<S, E, H>
where
    S: FileSelector,
    E: AudioEngine,
    H: ShareService,
{
    pub fn new(selector: S, engine: E, sharer: H) -> Self {
        let (state, _) = watch::channel(PlayerState::default());
        Self {
            selector,
            engine,
            sharer,
            session: Mutex::new(Session::new()),
            in_flight: AtomicUsize::new(0),
            state,
        }
    }

    pub fn with_theme(self, theme: ThemeMode) -> Self {
        self.state.send_modify(|s| s.theme = theme);
        self
    }

    /// Current snapshot.
    pub fn state(&self) -> PlayerState {
        self.state.borrow().clone()
    }

    /// Receiver that is notified on every published change.
    pub fn subscribe(&self) -> watch::Receiver<PlayerState> {
        self.state.subscribe()
    }

    pub fn toggle_theme(&self) -> ThemeMode {
        let mut theme = ThemeMode::default();
        self.state.send_modify(|s| {
            s.theme = s.theme.toggled();
            theme = s.theme;
        });
        debug!(?theme, "theme toggled");
        theme
    }

    /// Ask the user for an audio file and start playing it.
    ///
    /// Returns the loaded file, or `None` if the picker was dismissed (the
    /// session is untouched in that case).
    pub async fn pick_and_load(&self) -> Result<Option<FileRef>, SessionError> {
        let (_op, mut session) = self.begin().await;

        let file = match self.selector.select(FileFilter::Audio).await {
            Ok(file) => file,
            Err(Cancelled) => {
                debug!("file selection cancelled");
                return Ok(None);
            }
        };

        info!(%file, "file selected");
        let result = session.load(&self.engine, file.clone()).await;
        self.publish(&session);
        result.map(|()| Some(file))
    }

    pub async fn toggle_play_pause(&self) -> Result<PlaybackState, SessionError> {
        let (_op, mut session) = self.begin().await;
        let result = session.toggle_play_pause().await;
        self.publish(&session);
        result
    }

    pub async fn stop(&self) -> Result<(), SessionError> {
        let (_op, mut session) = self.begin().await;
        let result = session.stop().await;
        self.publish(&session);
        result
    }

    /// Hand the loaded file to the share service.
    ///
    /// Returns `false` without calling the service when nothing is loaded.
    pub async fn share(&self) -> Result<bool, SessionError> {
        let (_op, session) = self.begin().await;
        let Some(file) = session.file().cloned() else {
            debug!("nothing to share");
            return Ok(false);
        };

        self.sharer.share(&file).await?;
        info!(%file, "shared");
        Ok(true)
    }

    /// Release the engine handle. Safe to call any number of times; call it
    /// when the view goes away.
    pub async fn release(&self) -> Result<(), SessionError> {
        let (_op, mut session) = self.begin().await;
        let result = session.release().await;
        self.publish(&session);
        result
    }

    async fn begin(&self) -> (InFlight<'_>, MutexGuard<'_, Session<E::Handle>>) {
        let op = InFlight::enter(&self.in_flight, &self.state);
        let session = self.session.lock().await;
        (op, session)
    }

    fn publish(&self, session: &Session<E::Handle>) {
        let file = session.file().cloned();
        let playback = session.playback_state();
        self.state.send_if_modified(|s| {
            let changed = s.file != file || s.playback != playback;
            s.file = file;
            s.playback = playback;
            changed
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TransportOp;
    use crate::testing::{Gate, MockEngine, MockSelector, MockShare};
    use std::sync::Arc;
    use tokio::sync::Notify;

    type TestController = PlaybackController<MockSelector, MockEngine, MockShare>;

    fn controller(picks: &[&str]) -> (TestController, MockEngine) {
        let engine = MockEngine::default();
        let selector = MockSelector::with_picks(picks.iter().map(|p| Ok(FileRef::new(*p))));
        let controller = PlaybackController::new(selector, engine.clone(), MockShare::default());
        (controller, engine)
    }

    #[tokio::test]
    async fn test_initial_state() {
        let (c, _) = controller(&[]);
        let state = c.state();

        assert_eq!(state.file, None);
        assert_eq!(state.playback, PlaybackState::Empty);
        assert_eq!(state.theme, ThemeMode::Light);
        assert!(!state.busy);
    }

    #[tokio::test]
    async fn test_full_scenario() {
        let (c, engine) = controller(&["song.mp3", "other.mp3"]);

        let loaded = c.pick_and_load().await.unwrap();
        assert_eq!(loaded, Some(FileRef::new("song.mp3")));
        assert_eq!(c.state().playback, PlaybackState::Playing);
        assert_eq!(c.state().file, Some(FileRef::new("song.mp3")));

        assert_eq!(c.toggle_play_pause().await.unwrap(), PlaybackState::Paused);
        assert_eq!(c.state().playback, PlaybackState::Paused);

        c.stop().await.unwrap();
        assert_eq!(c.state().playback, PlaybackState::Stopped);
        assert_eq!(c.state().file, Some(FileRef::new("song.mp3")));

        c.pick_and_load().await.unwrap();
        assert_eq!(engine.released(), vec![FileRef::new("song.mp3")]);
        assert_eq!(engine.live_handles(), 1);
        assert_eq!(c.state().playback, PlaybackState::Playing);
        assert_eq!(c.state().file, Some(FileRef::new("other.mp3")));
    }

    #[tokio::test]
    async fn test_cancelled_pick_changes_nothing() {
        let (c, engine) = controller(&["song.mp3"]);
        c.pick_and_load().await.unwrap();
        c.toggle_play_pause().await.unwrap();
        let before = c.state();

        c.selector.push(Err(Cancelled));
        assert_eq!(c.pick_and_load().await.unwrap(), None);

        assert_eq!(c.state(), before);
        assert_eq!(engine.created().len(), 1);
        assert!(engine.released().is_empty());
    }

    #[tokio::test]
    async fn test_many_picks_leave_one_handle() {
        let picks: Vec<String> = (0..10).map(|i| format!("{i}.wav")).collect();
        let refs: Vec<&str> = picks.iter().map(String::as_str).collect();
        let (c, engine) = controller(&refs);

        for _ in 0..10 {
            c.pick_and_load().await.unwrap();
        }

        assert_eq!(engine.live_handles(), 1);
        assert_eq!(engine.released().len(), 9);
        assert_eq!(c.state().file, Some(FileRef::new("9.wav")));
    }

    #[tokio::test]
    async fn test_failed_load_is_reported_and_session_empty() {
        let (c, engine) = controller(&["good.mp3", "corrupt.mp3"]);
        c.pick_and_load().await.unwrap();
        engine.fail_create("corrupt.mp3");

        let err = c.pick_and_load().await.unwrap_err();
        assert!(matches!(err, SessionError::Load(_)));
        assert_eq!(c.state().playback, PlaybackState::Empty);
        assert_eq!(c.state().file, None);
        assert_eq!(engine.live_handles(), 0);

        // still usable afterwards
        c.selector.push(Ok(FileRef::new("good.mp3")));
        c.pick_and_load().await.unwrap();
        assert!(c.state().is_playing());
    }

    #[tokio::test]
    async fn test_toggle_without_file_reports_no_session() {
        let (c, engine) = controller(&[]);
        let err = c.toggle_play_pause().await.unwrap_err();

        assert!(matches!(err, SessionError::NoActiveSession));
        assert!(engine.calls().is_empty());
    }

    #[tokio::test]
    async fn test_stop_then_toggle_resumes_without_new_pick() {
        let (c, engine) = controller(&["song.mp3"]);
        c.pick_and_load().await.unwrap();

        c.stop().await.unwrap();
        assert_eq!(c.toggle_play_pause().await.unwrap(), PlaybackState::Playing);

        assert_eq!(c.selector.calls(), 1);
        assert_eq!(
            engine.calls(),
            vec![
                (FileRef::new("song.mp3"), TransportOp::Play),
                (FileRef::new("song.mp3"), TransportOp::Stop),
                (FileRef::new("song.mp3"), TransportOp::Play),
            ]
        );
    }

    #[tokio::test]
    async fn test_share_without_file_never_calls_service() {
        let (c, _) = controller(&[]);

        assert!(!c.share().await.unwrap());
        assert!(c.sharer.shared().is_empty());
    }

    #[tokio::test]
    async fn test_share_delegates_current_file_and_keeps_playback() {
        let (c, _) = controller(&["song.mp3"]);
        c.pick_and_load().await.unwrap();

        assert!(c.share().await.unwrap());
        assert_eq!(c.sharer.shared(), vec![FileRef::new("song.mp3")]);
        assert_eq!(c.state().playback, PlaybackState::Playing);
    }

    #[tokio::test]
    async fn test_share_failure_is_surfaced() {
        let selector = MockSelector::with_picks([Ok(FileRef::new("song.mp3"))]);
        let c = PlaybackController::new(selector, MockEngine::default(), MockShare::failing());
        c.pick_and_load().await.unwrap();

        let err = c.share().await.unwrap_err();
        assert!(matches!(err, SessionError::Share(_)));
        assert!(c.state().is_playing());
    }

    #[tokio::test]
    async fn test_release_twice_is_fine() {
        let (c, engine) = controller(&["song.mp3"]);
        c.pick_and_load().await.unwrap();

        c.release().await.unwrap();
        assert_eq!(c.state().playback, PlaybackState::Empty);
        c.release().await.unwrap();
        assert_eq!(c.state().playback, PlaybackState::Empty);

        assert_eq!(engine.released().len(), 1);
        assert_eq!(engine.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_dropping_controller_frees_handle() {
        let (c, engine) = controller(&["song.mp3"]);
        c.pick_and_load().await.unwrap();

        drop(c);
        assert_eq!(engine.live_handles(), 0);
    }

    #[tokio::test]
    async fn test_theme_toggle_is_published() {
        let (c, _) = controller(&[]);
        let mut rx = c.subscribe();
        rx.borrow_and_update();

        assert_eq!(c.toggle_theme(), ThemeMode::Dark);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().theme.is_dark());

        assert_eq!(c.toggle_theme(), ThemeMode::Light);
        assert!(!c.state().theme.is_dark());
    }

    #[tokio::test]
    async fn test_with_theme_sets_initial_theme() {
        let (c, _) = controller(&[]);
        let c = c.with_theme(ThemeMode::Dark);
        assert_eq!(c.state().theme, ThemeMode::Dark);
    }

    #[tokio::test]
    async fn test_toggle_during_pick_waits_for_new_handle() {
        let (entered_tx, mut entered) = watch::channel(false);
        let open = Arc::new(Notify::new());
        let selector = MockSelector::with_picks([Ok(FileRef::new("song.mp3"))]).gated(Gate {
            entered: entered_tx,
            open: Arc::clone(&open),
        });
        let engine = MockEngine::default();
        let c = PlaybackController::new(selector, engine.clone(), MockShare::default());

        let mut observer = entered.clone();
        let (loaded, toggled, busy_while_picking) = tokio::join!(
            c.pick_and_load(),
            async {
                entered.wait_for(|e| *e).await.unwrap();
                c.toggle_play_pause().await
            },
            async {
                observer.wait_for(|e| *e).await.unwrap();
                let busy = c.state().busy;
                // let the toggle reach the lock before the pick completes
                for _ in 0..4 {
                    tokio::task::yield_now().await;
                }
                open.notify_one();
                busy
            },
        );

        assert!(busy_while_picking);
        assert_eq!(loaded.unwrap(), Some(FileRef::new("song.mp3")));
        assert_eq!(toggled.unwrap(), PlaybackState::Paused);
        assert_eq!(c.state().playback, PlaybackState::Paused);
        assert!(!c.state().busy);
        assert_eq!(
            engine.calls(),
            vec![
                (FileRef::new("song.mp3"), TransportOp::Play),
                (FileRef::new("song.mp3"), TransportOp::Pause),
            ]
        );
    }

    #[tokio::test]
    async fn test_busy_clears_after_failure() {
        let (c, _) = controller(&[]);
        assert!(c.toggle_play_pause().await.is_err());
        assert!(!c.state().busy);
    }
}
