use std::future::Future;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, Sender};
use std::time::Duration;

use eframe::egui::{self, Button, Color32, RichText};
use player_core::{CpalEngine, PlaybackController, PlayerState, SessionError, ThemeMode};
use tokio::runtime::Runtime;
use tracing::{error, warn};

use crate::config::Config;
use crate::keybindings::{self, Action};
use crate::platform::{ClipboardShare, DialogSelector};
use crate::theme::{self, Palette};

type Controller = PlaybackController<DialogSelector, CpalEngine, ClipboardShare>;

const RELEASE_TIMEOUT: Duration = Duration::from_secs(2);

pub struct PlayerApp {
    controller: Arc<Controller>,
    runtime: Runtime,
    ctx: egui::Context,
    notices: Sender<Option<String>>,
    notice_rx: Receiver<Option<String>>,
    notice: Option<String>,
    applied_theme: Option<ThemeMode>,
}

impl PlayerApp {
    pub fn new(ctx: &egui::Context, runtime: Runtime, config: Config) -> Self {
        let selector = DialogSelector::new(config.picker_directory, config.audio_extensions);
        let theme = if config.dark_mode {
            ThemeMode::Dark
        } else {
            ThemeMode::Light
        };
        let controller = PlaybackController::new(
            selector,
            CpalEngine,
            ClipboardShare::new(ctx.clone()),
        )
        .with_theme(theme);

        // repaint whenever the controller publishes, including busy changes
        let mut state_rx = controller.subscribe();
        let repaint = ctx.clone();
        runtime.spawn(async move {
            while state_rx.changed().await.is_ok() {
                repaint.request_repaint();
            }
        });

        let (notices, notice_rx) = mpsc::channel();
        Self {
            controller: Arc::new(controller),
            runtime,
            ctx: ctx.clone(),
            notices,
            notice_rx,
            notice: None,
            applied_theme: None,
        }
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::PickMusic => self.spawn(|c| async move { c.pick_and_load().await.map(|_| ()) }),
            Action::PlayPause => {
                self.spawn(|c| async move { c.toggle_play_pause().await.map(|_| ()) })
            }
            Action::Stop => self.spawn(|c| async move { c.stop().await }),
            Action::Share => self.spawn(|c| async move { c.share().await.map(|_| ()) }),
            Action::ToggleTheme => {
                self.controller.toggle_theme();
            }
        }
    }

    /// Run one controller operation on the runtime. The outcome replaces the
    /// current notice.
    fn spawn<F, Fut>(&self, op: F)
    where
        F: FnOnce(Arc<Controller>) -> Fut,
        Fut: Future<Output = Result<(), SessionError>> + Send + 'static,
    {
        let fut = op(Arc::clone(&self.controller));
        let notices = self.notices.clone();
        let ctx = self.ctx.clone();
        self.runtime.spawn(async move {
            let notice = match fut.await {
                Ok(()) => None,
                Err(e) => {
                    warn!("{e}");
                    Some(e.to_string())
                }
            };
            // receiver only goes away with the app
            let _ = notices.send(notice);
            ctx.request_repaint();
        });
    }

    fn drain_notices(&mut self) {
        while let Ok(notice) = self.notice_rx.try_recv() {
            self.notice = notice;
        }
    }

    fn ui(&self, ui: &mut egui::Ui, state: &PlayerState, actions: &mut Vec<Action>) {
        let palette = Palette::for_mode(state.theme);

        ui.vertical_centered(|ui| {
            ui.add_space(24.0);
            ui.heading("Offline Music Player");
            ui.add_space(12.0);

            if ui.button(theme::mode_label(state.theme)).clicked() {
                actions.push(Action::ToggleTheme);
            }
            ui.add_space(12.0);

            match &state.file {
                Some(file) => ui.label(format!("Playing: {}", file.display_name())),
                None => ui.label("No file loaded"),
            };
            ui.add_space(12.0);

            let enabled = !state.busy;
            if transport_button(ui, &palette, Action::PickMusic, "Pick Music", enabled) {
                actions.push(Action::PickMusic);
            }

            let loaded = state.file.is_some();
            let toggle_label = if state.is_playing() { "Pause" } else { "Play" };
            if transport_button(ui, &palette, Action::PlayPause, toggle_label, enabled && loaded) {
                actions.push(Action::PlayPause);
            }
            if transport_button(ui, &palette, Action::Stop, "Stop", enabled && loaded) {
                actions.push(Action::Stop);
            }
            if transport_button(ui, &palette, Action::Share, "Share", enabled && loaded) {
                actions.push(Action::Share);
            }

            if let Some(notice) = &self.notice {
                ui.add_space(12.0);
                ui.colored_label(egui::Color32::RED, notice);
            }
        });
    }
}

/// Pick Music is labelled in the theme text color, the controls in white.
fn button_text(palette: &Palette, action: Action) -> Color32 {
    match action {
        Action::PickMusic => palette.text,
        _ => palette.button_text,
    }
}

fn transport_button(
    ui: &mut egui::Ui,
    palette: &Palette,
    action: Action,
    label: &str,
    enabled: bool,
) -> bool {
    let button = Button::new(RichText::new(label).color(button_text(palette, action)))
        .fill(palette.button)
        .min_size(egui::vec2(110.0, 32.0));
    ui.add_enabled(enabled, button).clicked()
}

impl eframe::App for PlayerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_notices();

        let state = self.controller.state();
        if self.applied_theme != Some(state.theme) {
            theme::apply(ctx, state.theme);
            self.applied_theme = Some(state.theme);
        }

        let mut actions = keybindings::pressed(ctx);
        if state.busy || state.file.is_none() {
            actions.retain(|a| !matches!(a, Action::PlayPause));
        }
        if state.busy {
            actions.retain(|a| !matches!(a, Action::PickMusic));
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            self.ui(ui, &state, &mut actions);
        });

        for action in actions {
            self.dispatch(action);
        }
    }
}

/// Wait at most `limit` for `release`. Returns whether it finished.
///
/// A pick still waiting on the open dialog holds the session, so release can
/// block indefinitely; the handle is then freed when the session drops.
async fn release_within<F>(release: F, limit: Duration) -> bool
where
    F: Future<Output = Result<(), SessionError>>,
{
    match tokio::time::timeout(limit, release).await {
        Ok(Ok(())) => true,
        Ok(Err(e)) => {
            error!("failed to release audio on exit: {e}");
            true
        }
        Err(_) => {
            warn!(?limit, "session still busy on exit, skipping release");
            false
        }
    }
}

impl Drop for PlayerApp {
    fn drop(&mut self) {
        self.runtime
            .block_on(release_within(self.controller.release(), RELEASE_TIMEOUT));
    }
}
