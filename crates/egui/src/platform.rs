//! Desktop implementations of the picker and share collaborators.

use std::path::PathBuf;

use eframe::egui;
use player_core::{Cancelled, FileFilter, FileRef, FileSelector, ShareError, ShareService};
use tracing::debug;

/// Native open dialog.
pub struct DialogSelector {
    directory: Option<PathBuf>,
    extensions: Vec<String>,
}

impl DialogSelector {
    pub fn new(directory: Option<PathBuf>, extensions: Vec<String>) -> Self {
        Self {
            directory,
            extensions,
        }
    }

    fn dialog(&self, filter: FileFilter) -> rfd::AsyncFileDialog {
        let mut dialog = rfd::AsyncFileDialog::new().set_title("Pick Music");
        match filter {
            FileFilter::Audio => {
                dialog = dialog.add_filter("Audio", self.extensions.as_slice());
            }
        }
        if let Some(directory) = &self.directory {
            dialog = dialog.set_directory(directory);
        }
        dialog
    }
}

impl FileSelector for DialogSelector {
    async fn select(&self, filter: FileFilter) -> Result<FileRef, Cancelled> {
        let handle = self.dialog(filter).pick_file().await.ok_or(Cancelled)?;
        debug!(path = %handle.path().display(), "picked");
        Ok(FileRef::from(handle.path()))
    }
}

/// Puts the file reference on the system clipboard.
pub struct ClipboardShare {
    ctx: egui::Context,
}

impl ClipboardShare {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl ShareService for ClipboardShare {
    async fn share(&self, file: &FileRef) -> Result<(), ShareError> {
        if let Some(path) = file.to_path() {
            if !path.exists() {
                return Err(ShareError::new(
                    file.clone(),
                    anyhow::anyhow!("{} no longer exists", path.display()),
                ));
            }
        }

        self.ctx.copy_text(file.to_string());
        self.ctx.request_repaint();
        Ok(())
    }
}
