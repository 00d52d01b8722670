use eframe::egui::{self, Color32, Visuals};
use player_core::ThemeMode;

/// Colors for one theme mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Palette {
    pub background: Color32,
    pub text: Color32,
    // Transport buttons
    pub button: Color32,
    pub button_text: Color32,
}

impl Palette {
    pub fn light() -> Self {
        Self {
            background: Color32::WHITE,
            text: Color32::BLACK,
            button: Color32::from_rgb(0x61, 0xda, 0xfb),
            button_text: Color32::WHITE,
        }
    }

    pub fn dark() -> Self {
        Self {
            background: Color32::from_rgb(0x28, 0x2c, 0x34),
            text: Color32::WHITE,
            button: Color32::from_rgb(0x4c, 0xaf, 0x50),
            button_text: Color32::WHITE,
        }
    }

    pub fn for_mode(mode: ThemeMode) -> Self {
        match mode {
            ThemeMode::Light => Self::light(),
            ThemeMode::Dark => Self::dark(),
        }
    }

    pub fn visuals(&self, mode: ThemeMode) -> Visuals {
        let mut visuals = if mode.is_dark() {
            Visuals::dark()
        } else {
            Visuals::light()
        };
        visuals.panel_fill = self.background;
        visuals.window_fill = self.background;
        visuals.override_text_color = Some(self.text);
        visuals
    }
}

/// Install the palette for `mode` on the context.
pub fn apply(ctx: &egui::Context, mode: ThemeMode) {
    let palette = Palette::for_mode(mode);
    ctx.set_visuals(palette.visuals(mode));
}

pub fn mode_label(mode: ThemeMode) -> &'static str {
    match mode {
        ThemeMode::Light => "Light Mode",
        ThemeMode::Dark => "Dark Mode",
    }
}
