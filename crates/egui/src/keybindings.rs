use eframe::egui::{self, Key, KeyboardShortcut, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    PickMusic,
    PlayPause,
    Stop,
    Share,
    ToggleTheme,
}

pub fn keybindings() -> [(KeyboardShortcut, Action); 3] {
    [
        (KeyboardShortcut::new(Modifiers::NONE, Key::Space), Action::PlayPause),
        (KeyboardShortcut::new(Modifiers::COMMAND, Key::O), Action::PickMusic),
        (KeyboardShortcut::new(Modifiers::COMMAND, Key::T), Action::ToggleTheme),
    ]
}

/// Consume every bound shortcut pressed this frame.
pub fn pressed(ctx: &egui::Context) -> Vec<Action> {
    ctx.input_mut(|input| {
        keybindings()
            .into_iter()
            .filter(|(shortcut, _)| input.consume_shortcut(shortcut))
            .map(|(_, action)| action)
            .collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bindings_are_distinct() {
        let bindings = keybindings();
        for (i, (a, _)) in bindings.iter().enumerate() {
            for (b, _) in &bindings[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_nothing_pressed_without_input() {
        let ctx = egui::Context::default();
        assert!(pressed(&ctx).is_empty());
    }
}
