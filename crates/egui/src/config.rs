use serde::Deserialize;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

const DEFAULT_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "ogg", "m4a", "aac"];

/// Startup options. Read once and never written back.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dark_mode: bool,
    pub picker_directory: Option<PathBuf>,
    pub audio_extensions: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dark_mode: false,
            picker_directory: None,
            audio_extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl Config {
    fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("offline-player").join("config.toml"))
    }

    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                warn!(path = %path.display(), "ignoring malformed config: {e}");
                Self::default()
            }),
            Err(e) => {
                debug!(path = %path.display(), "no config loaded: {e}");
                Self::default()
            }
        }
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        let mut config: Self = toml::from_str(contents)?;
        config.audio_extensions.retain(|e| !e.trim().is_empty());
        if config.audio_extensions.is_empty() {
            config.audio_extensions = Self::default().audio_extensions;
        }
        Ok(config)
    }
}
