use std::fmt;
use std::path::{Path, PathBuf};

const FILE_SCHEME: &str = "file://";

/// Opaque reference to a user-chosen audio file.
///
/// Holds either a plain filesystem path or a URI as handed out by a file
/// picker. Only `file://` URIs and plain paths resolve to something the
/// desktop engine can open; other schemes are carried around untouched.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef(String);

impl FileRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last `/`-separated segment, percent-decoded when possible.
    ///
    /// ```
    /// use player_core::FileRef;
    ///
    /// let file = FileRef::new("file:///music/My%20Song.mp3");
    /// assert_eq!(file.display_name(), "My Song.mp3");
    /// ```
    pub fn display_name(&self) -> String {
        let segment = self
            .0
            .trim_end_matches('/')
            .rsplit(['/', std::path::MAIN_SEPARATOR])
            .next()
            .unwrap_or_default();
        match urlencoding::decode(segment) {
            Ok(decoded) => decoded.into_owned(),
            Err(_) => segment.to_string(),
        }
    }

    /// Local path for this reference, or `None` for non-file URI schemes.
    pub fn to_path(&self) -> Option<PathBuf> {
        if let Some(rest) = self.0.strip_prefix(FILE_SCHEME) {
            // file://localhost/path is the same as file:///path
            let rest = rest.strip_prefix("localhost").unwrap_or(rest);
            let decoded = urlencoding::decode(rest)
                .map(|d| d.into_owned())
                .unwrap_or_else(|_| rest.to_string());
            return Some(PathBuf::from(decoded));
        }
        if self.0.contains("://") {
            return None;
        }
        Some(PathBuf::from(&self.0))
    }
}

impl fmt::Display for FileRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for FileRef {
    fn from(uri: &str) -> Self {
        Self::new(uri)
    }
}

impl From<String> for FileRef {
    fn from(uri: String) -> Self {
        Self(uri)
    }
}

impl From<&Path> for FileRef {
    fn from(path: &Path) -> Self {
        Self(path.to_string_lossy().into_owned())
    }
}

impl From<PathBuf> for FileRef {
    fn from(path: PathBuf) -> Self {
        Self::from(path.as_path())
    }
}
