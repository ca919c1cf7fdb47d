use serde::{Deserialize, Serialize};

/// Declared sizing policy of a widget (`size-sync` attribute).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeSyncMode {
    /// Decide per resize: host if the container has an explicit size, else canvas.
    #[default]
    Auto,
    /// The host container dictates size; the canvas fills it.
    Host,
    /// The canvas dictates size; the host is resized to match.
    Canvas,
    /// Sizing is frozen.
    None,
}

impl SizeSyncMode {
    /// Case-insensitive parse. Anything unrecognized, including an absent or
    /// empty value, becomes `Auto`.
    pub fn normalize(raw: Option<&str>) -> Self {
        let Some(raw) = raw else {
            return Self::Auto;
        };
        match raw.trim().to_ascii_lowercase().as_str() {
            "host" => Self::Host,
            "canvas" => Self::Canvas,
            "none" => Self::None,
            _ => Self::Auto,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Host => "host",
            Self::Canvas => "canvas",
            Self::None => "none",
        }
    }
}

impl std::fmt::Display for SizeSyncMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
