//! User preferences and their string-encoded persistence.

use anyhow::Result;

pub const KEY_DARK_MODE: &str = "darkMode";
pub const KEY_HIDE_NSFW: &str = "hideNSFW";
pub const KEY_CONTENT_WIDTH: &str = "contentWidth";

/// Key-value port the controller reads and writes preference strings
/// through, keeping the feed store and presenter free of persistence.
pub trait PrefsPort: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub dark_mode: bool,
    pub hide_nsfw: bool,
    pub wide_content: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            dark_mode: true,
            hide_nsfw: true,
            wide_content: true,
        }
    }
}

impl Preferences {
    pub fn load(port: &dyn PrefsPort, theme: &str) -> Result<Self> {
        Ok(Self {
            dark_mode: initial_dark_mode(port.get(KEY_DARK_MODE)?.as_deref(), theme),
            hide_nsfw: loose_bool(port.get(KEY_HIDE_NSFW)?.as_deref()),
            wide_content: loose_bool(port.get(KEY_CONTENT_WIDTH)?.as_deref()),
        })
    }
}

/// Picks the starting theme. A darkMode value the user once toggled wins;
/// until one exists, the configured `ui.theme` seeds it, where `"light"`
/// is the only light value and everything else keeps the dark default.
pub fn initial_dark_mode(stored: Option<&str>, theme: &str) -> bool {
    match stored {
        Some(value) => loose_bool(Some(value)),
        None => theme != "light",
    }
}

/// Decodes the stored string form of a preference. Only the literal
/// `"false"` counts as false; anything else, absence included, is true.
/// Stored values from the original front end rely on this default-true
/// rule, so it must not be normalized away.
pub fn loose_bool(value: Option<&str>) -> bool {
    !matches!(value, Some("false"))
}

pub fn encode_bool(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
