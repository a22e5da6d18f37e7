use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// `localStorage` key holding the chosen theme.
pub const THEME_KEY: &str = "theme-preference";

/// Name of the document event fired after a theme change.
pub const THEME_CHANGED_EVENT: &str = "themechanged";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Theme {
    #[default]
    Auto,
    Light,
    Dark,
    Darkest,
}

impl Theme {
    pub const ALL: [Theme; 4] = [Theme::Auto, Theme::Light, Theme::Dark, Theme::Darkest];

    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Auto => "auto",
            Theme::Light => "light",
            Theme::Dark => "dark",
            Theme::Darkest => "darkest",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Theme::Auto => "Auto",
            Theme::Light => "Light",
            Theme::Dark => "Dark",
            Theme::Darkest => "Darkest",
        }
    }

    pub fn icon(self) -> String {
        format!("/theme-icon-{}.svg", self.as_str())
    }

    /// Reads a stored preference; anything unrecognised means `Auto`.
    pub fn from_stored(value: Option<&str>) -> Self {
        value.and_then(|v| v.parse().ok()).unwrap_or_default()
    }

    /// Auto is expressed by the absence of a stored value.
    pub fn is_persisted(self) -> bool {
        self != Theme::Auto
    }

    /// Themes that follow the OS colour scheme for the background.
    pub fn follows_os(self) -> bool {
        matches!(self, Theme::Auto | Theme::Darkest)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown theme {0:?}")]
pub struct UnknownTheme(pub String);

impl FromStr for Theme {
    type Err = UnknownTheme;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Theme::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| UnknownTheme(s.to_string()))
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
