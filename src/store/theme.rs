use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use tracing::warn;

use crate::storage::{self, Storage, StorageError, keys};

/// Colour scheme preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Self::Light),
            "dark" => Ok(Self::Dark),
            other => Err(format!("unknown theme: {other}")),
        }
    }
}

/// Theme preference persisted under `theme`.
#[derive(Debug)]
pub struct ThemeStore {
    theme: Theme,
    storage: Arc<dyn Storage>,
}

impl ThemeStore {
    /// Load the saved preference; anything unrecognized means light.
    pub fn load(storage: Arc<dyn Storage>) -> Self {
        let theme = storage::read(storage.as_ref(), keys::THEME)
            .and_then(|raw| {
                raw.parse()
                    .inspect_err(|e: &String| warn!(error = %e, "Ignoring saved theme"))
                    .ok()
            })
            .unwrap_or_default();
        Self { theme, storage }
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn set(&mut self, theme: Theme) -> Result<(), StorageError> {
        self.storage.set(keys::THEME, theme.as_str())?;
        self.theme = theme;
        Ok(())
    }

    pub fn toggle(&mut self) -> Result<Theme, StorageError> {
        let next = self.theme.toggled();
        self.set(next)?;
        Ok(next)
    }
}
