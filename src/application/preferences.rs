//! Light/dark theme preference kept in client-local storage.

use std::fmt;

use super::session::ClientStorage;

pub const THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
}

impl ThemePreference {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(Self::Light),
            "dark" => Some(Self::Dark),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Dark => "dark",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Light => Self::Dark,
            Self::Dark => Self::Light,
        }
    }

    pub fn read(storage: &impl ClientStorage) -> Self {
        storage
            .get(THEME_KEY)
            .as_deref()
            .and_then(Self::parse)
            .unwrap_or_default()
    }

    /// Flip the stored preference and return the new value.
    pub fn toggle(storage: &mut impl ClientStorage) -> Self {
        let next = Self::read(storage).toggled();
        storage.set(THEME_KEY, next.as_str());
        next
    }
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::session::MemoryClientStorage;

    #[test]
    fn defaults_to_light_on_missing_or_unknown() {
        let mut storage = MemoryClientStorage::default();
        assert_eq!(ThemePreference::read(&storage), ThemePreference::Light);
        storage.set(THEME_KEY, "sepia");
        assert_eq!(ThemePreference::read(&storage), ThemePreference::Light);
    }

    #[test]
    fn toggle_alternates_and_persists() {
        let mut storage = MemoryClientStorage::default();
        assert_eq!(ThemePreference::toggle(&mut storage), ThemePreference::Dark);
        assert_eq!(storage.get(THEME_KEY).as_deref(), Some("dark"));
        assert_eq!(ThemePreference::toggle(&mut storage), ThemePreference::Light);
    }
}
