//! Operator preferences kept in the local store.
//!
//! Read once at startup into [`ConsoleConfig`]; written back when the
//! operator changes them.

use tracing::{info, warn};

use crate::config::{ConsoleConfig, Theme};
use crate::error::Result;
use crate::store::KeyValueStore;

/// Local-store key of the theme preference.
pub const THEME_KEY: &str = "theme";

/// Preferences view over the local store.
pub struct Preferences<'a> {
    store: &'a dyn KeyValueStore,
}

impl<'a> Preferences<'a> {
    #[must_use]
    pub fn new(store: &'a dyn KeyValueStore) -> Self {
        Self { store }
    }

    /// The stored theme, if one was saved. An unrecognized value is ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn theme(&self) -> Result<Option<Theme>> {
        let Some(raw) = self.store.get(THEME_KEY).await? else {
            return Ok(None);
        };
        match raw.parse() {
            Ok(theme) => Ok(Some(theme)),
            Err(e) => {
                warn!(value = %raw, error = %e, "ignoring stored theme");
                Ok(None)
            }
        }
    }

    /// Persist the theme.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn set_theme(&self, theme: Theme) -> Result<()> {
        self.store.put(THEME_KEY, &theme.to_string()).await?;
        info!(%theme, "theme saved");
        Ok(())
    }

    /// Overlay stored preferences onto `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn apply(&self, config: &mut ConsoleConfig) -> Result<()> {
        if let Some(theme) = self.theme().await? {
            config.theme = theme;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::config::FileConfig;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn theme_round_trips_and_overrides_config() {
        let store = MemoryStore::new();
        let prefs = Preferences::new(&store);
        assert_eq!(prefs.theme().await.unwrap(), None);

        prefs.set_theme(Theme::Dark).await.unwrap();
        let no_env = |_: &str| None::<String>;
        let mut config =
            ConsoleConfig::from_sources(&no_env, PathBuf::from("/tmp/d"), FileConfig::default())
                .unwrap();
        prefs.apply(&mut config).await.unwrap();
        assert_eq!(config.theme, Theme::Dark);
    }

    #[tokio::test]
    async fn garbage_theme_is_ignored() {
        let store = MemoryStore::new();
        store.put(THEME_KEY, "neon").await.unwrap();
        assert_eq!(Preferences::new(&store).theme().await.unwrap(), None);
    }
}
