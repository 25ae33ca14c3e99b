//! UI theme preference, stored independently of project data.

use cipher_core::Theme;

use crate::error::StoreError;
use crate::keyed::{KeyedStore, KeyedStoreExt};

pub const THEME_KEY: &str = "cipher-studio-theme";

pub struct ThemeStore<S> {
    store: S,
}

impl<S: KeyedStore> ThemeStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Stored theme, falling back to the default when absent or unreadable.
    pub fn theme(&self) -> Theme {
        match self.store.read_as::<Theme>(THEME_KEY) {
            Ok(theme) => theme.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, "unreadable theme preference, using default");
                Theme::default()
            }
        }
    }

    pub fn set_theme(&self, theme: Theme) -> Result<(), StoreError> {
        self.store.write_as(THEME_KEY, &theme)
    }

    /// Flip between light and dark; returns the new theme.
    pub fn toggle_theme(&self) -> Result<Theme, StoreError> {
        let next = self.theme().toggle();
        self.set_theme(next)?;
        Ok(next)
    }
}
