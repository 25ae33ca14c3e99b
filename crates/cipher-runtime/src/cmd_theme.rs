//! `cipherstudio theme`: light/dark preference.

use cipher_core::Theme;
use cipher_store::{KeyedStore, StoreError, ThemeStore};

use crate::cli::ThemeAction;

/// Apply `action` and return the resulting theme.
pub fn apply<S: KeyedStore>(
    themes: &ThemeStore<S>,
    action: ThemeAction,
) -> Result<Theme, StoreError> {
    let theme = match action {
        ThemeAction::Show => themes.theme(),
        ThemeAction::Toggle => themes.toggle_theme()?,
        ThemeAction::Light => {
            themes.set_theme(Theme::Light)?;
            Theme::Light
        }
        ThemeAction::Dark => {
            themes.set_theme(Theme::Dark)?;
            Theme::Dark
        }
    };
    Ok(theme)
}

/// Entry point for `cipherstudio theme`.
pub fn cmd_theme<S: KeyedStore>(themes: &ThemeStore<S>, action: ThemeAction) -> anyhow::Result<()> {
    println!("{}", apply(themes, action)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use cipher_store::MemoryStore;

    #[test]
    fn show_defaults_to_dark_and_writes_nothing() {
        let store = MemoryStore::new();
        let themes = ThemeStore::new(&store);
        assert_eq!(apply(&themes, ThemeAction::Show).expect("show"), Theme::Dark);
        assert_eq!(store.read(cipher_store::THEME_KEY).expect("read"), None);
    }

    #[test]
    fn explicit_and_toggle() {
        let themes = ThemeStore::new(MemoryStore::new());
        assert_eq!(apply(&themes, ThemeAction::Light).expect("light"), Theme::Light);
        assert_eq!(apply(&themes, ThemeAction::Toggle).expect("toggle"), Theme::Dark);
        assert_eq!(apply(&themes, ThemeAction::Toggle).expect("toggle"), Theme::Light);
        assert_eq!(apply(&themes, ThemeAction::Show).expect("show"), Theme::Light);
        assert_eq!(apply(&themes, ThemeAction::Dark).expect("dark"), Theme::Dark);
    }
}
