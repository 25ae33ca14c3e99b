//! Resolved runtime configuration.

use std::path::{Path, PathBuf};

use cipher_core::AutosaveCoordinator;

use crate::cli::Cli;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioConfig {
    pub data_dir: PathBuf,
    pub debounce_ms: u64,
    pub quota_bytes: usize,
    pub autosave: bool,
}

impl StudioConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        let data_dir = cli.data_dir.clone().unwrap_or_else(|| {
            default_data_dir(
                std::env::var_os("XDG_DATA_HOME").as_deref().map(Path::new),
                std::env::var_os("HOME").as_deref().map(Path::new),
            )
        });
        Self {
            data_dir,
            debounce_ms: cli.debounce_ms,
            quota_bytes: cli.quota_bytes,
            autosave: !cli.no_autosave,
        }
    }

    /// Coordinator for a new studio session.
    pub fn autosave_coordinator(&self) -> AutosaveCoordinator {
        AutosaveCoordinator::with_debounce_ms(self.debounce_ms, self.autosave)
    }
}

/// `$XDG_DATA_HOME/cipherstudio`, else `$HOME/.local/share/cipherstudio`,
/// else `./.cipherstudio`. Empty variables count as unset.
pub fn default_data_dir(xdg_data_home: Option<&Path>, home: Option<&Path>) -> PathBuf {
    let non_empty = |p: Option<&Path>| p.filter(|p| !p.as_os_str().is_empty()).map(Path::to_path_buf);

    if let Some(xdg) = non_empty(xdg_data_home) {
        return xdg.join("cipherstudio");
    }
    if let Some(home) = non_empty(home) {
        return home.join(".local").join("share").join("cipherstudio");
    }
    PathBuf::from(".cipherstudio")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn data_dir_prefers_xdg() {
        assert_eq!(
            default_data_dir(Some(Path::new("/xdg")), Some(Path::new("/home/me"))),
            PathBuf::from("/xdg/cipherstudio")
        );
    }

    #[test]
    fn data_dir_falls_back_to_home_then_cwd() {
        assert_eq!(
            default_data_dir(Some(Path::new("")), Some(Path::new("/home/me"))),
            PathBuf::from("/home/me/.local/share/cipherstudio")
        );
        assert_eq!(default_data_dir(None, None), PathBuf::from(".cipherstudio"));
    }

    #[test]
    fn cli_values_flow_into_config() {
        let cli = Cli::try_parse_from([
            "cipherstudio",
            "--data-dir",
            "/srv/cs",
            "--debounce-ms",
            "250",
            "--quota-bytes",
            "1024",
            "--no-autosave",
        ])
        .expect("parse");
        let config = StudioConfig::from_cli(&cli);
        assert_eq!(config.data_dir, PathBuf::from("/srv/cs"));
        assert_eq!(config.quota_bytes, 1024);
        assert!(!config.autosave);

        let coordinator = config.autosave_coordinator();
        assert!(!coordinator.is_enabled());
        assert_eq!(coordinator.debounce().num_milliseconds(), 250);
    }
}
