//! CLI definition using clap derive.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use cipher_core::DEFAULT_DEBOUNCE_MS;

/// Per-value storage budget, the size of a typical browser local-storage quota.
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

#[derive(Parser)]
#[command(name = "cipherstudio", about = "Project manager and studio session for small web projects")]
pub struct Cli {
    /// Data directory (default: $XDG_DATA_HOME/cipherstudio)
    #[arg(long, global = true, env = "CIPHER_STUDIO_HOME")]
    pub data_dir: Option<PathBuf>,

    /// Autosave debounce window in milliseconds
    #[arg(long, global = true, env = "CIPHER_STUDIO_DEBOUNCE_MS", default_value_t = DEFAULT_DEBOUNCE_MS)]
    pub debounce_ms: u64,

    /// Largest serialized value the store accepts, in bytes
    #[arg(long, global = true, env = "CIPHER_STUDIO_QUOTA_BYTES", default_value_t = DEFAULT_QUOTA_BYTES)]
    pub quota_bytes: usize,

    /// Start studio sessions with autosave turned off
    #[arg(long, global = true)]
    pub no_autosave: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// List projects, most recently updated first
    Ls(LsOpts),
    /// Create a project from the default template
    New { name: String },
    /// Delete a project
    Rm { id: String },
    /// Rename a project
    Rename { id: String, name: String },
    /// Show or change the UI theme
    Theme {
        #[arg(value_enum, default_value_t = ThemeAction::Show)]
        action: ThemeAction,
    },
    /// Open an interactive studio session on a project
    Studio { id: String },
}

#[derive(clap::Args, Default)]
pub struct LsOpts {
    /// Print the list as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ThemeAction {
    Show,
    Toggle,
    Light,
    Dark,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_invocation_has_no_command() {
        let cli = Cli::try_parse_from(["cipherstudio"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.debounce_ms, DEFAULT_DEBOUNCE_MS);
        assert_eq!(cli.quota_bytes, DEFAULT_QUOTA_BYTES);
        assert!(!cli.no_autosave);
    }

    #[test]
    fn global_options_after_subcommand() {
        let cli = Cli::try_parse_from([
            "cipherstudio",
            "studio",
            "abc",
            "--debounce-ms",
            "200",
            "--no-autosave",
            "--data-dir",
            "/tmp/cs",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Some(Command::Studio { ref id }) if id == "abc"));
        assert_eq!(cli.debounce_ms, 200);
        assert!(cli.no_autosave);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/cs")));
    }

    #[test]
    fn theme_defaults_to_show() {
        let cli = Cli::try_parse_from(["cipherstudio", "theme"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Command::Theme {
                action: ThemeAction::Show
            })
        ));
        let cli = Cli::try_parse_from(["cipherstudio", "theme", "light"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Command::Theme {
                action: ThemeAction::Light
            })
        ));
    }

    #[test]
    fn rename_takes_id_and_name() {
        let cli = Cli::try_parse_from(["cipherstudio", "rename", "p1", "New name"]).expect("parse");
        assert!(matches!(
            cli.command,
            Some(Command::Rename { ref id, ref name }) if id == "p1" && name == "New name"
        ));
    }
}
