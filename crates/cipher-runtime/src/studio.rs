//! `cipherstudio studio <id>`: line-oriented studio session over stdin.
//!
//! Each input line is one command against the session controller. The
//! autosave timer is driven here: the loop sleeps until the coordinator's
//! deadline unless a line or Ctrl-C arrives first.

use std::io::Write as _;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::io::{AsyncBufReadExt, BufReader};

use cipher_core::{CommitTrigger, FileSetError, normalize_path, visible_paths};
use cipher_session::{SaveOutcome, SessionController, SessionError, SessionEvent, Severity};
use cipher_store::{KeyedStore, ThemeStore};

use crate::cli::ThemeAction;
use crate::cmd_theme;

const HELP: &str = "\
commands:
  ls                     list files (* marks the open file)
  open <path>            switch the open file
  cat [path]             print a file (default: the open file)
  touch <path>           create a file
  rm <path>              delete a file
  mv <old> <new>         rename a file
  write <path> <text>    replace a file's content (\\n for newline)
  save                   save now (only while autosave is off)
  autosave on|off        toggle autosave
  theme [toggle|light|dark]
                         show or change the UI theme
  status                 project and save state
  help                   this text
  exit                   save (when autosave is on) and leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StudioCommand {
    Ls,
    Open(String),
    Cat(Option<String>),
    Touch(String),
    Rm(String),
    Mv(String, String),
    Write { path: String, text: String },
    Save,
    Autosave(bool),
    Theme(ThemeAction),
    Status,
    Help,
    Exit,
}

/// Parse one input line. Blank lines yield `Ok(None)`; the error is a usage
/// message for the user.
pub fn parse_line(line: &str) -> Result<Option<StudioCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match (verb, args.as_slice()) {
        ("ls", []) => StudioCommand::Ls,
        ("open", [path]) => StudioCommand::Open(normalize_path(path)),
        ("cat", []) => StudioCommand::Cat(None),
        ("cat", [path]) => StudioCommand::Cat(Some(normalize_path(path))),
        ("touch", [path]) => StudioCommand::Touch(normalize_path(path)),
        ("rm", [path]) => StudioCommand::Rm(normalize_path(path)),
        ("mv", [old, new]) => StudioCommand::Mv(normalize_path(old), normalize_path(new)),
        ("write", [path, ..]) => {
            let text = rest[path.len()..].trim_start();
            StudioCommand::Write {
                path: normalize_path(path),
                text: unescape(text),
            }
        }
        ("save", []) => StudioCommand::Save,
        ("autosave", ["on"]) => StudioCommand::Autosave(true),
        ("autosave", ["off"]) => StudioCommand::Autosave(false),
        ("theme", [] | ["show"]) => StudioCommand::Theme(ThemeAction::Show),
        ("theme", ["toggle"]) => StudioCommand::Theme(ThemeAction::Toggle),
        ("theme", ["light"]) => StudioCommand::Theme(ThemeAction::Light),
        ("theme", ["dark"]) => StudioCommand::Theme(ThemeAction::Dark),
        ("status", []) => StudioCommand::Status,
        ("help" | "?", []) => StudioCommand::Help,
        ("exit" | "quit", []) => StudioCommand::Exit,
        ("ls" | "cat" | "open" | "touch" | "rm" | "mv" | "write" | "save" | "autosave"
        | "theme" | "status" | "help" | "exit", _) => {
            return Err(format!("usage: {}", usage_for(verb)));
        }
        _ => return Err(format!("unknown command `{verb}`; type `help`")),
    };
    Ok(Some(command))
}

fn usage_for(verb: &str) -> &'static str {
    match verb {
        "open" => "open <path>",
        "cat" => "cat [path]",
        "touch" => "touch <path>",
        "rm" => "rm <path>",
        "mv" => "mv <old> <new>",
        "write" => "write <path> <text>",
        "autosave" => "autosave on|off",
        "theme" => "theme [toggle|light|dark]",
        "ls" => "ls",
        "save" => "save",
        "status" => "status",
        "help" => "help",
        _ => "exit",
    }
}

/// `\n`, `\t` and `\\` escapes in `write` text.
fn unescape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('\\') => out.push('\\'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

/// Run one command. Returns text to print, if any. `Exit` is handled by the
/// caller.
pub fn execute<S: KeyedStore, T: KeyedStore>(
    session: &mut SessionController<S>,
    themes: &ThemeStore<T>,
    command: StudioCommand,
    now: DateTime<Utc>,
) -> Result<Option<String>, SessionError> {
    let reply = match command {
        StudioCommand::Ls => Some(format_files(session)?),
        StudioCommand::Open(path) => {
            session.select_file(&path)?;
            None
        }
        StudioCommand::Cat(path) => {
            let files = session.files().ok_or(SessionError::NoActiveProject)?;
            let path = path
                .or_else(|| session.active_path().map(str::to_string))
                .unwrap_or_default();
            let entry = files
                .get(&path)
                .ok_or_else(|| FileSetError::NotFound(path.clone()))?;
            Some(entry.content.trim_end_matches('\n').to_string())
        }
        StudioCommand::Touch(path) => {
            session.create_file(&path, now)?;
            None
        }
        StudioCommand::Rm(path) => {
            session.delete_file(&path, now)?;
            None
        }
        StudioCommand::Mv(old, new) => {
            session.rename_file(&old, &new, now)?;
            None
        }
        StudioCommand::Write { path, text } => {
            session.update_content(&path, text, now)?;
            None
        }
        // Manual saving is only offered while autosave is off.
        StudioCommand::Save if session.autosave().is_enabled() => {
            Some("autosave is on; turn it off to save manually".to_string())
        }
        StudioCommand::Save => match session.save(now)? {
            SaveOutcome::Saved(record) => {
                Some(format!("saved at {}", record.updated_at.format("%H:%M:%S")))
            }
            SaveOutcome::AlreadySaving => Some("a save is already in progress".to_string()),
        },
        StudioCommand::Autosave(enabled) => {
            session.set_autosave(enabled);
            Some(format!("autosave {}", if enabled { "on" } else { "off" }))
        }
        StudioCommand::Theme(action) => match cmd_theme::apply(themes, action) {
            Ok(theme) => Some(format!("theme {theme}")),
            Err(e) => {
                tracing::warn!(error = %e, "theme not saved");
                Some(format!("warning: theme not saved: {e}"))
            }
        },
        StudioCommand::Status => Some(format_status(session, now)?),
        StudioCommand::Help => Some(HELP.to_string()),
        StudioCommand::Exit => None,
    };
    Ok(reply)
}

fn format_files<S: KeyedStore>(session: &SessionController<S>) -> Result<String, SessionError> {
    let files = session.files().ok_or(SessionError::NoActiveProject)?;
    let active = session.active_path().unwrap_or_default();
    Ok(visible_paths(files)
        .into_iter()
        .map(|path| {
            let marker = if path == active { '*' } else { ' ' };
            format!("{marker} {path}")
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

pub fn format_status<S: KeyedStore>(
    session: &SessionController<S>,
    now: DateTime<Utc>,
) -> Result<String, SessionError> {
    let project = session.project().ok_or(SessionError::NoActiveProject)?;
    let autosave = session.autosave();

    let save_state = if autosave.is_saving() {
        "saving\u{2026}".to_string()
    } else if let Some(deadline) = autosave.deadline() {
        let ms = (deadline - now).num_milliseconds().max(0);
        format!("unsaved changes, autosave in {ms} ms")
    } else if session.is_dirty() {
        "unsaved changes".to_string()
    } else {
        "saved".to_string()
    };
    let autosave_line = if autosave.is_enabled() {
        format!("on ({} ms)", autosave.debounce().num_milliseconds())
    } else {
        "off".to_string()
    };

    Ok([
        format!("project   {} ({})", project.name, project.id),
        format!("file      {}", session.active_path().unwrap_or("-")),
        format!("files     {}", project.visible_file_count()),
        format!("autosave  {autosave_line}"),
        format!("state     {save_state}"),
        format!("updated   {}", project.updated_at.to_rfc3339()),
    ]
    .join("\n"))
}

/// User-facing text for a failed command, prefixed by how it is surfaced.
pub fn describe_error(err: &SessionError) -> String {
    match err.severity() {
        Severity::BlockingPrompt => format!("invalid: {err}"),
        Severity::Rejection => format!("rejected: {err}"),
        Severity::Warning => format!("warning: {err} (edits kept; `save` to retry)"),
        Severity::ReturnToProjectList => format!("error: {err}"),
    }
}

/// Notices worth showing for events the command output does not cover.
pub fn render_event(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::Saved {
            updated_at,
            trigger: CommitTrigger::Scheduled,
        } => Some(format!("autosaved at {}", updated_at.format("%H:%M:%S"))),
        SessionEvent::Saved {
            trigger: CommitTrigger::Flush,
            ..
        } => Some("saved before closing".to_string()),
        SessionEvent::SaveFailed {
            trigger: CommitTrigger::Scheduled,
            message,
        } => Some(format!(
            "warning: autosave failed: {message} (edits kept; the next edit retries, \
             or `autosave off` then `save`)"
        )),
        other => {
            tracing::trace!(event = ?other, "session event");
            None
        }
    }
}

fn flush_events<S: KeyedStore>(session: &mut SessionController<S>) {
    for event in session.take_events() {
        if let Some(line) = render_event(&event) {
            println!("{line}");
        }
    }
}

fn prompt() {
    print!("> ");
    if let Err(e) = std::io::stdout().flush() {
        tracing::debug!(error = %e, "stdout flush failed");
    }
}

/// Leave the project on an explicit `exit`. When the final save fails the
/// project stays open and the returned warning is shown instead.
pub fn try_exit<S: KeyedStore>(
    session: &mut SessionController<S>,
    now: DateTime<Utc>,
) -> Result<(), String> {
    session.close(now).map(|_| ()).map_err(|e| {
        format!(
            "warning: could not save before leaving: {e}\n\
             edits kept; fix the problem and `exit` again, \
             or `autosave off` then `exit` to leave without saving"
        )
    })
}

/// Sleep until `deadline`; never resolves when there is none.
async fn sleep_until(deadline: Option<DateTime<Utc>>) {
    match deadline {
        Some(deadline) => {
            let wait = (deadline - Utc::now()).to_std().unwrap_or(Duration::ZERO);
            tokio::time::sleep(wait).await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Entry point for `cipherstudio studio <id>`.
pub async fn run_studio<S: KeyedStore, T: KeyedStore>(
    session: &mut SessionController<S>,
    themes: &ThemeStore<T>,
    project_id: &str,
) -> anyhow::Result<()> {
    session.open_project(project_id, Utc::now())?;
    if let Some(project) = session.project() {
        println!("{} \u{00b7} type `help` for commands, Ctrl-D to leave", project.name);
    }
    flush_events(session);
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let deadline = session.next_deadline();
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    println!();
                    break;
                };
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(StudioCommand::Exit)) => match try_exit(session, Utc::now()) {
                        Ok(()) => break,
                        Err(warning) => println!("{warning}"),
                    },
                    Ok(Some(command)) => match execute(session, themes, command, Utc::now()) {
                        Ok(Some(output)) => println!("{output}"),
                        Ok(None) => {}
                        Err(e) => {
                            println!("{}", describe_error(&e));
                            if e.severity() == Severity::ReturnToProjectList {
                                break;
                            }
                        }
                    },
                    Err(usage) => println!("{usage}"),
                }
                flush_events(session);
                prompt();
            }
            () = sleep_until(deadline) => {
                // The failure is reported through the SaveFailed event.
                if let Err(e) = session.tick(Utc::now()) {
                    tracing::debug!(error = %e, "scheduled save failed");
                }
                flush_events(session);
            }
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        }
    }

    // Stdin is gone or Ctrl-C was pressed: nobody is left to retry.
    if let Err(e) = session.close(Utc::now()) {
        println!("warning: final save failed: {e}; unsaved edits were discarded");
        session.discard();
    }
    flush_events(session);
    Ok(())
}
