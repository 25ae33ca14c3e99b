//! `cipherstudio ls | new | rm | rename`: the project manager.

use chrono::{DateTime, Utc};

use cipher_core::ProjectRecord;
use cipher_store::{KeyedStore, ProjectRepository};

use crate::display::{relative_time, truncate};

const NAME_WIDTH: usize = 32;

/// Entry point for `cipherstudio ls`.
pub fn cmd_ls<S: KeyedStore>(
    repo: &ProjectRepository<S>,
    json: bool,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let projects = repo.list_projects()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&projects)?);
        return Ok(());
    }

    let output = format_project_list(&projects, now);
    if output.is_empty() {
        println!("(no projects yet; create one with `cipherstudio new <name>`)");
    } else {
        println!("{output}");
    }
    Ok(())
}

/// One line per project in the order given:
/// `<id>  <name padded>  <n> files  updated <age>`.
pub fn format_project_list(projects: &[ProjectRecord], now: DateTime<Utc>) -> String {
    projects
        .iter()
        .map(|p| {
            let files = p.visible_file_count();
            let noun = if files == 1 { "file" } else { "files" };
            format!(
                "{}  {:<width$}  {files:>3} {noun}  updated {}",
                p.id,
                truncate(&p.name, NAME_WIDTH),
                relative_time(p.updated_at, now),
                width = NAME_WIDTH,
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn cmd_new<S: KeyedStore>(
    repo: &ProjectRepository<S>,
    name: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let record = repo.create_project(name, now)?;
    println!("{}", record.id);
    Ok(())
}

pub fn cmd_rm<S: KeyedStore>(repo: &ProjectRepository<S>, id: &str) -> anyhow::Result<()> {
    if repo.delete_project(id)? {
        println!("deleted {id}");
    } else {
        println!("no project {id}; nothing deleted");
    }
    Ok(())
}

pub fn cmd_rename<S: KeyedStore>(
    repo: &ProjectRepository<S>,
    id: &str,
    name: &str,
    now: DateTime<Utc>,
) -> anyhow::Result<()> {
    let record = repo.rename_project(id, name, now)?;
    println!("{}  {}", record.id, record.name);
    Ok(())
}
