//! Command tree construction from a directory layout.
//!
//! Every module file becomes a command named after its kebab-cased stem and
//! every subdirectory becomes a group. A directory holding an `index` module
//! is folded into that module, making the directory runnable as well as a
//! group.

use std::path::{Path, PathBuf};

use futures::future::BoxFuture;
use heck::ToKebabCase;
use tracing::{debug, trace, warn};

use crate::command::{Command, CommandMap};
use crate::error::{Error, Result};
use crate::loader::ModuleLoader;

/// Prefix of entries reserved for the app wrapper.
pub const APP_MARKER: &str = "_app";

/// Name of the module that defines its directory's own command.
pub const INDEX_COMMAND: &str = "index";

/// Derive a command name from a module stem: `doThing` becomes `do-thing`.
pub fn command_name(stem: &str) -> String {
    stem.to_kebab_case()
}

/// Read the command tree rooted at `directory`.
///
/// Entries are visited in file-name order. Two entries resolving to the same
/// name are rejected.
pub fn read_commands<'a>(
    directory: &'a Path,
    loader: &'a dyn ModuleLoader,
) -> BoxFuture<'a, Result<CommandMap>> {
    Box::pin(async move {
        debug!(directory = %directory.display(), "reading commands");
        let mut commands = CommandMap::new();

        for entry in list_entries(directory).await? {
            if entry.name.starts_with(APP_MARKER) {
                trace!(entry = %entry.name, "skipping app wrapper");
                continue;
            }

            if entry.is_dir {
                let mut children = read_commands(&entry.path, loader).await?;
                let command = match children.shift_remove(INDEX_COMMAND) {
                    Some(mut index) => {
                        index.name = entry.name.clone();
                        index.commands = Some(children);
                        index.source = Some(entry.path.clone());
                        index
                    }
                    None => Command::group(entry.name.clone(), children, entry.path.clone()),
                };
                insert(&mut commands, command)?;
                continue;
            }

            let Some(stem) = loader.module_stem(&entry.name) else {
                trace!(entry = %entry.name, "skipping non-module file");
                continue;
            };
            let name = command_name(stem);
            let module = loader.load(&entry.path).await?;
            insert(&mut commands, Command::from_module(name, module, entry.path.clone()))?;
        }

        Ok(commands)
    })
}

fn insert(commands: &mut CommandMap, command: Command) -> Result<()> {
    if let Some(existing) = commands.get(&command.name) {
        return Err(Error::DuplicateCommand {
            name: command.name.clone(),
            first: existing.source.clone().unwrap_or_default(),
            second: command.source.clone().unwrap_or_default(),
        });
    }
    commands.insert(command.name.clone(), command);
    Ok(())
}

pub(crate) struct DirEntry {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
    pub(crate) is_dir: bool,
}

/// List a directory's entries sorted by name, following symlinks.
pub(crate) async fn list_entries(directory: &Path) -> Result<Vec<DirEntry>> {
    let mut reader = tokio::fs::read_dir(directory)
        .await
        .map_err(|e| Error::io(directory, e))?;

    let mut entries = Vec::new();
    while let Some(entry) = reader
        .next_entry()
        .await
        .map_err(|e| Error::io(directory, e))?
    {
        let path = entry.path();
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            warn!(path = %path.display(), "skipping entry with a non UTF-8 name");
            continue;
        };
        let metadata = tokio::fs::metadata(&path)
            .await
            .map_err(|e| Error::io(&path, e))?;
        entries.push(DirEntry {
            name,
            path,
            is_dir: metadata.is_dir(),
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::MarkdownLoader;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[rstest]
    #[case("build", "build")]
    #[case("doThing", "do-thing")]
    #[case("runAllTests", "run-all-tests")]
    #[case("HTTPServer", "http-server")]
    #[case("already-kebab", "already-kebab")]
    fn test_command_name(#[case] stem: &str, #[case] expected: &str) {
        assert_eq!(command_name(stem), expected);
    }

    #[tokio::test]
    async fn test_index_folding() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "db/index.md", "---\ndescription: Database\nalias: d\n---\nC");
        write(dir.path(), "db/migrate.md", "D");

        let loader = MarkdownLoader::new();
        let commands = read_commands(dir.path(), &loader).await.unwrap();

        let db = &commands["db"];
        assert_eq!(db.name, "db");
        assert_eq!(db.alias.as_deref(), Some("d"));
        assert!(db.is_runnable());
        let children = db.commands.as_ref().unwrap();
        assert!(children.contains_key("migrate"));
        assert!(!children.contains_key("index"));
    }

    #[tokio::test]
    async fn test_directory_without_index_is_a_group() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "cache/clear.md", "cleared");

        let loader = MarkdownLoader::new();
        let commands = read_commands(dir.path(), &loader).await.unwrap();
        let cache = &commands["cache"];
        assert!(!cache.is_runnable());
        assert!(!cache.is_default);
        assert_eq!(cache.children().count(), 1);
    }

    #[tokio::test]
    async fn test_skips_app_declarations_and_foreign_files() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "_app.md", "{{ content }}");
        write(dir.path(), "types.d.md", "ignored");
        write(dir.path(), "notes.txt", "ignored");
        write(dir.path(), "doThing.md", "done");

        let loader = MarkdownLoader::new();
        let commands = read_commands(dir.path(), &loader).await.unwrap();
        let names: Vec<_> = commands.keys().cloned().collect();
        assert_eq!(names, ["do-thing"]);
    }

    #[tokio::test]
    async fn test_entries_are_ordered_by_file_name() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "zeta.md", "z");
        write(dir.path(), "alpha.md", "a");
        write(dir.path(), "mid/index.md", "m");

        let loader = MarkdownLoader::new();
        let commands = read_commands(dir.path(), &loader).await.unwrap();
        let names: Vec<_> = commands.keys().cloned().collect();
        assert_eq!(names, ["alpha", "mid", "zeta"]);
    }

    #[tokio::test]
    async fn test_file_and_directory_collision_is_rejected() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "db.md", "file");
        write(dir.path(), "db/migrate.md", "nested");

        let loader = MarkdownLoader::new();
        let error = read_commands(dir.path(), &loader).await.unwrap_err();
        assert!(matches!(error, Error::DuplicateCommand { ref name, .. } if name == "db"));
    }

    #[tokio::test]
    async fn test_unreadable_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing");
        let loader = MarkdownLoader::new();
        let error = read_commands(&missing, &loader).await.unwrap_err();
        assert!(matches!(error, Error::Io { .. }));
    }

    #[tokio::test]
    async fn test_root_index_stays_in_the_map() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "index.md", "root");
        let loader = MarkdownLoader::new();
        let commands = read_commands(dir.path(), &loader).await.unwrap();
        assert!(commands.contains_key("index"));
    }
}
