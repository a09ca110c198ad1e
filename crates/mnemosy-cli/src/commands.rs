//! Subcommands and their execution against a registry.
//!
//! Folders are addressed by slash-separated paths below the library root
//! (`""` or `/` is the root); entries by their folder path plus name, e.g.
//! `Bricks/Red Brick`.

use anyhow::{anyhow, bail, Result};
use clap::Subcommand;
use mnemosy_core::{EntryId, FolderId, FolderTree, LibEntryType, MaterialLibraryRegistry, TextureChannel};
use std::io::Write;
use std::path::PathBuf;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List known libraries
    Libraries,
    /// Create a new empty library
    Create { name: String, path: PathBuf },
    /// Add an existing library directory
    Attach { name: String, path: PathBuf },
    /// Forget a library without deleting its files
    Forget { index: usize },
    /// Make a library the active one
    Activate { index: usize },
    /// Rename a library
    RenameLibrary { index: usize, name: String },
    /// Print the folder tree of the active library
    Tree,
    /// Create a folder
    Mkdir { parent: String, name: String },
    /// Create an entry
    Add {
        folder: String,
        name: String,
        /// pbr, texture or skybox
        #[arg(long, default_value = "pbr")]
        kind: LibEntryType,
    },
    RenameFolder { folder: String, name: String },
    RenameEntry { entry: String, name: String },
    MoveFolder { folder: String, destination: String },
    MoveEntry { entry: String, destination: String },
    /// Delete an entry and its package
    RmEntry { entry: String },
    /// Delete a folder with everything in it
    RmFolder {
        folder: String,
        /// Hand sub-folders and entries to the parent instead
        #[arg(long)]
        keep_children: bool,
    },
    /// Search entry names
    Search { keyword: String },
    /// Compare the active library with its directory
    Verify,
    /// Copy an entry's package out of the library
    Export { entry: String, destination: PathBuf },
    /// Copy a package into the library
    Import { folder: String, source: PathBuf },
    /// Copy a texture file into an entry's channel slot
    Assign {
        entry: String,
        channel: TextureChannel,
        file: PathBuf,
    },
}

fn active_tree(registry: &MaterialLibraryRegistry) -> Result<&FolderTree> {
    registry
        .active_collection()
        .map(|c| c.tree())
        .ok_or_else(|| anyhow!("no active library; create or attach one first"))
}

fn resolve_folder(registry: &MaterialLibraryRegistry, path: &str) -> Result<FolderId> {
    active_tree(registry)?
        .find_folder_by_path(path)
        .ok_or_else(|| anyhow!("no folder '{}'", path))
}

fn resolve_entry(registry: &MaterialLibraryRegistry, path: &str) -> Result<EntryId> {
    let (folder_path, name) = path.trim_end_matches('/').rsplit_once('/').unwrap_or(("", path));
    let folder = resolve_folder(registry, folder_path)?;
    active_tree(registry)?
        .find_entry_in(folder, name)
        .ok_or_else(|| anyhow!("no entry '{}'", path))
}

fn print_folder(tree: &FolderTree, id: FolderId, depth: usize, out: &mut impl Write) -> Result<()> {
    let node = tree.node(id)?;
    writeln!(out, "{}{}/", "  ".repeat(depth), node.name())?;
    for entry in tree.entries_in(id)? {
        writeln!(out, "{}{} [{}]", "  ".repeat(depth + 1), entry.name(), entry.entry_type())?;
    }
    for child in node.sub_nodes() {
        print_folder(tree, *child, depth + 1, out)?;
    }
    Ok(())
}

pub fn execute(registry: &mut MaterialLibraryRegistry, command: Command, out: &mut impl Write) -> Result<()> {
    match command {
        Command::Libraries => {
            for (index, collection) in registry.collections().iter().enumerate() {
                let marker = if registry.active_index() == Some(index) { "*" } else { " " };
                writeln!(
                    out,
                    "{} {} {} ({})",
                    marker,
                    index,
                    collection.name(),
                    collection.root_path().display()
                )?;
            }
        }
        Command::Create { name, path } => {
            let index = registry.create_new_entry(&name, &path)?;
            writeln!(out, "created library {} '{}'", index, registry.collection(index)?.name())?;
        }
        Command::Attach { name, path } => {
            let index = registry.create_new_entry_from_existing(&name, &path)?;
            writeln!(out, "attached library {} '{}'", index, registry.collection(index)?.name())?;
        }
        Command::Forget { index } => {
            let removed = registry.remove_entry_from_list(index)?;
            writeln!(out, "forgot '{}'; files kept at {}", removed.name(), removed.root_path().display())?;
        }
        Command::Activate { index } => {
            registry.switch_active_collection(index)?;
            writeln!(out, "active library: {}", registry.collection(index)?.name())?;
        }
        Command::RenameLibrary { index, name } => {
            let name = registry.rename_collection(index, &name)?;
            writeln!(out, "library {} renamed to '{}'", index, name)?;
        }
        Command::Tree => {
            let tree = active_tree(registry)?;
            print_folder(tree, tree.root_id(), 0, out)?;
        }
        Command::Mkdir { parent, name } => {
            let parent = resolve_folder(registry, &parent)?;
            let id = registry.create_subfolder(parent, &name)?;
            writeln!(out, "created {}", active_tree(registry)?.display_path(id)?)?;
        }
        Command::Add { folder, name, kind } => {
            let folder = resolve_folder(registry, &folder)?;
            let id = registry.create_entry(folder, &name, kind)?;
            let entry = active_tree(registry)?.entry(id)?;
            writeln!(out, "created {} '{}'", kind, entry.name())?;
        }
        Command::RenameFolder { folder, name } => {
            let folder = resolve_folder(registry, &folder)?;
            let name = registry.rename_folder(folder, &name)?;
            writeln!(out, "renamed to '{}'", name)?;
        }
        Command::RenameEntry { entry, name } => {
            let entry = resolve_entry(registry, &entry)?;
            let name = registry.rename_entry(entry, &name)?;
            writeln!(out, "renamed to '{}'", name)?;
        }
        Command::MoveFolder { folder, destination } => {
            let folder = resolve_folder(registry, &folder)?;
            let destination = resolve_folder(registry, &destination)?;
            registry.move_folder(folder, destination)?;
            writeln!(out, "moved to {}", active_tree(registry)?.display_path(folder)?)?;
        }
        Command::MoveEntry { entry, destination } => {
            let entry = resolve_entry(registry, &entry)?;
            let destination = resolve_folder(registry, &destination)?;
            let name = registry.move_entry(entry, destination)?;
            writeln!(out, "moved as '{}'", name)?;
        }
        Command::RmEntry { entry } => {
            let entry = resolve_entry(registry, &entry)?;
            registry.delete_entry(entry)?;
            writeln!(out, "deleted")?;
        }
        Command::RmFolder { folder, keep_children } => {
            let id = resolve_folder(registry, &folder)?;
            if keep_children {
                registry.delete_folder_keep_children(id)?;
                writeln!(out, "dissolved '{}'", folder)?;
            } else {
                registry.arm_delete_hierarchy(id)?;
                let removed = registry.confirm_delete_hierarchy()?;
                writeln!(
                    out,
                    "deleted {} folders and {} entries",
                    removed.folders.len(),
                    removed.entries.len()
                )?;
            }
        }
        Command::Search { keyword } => {
            if !registry.search_lib_entries_for_keyword(&keyword) {
                writeln!(out, "no matches")?;
                return Ok(());
            }
            let tree = active_tree(registry)?;
            for id in registry.search_results() {
                let entry = tree.entry(*id)?;
                writeln!(out, "{}/{}", tree.display_path(entry.folder())?, entry.name())?;
            }
        }
        Command::Verify => {
            let health = registry.verify_collection()?;
            if health.is_healthy() {
                writeln!(out, "library is consistent with disk")?;
            } else {
                let tree = active_tree(registry)?;
                for id in &health.missing_folders {
                    writeln!(out, "missing folder: {}", tree.display_path(*id)?)?;
                }
                for id in &health.missing_packages {
                    writeln!(out, "missing package: {}", tree.entry(*id)?.name())?;
                }
                for path in &health.orphan_dirs {
                    writeln!(out, "untracked directory: {}", path.display())?;
                }
                bail!("library drifted from disk");
            }
        }
        Command::Export { entry, destination } => {
            let entry = resolve_entry(registry, &entry)?;
            let path = registry.export_entry(entry, &destination)?;
            writeln!(out, "exported to {}", path.display())?;
        }
        Command::Import { folder, source } => {
            let folder = resolve_folder(registry, &folder)?;
            let id = registry.import_entry(folder, &source)?;
            writeln!(out, "imported '{}'", active_tree(registry)?.entry(id)?.name())?;
        }
        Command::Assign { entry, channel, file } => {
            let entry = resolve_entry(registry, &entry)?;
            let stored = registry.assign_channel(entry, channel, &file)?;
            writeln!(out, "assigned {}", stored)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn run(registry: &mut MaterialLibraryRegistry, command: Command) -> Result<String> {
        let mut out = Vec::new();
        execute(registry, command, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    fn registry_with_library() -> (MaterialLibraryRegistry, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut registry = MaterialLibraryRegistry::in_memory().unwrap();
        run(
            &mut registry,
            Command::Create {
                name: "Main".into(),
                path: temp_dir.path().join("main"),
            },
        )
        .unwrap();
        (registry, temp_dir)
    }

    #[test]
    fn test_tree_output() {
        let (mut registry, _temp_dir) = registry_with_library();
        run(&mut registry, Command::Mkdir { parent: "/".into(), name: "Bricks".into() }).unwrap();
        run(
            &mut registry,
            Command::Add {
                folder: "Bricks".into(),
                name: "Red".into(),
                kind: LibEntryType::PbrMaterial,
            },
        )
        .unwrap();

        let output = run(&mut registry, Command::Tree).unwrap();

        assert_eq!(output, "Root/\n  Bricks/\n    Red [pbr_material]\n");
    }

    #[test]
    fn test_entry_paths_resolve() {
        let (mut registry, _temp_dir) = registry_with_library();
        run(&mut registry, Command::Mkdir { parent: "".into(), name: "A".into() }).unwrap();
        run(
            &mut registry,
            Command::Add {
                folder: "A".into(),
                name: "Tile".into(),
                kind: LibEntryType::UnlitTexture,
            },
        )
        .unwrap();

        let output = run(
            &mut registry,
            Command::MoveEntry {
                entry: "A/Tile".into(),
                destination: "/".into(),
            },
        )
        .unwrap();
        assert_eq!(output, "moved as 'Tile'\n");

        let output = run(&mut registry, Command::Search { keyword: "til".into() }).unwrap();
        assert_eq!(output, "Root/Tile\n");

        assert!(run(&mut registry, Command::RmEntry { entry: "A/Tile".into() }).is_err());
    }

    #[test]
    fn test_rm_folder_modes() {
        let (mut registry, _temp_dir) = registry_with_library();
        run(&mut registry, Command::Mkdir { parent: "".into(), name: "A".into() }).unwrap();
        run(&mut registry, Command::Mkdir { parent: "A".into(), name: "B".into() }).unwrap();

        let output = run(
            &mut registry,
            Command::RmFolder {
                folder: "A".into(),
                keep_children: true,
            },
        )
        .unwrap();
        assert_eq!(output, "dissolved 'A'\n");

        let output = run(
            &mut registry,
            Command::RmFolder {
                folder: "B".into(),
                keep_children: false,
            },
        )
        .unwrap();
        assert_eq!(output, "deleted 1 folders and 0 entries\n");
    }

    #[test]
    fn test_libraries_listing_marks_active() {
        let (mut registry, temp_dir) = registry_with_library();
        run(
            &mut registry,
            Command::Create {
                name: "Second".into(),
                path: temp_dir.path().join("second"),
            },
        )
        .unwrap();
        run(&mut registry, Command::Activate { index: 1 }).unwrap();

        let output = run(&mut registry, Command::Libraries).unwrap();

        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[0].starts_with("  0 Main"));
        assert!(lines[1].starts_with("* 1 Second"));
    }

    #[test]
    fn test_commands_without_library_fail() {
        let mut registry = MaterialLibraryRegistry::in_memory().unwrap();
        assert!(run(&mut registry, Command::Tree).is_err());
        assert!(run(&mut registry, Command::Verify).is_err());
    }
}
