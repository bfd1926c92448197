//! The six CLI-facing commands (spec §4.6), implemented as library
//! functions over a [`CompilerManager`] and [`Project`] so `togo-cli` stays
//! a thin argument-parsing shell.

use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};

use togo_resource::{path as path_grammar, ResourceMetadata};
use togo_stream::{FileMode, FileStream};

use crate::error::{Error, Result};
use crate::manager::{CompilerContext, CompilerManager};
use crate::package_compiler::PackageCompiler;
use crate::project::Project;

/// Per-file status emitted by [`sync`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    Unchanged,
    Deleted,
    Added,
    Ignored,
}

impl SyncStatus {
    #[must_use]
    pub const fn code(self) -> char {
        match self {
            Self::Unchanged => 'N',
            Self::Deleted => 'D',
            Self::Added => 'A',
            Self::Ignored => 'I',
        }
    }
}

/// `create <name>`: package skeleton plus project registration.
///
/// # Errors
/// Propagates filesystem errors.
pub fn create(project: &mut Project, manager: &mut CompilerManager, name: &str) -> Result<()> {
    let package_dir = project.create_package(name)?;
    manager.packages_mut().push(PackageCompiler::new(name, package_dir));
    Ok(())
}

/// Loads every package registered in `project`'s roster into `manager`,
/// picking up each package's persisted manifest. Called once at startup so a
/// fresh CLI process resumes the state a previous invocation left behind.
///
/// # Errors
/// Propagates a filesystem error from reading a package's manifest.
pub fn open_all(project: &Project, manager: &mut CompilerManager) -> Result<()> {
    for name in project.packages() {
        let pkg = PackageCompiler::load(name.clone(), project.package_dir(name))?;
        manager.packages_mut().push(pkg);
    }
    Ok(())
}

/// Persists every package's manifest in `manager` back to disk. Called after
/// a mutating subcommand completes so the next invocation sees the change.
///
/// # Errors
/// Propagates a filesystem error from writing a package's manifest.
pub fn save_all(manager: &CompilerManager) -> Result<()> {
    for pkg in manager.packages() {
        pkg.save()?;
    }
    Ok(())
}

fn source_dir(pkg: &PackageCompiler) -> std::path::PathBuf {
    pkg.root().join("source")
}

/// `sync`: walks a package's source tree, reconciling it against the
/// manifest. Returns one status per file touched.
///
/// # Errors
/// Propagates filesystem errors encountered while walking the tree.
pub fn sync(manager: &mut CompilerManager, package_name: &str) -> Result<Vec<(String, SyncStatus)>> {
    let pkg = manager
        .package_mut(package_name)
        .ok_or_else(|| Error::PackageNotFound(package_name.to_string()))?;

    let mut results = Vec::new();

    for index in 0..pkg.manifest().len() {
        if pkg.manifest()[index].is_hole() {
            continue;
        }
        let source_path = pkg.compile_record(index).source_path.clone();
        if !source_path.exists() {
            pkg.remove_entry(index);
            results.push((source_path.display().to_string(), SyncStatus::Deleted));
        }
    }

    let dir = source_dir(pkg);
    if dir.is_dir() {
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let path = entry.path();
            let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };

            let parsed = match path_grammar::parse(file_name) {
                Ok(p) => p,
                Err(_) => {
                    results.push((file_name.to_string(), SyncStatus::Ignored));
                    continue;
                }
            };

            let type_hash = parsed.type_hash;
            if manager.compiler_for(type_hash).is_none() {
                results.push((file_name.to_string(), SyncStatus::Ignored));
                continue;
            }

            let pkg = manager.package_mut(package_name).expect("package vanished mid-sync");
            let name_hash = parsed.name_hash.raw();
            if pkg.find_by_name_hash(name_hash).is_some() {
                results.push((file_name.to_string(), SyncStatus::Unchanged));
                continue;
            }

            let entry = ResourceMetadata {
                name_hash,
                tag_glob_hash: parsed.tag_glob_hash.raw(),
                type_hash: type_hash.raw(),
                format_version: manager.compiler_for(type_hash).unwrap().format_version(),
                data_offset: 0,
                data_size: 0,
            };
            pkg.add_entry(entry, path);
            results.push((file_name.to_string(), SyncStatus::Added));
        }
    }

    Ok(results)
}

fn file_mtime_unix(path: &std::path::Path) -> Result<u64> {
    let metadata = fs::metadata(path)?;
    let modified = metadata.modified()?;
    Ok(modified.duration_since(UNIX_EPOCH).unwrap_or_default().as_secs())
}

fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

/// `compile [--force]`: recompiles every out-of-date (or `force`d) entry in
/// `package_name`. Returns the number of entries actually recompiled.
///
/// # Errors
/// Returns [`Error::NoCompilerForType`] if an entry's type has no
/// registered compiler, or an I/O error opening source/destination files.
pub fn compile(manager: &mut CompilerManager, package_name: &str, force: bool) -> Result<usize> {
    let mut recompiled = 0;
    let entry_count = manager
        .package(package_name)
        .ok_or_else(|| Error::PackageNotFound(package_name.to_string()))?
        .manifest()
        .len();

    for index in 0..entry_count {
        let pkg = manager.package(package_name).expect("checked above");
        if pkg.manifest()[index].is_hole() {
            continue;
        }
        let type_hash = pkg.manifest()[index].type_hash;
        let source_path = pkg.compile_record(index).source_path.clone();
        let last_compiled = pkg.compile_record(index).last_compiled;
        let source_mtime = file_mtime_unix(&source_path)?;

        if !force && source_mtime <= last_compiled {
            continue;
        }

        let resource_type = togo_resource::ResourceType(type_hash);
        let compiler = manager
            .compiler_for(resource_type)
            .ok_or(Error::NoCompilerForType(type_hash))?;

        let dest_path = manager.package(package_name).unwrap().compiled_blob_path(index);
        if let Some(parent) = dest_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut in_stream = FileStream::open(&source_path, FileMode::ReadBinary)
            .ok_or_else(|| Error::SourceNotFound(source_path.clone()))?;
        let mut out_stream = FileStream::open(&dest_path, FileMode::WriteBinaryTruncate).ok_or_else(|| {
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                format!("failed to open {} for writing", dest_path.display()),
            ))
        })?;

        let name_hash = manager.package(package_name).unwrap().manifest()[index].name_hash;
        let ctx = CompilerContext {
            package_name,
            name_hash,
            manifest_id: index as u32,
        };
        let ok = compiler.compile(&ctx, &mut in_stream, &mut out_stream);
        if !ok {
            tracing::warn!(package = package_name, index, "compile failed for entry");
            return Err(Error::CompileFailed(index as u32));
        }

        let pkg = manager.package_mut(package_name).expect("checked above");
        pkg.compile_record_mut(index).last_compiled = now_unix();
        pkg.manifest_modified = true;
        pkg.build_parity.mark_dirty();
        recompiled += 1;
    }

    tracing::info!(package = package_name, recompiled, "compile finished");
    Ok(recompiled)
}

/// `pack [--force]`: compiles, then if the manifest changed since the last
/// archive, writes `<name>.package` next to the project root.
///
/// # Errors
/// Propagates [`compile`]'s errors, plus I/O errors writing the archive.
pub fn pack(manager: &mut CompilerManager, package_name: &str, force: bool) -> Result<bool> {
    compile(manager, package_name, force)?;

    let pkg = manager
        .package_mut(package_name)
        .ok_or_else(|| Error::PackageNotFound(package_name.to_string()))?;
    if !pkg.build_parity.needs_build() {
        return Ok(false);
    }

    let mut archive = togo_resource::Archive::new();
    for (index, entry) in pkg.manifest().iter().enumerate() {
        if entry.is_hole() {
            archive.entries.push(*entry);
            archive.blobs.push(Vec::new());
            continue;
        }
        let blob = fs::read(pkg.compiled_blob_path(index))?;
        archive.push(*entry, blob);
    }

    let archive_path = pkg.root().join(format!("{package_name}.package"));
    let mut writer = FileStream::open(&archive_path, FileMode::WriteBinaryTruncate).ok_or_else(|| {
        Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            format!("failed to open {} for writing", archive_path.display()),
        ))
    })?;
    archive.write(&mut writer);

    pkg.build_parity.mark_in_parity();
    Ok(true)
}

/// `list [-r]`: either the package roster, or (with `recursive`) full
/// per-resource detail for a single package.
#[must_use]
pub fn list(manager: &CompilerManager, package_name: Option<&str>, recursive: bool) -> Vec<String> {
    match (package_name, recursive) {
        (None, _) => manager.packages().iter().map(|p| p.name().to_string()).collect(),
        (Some(name), false) => manager.package(name).map(|p| p.name().to_string()).into_iter().collect(),
        (Some(name), true) => {
            let Some(pkg) = manager.package(name) else {
                return Vec::new();
            };
            pkg.manifest()
                .iter()
                .enumerate()
                .filter(|(_, e)| !e.is_hole())
                .map(|(index, e)| {
                    let marker = if pkg.compile_record(index).last_compiled > 0 { "C" } else { " " };
                    format!("{index}\t{:#010x}\t{:#018x}\t{marker}", e.type_hash, e.name_hash)
                })
                .collect()
        }
    }
}

/// `compact <pkg>`.
///
/// # Errors
/// Returns [`Error::PackageNotFound`] if the package is unknown.
pub fn compact(manager: &mut CompilerManager, package_name: &str) -> Result<()> {
    let pkg = manager
        .package_mut(package_name)
        .ok_or_else(|| Error::PackageNotFound(package_name.to_string()))?;
    pkg.compact();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compilers::TestResourceCompiler;
    use std::fs;

    fn setup() -> (tempfile::TempDir, Project, CompilerManager) {
        let dir = tempfile::tempdir().unwrap();
        let mut project = Project::new(dir.path());
        let mut manager = CompilerManager::new();
        manager.register(Box::new(TestResourceCompiler));
        create(&mut project, &mut manager, "demo").unwrap();
        (dir, project, manager)
    }

    fn write_source(project: &Project, package: &str, file_name: &str, contents: &str) {
        let source_dir = project.package_dir(package).join("source");
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join(file_name), contents).unwrap();
    }

    #[test]
    fn create_sync_compile_pack_round_trip() {
        let (_dir, project, mut manager) = setup();
        write_source(&project, "demo", "hero.test_resource", "payload bytes");

        let statuses = sync(&mut manager, "demo").unwrap();
        assert!(statuses.iter().any(|(_, s)| *s == SyncStatus::Added));

        let recompiled = compile(&mut manager, "demo", false).unwrap();
        assert_eq!(recompiled, 1);

        // a second compile without changes recompiles nothing
        assert_eq!(compile(&mut manager, "demo", false).unwrap(), 0);

        let packed = pack(&mut manager, "demo", false).unwrap();
        assert!(packed);
        let archive_path = manager.package("demo").unwrap().root().join("demo.package");
        assert!(archive_path.is_file());

        // nothing changed since the last pack
        assert!(!pack(&mut manager, "demo", false).unwrap());
    }

    #[test]
    fn sync_removes_entries_whose_source_vanished() {
        let (_dir, project, mut manager) = setup();
        write_source(&project, "demo", "hero.test_resource", "payload");
        sync(&mut manager, "demo").unwrap();

        let source_path = manager.package("demo").unwrap().compile_record(0).source_path.clone();
        fs::remove_file(source_path).unwrap();

        let statuses = sync(&mut manager, "demo").unwrap();
        assert!(statuses.iter().any(|(_, s)| *s == SyncStatus::Deleted));
        assert!(manager.package("demo").unwrap().manifest()[0].is_hole());
    }

    #[test]
    fn compact_renumbers_after_a_removal() {
        let (_dir, project, mut manager) = setup();
        write_source(&project, "demo", "a.test_resource", "a");
        write_source(&project, "demo", "b.test_resource", "b");
        sync(&mut manager, "demo").unwrap();
        compile(&mut manager, "demo", false).unwrap();

        let source_path = manager.package("demo").unwrap().compile_record(0).source_path.clone();
        fs::remove_file(source_path).unwrap();
        sync(&mut manager, "demo").unwrap();

        compact(&mut manager, "demo").unwrap();
        assert_eq!(manager.package("demo").unwrap().manifest().len(), 1);
    }
}
