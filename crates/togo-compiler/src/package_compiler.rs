//! `PackageCompiler`: per-package compile state — the manifest, its dirty
//! flags, and the source-path/last-compiled bookkeeping compiler_metadata
//! carries between runs.

use std::path::{Path, PathBuf};

use togo_core::HashMap as TogoHashMap;
use togo_resource::ResourceMetadata;
use togo_serialize::{Endian, SerString, Serializer};
use togo_stream::{FileMode, FileStream};

use crate::error::Result;

const MANIFEST_FORMAT_VERSION: u32 = 1;

/// `false` after any manifest change; only a successful `pack` sets it back
/// to `true`. `needs_build()` is its negation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildParity(bool);

impl BuildParity {
    #[must_use]
    pub const fn in_parity() -> Self {
        Self(true)
    }

    #[must_use]
    pub const fn out_of_parity() -> Self {
        Self(false)
    }

    #[must_use]
    pub const fn needs_build(self) -> bool {
        !self.0
    }

    pub fn mark_dirty(&mut self) {
        self.0 = false;
    }

    pub fn mark_in_parity(&mut self) {
        self.0 = true;
    }
}

/// Per-manifest-entry bookkeeping kept alongside the manifest itself:
/// authoring source path and the last successful compile's timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileRecord {
    pub source_path: PathBuf,
    pub last_compiled: u64,
}

pub struct PackageCompiler {
    name: String,
    root: PathBuf,
    manifest: Vec<ResourceMetadata>,
    compile_records: Vec<CompileRecord>,
    index_of_name_hash: TogoHashMap<u64, usize>,
    pub properties_modified: bool,
    pub manifest_modified: bool,
    pub build_parity: BuildParity,
}

impl PackageCompiler {
    #[must_use]
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            manifest: Vec::new(),
            compile_records: Vec::new(),
            index_of_name_hash: TogoHashMap::new(),
            properties_modified: false,
            manifest_modified: false,
            build_parity: BuildParity::out_of_parity(),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn manifest(&self) -> &[ResourceMetadata] {
        &self.manifest
    }

    #[must_use]
    pub fn compile_record(&self, index: usize) -> &CompileRecord {
        &self.compile_records[index]
    }

    #[must_use]
    pub fn compile_record_mut(&mut self, index: usize) -> &mut CompileRecord {
        &mut self.compile_records[index]
    }

    #[must_use]
    pub fn find_by_name_hash(&self, name_hash: u64) -> Option<usize> {
        self.index_of_name_hash.get(&name_hash).copied()
    }

    /// Appends a new entry, its compile record, and its lookup slot.
    /// Compiled-blob files are addressed by this numeric id so renames of
    /// the source never move the on-disk blob.
    pub fn add_entry(&mut self, entry: ResourceMetadata, source_path: PathBuf) -> u32 {
        let index = self.manifest.len();
        self.index_of_name_hash.set(entry.name_hash, index);
        self.manifest.push(entry);
        self.compile_records.push(CompileRecord {
            source_path,
            last_compiled: 0,
        });
        self.manifest_modified = true;
        self.build_parity.mark_dirty();
        index as u32
    }

    /// Turns the entry at `index` into a hole: retained for id stability,
    /// excluded from lookup and future `compile`/`pack` passes.
    pub fn remove_entry(&mut self, index: usize) {
        let name_hash = self.manifest[index].name_hash;
        self.manifest[index] = ResourceMetadata::hole();
        self.index_of_name_hash.remove(&name_hash);
        self.manifest_modified = true;
        self.build_parity.mark_dirty();
    }

    /// Compacts the manifest: holes are dropped, surviving entries and
    /// their compile records renumbered from 0. Forces a recompile of
    /// every surviving entry because ids (and hence `.compiled/<id>` file
    /// names) shift.
    pub fn compact(&mut self) {
        let mut new_manifest = Vec::new();
        let mut new_records = Vec::new();
        for (entry, record) in self.manifest.drain(..).zip(self.compile_records.drain(..)) {
            if !entry.is_hole() {
                new_manifest.push(entry);
                new_records.push(CompileRecord {
                    source_path: record.source_path,
                    last_compiled: 0,
                });
            }
        }
        self.manifest = new_manifest;
        self.compile_records = new_records;
        self.index_of_name_hash.clear();
        for (index, entry) in self.manifest.iter().enumerate() {
            self.index_of_name_hash.set(entry.name_hash, index);
        }
        self.manifest_modified = true;
        self.build_parity.mark_dirty();
    }

    /// Path of the compiled-blob file for manifest entry `index`, addressed
    /// by its stable numeric id rather than its source path.
    #[must_use]
    pub fn compiled_blob_path(&self, index: usize) -> PathBuf {
        self.root.join(".compiled").join(index.to_string())
    }

    fn manifest_path(&self) -> PathBuf {
        self.root.join(".compiled").join("manifest")
    }

    /// Loads a package's in-memory state from its `.compiled/manifest` file
    /// so a fresh `togo-cli` process picks up where the previous
    /// invocation left off. A package that has never been synced (no
    /// manifest file yet) loads as empty, matching a freshly `create`d
    /// package.
    ///
    /// # Errors
    /// Propagates a filesystem error other than "not found".
    pub fn load(name: impl Into<String>, root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let manifest_path = root.join(".compiled").join("manifest");
        let mut pkg = Self::new(name, root);

        let mut file = match FileStream::open(&manifest_path, FileMode::ReadBinary) {
            Some(file) => file,
            None => return Ok(pkg),
        };
        let mut ser = Serializer::reader(&mut file, Endian::default_target());
        let mut version = 0u32;
        ser.arithmetic(&mut version);
        assert_eq!(version, MANIFEST_FORMAT_VERSION, "PackageCompiler::load: unsupported manifest version");
        let mut in_parity = false;
        ser.arithmetic(&mut in_parity);
        pkg.build_parity = if in_parity { BuildParity::in_parity() } else { BuildParity::out_of_parity() };

        let mut count = 0u32;
        ser.arithmetic(&mut count);
        for index in 0..count as usize {
            let mut name_hash = 0u64;
            ser.arithmetic(&mut name_hash);
            let mut tag_glob_hash = 0u64;
            ser.arithmetic(&mut tag_glob_hash);
            let mut type_hash = 0u32;
            ser.arithmetic(&mut type_hash);
            let mut format_version = 0u32;
            ser.arithmetic(&mut format_version);
            let mut data_offset = 0u64;
            ser.arithmetic(&mut data_offset);
            let mut data_size = 0u64;
            ser.arithmetic(&mut data_size);
            let entry = ResourceMetadata { name_hash, tag_glob_hash, type_hash, format_version, data_offset, data_size };

            let mut source_path = String::new();
            SerString::<u32>::apply(&mut ser, &mut source_path, None);
            let mut last_compiled = 0u64;
            ser.arithmetic(&mut last_compiled);

            if !entry.is_hole() {
                pkg.index_of_name_hash.set(entry.name_hash, index);
            }
            pkg.manifest.push(entry);
            pkg.compile_records.push(CompileRecord { source_path: PathBuf::from(source_path), last_compiled });
        }
        Ok(pkg)
    }

    /// Writes the package's full state back to `.compiled/manifest`, the
    /// counterpart to [`PackageCompiler::load`].
    ///
    /// # Errors
    /// Propagates the underlying filesystem error.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(self.root.join(".compiled"))?;
        let mut file = FileStream::open(self.manifest_path(), FileMode::WriteBinaryTruncate)
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::Other, "failed to open manifest for write"))?;
        let mut ser = Serializer::writer(&mut file, Endian::default_target());
        let mut version = MANIFEST_FORMAT_VERSION;
        ser.arithmetic(&mut version);
        let mut in_parity = !self.build_parity.needs_build();
        ser.arithmetic(&mut in_parity);
        let mut count = self.manifest.len() as u32;
        ser.arithmetic(&mut count);
        for (entry, record) in self.manifest.iter().zip(self.compile_records.iter()) {
            let mut v = entry.name_hash;
            ser.arithmetic(&mut v);
            let mut v = entry.tag_glob_hash;
            ser.arithmetic(&mut v);
            let mut v = entry.type_hash;
            ser.arithmetic(&mut v);
            let mut v = entry.format_version;
            ser.arithmetic(&mut v);
            let mut v = entry.data_offset;
            ser.arithmetic(&mut v);
            let mut v = entry.data_size;
            ser.arithmetic(&mut v);
            let mut path = record.source_path.to_string_lossy().into_owned();
            SerString::<u32>::apply(&mut ser, &mut path, None);
            let mut last_compiled = record.last_compiled;
            ser.arithmetic(&mut last_compiled);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_then_remove_creates_a_hole() {
        let mut pkg = PackageCompiler::new("test_pkg", "/tmp/test_pkg");
        let entry = ResourceMetadata {
            name_hash: 7,
            tag_glob_hash: 0,
            type_hash: 1,
            format_version: 1,
            data_offset: 0,
            data_size: 0,
        };
        let id = pkg.add_entry(entry, PathBuf::from("a.txt"));
        assert_eq!(pkg.find_by_name_hash(7), Some(id as usize));

        pkg.remove_entry(id as usize);
        assert!(pkg.manifest()[id as usize].is_hole());
        assert_eq!(pkg.find_by_name_hash(7), None);
    }

    #[test]
    fn compact_drops_holes_and_renumbers() {
        let mut pkg = PackageCompiler::new("test_pkg", "/tmp/test_pkg");
        let mk = |h: u64| ResourceMetadata {
            name_hash: h,
            tag_glob_hash: 0,
            type_hash: 1,
            format_version: 1,
            data_offset: 0,
            data_size: 0,
        };
        pkg.add_entry(mk(1), PathBuf::from("a"));
        let b_id = pkg.add_entry(mk(2), PathBuf::from("b"));
        pkg.add_entry(mk(3), PathBuf::from("c"));
        pkg.remove_entry(b_id as usize);

        pkg.compact();
        assert_eq!(pkg.manifest().len(), 2);
        assert_eq!(pkg.find_by_name_hash(1), Some(0));
        assert_eq!(pkg.find_by_name_hash(3), Some(1));
    }

    #[test]
    fn build_parity_tracks_dirtiness() {
        let mut parity = BuildParity::in_parity();
        assert!(!parity.needs_build());
        parity.mark_dirty();
        assert!(parity.needs_build());
        parity.mark_in_parity();
        assert!(!parity.needs_build());
    }
}
