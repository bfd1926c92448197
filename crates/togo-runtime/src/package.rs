//! `ResourcePackage`: a mounted `.package` archive. Reads only the header
//! and manifest at mount time, keeps the file open as a shared reader, and
//! streams individual resource blobs on demand rather than holding the
//! whole archive in memory (unlike [`togo_resource::Archive::read`], which
//! is the offline-side, whole-archive-in-memory counterpart).

use std::cell::{Cell, RefCell, RefMut};
use std::path::{Path, PathBuf};

use togo_core::HashMap as TogoHashMap;
use togo_resource::{ResourceMetadata, ResourceType};
use togo_serialize::{Endian, Serializer};
use togo_stream::{FileMode, FileStream, IOStatus, Reader, Seekable};

use crate::error::{Error, Result};

fn read_metadata(ser: &mut Serializer<'_>) -> ResourceMetadata {
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
    ResourceMetadata {
        name_hash,
        tag_glob_hash,
        type_hash,
        format_version,
        data_offset,
        data_size,
    }
}

/// A single reader borrowed from the archive's file, bounded to one
/// manifest entry's byte range. Dropping it clears the package's
/// at-most-one-active-stream flag, so every exit path (early return, panic
/// unwind, normal completion) releases the lock.
pub struct ResourceStreamLock<'a> {
    active: &'a Cell<bool>,
    reader: RefMut<'a, FileStream>,
    cursor: u64,
    end_offset: u64,
}

impl Reader for ResourceStreamLock<'_> {
    fn read(&mut self, buf: &mut [u8]) -> (usize, IOStatus) {
        let remaining = self.end_offset.saturating_sub(self.cursor) as usize;
        let capped = &mut buf[..buf.len().min(remaining)];
        let (n, status) = self.reader.read(capped);
        self.cursor += n as u64;
        if n < buf.len() {
            (n, IOStatus::ok_eof())
        } else {
            (n, status)
        }
    }
}

impl Drop for ResourceStreamLock<'_> {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

pub struct ResourcePackage {
    path: PathBuf,
    manifest: Vec<ResourceMetadata>,
    index_of_name_hash: TogoHashMap<u64, usize>,
    reader: RefCell<FileStream>,
    stream_active: Cell<bool>,
}

impl ResourcePackage {
    /// Mounts `path`: reads the version header and the full manifest, then
    /// keeps the file open for later streamed reads of individual blobs.
    ///
    /// `has_handler` is consulted for every non-hole manifest entry's type:
    /// a handler is required before any package claiming that type can be
    /// mounted, matching the original's assertion at open time.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be opened, [`Error::HandlerNotRegistered`]
    /// if the manifest claims a type with no registered handler, or panics
    /// (via the shared serializer) if the version header doesn't match.
    pub fn mount(path: impl AsRef<Path>, has_handler: impl Fn(u32) -> bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = FileStream::open(&path, FileMode::ReadBinary)
            .ok_or_else(|| Error::Io(std::io::Error::new(std::io::ErrorKind::NotFound, path.display().to_string())))?;

        let mut version = 0u32;
        let mut count = 0u32;
        {
            let mut ser = Serializer::reader(&mut file, Endian::default_target());
            ser.arithmetic(&mut version);
            assert_eq!(version, togo_resource::FORMAT_VERSION, "ResourcePackage::mount: unsupported archive version");
            ser.arithmetic(&mut count);
        }

        let mut manifest = Vec::with_capacity(count as usize);
        {
            let mut ser = Serializer::reader(&mut file, Endian::default_target());
            for _ in 0..count {
                manifest.push(read_metadata(&mut ser));
            }
        }

        for entry in &manifest {
            if !entry.is_hole() && !has_handler(entry.type_hash) {
                return Err(Error::handler_not_registered(ResourceType(entry.type_hash)));
            }
        }

        let mut index_of_name_hash = TogoHashMap::new();
        for (index, entry) in manifest.iter().enumerate() {
            if !entry.is_hole() {
                index_of_name_hash.set(entry.name_hash, index);
            }
        }

        Ok(Self {
            path,
            manifest,
            index_of_name_hash,
            reader: RefCell::new(file),
            stream_active: Cell::new(false),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn manifest(&self) -> &[ResourceMetadata] {
        &self.manifest
    }

    #[must_use]
    pub fn find_by_name_hash(&self, name_hash: u64) -> Option<usize> {
        self.index_of_name_hash.get(&name_hash).copied()
    }

    /// Opens a bounded reader over manifest entry `index`'s blob.
    ///
    /// # Panics
    /// Panics if a stream from this archive is already open; an archive
    /// permits at most one active resource stream at a time.
    #[must_use]
    pub fn open_resource_stream(&self, index: usize) -> ResourceStreamLock<'_> {
        assert!(!self.stream_active.get(), "ResourcePackage: a resource stream is already open");
        let entry = &self.manifest[index];
        let mut reader = self.reader.borrow_mut();
        reader.seek_to(entry.data_offset);
        self.stream_active.set(true);
        ResourceStreamLock {
            active: &self.stream_active,
            reader,
            cursor: entry.data_offset,
            end_offset: entry.data_offset + entry.data_size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use togo_resource::Archive;

    fn build_archive(path: &Path) {
        let mut archive = Archive::new();
        archive.push(
            ResourceMetadata {
                name_hash: 1,
                tag_glob_hash: 0,
                type_hash: 7,
                format_version: 1,
                data_offset: 0,
                data_size: 0,
            },
            b"hello world".to_vec(),
        );
        let mut w = FileStream::open(path, FileMode::WriteBinaryTruncate).unwrap();
        archive.write(&mut w);
    }

    #[test]
    fn mount_reads_manifest_and_streams_a_blob() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.package");
        build_archive(&path);

        let package = ResourcePackage::mount(&path, |_| true).unwrap();
        assert_eq!(package.manifest().len(), 1);
        let index = package.find_by_name_hash(1).unwrap();

        let mut buf = vec![0u8; 11];
        {
            let mut stream = package.open_resource_stream(index);
            let (n, status) = stream.read(&mut buf);
            assert_eq!(n, 11);
            assert!(status.is_ok());
        }
        assert_eq!(&buf, b"hello world");
        // the lock dropped, so opening another stream does not panic
        let _second = package.open_resource_stream(index);
    }

    #[test]
    #[should_panic(expected = "already open")]
    fn at_most_one_active_stream_is_enforced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.package");
        build_archive(&path);

        let package = ResourcePackage::mount(&path, |_| true).unwrap();
        let index = package.find_by_name_hash(1).unwrap();
        let _first = package.open_resource_stream(index);
        let _second = package.open_resource_stream(index);
    }

    #[test]
    fn mount_rejects_a_type_with_no_registered_handler() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.package");
        build_archive(&path);

        let err = ResourcePackage::mount(&path, |_| false).unwrap_err();
        assert!(matches!(err, Error::HandlerNotRegistered(7)));
    }
}
