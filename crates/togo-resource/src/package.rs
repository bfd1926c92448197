//! The on-disk package archive format: a fixed-size manifest of
//! [`ResourceMetadata`] records followed by the resource blobs they point
//! into.
//!
//! ```text
//! u32   format_version        = 3
//! u32   manifest_entry_count
//! ResourceMetadata[entry_count]
//! <resource blobs, back to back, addressed by entry.data_offset/data_size>
//! ```
//!
//! There is no padding beyond the manifest itself: entry 0's `data_offset`
//! is defined to be exactly `header size + entry count * record size`, so
//! blobs begin immediately after the last manifest record.

use togo_serialize::{Endian, Serializer};
use togo_stream::{Reader, Seekable, Writer};

pub const FORMAT_VERSION: u32 = 3;
const RECORD_SIZE: u64 = 8 + 8 + 4 + 4 + 8 + 8;
const HEADER_SIZE: u64 = 4 + 4;

/// A single manifest record. `type_hash == 0` marks a hole: a retired slot
/// kept around so later entries' ids don't shift.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceMetadata {
    pub name_hash: u64,
    pub tag_glob_hash: u64,
    pub type_hash: u32,
    pub format_version: u32,
    pub data_offset: u64,
    pub data_size: u64,
}

impl ResourceMetadata {
    #[must_use]
    pub const fn hole() -> Self {
        Self {
            name_hash: 0,
            tag_glob_hash: 0,
            type_hash: 0,
            format_version: 0,
            data_offset: 0,
            data_size: 0,
        }
    }

    #[must_use]
    pub const fn is_hole(&self) -> bool {
        self.type_hash == 0
    }
}

/// A fully in-memory package: the manifest plus each entry's blob bytes
/// (empty for holes).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Archive {
    pub entries: Vec<ResourceMetadata>,
    pub blobs: Vec<Vec<u8>>,
}

impl Archive {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut entry: ResourceMetadata, blob: Vec<u8>) {
        entry.data_size = blob.len() as u64;
        self.entries.push(entry);
        self.blobs.push(blob);
    }

    /// Patches every non-hole entry's `data_offset` for sequential,
    /// gap-free layout starting right after the manifest, then writes the
    /// full archive.
    pub fn write(&mut self, writer: &mut dyn Writer) {
        let mut offset = HEADER_SIZE + self.entries.len() as u64 * RECORD_SIZE;
        for entry in &mut self.entries {
            if entry.is_hole() {
                entry.data_offset = 0;
            } else {
                entry.data_offset = offset;
                offset += entry.data_size;
            }
        }

        let mut ser = Serializer::writer(writer, Endian::default_target());
        let mut version = FORMAT_VERSION;
        ser.arithmetic(&mut version);
        let mut count = self.entries.len() as u32;
        ser.arithmetic(&mut count);
        for entry in &self.entries {
            write_metadata(&mut ser, entry);
        }
        drop(ser);

        for (entry, blob) in self.entries.iter().zip(&self.blobs) {
            if !entry.is_hole() {
                assert!(writer.write(blob).is_ok(), "Archive::write: blob write failed");
            }
        }
    }

    /// Reads an archive previously produced by [`Archive::write`]. `reader`
    /// must also implement [`Seekable`] since each blob is fetched at its
    /// recorded offset.
    ///
    /// # Panics
    /// Panics if the version header doesn't match [`FORMAT_VERSION`].
    pub fn read<R: Reader + Seekable>(reader: &mut R) -> Self {
        let mut version = 0u32;
        let mut count = 0u32;
        {
            let mut ser = Serializer::reader(reader, Endian::default_target());
            ser.arithmetic(&mut version);
            assert_eq!(version, FORMAT_VERSION, "Archive::read: unsupported format version");
            ser.arithmetic(&mut count);
        }
        let mut entries = Vec::with_capacity(count as usize);
        {
            let mut ser = Serializer::reader(reader, Endian::default_target());
            for _ in 0..count {
                entries.push(read_metadata(&mut ser));
            }
        }

        let mut blobs = Vec::with_capacity(entries.len());
        for entry in &entries {
            if entry.is_hole() {
                blobs.push(Vec::new());
                continue;
            }
            reader.seek_to(entry.data_offset);
            let mut buf = vec![0u8; entry.data_size as usize];
            let (n, status) = reader.read(&mut buf);
            assert!(
                n == buf.len() && status.is_ok(),
                "Archive::read: short read for a resource blob"
            );
            blobs.push(buf);
        }

        Self { entries, blobs }
    }
}

fn write_metadata(ser: &mut Serializer<'_>, m: &ResourceMetadata) {
    let mut name_hash = m.name_hash;
    ser.arithmetic(&mut name_hash);
    let mut tag_glob_hash = m.tag_glob_hash;
    ser.arithmetic(&mut tag_glob_hash);
    let mut type_hash = m.type_hash;
    ser.arithmetic(&mut type_hash);
    let mut format_version = m.format_version;
    ser.arithmetic(&mut format_version);
    let mut data_offset = m.data_offset;
    ser.arithmetic(&mut data_offset);
    let mut data_size = m.data_size;
    ser.arithmetic(&mut data_size);
}

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

#[cfg(test)]
mod tests {
    use super::*;
    use togo_stream::{FileMode, FileStream};

    #[test]
    fn round_trips_through_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test.package");

        let mut archive = Archive::new();
        archive.push(
            ResourceMetadata {
                name_hash: 42,
                tag_glob_hash: 0,
                type_hash: 7,
                format_version: 1,
                data_offset: 0,
                data_size: 0,
            },
            b"hello".to_vec(),
        );
        archive.push(ResourceMetadata::hole(), Vec::new());
        archive.push(
            ResourceMetadata {
                name_hash: 99,
                tag_glob_hash: 0,
                type_hash: 7,
                format_version: 1,
                data_offset: 0,
                data_size: 0,
            },
            b"world!".to_vec(),
        );

        {
            let mut w = FileStream::open(&path, FileMode::WriteBinaryTruncate).unwrap();
            archive.write(&mut w);
        }

        let mut r = FileStream::open(&path, FileMode::ReadBinary).unwrap();
        let read_back = Archive::read(&mut r);

        assert_eq!(read_back.entries.len(), 3);
        assert!(read_back.entries[1].is_hole());
        assert_eq!(read_back.blobs[0], b"hello");
        assert_eq!(read_back.blobs[2], b"world!");
    }

    #[test]
    fn blobs_are_laid_out_gap_free_after_the_manifest() {
        let mut archive = Archive::new();
        archive.push(
            ResourceMetadata {
                type_hash: 1,
                ..ResourceMetadata::hole()
            },
            vec![0; 10],
        );
        let mut sink = togo_stream::MemoryWriterStream::new();
        archive.write(&mut sink);
        let expected_first_offset = HEADER_SIZE + RECORD_SIZE;
        assert_eq!(archive.entries[0].data_offset, expected_first_offset);
    }
}
