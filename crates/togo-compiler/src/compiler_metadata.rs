//! `compiler_metadata`: the project-local binary file recording, per
//! manifest entry, its authoring source path and the timestamp it was last
//! compiled at.

use std::path::PathBuf;

use togo_serialize::{Endian, SerString, Serializer};
use togo_stream::{Reader, Writer};

use crate::package_compiler::CompileRecord;

pub fn write(records: &[CompileRecord], writer: &mut dyn Writer) {
    let mut ser = Serializer::writer(writer, Endian::default_target());
    let mut count = records.len() as u32;
    ser.arithmetic(&mut count);
    for record in records {
        let mut path = record.source_path.to_string_lossy().into_owned();
        SerString::<u32>::apply(&mut ser, &mut path, None);
        let mut last_compiled = record.last_compiled;
        ser.arithmetic(&mut last_compiled);
    }
}

#[must_use]
pub fn read(reader: &mut dyn Reader) -> Vec<CompileRecord> {
    let mut ser = Serializer::reader(reader, Endian::default_target());
    let mut count = 0u32;
    ser.arithmetic(&mut count);
    (0..count)
        .map(|_| {
            let mut path = String::new();
            SerString::<u32>::apply(&mut ser, &mut path, None);
            let mut last_compiled = 0u64;
            ser.arithmetic(&mut last_compiled);
            CompileRecord {
                source_path: PathBuf::from(path),
                last_compiled,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use togo_stream::{MemoryReader, MemoryWriterStream};

    #[test]
    fn round_trips_records() {
        let records = vec![
            CompileRecord {
                source_path: PathBuf::from("src/a.shader"),
                last_compiled: 1_700_000_000,
            },
            CompileRecord {
                source_path: PathBuf::from("src/b.shader"),
                last_compiled: 0,
            },
        ];
        let mut w = MemoryWriterStream::new();
        write(&records, &mut w);
        let bytes = w.into_inner();
        let mut r = MemoryReader::new(&bytes);
        assert_eq!(read(&mut r), records);
    }
}
