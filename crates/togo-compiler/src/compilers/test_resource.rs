//! The `test_resource` compiler: an identity transform used to exercise the
//! compile pipeline without depending on any of the real asset formats.

use togo_resource::ResourceType;
use togo_stream::{Reader, Writer};

use crate::manager::{CompilerContext, ResourceCompiler};

pub const FORMAT_VERSION: u32 = 1;

pub struct TestResourceCompiler;

impl ResourceCompiler for TestResourceCompiler {
    fn resource_type(&self) -> ResourceType {
        ResourceType::of("test_resource")
    }

    fn format_version(&self) -> u32 {
        FORMAT_VERSION
    }

    fn compile(&self, _ctx: &CompilerContext<'_>, in_reader: &mut dyn Reader, out_writer: &mut dyn Writer) -> bool {
        let mut buf = [0u8; 4096];
        loop {
            let (n, status) = in_reader.read(&mut buf);
            if n > 0 && !out_writer.write(&buf[..n]).is_ok() {
                return false;
            }
            if status.is_fail() {
                return false;
            }
            if status.is_eof() || n == 0 {
                return true;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use togo_stream::{MemoryReader, MemoryWriterStream};

    #[test]
    fn copies_input_verbatim() {
        let compiler = TestResourceCompiler;
        let mut in_stream = MemoryReader::new(b"hello resource");
        let mut out_stream = MemoryWriterStream::new();
        let ctx = CompilerContext {
            package_name: "test",
            name_hash: 0,
            manifest_id: 0,
        };
        assert!(compiler.compile(&ctx, &mut in_stream, &mut out_stream));
        assert_eq!(out_stream.as_slice(), b"hello resource");
    }

    #[test]
    fn format_version_is_one() {
        assert_eq!(TestResourceCompiler.format_version(), 1);
    }
}
