//! Module container: header plus 8-byte aligned sections.

use super::BufferWriter;
use crate::error::Result;
use std::path::Path;
use tracing::debug;

/// Magic tag at the start of the header payload.
pub const MAGIC: [u8; 4] = *b"HYIR";

/// Section type codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum SectionType {
    /// One compiled function
    Function = 0,
    /// The module's string pool
    StringPool = 1,
}

impl TryFrom<u32> for SectionType {
    type Error = u32;

    fn try_from(value: u32) -> std::result::Result<Self, u32> {
        match value {
            0 => Ok(SectionType::Function),
            1 => Ok(SectionType::StringPool),
            other => Err(other),
        }
    }
}

#[derive(Debug)]
struct Section {
    kind: SectionType,
    writer: BufferWriter,
}

/// An assembled module, ready to be written out.
#[derive(Debug, Default)]
pub struct ByteCode {
    sections: Vec<Section>,
}

impl ByteCode {
    /// Creates a container with no sections.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a section backed by an already populated writer.
    pub fn add_section(&mut self, writer: BufferWriter, kind: SectionType) {
        self.sections.push(Section { kind, writer });
    }

    /// Number of sections, not counting the header.
    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// File offsets of each section's length prefix.
    pub fn section_offsets(&self) -> Vec<u32> {
        let header_len = 4 + 4 + 8 * self.sections.len();
        let mut offset = (4 + header_len).next_multiple_of(8);
        let mut offsets = Vec::with_capacity(self.sections.len());
        for section in &self.sections {
            offsets.push(offset as u32);
            offset = (offset + 4 + section.writer.len()).next_multiple_of(8);
        }
        offsets
    }

    /// Serializes the header and every section.
    pub fn to_bytes(&self) -> Vec<u8> {
        let offsets = self.section_offsets();

        let mut header = BufferWriter::new();
        header.raw(&MAGIC);
        header.uint(self.sections.len() as u32);
        for (section, &offset) in self.sections.iter().zip(&offsets) {
            header.uint(section.kind as u32);
            header.uint(offset);
        }

        let mut file = BufferWriter::new();
        write_section(&mut file, header.as_bytes());
        for (section, &offset) in self.sections.iter().zip(&offsets) {
            debug_assert_eq!(file.len(), offset as usize);
            write_section(&mut file, section.writer.as_bytes());
        }
        file.into_bytes()
    }

    /// Writes the module to `path`.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_bytes();
        debug!(path = %path.as_ref().display(), bytes = bytes.len(), "storing module");
        std::fs::write(path, bytes)?;
        Ok(())
    }
}

fn write_section(file: &mut BufferWriter, payload: &[u8]) {
    file.uint(payload.len() as u32);
    file.raw(payload);
    file.align(8);
}
