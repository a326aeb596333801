//! Validating reader for module files.

use super::{MAGIC, SectionType};
use crate::error::{Error, Result};

/// One section located through the header table.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    /// Section type
    pub kind: SectionType,
    /// File offset of the section's length prefix
    pub offset: u32,
    /// Section payload, without the length prefix
    pub payload: &'a [u8],
}

/// A parsed module file.
#[derive(Debug)]
pub struct ModuleReader<'a> {
    sections: Vec<Section<'a>>,
    string_pool: &'a [u8],
}

impl<'a> ModuleReader<'a> {
    /// Parses and validates the header and section table of `data`.
    pub fn parse(data: &'a [u8]) -> Result<Self> {
        let header = length_prefixed(data, 0)?;
        let mut reader = SectionReader::new(header);
        if reader.take(4)? != MAGIC.as_slice() {
            return Err(invalid("bad magic"));
        }
        let count = reader.uint()?;

        // each table entry is 8 bytes; bound the allocation by what the header holds
        let mut sections = Vec::with_capacity((count as usize).min(reader.remaining() / 8));
        let mut expected = (4 + header.len()).next_multiple_of(8);
        for _ in 0..count {
            let code = reader.uint()?;
            let offset = reader.uint()?;
            let kind = SectionType::try_from(code)
                .map_err(|code| invalid(format!("unknown section type {code}")))?;
            if offset % 8 != 0 {
                return Err(invalid(format!("section offset {offset} is not 8-byte aligned")));
            }
            if offset as usize != expected {
                return Err(invalid(format!(
                    "section offset {offset} does not follow the previous section (expected {expected})"
                )));
            }
            let payload = length_prefixed(data, offset as usize)?;
            expected = (expected + 4 + payload.len()).next_multiple_of(8);
            sections.push(Section { kind, offset, payload });
        }

        let mut pools = sections.iter().filter(|s| s.kind == SectionType::StringPool);
        let string_pool = match (pools.next(), pools.next()) {
            (Some(pool), None) => pool.payload,
            (None, _) => return Err(invalid("missing string pool section")),
            (Some(_), Some(_)) => return Err(invalid("more than one string pool section")),
        };

        Ok(Self {
            sections,
            string_pool,
        })
    }

    /// Every section, in header order.
    pub fn sections(&self) -> &[Section<'a>] {
        &self.sections
    }

    /// Payloads of the function sections, in order.
    pub fn functions(&self) -> impl Iterator<Item = &'a [u8]> + '_ {
        self.sections
            .iter()
            .filter(|s| s.kind == SectionType::Function)
            .map(|s| s.payload)
    }

    /// Decodes the string stored at `offset` in the string pool.
    pub fn string_at(&self, offset: u32) -> Result<String> {
        let mut reader = SectionReader::new(self.string_pool);
        reader.seek(offset as usize)?;
        reader.string()
    }

    /// Every string-pool entry with its offset.
    pub fn strings(&self) -> Result<Vec<(u32, String)>> {
        let mut reader = SectionReader::new(self.string_pool);
        let mut entries = Vec::new();
        while reader.remaining() > 0 {
            reader.seek(reader.position().next_multiple_of(4))?;
            if reader.remaining() == 0 {
                break;
            }
            let offset = reader.position() as u32;
            entries.push((offset, reader.string()?));
        }
        Ok(entries)
    }
}

/// Cursor over a section payload.
#[derive(Debug, Clone)]
pub struct SectionReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> SectionReader<'a> {
    /// Starts reading at the beginning of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left to read.
    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Moves to an absolute position.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(invalid(format!("offset {pos} is past the end of the section")));
        }
        self.pos = pos;
        Ok(())
    }

    /// Reads `len` raw bytes.
    pub fn take(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| invalid(format!("truncated section at offset {}", self.pos)))?;
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a u32.
    pub fn uint(&mut self) -> Result<u32> {
        let bytes = self.take(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads an f64.
    pub fn double(&mut self) -> Result<f64> {
        let mut raw = [0u8; 8];
        raw.copy_from_slice(self.take(8)?);
        Ok(f64::from_le_bytes(raw))
    }

    /// Reads a u32 code-unit count followed by UTF-16 code units.
    pub fn string(&mut self) -> Result<String> {
        let len = self.uint()? as usize;
        let bytes = self.take(len * 2)?;
        let units: Vec<u16> = bytes
            .chunks_exact(2)
            .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16(&units).map_err(|e| invalid(format!("bad string: {e}")))
    }
}

fn length_prefixed(data: &[u8], offset: usize) -> Result<&[u8]> {
    let mut reader = SectionReader::new(data);
    reader.seek(offset)?;
    let len = reader.uint()? as usize;
    reader.take(len)
}

fn invalid(msg: impl Into<String>) -> Error {
    Error::InvalidModule(msg.into())
}
