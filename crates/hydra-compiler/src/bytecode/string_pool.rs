//! Deduplicating string table.

use super::BufferWriter;
use rustc_hash::FxHashMap;

/// Maps each distinct string to its offset inside the pool's writer.
#[derive(Debug, Default)]
pub struct StringPool {
    offsets: FxHashMap<String, u32>,
    writer: BufferWriter,
}

impl StringPool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the offset of `value`, writing it on first use.
    pub fn get(&mut self, value: &str) -> u32 {
        if let Some(&offset) = self.offsets.get(value) {
            return offset;
        }
        let offset = self.writer.string(value) as u32;
        self.offsets.insert(value.to_string(), offset);
        offset
    }

    /// Number of distinct strings.
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    /// Returns true if no string has been added.
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Consumes the pool, returning the writer holding its entries.
    pub fn into_writer(self) -> BufferWriter {
        self.writer
    }
}
