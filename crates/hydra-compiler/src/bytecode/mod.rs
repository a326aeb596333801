//! The HYIR binary module format.
//!
//! A module file is a length-prefixed header section followed by
//! length-prefixed payload sections, every section starting on an 8-byte
//! boundary:
//!
//! ```text
//! header:   u32 len | 'H' 'Y' 'I' 'R' | u32 count | count x (u32 type, u32 offset)
//! section:  u32 len | payload
//! ```
//!
//! All integers are little-endian. Strings live in a single string-pool
//! section and are referenced by their byte offset within it.

mod container;
mod reader;
mod string_pool;
mod writer;

pub use container::{ByteCode, MAGIC, SectionType};
pub use reader::{ModuleReader, Section, SectionReader};
pub use string_pool::StringPool;
pub use writer::{BLOCK_SIZE, BufferWriter};
