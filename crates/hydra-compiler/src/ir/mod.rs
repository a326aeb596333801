//! The in-memory IR: modules of functions, functions of basic blocks,
//! blocks of instructions.
//!
//! Instructions live in a per-function arena and are addressed by
//! [`InstId`] from the moment they are created. Display names and linear
//! offsets are derived from block order when the function is printed or
//! encoded, so neither needs to be stored on the instruction.

mod decode;
mod display;
mod encode;
mod function;
mod instruction;
mod verify;

pub use decode::{DecodedFunction, DecodedInst, Operand};
pub use function::{Block, BlockBuilder, IrFunction};
pub use instruction::{BinaryOp, Inst, Tag, UnaryOp};

use rustc_hash::FxHashMap;
use std::fmt;
use std::ops::{Index, IndexMut};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Process-wide identifier of a function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub u32);

/// Index of a block within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

/// Arena index of an instruction within its function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstId(pub u32);

impl BlockId {
    /// Position in the function's block list.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl InstId {
    /// Position in the function's instruction arena.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FuncId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "blk_{}", self.0)
    }
}

impl fmt::Display for InstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "%{}", self.0)
    }
}

/// Allocator of globally unique function identifiers.
///
/// Clones share one counter, so every compilation that receives a clone
/// draws from the same sequence, including compilations running on other
/// threads.
#[derive(Debug, Clone, Default)]
pub struct FunctionIds {
    next: Arc<AtomicU32>,
}

impl FunctionIds {
    /// Creates an allocator starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an allocator whose first identifier is `first`.
    pub fn starting_at(first: u32) -> Self {
        Self {
            next: Arc::new(AtomicU32::new(first)),
        }
    }

    /// Returns a fresh identifier.
    pub fn next_function_id(&self) -> FuncId {
        FuncId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

/// A compilation unit: an ordered list of functions.
#[derive(Debug)]
pub struct IrModule {
    name: String,
    ids: FunctionIds,
    functions: Vec<IrFunction>,
    index: FxHashMap<FuncId, usize>,
}

impl IrModule {
    /// Creates an empty module drawing function ids from `ids`.
    pub fn new(name: impl Into<String>, ids: &FunctionIds) -> Self {
        Self {
            name: name.into(),
            ids: ids.clone(),
            functions: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    /// Display name of the module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a function and returns its id.
    pub fn new_func(&mut self, name: impl Into<String>, param_count: u32) -> FuncId {
        let id = self.ids.next_function_id();
        self.index.insert(id, self.functions.len());
        self.functions.push(IrFunction::new(id, name.into(), param_count));
        id
    }

    /// Functions in creation order.
    pub fn functions(&self) -> &[IrFunction] {
        &self.functions
    }

    /// Looks up a function by id.
    pub fn function(&self, id: FuncId) -> Option<&IrFunction> {
        self.index.get(&id).map(|&i| &self.functions[i])
    }
}

impl Index<FuncId> for IrModule {
    type Output = IrFunction;

    fn index(&self, id: FuncId) -> &IrFunction {
        &self.functions[self.index[&id]]
    }
}

impl IndexMut<FuncId> for IrModule {
    fn index_mut(&mut self, id: FuncId) -> &mut IrFunction {
        &mut self.functions[self.index[&id]]
    }
}
