//! Functions, blocks and the per-block instruction constructors.

use super::{BinaryOp, BlockId, FuncId, Inst, InstId, UnaryOp};
use std::ops::{Index, IndexMut};

/// A basic block: an ordered list of instructions.
#[derive(Debug, Clone)]
pub struct Block {
    id: BlockId,
    insts: Vec<InstId>,
}

impl Block {
    /// The block's index within its function.
    pub fn id(&self) -> BlockId {
        self.id
    }

    /// Instructions in execution order.
    pub fn insts(&self) -> &[InstId] {
        &self.insts
    }
}

/// A function: blocks plus the arena of instructions they hold.
#[derive(Debug, Clone)]
pub struct IrFunction {
    id: FuncId,
    name: String,
    param_count: u32,
    blocks: Vec<Block>,
    insts: Vec<Inst>,
}

impl IrFunction {
    pub(super) fn new(id: FuncId, name: String, param_count: u32) -> Self {
        Self {
            id,
            name,
            param_count,
            blocks: Vec::new(),
            insts: Vec::new(),
        }
    }

    /// The function's process-wide id.
    pub fn id(&self) -> FuncId {
        self.id
    }

    /// Display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of declared formal parameters.
    pub fn param_count(&self) -> u32 {
        self.param_count
    }

    /// Blocks in creation order.
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Total number of instructions.
    pub fn inst_count(&self) -> usize {
        self.insts.len()
    }

    /// Appends a new, empty block.
    pub fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        self.blocks.push(Block {
            id,
            insts: Vec::new(),
        });
        id
    }

    /// Appends `inst` to the end of `block`.
    pub fn push(&mut self, block: BlockId, inst: Inst) -> InstId {
        let id = InstId(self.insts.len() as u32);
        self.insts.push(inst);
        self.blocks[block.index()].insts.push(id);
        id
    }

    /// Instruction constructors appending to `block`.
    pub fn at(&mut self, block: BlockId) -> BlockBuilder<'_> {
        BlockBuilder { func: self, block }
    }

    /// The last instruction of `block`, if any.
    pub fn last_inst(&self, block: BlockId) -> Option<&Inst> {
        self.blocks[block.index()]
            .insts
            .last()
            .map(|&id| &self.insts[id.index()])
    }

    /// Returns true if `block` already ends in a terminator.
    pub fn is_terminated(&self, block: BlockId) -> bool {
        self.last_inst(block).is_some_and(Inst::is_terminator)
    }
}

impl Index<InstId> for IrFunction {
    type Output = Inst;

    fn index(&self, id: InstId) -> &Inst {
        &self.insts[id.index()]
    }
}

impl IndexMut<InstId> for IrFunction {
    fn index_mut(&mut self, id: InstId) -> &mut Inst {
        &mut self.insts[id.index()]
    }
}

impl Index<BlockId> for IrFunction {
    type Output = Block;

    fn index(&self, id: BlockId) -> &Block {
        &self.blocks[id.index()]
    }
}

/// Appends instructions to one block of a function.
pub struct BlockBuilder<'a> {
    func: &'a mut IrFunction,
    block: BlockId,
}

impl BlockBuilder<'_> {
    /// The block being appended to.
    pub fn block(&self) -> BlockId {
        self.block
    }

    fn push(&mut self, inst: Inst) -> InstId {
        self.func.push(self.block, inst)
    }

    /// `return value`
    pub fn ret(&mut self, value: InstId) -> InstId {
        self.push(Inst::Return { value })
    }

    /// Reads a slot.
    pub fn load(&mut self, addr: InstId) -> InstId {
        self.push(Inst::Load { addr })
    }

    /// Writes a slot.
    pub fn store(&mut self, addr: InstId, value: InstId) -> InstId {
        self.push(Inst::Store { addr, value })
    }

    /// `object[key]`
    pub fn get_item(&mut self, object: InstId, key: InstId) -> InstId {
        self.push(Inst::GetItem { object, key })
    }

    /// `object[key] = value`
    pub fn set_item(&mut self, object: InstId, key: InstId, value: InstId) -> InstId {
        self.push(Inst::SetItem { object, key, value })
    }

    /// `delete object[key]`
    pub fn del_item(&mut self, object: InstId, key: InstId) -> InstId {
        self.push(Inst::DelItem { object, key })
    }

    /// `new callee(...args)`
    pub fn new_instance(&mut self, callee: InstId, args: InstId) -> InstId {
        self.push(Inst::New { callee, args })
    }

    /// Calls `callee` with receiver `this`.
    pub fn call(&mut self, callee: InstId, this: InstId, args: InstId) -> InstId {
        self.push(Inst::Call { callee, this, args })
    }

    /// Unconditional jump.
    pub fn jump(&mut self, target: BlockId) -> InstId {
        self.push(Inst::Jump { target })
    }

    /// Two-way branch.
    pub fn branch(&mut self, cond: InstId, then_block: BlockId, else_block: BlockId) -> InstId {
        self.push(Inst::Branch {
            cond,
            then_block,
            else_block,
        })
    }

    /// Address of the global binding `name`.
    pub fn get_global(&mut self, name: impl Into<String>) -> InstId {
        self.push(Inst::GetGlobal { name: name.into() })
    }

    /// `undefined`
    pub fn undefined(&mut self) -> InstId {
        self.push(Inst::Undefined)
    }

    /// `null`
    pub fn null(&mut self) -> InstId {
        self.push(Inst::Null)
    }

    /// `true` or `false`
    pub fn boolean(&mut self, value: bool) -> InstId {
        self.push(if value { Inst::True } else { Inst::False })
    }

    /// Number literal.
    pub fn number(&mut self, value: f64) -> InstId {
        self.push(Inst::Number(value))
    }

    /// String literal.
    pub fn string(&mut self, value: impl Into<String>) -> InstId {
        self.push(Inst::String(value.into()))
    }

    /// Regular expression literal.
    pub fn regex(&mut self, source: impl Into<String>) -> InstId {
        self.push(Inst::Regex(source.into()))
    }

    /// Object literal.
    pub fn object(&mut self, props: Vec<(InstId, InstId)>) -> InstId {
        self.push(Inst::Object { props })
    }

    /// Array literal.
    pub fn array(&mut self, elements: Vec<InstId>) -> InstId {
        self.push(Inst::Array { elements })
    }

    /// `function` closure.
    pub fn func(&mut self, func: FuncId, captured: Vec<InstId>) -> InstId {
        self.push(Inst::Func { func, captured })
    }

    /// Arrow closure.
    pub fn arrow(&mut self, func: FuncId, captured: Vec<InstId>) -> InstId {
        self.push(Inst::Arrow { func, captured })
    }

    /// Two-operand operator.
    pub fn binary(&mut self, op: BinaryOp, lhs: InstId, rhs: InstId) -> InstId {
        self.push(Inst::Binary { op, lhs, rhs })
    }

    /// One-operand operator.
    pub fn unary(&mut self, op: UnaryOp, operand: InstId) -> InstId {
        self.push(Inst::Unary { op, operand })
    }

    /// Enters a scope frame.
    pub fn push_scope(&mut self, size: u32, captured: Vec<InstId>) -> InstId {
        self.push(Inst::PushScope { size, captured })
    }

    /// Leaves `count` scope frames.
    pub fn pop_scope(&mut self, count: u32) -> InstId {
        self.push(Inst::PopScope { count })
    }

    /// New local slot.
    pub fn alloca(&mut self) -> InstId {
        self.push(Inst::Alloca)
    }

    /// Parameter slot.
    pub fn arg(&mut self, index: u32) -> InstId {
        self.push(Inst::Arg { index })
    }

    /// Captured slot.
    pub fn capture(&mut self, index: u32) -> InstId {
        self.push(Inst::Capture { index })
    }

    /// `this`
    pub fn this(&mut self) -> InstId {
        self.push(Inst::This)
    }

    /// The arguments object.
    pub fn arguments(&mut self) -> InstId {
        self.push(Inst::Arguments)
    }

    /// Copies `value`.
    pub fn move_value(&mut self, value: InstId) -> InstId {
        self.push(Inst::Move { value })
    }

    /// Merge point.
    pub fn phi(&mut self, incoming: Vec<(BlockId, InstId)>) -> InstId {
        self.push(Inst::Phi { incoming })
    }

    /// Breakpoint.
    pub fn debugger(&mut self) -> InstId {
        self.push(Inst::Debugger)
    }
}
