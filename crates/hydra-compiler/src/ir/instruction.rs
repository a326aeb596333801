//! The closed instruction set.

use super::{BlockId, FuncId, InstId};

/// Wire tag of each instruction kind. The numbering is fixed by the
/// runtime's loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
#[allow(missing_docs)]
pub enum Tag {
    Return = 0,
    Load = 1,
    Store = 2,
    GetItem = 3,
    SetItem = 4,
    DelItem = 5,
    New = 6,
    Call = 7,
    Jump = 8,
    Branch = 9,
    GetGlobal = 10,
    Undefined = 11,
    Null = 12,
    True = 13,
    False = 14,
    Number = 15,
    String = 16,
    Regex = 17,
    Object = 18,
    Array = 19,
    Func = 20,
    Arrow = 21,
    Add = 22,
    Sub = 23,
    Mul = 24,
    Div = 25,
    Mod = 26,
    BAnd = 27,
    BOr = 28,
    BXor = 29,
    BNot = 30,
    LNot = 31,
    Sll = 32,
    Srl = 33,
    Srr = 34,
    Eq = 35,
    Eqq = 36,
    Ne = 37,
    Nee = 38,
    Gt = 39,
    Ge = 40,
    Lt = 41,
    Le = 42,
    In = 43,
    InstanceOf = 44,
    TypeOf = 45,
    PushScope = 46,
    PopScope = 47,
    Alloca = 48,
    Arg = 49,
    Capture = 50,
    This = 51,
    Arguments = 52,
    Move = 53,
    Phi = 54,
    Debugger = 55,
    /// Numeric negation. Appended after the loader's opcode table, so a
    /// loader must map 56 to negation before it can run modules that use
    /// `-x`; `0 - x` is not a substitute because it turns `-0` into `0`.
    Neg = 56,
}

impl Tag {
    /// Every tag, indexed by its wire value.
    pub const ALL: [Tag; 57] = [
        Tag::Return,
        Tag::Load,
        Tag::Store,
        Tag::GetItem,
        Tag::SetItem,
        Tag::DelItem,
        Tag::New,
        Tag::Call,
        Tag::Jump,
        Tag::Branch,
        Tag::GetGlobal,
        Tag::Undefined,
        Tag::Null,
        Tag::True,
        Tag::False,
        Tag::Number,
        Tag::String,
        Tag::Regex,
        Tag::Object,
        Tag::Array,
        Tag::Func,
        Tag::Arrow,
        Tag::Add,
        Tag::Sub,
        Tag::Mul,
        Tag::Div,
        Tag::Mod,
        Tag::BAnd,
        Tag::BOr,
        Tag::BXor,
        Tag::BNot,
        Tag::LNot,
        Tag::Sll,
        Tag::Srl,
        Tag::Srr,
        Tag::Eq,
        Tag::Eqq,
        Tag::Ne,
        Tag::Nee,
        Tag::Gt,
        Tag::Ge,
        Tag::Lt,
        Tag::Le,
        Tag::In,
        Tag::InstanceOf,
        Tag::TypeOf,
        Tag::PushScope,
        Tag::PopScope,
        Tag::Alloca,
        Tag::Arg,
        Tag::Capture,
        Tag::This,
        Tag::Arguments,
        Tag::Move,
        Tag::Phi,
        Tag::Debugger,
        Tag::Neg,
    ];

    /// Lower-case name used by the text dump.
    pub fn mnemonic(self) -> &'static str {
        match self {
            Tag::Return => "return",
            Tag::Load => "load",
            Tag::Store => "store",
            Tag::GetItem => "get_item",
            Tag::SetItem => "set_item",
            Tag::DelItem => "del_item",
            Tag::New => "new",
            Tag::Call => "call",
            Tag::Jump => "jump",
            Tag::Branch => "branch",
            Tag::GetGlobal => "get_global",
            Tag::Undefined => "undefined",
            Tag::Null => "null",
            Tag::True => "true",
            Tag::False => "false",
            Tag::Number => "number",
            Tag::String => "string",
            Tag::Regex => "regex",
            Tag::Object => "object",
            Tag::Array => "array",
            Tag::Func => "func",
            Tag::Arrow => "arrow",
            Tag::Add => "add",
            Tag::Sub => "sub",
            Tag::Mul => "mul",
            Tag::Div => "div",
            Tag::Mod => "mod",
            Tag::BAnd => "band",
            Tag::BOr => "bor",
            Tag::BXor => "bxor",
            Tag::BNot => "bnot",
            Tag::LNot => "lnot",
            Tag::Sll => "sll",
            Tag::Srl => "srl",
            Tag::Srr => "srr",
            Tag::Eq => "eq",
            Tag::Eqq => "eqq",
            Tag::Ne => "ne",
            Tag::Nee => "nee",
            Tag::Gt => "gt",
            Tag::Ge => "ge",
            Tag::Lt => "lt",
            Tag::Le => "le",
            Tag::In => "in",
            Tag::InstanceOf => "instanceof",
            Tag::TypeOf => "typeof",
            Tag::PushScope => "push_scope",
            Tag::PopScope => "pop_scope",
            Tag::Alloca => "alloca",
            Tag::Arg => "arg",
            Tag::Capture => "capture",
            Tag::This => "this",
            Tag::Arguments => "arguments",
            Tag::Move => "move",
            Tag::Phi => "phi",
            Tag::Debugger => "debugger",
            Tag::Neg => "neg",
        }
    }
}

impl TryFrom<u32> for Tag {
    type Error = u32;

    fn try_from(value: u32) -> Result<Self, u32> {
        Tag::ALL.get(value as usize).copied().ok_or(value)
    }
}

/// Two-operand arithmetic, bitwise, comparison and relational operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    /// `+`
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `&`
    BitAnd,
    /// `|`
    BitOr,
    /// `^`
    BitXor,
    /// `<<`
    Shl,
    /// `>>`
    Shr,
    /// `>>>`
    UShr,
    /// `==`
    Eq,
    /// `===`
    StrictEq,
    /// `!=`
    Ne,
    /// `!==`
    StrictNe,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `in`
    In,
    /// `instanceof`
    InstanceOf,
}

impl BinaryOp {
    /// The wire tag for this operator.
    pub fn tag(self) -> Tag {
        match self {
            BinaryOp::Add => Tag::Add,
            BinaryOp::Sub => Tag::Sub,
            BinaryOp::Mul => Tag::Mul,
            BinaryOp::Div => Tag::Div,
            BinaryOp::Mod => Tag::Mod,
            BinaryOp::BitAnd => Tag::BAnd,
            BinaryOp::BitOr => Tag::BOr,
            BinaryOp::BitXor => Tag::BXor,
            BinaryOp::Shl => Tag::Sll,
            BinaryOp::Shr => Tag::Srl,
            BinaryOp::UShr => Tag::Srr,
            BinaryOp::Eq => Tag::Eq,
            BinaryOp::StrictEq => Tag::Eqq,
            BinaryOp::Ne => Tag::Ne,
            BinaryOp::StrictNe => Tag::Nee,
            BinaryOp::Gt => Tag::Gt,
            BinaryOp::Ge => Tag::Ge,
            BinaryOp::Lt => Tag::Lt,
            BinaryOp::Le => Tag::Le,
            BinaryOp::In => Tag::In,
            BinaryOp::InstanceOf => Tag::InstanceOf,
        }
    }
}

/// One-operand operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-x`
    Neg,
    /// `~x`
    BitNot,
    /// `!x`
    Not,
    /// `typeof x`
    TypeOf,
}

impl UnaryOp {
    /// The wire tag for this operator.
    pub fn tag(self) -> Tag {
        match self {
            UnaryOp::Neg => Tag::Neg,
            UnaryOp::BitNot => Tag::BNot,
            UnaryOp::Not => Tag::LNot,
            UnaryOp::TypeOf => Tag::TypeOf,
        }
    }
}

/// An IR instruction. Operands refer to other instructions of the same
/// function by [`InstId`] and to blocks by [`BlockId`].
#[derive(Debug, Clone, PartialEq)]
pub enum Inst {
    /// Returns `value` from the function
    Return {
        /// Returned value
        value: InstId,
    },
    /// Reads the slot at `addr`
    Load {
        /// Slot address
        addr: InstId,
    },
    /// Writes `value` to the slot at `addr`
    Store {
        /// Slot address
        addr: InstId,
        /// Stored value
        value: InstId,
    },
    /// `object[key]`
    GetItem {
        /// Receiver
        object: InstId,
        /// Property key
        key: InstId,
    },
    /// `object[key] = value`
    SetItem {
        /// Receiver
        object: InstId,
        /// Property key
        key: InstId,
        /// Stored value
        value: InstId,
    },
    /// `delete object[key]`
    DelItem {
        /// Receiver
        object: InstId,
        /// Property key
        key: InstId,
    },
    /// `new callee(...args)`
    New {
        /// Constructor
        callee: InstId,
        /// Arguments, as an array value
        args: InstId,
    },
    /// `callee.call(this, ...args)`
    Call {
        /// Function value
        callee: InstId,
        /// Receiver
        this: InstId,
        /// Arguments, as an array value
        args: InstId,
    },
    /// Unconditional jump
    Jump {
        /// Target block
        target: BlockId,
    },
    /// Two-way branch on truthiness
    Branch {
        /// Condition
        cond: InstId,
        /// Taken when truthy
        then_block: BlockId,
        /// Taken when falsy
        else_block: BlockId,
    },
    /// Address of a global binding
    GetGlobal {
        /// Binding name
        name: String,
    },
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// `true`
    True,
    /// `false`
    False,
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Regular expression literal, as `/pattern/flags`
    Regex(String),
    /// Object literal
    Object {
        /// Key/value pairs in source order
        props: Vec<(InstId, InstId)>,
    },
    /// Array literal
    Array {
        /// Elements in source order
        elements: Vec<InstId>,
    },
    /// Creates a `function` closure
    Func {
        /// The function's body
        func: FuncId,
        /// Captured slots, in capture-index order
        captured: Vec<InstId>,
    },
    /// Creates an arrow closure
    Arrow {
        /// The function's body
        func: FuncId,
        /// Captured slots, in capture-index order
        captured: Vec<InstId>,
    },
    /// Two-operand operator
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        lhs: InstId,
        /// Right operand
        rhs: InstId,
    },
    /// One-operand operator
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: InstId,
    },
    /// Enters a block scope frame
    PushScope {
        /// Number of local slots the frame holds
        size: u32,
        /// Captured slots, in capture-index order
        captured: Vec<InstId>,
    },
    /// Leaves `count` scope frames
    PopScope {
        /// Number of frames
        count: u32,
    },
    /// Allocates a local slot in the current frame
    Alloca,
    /// Address of a formal parameter
    Arg {
        /// Parameter position
        index: u32,
    },
    /// Address of a captured slot
    Capture {
        /// Capture index
        index: u32,
    },
    /// The receiver
    This,
    /// The arguments object
    Arguments,
    /// Copies a value
    Move {
        /// Source value
        value: InstId,
    },
    /// Selects a value by predecessor block
    Phi {
        /// (predecessor, value) pairs
        incoming: Vec<(BlockId, InstId)>,
    },
    /// Debugger breakpoint
    Debugger,
}

impl Inst {
    /// Wire tag.
    pub fn tag(&self) -> Tag {
        match self {
            Inst::Return { .. } => Tag::Return,
            Inst::Load { .. } => Tag::Load,
            Inst::Store { .. } => Tag::Store,
            Inst::GetItem { .. } => Tag::GetItem,
            Inst::SetItem { .. } => Tag::SetItem,
            Inst::DelItem { .. } => Tag::DelItem,
            Inst::New { .. } => Tag::New,
            Inst::Call { .. } => Tag::Call,
            Inst::Jump { .. } => Tag::Jump,
            Inst::Branch { .. } => Tag::Branch,
            Inst::GetGlobal { .. } => Tag::GetGlobal,
            Inst::Undefined => Tag::Undefined,
            Inst::Null => Tag::Null,
            Inst::True => Tag::True,
            Inst::False => Tag::False,
            Inst::Number(_) => Tag::Number,
            Inst::String(_) => Tag::String,
            Inst::Regex(_) => Tag::Regex,
            Inst::Object { .. } => Tag::Object,
            Inst::Array { .. } => Tag::Array,
            Inst::Func { .. } => Tag::Func,
            Inst::Arrow { .. } => Tag::Arrow,
            Inst::Binary { op, .. } => op.tag(),
            Inst::Unary { op, .. } => op.tag(),
            Inst::PushScope { .. } => Tag::PushScope,
            Inst::PopScope { .. } => Tag::PopScope,
            Inst::Alloca => Tag::Alloca,
            Inst::Arg { .. } => Tag::Arg,
            Inst::Capture { .. } => Tag::Capture,
            Inst::This => Tag::This,
            Inst::Arguments => Tag::Arguments,
            Inst::Move { .. } => Tag::Move,
            Inst::Phi { .. } => Tag::Phi,
            Inst::Debugger => Tag::Debugger,
        }
    }

    /// Returns true for instructions that end a block.
    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Inst::Return { .. } | Inst::Jump { .. } | Inst::Branch { .. }
        )
    }

    /// Returns true if the instruction produces a value other
    /// instructions can use.
    pub fn has_value(&self) -> bool {
        !matches!(
            self,
            Inst::Return { .. }
                | Inst::Store { .. }
                | Inst::SetItem { .. }
                | Inst::Jump { .. }
                | Inst::Branch { .. }
                | Inst::PushScope { .. }
                | Inst::PopScope { .. }
                | Inst::Debugger
        )
    }

    /// Instructions this one reads, in encoding order.
    pub fn operands(&self) -> Vec<InstId> {
        match self {
            Inst::Return { value } | Inst::Move { value } => vec![*value],
            Inst::Load { addr } => vec![*addr],
            Inst::Store { addr, value } => vec![*addr, *value],
            Inst::GetItem { object, key } | Inst::DelItem { object, key } => vec![*object, *key],
            Inst::SetItem { object, key, value } => vec![*object, *key, *value],
            Inst::New { callee, args } => vec![*callee, *args],
            Inst::Call { callee, this, args } => vec![*callee, *this, *args],
            Inst::Branch { cond, .. } => vec![*cond],
            Inst::Object { props } => props.iter().flat_map(|&(k, v)| [k, v]).collect(),
            Inst::Array { elements } => elements.clone(),
            Inst::Func { captured, .. }
            | Inst::Arrow { captured, .. }
            | Inst::PushScope { captured, .. } => captured.clone(),
            Inst::Binary { lhs, rhs, .. } => vec![*lhs, *rhs],
            Inst::Unary { operand, .. } => vec![*operand],
            Inst::Phi { incoming } => incoming.iter().map(|&(_, v)| v).collect(),
            Inst::Jump { .. }
            | Inst::GetGlobal { .. }
            | Inst::Undefined
            | Inst::Null
            | Inst::True
            | Inst::False
            | Inst::Number(_)
            | Inst::String(_)
            | Inst::Regex(_)
            | Inst::PopScope { .. }
            | Inst::Alloca
            | Inst::Arg { .. }
            | Inst::Capture { .. }
            | Inst::This
            | Inst::Arguments
            | Inst::Debugger => Vec::new(),
        }
    }

    /// Blocks this instruction refers to.
    pub fn block_refs(&self) -> Vec<BlockId> {
        match self {
            Inst::Jump { target } => vec![*target],
            Inst::Branch {
                then_block,
                else_block,
                ..
            } => vec![*then_block, *else_block],
            Inst::Phi { incoming } => incoming.iter().map(|&(b, _)| b).collect(),
            _ => Vec::new(),
        }
    }

    /// Successor blocks in the control-flow graph.
    pub fn successors(&self) -> Vec<BlockId> {
        match self {
            Inst::Jump { .. } | Inst::Branch { .. } => self.block_refs(),
            _ => Vec::new(),
        }
    }
}
