//! Text dump of modules and functions.
//!
//! ```text
//! module "main.js"
//!
//! function #0 "#main" (params: 0)
//!   blk_0:
//!     $0 = alloca
//!     $1 = number 1
//!     store $0 $1
//!     ...
//! ```

use super::{Inst, InstId, IrFunction, IrModule};
use std::fmt;

impl IrFunction {
    /// Display names (`$n`) of value-producing instructions, numbered in
    /// block order and indexed by [`InstId`].
    pub fn value_names(&self) -> Vec<Option<u32>> {
        let mut names = vec![None; self.inst_count()];
        let mut next = 0;
        for block in self.blocks() {
            for &id in block.insts() {
                if self[id].has_value() {
                    names[id.index()] = Some(next);
                    next += 1;
                }
            }
        }
        names
    }
}

struct Operand<'a>(&'a [Option<u32>], InstId);

impl fmt::Display for Operand<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.get(self.1.index()).copied().flatten() {
            Some(n) => write!(f, "${n}"),
            None => write!(f, "<{}>", self.1),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, names: &[Option<u32>], ids: &[InstId]) -> fmt::Result {
    write!(f, "[")?;
    for (i, &id) in ids.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", Operand(names, id))?;
    }
    write!(f, "]")
}

fn write_inst(f: &mut fmt::Formatter<'_>, names: &[Option<u32>], inst: &Inst) -> fmt::Result {
    let op = |id: InstId| Operand(names, id);
    write!(f, "{}", inst.tag().mnemonic())?;
    match inst {
        Inst::Return { value } | Inst::Move { value } => write!(f, " {}", op(*value)),
        Inst::Load { addr } => write!(f, " {}", op(*addr)),
        Inst::Store { addr, value } => write!(f, " {} {}", op(*addr), op(*value)),
        Inst::GetItem { object, key } | Inst::DelItem { object, key } => {
            write!(f, " {} {}", op(*object), op(*key))
        }
        Inst::SetItem { object, key, value } => {
            write!(f, " {} {} {}", op(*object), op(*key), op(*value))
        }
        Inst::New { callee, args } => write!(f, " {} {}", op(*callee), op(*args)),
        Inst::Call { callee, this, args } => {
            write!(f, " {} {} {}", op(*callee), op(*this), op(*args))
        }
        Inst::Jump { target } => write!(f, " {target}"),
        Inst::Branch {
            cond,
            then_block,
            else_block,
        } => write!(f, " {} {then_block} {else_block}", op(*cond)),
        Inst::GetGlobal { name } | Inst::String(name) => write!(f, " {name:?}"),
        Inst::Regex(source) => write!(f, " {source}"),
        Inst::Number(value) => write!(f, " {value}"),
        Inst::Object { props } => {
            write!(f, " {{")?;
            for (i, (key, value)) in props.iter().enumerate() {
                if i > 0 {
                    write!(f, ",")?;
                }
                write!(f, " {}: {}", op(*key), op(*value))?;
            }
            write!(f, " }}")
        }
        Inst::Array { elements } => {
            write!(f, " ")?;
            write_list(f, names, elements)
        }
        Inst::Func { func, captured } | Inst::Arrow { func, captured } => {
            write!(f, " {func} ")?;
            write_list(f, names, captured)
        }
        Inst::Binary { lhs, rhs, .. } => write!(f, " {} {}", op(*lhs), op(*rhs)),
        Inst::Unary { operand, .. } => write!(f, " {}", op(*operand)),
        Inst::PushScope { size, captured } => {
            write!(f, " {size} ")?;
            write_list(f, names, captured)
        }
        Inst::PopScope { count } => write!(f, " {count}"),
        Inst::Arg { index } | Inst::Capture { index } => write!(f, " {index}"),
        Inst::Phi { incoming } => {
            for (block, value) in incoming {
                write!(f, " [{block} {}]", op(*value))?;
            }
            Ok(())
        }
        Inst::Undefined
        | Inst::Null
        | Inst::True
        | Inst::False
        | Inst::Alloca
        | Inst::This
        | Inst::Arguments
        | Inst::Debugger => Ok(()),
    }
}

impl fmt::Display for IrFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.value_names();
        writeln!(
            f,
            "function {} {:?} (params: {})",
            self.id(),
            self.name(),
            self.param_count()
        )?;
        for block in self.blocks() {
            writeln!(f, "  {}:", block.id())?;
            for &id in block.insts() {
                write!(f, "    ")?;
                if let Some(n) = names[id.index()] {
                    write!(f, "${n} = ")?;
                }
                write_inst(f, &names, &self[id])?;
                writeln!(f)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for IrModule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "module {:?}", self.name())?;
        for function in self.functions() {
            writeln!(f)?;
            write!(f, "{function}")?;
        }
        Ok(())
    }
}
