//! Binary encoding of functions into module sections.

use super::{Inst, InstId, IrFunction, IrModule};
use crate::bytecode::{BufferWriter, ByteCode, SectionType, StringPool};
use crate::error::{Error, Result};
use tracing::{debug, error};

impl IrModule {
    /// Encodes every function plus the string pool into a module
    /// container.
    pub fn dump(&self) -> Result<ByteCode> {
        let mut pool = StringPool::new();
        let mut bytecode = ByteCode::new();
        for function in self.functions() {
            let section = function.encode(&mut pool)?;
            bytecode.add_section(section, SectionType::Function);
        }
        debug!(
            module = %self.name(),
            functions = self.functions().len(),
            strings = pool.len(),
            "encoded module"
        );
        bytecode.add_section(pool.into_writer(), SectionType::StringPool);
        Ok(bytecode)
    }
}

impl IrFunction {
    /// Linear offset of every placed instruction, indexed by [`InstId`].
    ///
    /// Offsets count instructions in block order, then instruction order,
    /// including terminators.
    pub fn linear_offsets(&self) -> Vec<Option<u32>> {
        let mut offsets = vec![None; self.inst_count()];
        let mut next = 0u32;
        for block in self.blocks() {
            for &id in block.insts() {
                offsets[id.index()] = Some(next);
                next += 1;
            }
        }
        offsets
    }

    /// Encodes this function as a FUNCTION section payload.
    pub fn encode(&self, pool: &mut StringPool) -> Result<BufferWriter> {
        let offsets = self.linear_offsets();
        let offset = |id: InstId| -> Result<u32> {
            offsets.get(id.index()).copied().flatten().ok_or_else(|| {
                error!(function = %self.name(), inst = %id, "operand has no linear offset");
                Error::internal(format!(
                    "instruction {id} in function {:?} is not placed in any block",
                    self.name()
                ))
            })
        };

        let mut w = BufferWriter::new();
        w.uint(pool.get(self.name()));
        w.uint(self.param_count());
        w.uint(self.blocks().len() as u32);
        for block in self.blocks() {
            w.uint(block.insts().len() as u32);
            for &id in block.insts() {
                let inst = &self[id];
                w.uint(inst.tag() as u32);
                match inst {
                    Inst::Return { value } | Inst::Move { value } => {
                        w.uint(offset(*value)?);
                    }
                    Inst::Load { addr } => {
                        w.uint(offset(*addr)?);
                    }
                    Inst::Store { addr, value } => {
                        w.uint(offset(*addr)?);
                        w.uint(offset(*value)?);
                    }
                    Inst::GetItem { object, key } | Inst::DelItem { object, key } => {
                        w.uint(offset(*object)?);
                        w.uint(offset(*key)?);
                    }
                    Inst::SetItem { object, key, value } => {
                        w.uint(offset(*object)?);
                        w.uint(offset(*key)?);
                        w.uint(offset(*value)?);
                    }
                    Inst::New { callee, args } => {
                        w.uint(offset(*callee)?);
                        w.uint(offset(*args)?);
                    }
                    Inst::Call { callee, this, args } => {
                        w.uint(offset(*callee)?);
                        w.uint(offset(*this)?);
                        w.uint(offset(*args)?);
                    }
                    Inst::Jump { target } => {
                        w.uint(target.0);
                    }
                    Inst::Branch {
                        cond,
                        then_block,
                        else_block,
                    } => {
                        w.uint(offset(*cond)?);
                        w.uint(then_block.0);
                        w.uint(else_block.0);
                    }
                    Inst::GetGlobal { name } | Inst::String(name) | Inst::Regex(name) => {
                        w.uint(pool.get(name));
                    }
                    Inst::Number(value) => {
                        w.double(*value);
                    }
                    Inst::Object { props } => {
                        w.uint(props.len() as u32);
                        for (key, value) in props {
                            w.uint(offset(*key)?);
                            w.uint(offset(*value)?);
                        }
                    }
                    Inst::Array { elements } => {
                        write_values(&mut w, elements, &offset)?;
                    }
                    Inst::Func { func, captured } | Inst::Arrow { func, captured } => {
                        w.uint(func.0);
                        write_values(&mut w, captured, &offset)?;
                    }
                    Inst::Binary { lhs, rhs, .. } => {
                        w.uint(offset(*lhs)?);
                        w.uint(offset(*rhs)?);
                    }
                    Inst::Unary { operand, .. } => {
                        w.uint(offset(*operand)?);
                    }
                    Inst::PushScope { size, captured } => {
                        w.uint(*size);
                        write_values(&mut w, captured, &offset)?;
                    }
                    Inst::PopScope { count } => {
                        w.uint(*count);
                    }
                    Inst::Arg { index } | Inst::Capture { index } => {
                        w.uint(*index);
                    }
                    Inst::Phi { incoming } => {
                        w.uint(incoming.len() as u32);
                        for (block, value) in incoming {
                            w.uint(block.0);
                            w.uint(offset(*value)?);
                        }
                    }
                    Inst::Undefined
                    | Inst::Null
                    | Inst::True
                    | Inst::False
                    | Inst::Alloca
                    | Inst::This
                    | Inst::Arguments
                    | Inst::Debugger => {}
                }
            }
        }
        Ok(w)
    }
}

fn write_values(
    w: &mut BufferWriter,
    values: &[InstId],
    offset: &impl Fn(InstId) -> Result<u32>,
) -> Result<()> {
    w.uint(values.len() as u32);
    for &value in values {
        w.uint(offset(value)?);
    }
    Ok(())
}
