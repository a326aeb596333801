//! Structural checks run after lowering.

use super::{Inst, IrFunction, IrModule};
use crate::error::{Error, Result};
use tracing::error;

impl IrModule {
    /// Verifies every function and every closure's function reference.
    pub fn verify(&self) -> Result<()> {
        for function in self.functions() {
            function.verify()?;
            for block in function.blocks() {
                for &id in block.insts() {
                    if let Inst::Func { func, .. } | Inst::Arrow { func, .. } = &function[id]
                        && self.function(*func).is_none()
                    {
                        return Err(violation(
                            function,
                            format!("closure refers to unknown function {func}"),
                        ));
                    }
                }
            }
        }
        Ok(())
    }
}

impl IrFunction {
    /// Checks that every block ends in exactly one terminator and that
    /// every operand and block reference stays inside this function.
    pub fn verify(&self) -> Result<()> {
        let mut placed = vec![false; self.inst_count()];
        for block in self.blocks() {
            for &id in block.insts() {
                placed[id.index()] = true;
            }
        }

        for block in self.blocks() {
            let Some((&last, body)) = block.insts().split_last() else {
                return Err(violation(self, format!("{} is empty", block.id())));
            };
            if !self[last].is_terminator() {
                return Err(violation(
                    self,
                    format!("{} does not end in a terminator", block.id()),
                ));
            }
            if let Some(&early) = body.iter().find(|&&id| self[id].is_terminator()) {
                return Err(violation(
                    self,
                    format!("{} has a terminator {early} before its end", block.id()),
                ));
            }
            for &id in block.insts() {
                let inst = &self[id];
                for operand in inst.operands() {
                    if !placed.get(operand.index()).copied().unwrap_or(false) {
                        return Err(violation(
                            self,
                            format!("{id} uses {operand}, which is not placed in a block"),
                        ));
                    }
                    if !self[operand].has_value() {
                        return Err(violation(
                            self,
                            format!("{id} uses {operand}, which produces no value"),
                        ));
                    }
                }
                for target in inst.block_refs() {
                    if target.index() >= self.blocks().len() {
                        return Err(violation(self, format!("{id} refers to missing {target}")));
                    }
                }
            }
        }
        Ok(())
    }
}

fn violation(function: &IrFunction, msg: String) -> Error {
    error!(function = %function.name(), id = %function.id(), "{msg}");
    Error::internal(format!("in function {:?}: {msg}", function.name()))
}

#[cfg(test)]
mod tests {
    use crate::ir::{BlockId, FuncId, FunctionIds, InstId, IrModule};

    fn module() -> (IrModule, FuncId) {
        let mut module = IrModule::new("m", &FunctionIds::new());
        let id = module.new_func("f", 0);
        (module, id)
    }

    #[test]
    fn test_well_formed_function_passes() {
        let (mut module, id) = module();
        let f = &mut module[id];
        let entry = f.new_block();
        let next = f.new_block();
        let cond = f.at(entry).boolean(true);
        f.at(entry).branch(cond, next, next);
        let u = f.at(next).undefined();
        f.at(next).ret(u);
        assert!(module.verify().is_ok());
    }

    #[test]
    fn test_missing_terminator_fails() {
        let (mut module, id) = module();
        let f = &mut module[id];
        let entry = f.new_block();
        f.at(entry).undefined();
        let err = module.verify().unwrap_err();
        assert!(err.to_string().contains("does not end in a terminator"));
    }

    #[test]
    fn test_instruction_after_terminator_fails() {
        let (mut module, id) = module();
        let f = &mut module[id];
        let entry = f.new_block();
        let u = f.at(entry).undefined();
        f.at(entry).ret(u);
        f.at(entry).ret(u);
        assert!(module.verify().is_err());
    }

    #[test]
    fn test_bad_references_fail() {
        let (mut module, id) = module();
        let f = &mut module[id];
        let entry = f.new_block();
        f.at(entry).jump(BlockId(5));
        assert!(module.verify().is_err());

        let (mut module, id) = self::module();
        let f = &mut module[id];
        let entry = f.new_block();
        f.at(entry).ret(InstId(9));
        assert!(module.verify().is_err());
    }

    #[test]
    fn test_unknown_closure_target_fails() {
        let (mut module, id) = module();
        let f = &mut module[id];
        let entry = f.new_block();
        let c = f.at(entry).func(FuncId(77), Vec::new());
        f.at(entry).ret(c);
        assert!(module.verify().is_err());
    }
}
