//! Lowering from the ESTree AST to IR.
//!
//! Every lowering routine takes the block to append to and returns the
//! block where control continues. Expression routines also return the
//! instruction holding the expression's value.
//!
//! Block scopes are bracketed by a frame template:
//!
//! ```text
//! entry:  <resolve captured slots in the parent scope>
//!         jump body
//! body:   push_scope <size> [captured...]
//!         ...
//!         pop_scope 1
//! ```
//!
//! The `push_scope` operands are only known once the body has been
//! lowered, so [`Compiler::close_scope`] fills them in afterwards.

mod expressions;
mod functions;
mod patterns;
mod scope;
mod statements;

#[cfg(test)]
mod tests;

pub use scope::{Binding, Capture, Resolved, ScopeArena, ScopeId, ScopeKind};

use crate::ast::{Identifier, Program};
use crate::error::{Error, Result};
use crate::ir::{BlockBuilder, BlockId, FuncId, FunctionIds, Inst, InstId, IrModule};
use tracing::{debug, debug_span, error, trace};

/// Function and scope that code is currently being lowered into.
#[derive(Debug, Clone, Copy)]
struct Ctx {
    func: FuncId,
    scope: ScopeId,
}

impl Ctx {
    fn with_scope(self, scope: ScopeId) -> Self {
        Self { scope, ..self }
    }
}

/// Result of lowering an expression.
#[derive(Debug, Clone, Copy)]
struct Lowered {
    block: BlockId,
    value: InstId,
}

/// An open block-scope frame.
#[derive(Debug, Clone, Copy)]
struct ScopeFrame {
    scope: ScopeId,
    /// Runs in the parent scope; resolves captured slots
    entry: BlockId,
    /// Starts with the frame's `push_scope`
    body: BlockId,
    push: InstId,
}

/// Compiles one program into one module.
pub struct Compiler {
    module: IrModule,
    scopes: ScopeArena,
}

/// Compiles `program` into a module named `name`, drawing function ids
/// from `ids`.
pub fn compile(program: &Program, name: &str, ids: &FunctionIds) -> Result<IrModule> {
    Compiler::new(name, ids).compile(program)
}

impl Compiler {
    /// Creates a compiler for a module named `name`.
    pub fn new(name: &str, ids: &FunctionIds) -> Self {
        Self {
            module: IrModule::new(name, ids),
            scopes: ScopeArena::new(),
        }
    }

    /// Lowers the whole program. The top-level code becomes a function
    /// named `#main`.
    pub fn compile(mut self, program: &Program) -> Result<IrModule> {
        let span = debug_span!("compile", module = %self.module.name());
        let _guard = span.enter();

        let func = self.module.new_func("#main", 0);
        let scope = self.scopes.push_function(None);
        let ctx = Ctx { func, scope };
        let entry = self.new_block(ctx);
        let last = self.lower_statement_list(ctx, entry, &program.body)?;
        self.return_undefined(ctx, last);

        self.module.verify()?;
        debug!(functions = self.module.functions().len(), "compiled module");
        Ok(self.module)
    }

    // ========================================================================
    // Emission helpers
    // ========================================================================

    fn new_block(&mut self, ctx: Ctx) -> BlockId {
        self.module[ctx.func].new_block()
    }

    fn at(&mut self, ctx: Ctx, block: BlockId) -> BlockBuilder<'_> {
        self.module[ctx.func].at(block)
    }

    fn return_undefined(&mut self, ctx: Ctx, block: BlockId) {
        let mut b = self.at(ctx, block);
        let value = b.undefined();
        b.ret(value);
    }

    fn pop_scopes(&mut self, ctx: Ctx, block: BlockId, count: u32) {
        if count > 0 {
            self.at(ctx, block).pop_scope(count);
        }
    }

    /// `load (get_global name)`
    fn load_global(&mut self, ctx: Ctx, block: BlockId, name: &str) -> InstId {
        let mut b = self.at(ctx, block);
        let addr = b.get_global(name);
        b.load(addr)
    }

    /// `object[name]` with a string key.
    fn get_named(&mut self, ctx: Ctx, block: BlockId, object: InstId, name: &str) -> InstId {
        let mut b = self.at(ctx, block);
        let key = b.string(name);
        b.get_item(object, key)
    }

    /// Logs and builds an internal-invariant error.
    fn internal(&self, ctx: Ctx, node: &str, msg: impl Into<String>) -> Error {
        let msg = msg.into();
        error!(
            node,
            scope_depth = self.scopes.depth(ctx.scope),
            function = %ctx.func,
            "{msg}"
        );
        Error::internal(msg)
    }

    // ========================================================================
    // Scope frames
    // ========================================================================

    fn open_scope(&mut self, ctx: Ctx, scope: ScopeId) -> ScopeFrame {
        let entry = self.new_block(ctx);
        let body = self.new_block(ctx);
        let push = self.at(ctx, body).push_scope(0, Vec::new());
        ScopeFrame {
            scope,
            entry,
            body,
            push,
        }
    }

    /// Resolves the frame's captures in the parent scope `ctx` and
    /// completes its `push_scope`.
    fn close_scope(&mut self, ctx: Ctx, frame: &ScopeFrame) -> Result<()> {
        let names: Vec<String> = self
            .scopes
            .capture_list(frame.scope)
            .iter()
            .map(|c| c.name.clone())
            .collect();
        let captured = self.resolve_captured(ctx, frame.entry, &names)?;
        let slots = self.scopes.variable_count(frame.scope);
        trace!(
            scope_depth = self.scopes.depth(frame.scope),
            slots,
            captures = captured.len(),
            "closing scope frame"
        );

        match &mut self.module[ctx.func][frame.push] {
            Inst::PushScope { size, captured: operands } => {
                *size = slots;
                *operands = captured;
            }
            _ => return Err(self.internal(ctx, "BlockStatement", "scope frame lost its push_scope")),
        }
        self.at(ctx, frame.entry).jump(frame.body);
        Ok(())
    }

    // ========================================================================
    // Name resolution
    // ========================================================================

    /// Address of a resolved binding, emitting `arg`/`capture` as needed.
    fn slot_address(&mut self, ctx: Ctx, block: BlockId, binding: Binding) -> InstId {
        match binding {
            Binding::Parameter(index) => self.at(ctx, block).arg(index),
            Binding::Capture(index) => self.at(ctx, block).capture(index),
            Binding::RestArg(slot) | Binding::Local(slot) | Binding::Forward(slot) => slot,
        }
    }

    /// Resolves a nested scope's captured names against `ctx`, in capture
    /// order. Forward declarations are accepted.
    fn resolve_captured(&mut self, ctx: Ctx, block: BlockId, names: &[String]) -> Result<Vec<InstId>> {
        let mut operands = Vec::with_capacity(names.len());
        for name in names {
            let Some(resolved) = self.scopes.lookup(ctx.scope, name, true, true)? else {
                return Err(self.internal(
                    ctx,
                    "Identifier",
                    format!("captured name '{name}' is not visible at its capture site"),
                ));
            };
            operands.push(self.slot_address(ctx, block, resolved.binding));
        }
        Ok(operands)
    }

    /// Address of `name` for reading or writing. Unbound names are
    /// globals.
    fn identifier_address(&mut self, ctx: Ctx, block: BlockId, name: &str, write: bool) -> Result<InstId> {
        match self.scopes.lookup(ctx.scope, name, false, true)? {
            Some(resolved) => {
                if write && resolved.constant {
                    return Err(Error::ConstAssignment(name.to_string()));
                }
                Ok(self.slot_address(ctx, block, resolved.binding))
            }
            None => Ok(self.at(ctx, block).get_global(name)),
        }
    }

    fn read_identifier(&mut self, ctx: Ctx, block: BlockId, id: &Identifier) -> Result<InstId> {
        let addr = self.identifier_address(ctx, block, &id.name, false)?;
        Ok(self.at(ctx, block).load(addr))
    }
}
