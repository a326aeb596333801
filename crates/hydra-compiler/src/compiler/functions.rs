//! Function, arrow and closure lowering.

use super::{Compiler, Ctx, Lowered, ScopeId};
use crate::ast::{ArrowBody, ArrowFunction, Function, Pattern};
use crate::error::{Error, Result};
use crate::ir::{BlockId, FuncId, InstId};
use tracing::debug;

/// A function-like node.
#[derive(Debug, Clone, Copy)]
pub(super) enum FunctionNode<'a> {
    /// `function` declaration or expression
    Function(&'a Function),
    /// Arrow function
    Arrow(&'a ArrowFunction),
}

/// A lowered function body and the outer names it captures, in capture
/// index order.
#[derive(Debug)]
struct Closure {
    func: FuncId,
    captures: Vec<String>,
}

impl Compiler {
    /// Lowers a function declaration that was forward declared in the
    /// current scope and stores the closure into its slot.
    pub(super) fn lower_function_declaration(&mut self, ctx: Ctx, block: BlockId, function: &Function) -> Result<BlockId> {
        let Some(id) = &function.id else {
            return Err(Error::unsupported("anonymous function declaration", function.loc.as_ref()));
        };
        let closure = self.lower_closure(ctx, block, FunctionNode::Function(function))?;
        let slot = self.scopes.declare(ctx.scope, &id.name, None, false)?;
        self.at(ctx, closure.block).store(slot, closure.value);
        Ok(closure.block)
    }

    /// Lowers the function body into a new IR function and emits the
    /// `func`/`arrow` instruction creating it, with its captured slots
    /// resolved in `ctx`.
    pub(super) fn lower_closure(&mut self, ctx: Ctx, block: BlockId, node: FunctionNode<'_>) -> Result<Lowered> {
        let closure = self.lower_function(ctx.scope, node)?;
        let captured = self.resolve_captured(ctx, block, &closure.captures)?;
        let value = match node {
            FunctionNode::Function(_) => self.at(ctx, block).func(closure.func, captured),
            FunctionNode::Arrow(_) => self.at(ctx, block).arrow(closure.func, captured),
        };
        Ok(Lowered { block, value })
    }

    fn lower_function(&mut self, parent: ScopeId, node: FunctionNode<'_>) -> Result<Closure> {
        let (name, params, loc, is_async) = match node {
            FunctionNode::Function(f) => {
                if f.generator {
                    return Err(Error::unsupported("generator function", f.loc.as_ref()));
                }
                let name = f.id.as_ref().map_or("<anonymous>", |id| id.name.as_str());
                (name, &f.params, f.loc.as_ref(), f.is_async)
            }
            FunctionNode::Arrow(a) => ("<arrow>", &a.params, a.loc.as_ref(), a.is_async),
        };
        if is_async {
            return Err(Error::unsupported("async function", loc));
        }

        let (names, rest) = parameter_names(params)?;
        let func = self.module.new_func(name, names.len() as u32);
        debug!(function = %func, name, params = names.len(), "lowering function");

        let scope = self.scopes.push_function(Some(parent));
        self.scopes.set_params(scope, names.iter().copied())?;
        let ctx = Ctx { func, scope };
        let entry = self.new_block(ctx);

        if matches!(node, FunctionNode::Function(_)) && !names.contains(&"arguments") {
            let mut b = self.at(ctx, entry);
            let slot = b.alloca();
            let arguments = b.arguments();
            b.store(slot, arguments);
            self.scopes.declare(scope, "arguments", Some(slot), false)?;
        }
        if let Some(rest) = rest {
            let slot = self.lower_rest_parameter(ctx, entry, names.len() as u32);
            self.scopes.set_rest(scope, rest, slot)?;
        }

        match node {
            FunctionNode::Function(f) => {
                let last = self.lower_statement_list(ctx, entry, &f.body.body)?;
                self.return_undefined(ctx, last);
            }
            FunctionNode::Arrow(a) => match &a.body {
                ArrowBody::Block(body) => {
                    let last = self.lower_statement_list(ctx, entry, &body.body)?;
                    self.return_undefined(ctx, last);
                }
                ArrowBody::Expression(expr) => {
                    let lowered = self.lower_expression(ctx, entry, expr)?;
                    self.at(ctx, lowered.block).ret(lowered.value);
                }
            },
        }

        let captures = self
            .scopes
            .capture_list(scope)
            .iter()
            .map(|c| c.name.clone())
            .collect();
        Ok(Closure { func, captures })
    }

    /// `Array.prototype.slice.call(arguments, skip)`, stored in a fresh slot.
    fn lower_rest_parameter(&mut self, ctx: Ctx, block: BlockId, skip: u32) -> InstId {
        let array = self.load_global(ctx, block, "Array");
        let prototype = self.get_named(ctx, block, array, "prototype");
        let slice = self.get_named(ctx, block, prototype, "slice");
        let mut b = self.at(ctx, block);
        let arguments = b.arguments();
        let start = b.number(f64::from(skip));
        let args = b.array(vec![start]);
        let rest = b.call(slice, arguments, args);
        let slot = b.alloca();
        b.store(slot, rest);
        slot
    }
}

/// Names of the formal parameters and of the trailing rest parameter.
fn parameter_names(params: &[Pattern]) -> Result<(Vec<&str>, Option<&str>)> {
    let mut names = Vec::with_capacity(params.len());
    let mut rest = None;
    for (i, param) in params.iter().enumerate() {
        match param {
            Pattern::Identifier(id) => names.push(id.name.as_str()),
            Pattern::RestElement(element) if i + 1 == params.len() => match element.argument.as_ref() {
                Pattern::Identifier(id) => rest = Some(id.name.as_str()),
                _ => return Err(Error::unsupported("destructuring rest parameter", element.loc.as_ref())),
            },
            Pattern::AssignmentPattern(_) => return Err(Error::unsupported("default parameter value", None)),
            other => {
                return Err(Error::unsupported(
                    format!("{} parameter", other.kind_name()),
                    None,
                ));
            }
        }
    }
    Ok((names, rest))
}
