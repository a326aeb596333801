//! Statement lowering: statement lists, blocks, conditionals and loops.

use super::{Compiler, Ctx};
use crate::ast::{
    ForEachLeft, ForEachStatement, ForInit, ForStatement, IfStatement, JumpStatement,
    ReturnStatement, Statement, VariableKind, WhileStatement,
};
use crate::error::{Error, Result};
use crate::ir::{BinaryOp, BlockId, Inst, InstId};

/// Which protocol a for-in/for-of loop iterates with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ForEachKind {
    /// Own enumerable keys
    In,
    /// Iterator protocol
    Of,
}

impl Compiler {
    /// Lowers a statement list in the current scope.
    ///
    /// Runs in three passes: every `let`/`const`/function name gets a slot
    /// and a forward declaration, then function declarations are hoisted,
    /// then the remaining statements are lowered in order.
    pub(super) fn lower_statement_list(&mut self, ctx: Ctx, block: BlockId, body: &[Statement]) -> Result<BlockId> {
        for statement in body {
            match statement {
                Statement::VariableDeclaration(decl) => {
                    self.forward_declare_variables(ctx, block, decl)?;
                }
                Statement::FunctionDeclaration(function) => {
                    let Some(id) = &function.id else {
                        return Err(Error::unsupported("anonymous function declaration", function.loc.as_ref()));
                    };
                    let slot = self.at(ctx, block).alloca();
                    self.scopes.forward_declare(ctx.scope, &id.name, slot, false)?;
                }
                _ => {}
            }
        }

        let mut block = block;
        for statement in body {
            if let Statement::FunctionDeclaration(function) = statement {
                block = self.lower_function_declaration(ctx, block, function)?;
            }
        }
        for statement in body {
            if !matches!(statement, Statement::FunctionDeclaration(_)) {
                block = self.lower_statement(ctx, block, statement)?;
            }
        }
        Ok(block)
    }

    pub(super) fn lower_statement(&mut self, ctx: Ctx, block: BlockId, statement: &Statement) -> Result<BlockId> {
        match statement {
            Statement::Expression(stmt) => Ok(self.lower_expression(ctx, block, &stmt.expression)?.block),
            Statement::VariableDeclaration(decl) => self.lower_variable_declaration(ctx, block, decl),
            Statement::Block(stmt) => self.lower_block(ctx, block, &stmt.body),
            Statement::Empty(_) => Ok(block),
            Statement::Debugger(_) => {
                self.at(ctx, block).debugger();
                Ok(block)
            }
            Statement::Return(stmt) => self.lower_return(ctx, block, stmt),
            Statement::Break(stmt) => self.lower_break(ctx, block, stmt),
            Statement::Continue(stmt) => self.lower_continue(ctx, block, stmt),
            Statement::If(stmt) => self.lower_if(ctx, block, stmt),
            Statement::While(stmt) => self.lower_while(ctx, block, stmt),
            Statement::DoWhile(stmt) => self.lower_do_while(ctx, block, stmt),
            Statement::For(stmt) => self.lower_for(ctx, block, stmt),
            Statement::ForIn(stmt) => self.lower_for_each(ctx, block, stmt, ForEachKind::In),
            Statement::ForOf(stmt) => self.lower_for_each(ctx, block, stmt, ForEachKind::Of),
            Statement::FunctionDeclaration(function) => Err(Error::unsupported(
                "function declaration in single-statement context",
                function.loc.as_ref(),
            )),
            Statement::ClassDeclaration(node) => Err(Error::unsupported("class declaration", node.loc.as_ref())),
            Statement::With(node) => Err(Error::unsupported("with statement", node.loc.as_ref())),
            Statement::Labeled(node) => Err(Error::unsupported("labeled statement", node.loc.as_ref())),
            Statement::Switch(node) => Err(Error::unsupported("switch statement", node.loc.as_ref())),
            Statement::Throw(node) => Err(Error::unsupported("throw statement", node.loc.as_ref())),
            Statement::Try(node) => Err(Error::unsupported("try statement", node.loc.as_ref())),
            Statement::ImportDeclaration(node)
            | Statement::ExportNamedDeclaration(node)
            | Statement::ExportDefaultDeclaration(node)
            | Statement::ExportAllDeclaration(node) => {
                Err(Error::unsupported(statement.kind_name(), node.loc.as_ref()))
            }
        }
    }

    /// `{ ... }` always gets its own scope frame.
    fn lower_block(&mut self, ctx: Ctx, block: BlockId, body: &[Statement]) -> Result<BlockId> {
        let scope = self.scopes.push_block(ctx.scope);
        let frame = self.open_scope(ctx, scope);
        self.at(ctx, block).jump(frame.entry);

        let last = self.lower_statement_list(ctx.with_scope(scope), frame.body, body)?;
        self.close_scope(ctx, &frame)?;
        self.at(ctx, last).pop_scope(1);
        Ok(last)
    }

    fn lower_return(&mut self, ctx: Ctx, block: BlockId, stmt: &ReturnStatement) -> Result<BlockId> {
        let (block, value) = match &stmt.argument {
            Some(argument) => {
                let lowered = self.lower_expression(ctx, block, argument)?;
                (lowered.block, lowered.value)
            }
            None => (block, self.at(ctx, block).undefined()),
        };
        let pops = self.scopes.scopes_to_function(ctx.scope);
        self.pop_scopes(ctx, block, pops);
        self.at(ctx, block).ret(value);
        Ok(self.new_block(ctx))
    }

    fn lower_break(&mut self, ctx: Ctx, block: BlockId, stmt: &JumpStatement) -> Result<BlockId> {
        if stmt.label.is_some() {
            return Err(Error::unsupported("labeled break", stmt.loc.as_ref()));
        }
        let (target, pops) = self.scopes.find_break(ctx.scope).ok_or(Error::IllegalBreak)?;
        self.pop_scopes(ctx, block, pops);
        self.at(ctx, block).jump(target);
        Ok(self.new_block(ctx))
    }

    fn lower_continue(&mut self, ctx: Ctx, block: BlockId, stmt: &JumpStatement) -> Result<BlockId> {
        if stmt.label.is_some() {
            return Err(Error::unsupported("labeled continue", stmt.loc.as_ref()));
        }
        let (target, pops) = self.scopes.find_continue(ctx.scope).ok_or(Error::IllegalContinue)?;
        self.pop_scopes(ctx, block, pops);
        self.at(ctx, block).jump(target);
        Ok(self.new_block(ctx))
    }

    fn lower_if(&mut self, ctx: Ctx, block: BlockId, stmt: &IfStatement) -> Result<BlockId> {
        let test = self.lower_expression(ctx, block, &stmt.test)?;
        let consequent = self.new_block(ctx);
        let following = self.new_block(ctx);
        let alternate = match stmt.alternate {
            Some(_) => self.new_block(ctx),
            None => following,
        };
        self.at(ctx, test.block).branch(test.value, consequent, alternate);

        let end = self.lower_statement(ctx, consequent, &stmt.consequent)?;
        self.at(ctx, end).jump(following);
        if let Some(statement) = &stmt.alternate {
            let end = self.lower_statement(ctx, alternate, statement)?;
            self.at(ctx, end).jump(following);
        }
        Ok(following)
    }

    // ========================================================================
    // Loops
    // ========================================================================

    /// ```text
    /// frame body -> test -> body -> test ...
    ///               test -> exit (pop_scope 1)
    /// ```
    fn lower_while(&mut self, ctx: Ctx, block: BlockId, stmt: &WhileStatement) -> Result<BlockId> {
        let scope = self.scopes.push_block(ctx.scope);
        let inner = ctx.with_scope(scope);
        let exit = self.new_block(ctx);
        let frame = self.open_scope(ctx, scope);
        let test = self.new_block(ctx);
        let body = self.new_block(ctx);
        self.scopes.set_break_target(scope, exit);
        self.scopes.set_continue_target(scope, test);

        self.at(ctx, block).jump(frame.entry);
        self.at(ctx, frame.body).jump(test);
        let cond = self.lower_expression(inner, test, &stmt.test)?;
        self.at(ctx, cond.block).branch(cond.value, body, exit);
        let end = self.lower_statement(inner, body, &stmt.body)?;
        self.at(ctx, end).jump(test);

        self.close_scope(ctx, &frame)?;
        self.at(ctx, exit).pop_scope(1);
        Ok(exit)
    }

    fn lower_do_while(&mut self, ctx: Ctx, block: BlockId, stmt: &WhileStatement) -> Result<BlockId> {
        let scope = self.scopes.push_block(ctx.scope);
        let inner = ctx.with_scope(scope);
        let exit = self.new_block(ctx);
        let frame = self.open_scope(ctx, scope);
        let body = self.new_block(ctx);
        let test = self.new_block(ctx);
        self.scopes.set_break_target(scope, exit);
        self.scopes.set_continue_target(scope, test);

        self.at(ctx, block).jump(frame.entry);
        self.at(ctx, frame.body).jump(body);
        let end = self.lower_statement(inner, body, &stmt.body)?;
        self.at(ctx, end).jump(test);
        let cond = self.lower_expression(inner, test, &stmt.test)?;
        self.at(ctx, cond.block).branch(cond.value, body, exit);

        self.close_scope(ctx, &frame)?;
        self.at(ctx, exit).pop_scope(1);
        Ok(exit)
    }

    /// The loop scope holds the init bindings. When the init declares
    /// `let`/`const` names, each iteration runs in its own frame holding
    /// fresh copies of them, written back to the loop slots at the end of
    /// the iteration, so closures created in the body see that
    /// iteration's values.
    ///
    /// ```text
    /// frame body: init; jump test
    /// test:       branch cond iteration exit
    /// iteration:  [push_scope; copy in] body; jump iter_end
    /// iter_end:   [copy out; pop_scope 1]; jump update
    /// update:     update; jump test
    /// exit:       pop_scope 1
    /// ```
    fn lower_for(&mut self, ctx: Ctx, block: BlockId, stmt: &ForStatement) -> Result<BlockId> {
        let scope = self.scopes.push_block(ctx.scope);
        let inner = ctx.with_scope(scope);
        let exit = self.new_block(ctx);
        let frame = self.open_scope(ctx, scope);
        self.scopes.set_break_target(scope, exit);
        self.at(ctx, block).jump(frame.entry);

        let mut head = frame.body;
        let mut loop_vars: Vec<(String, bool)> = Vec::new();
        match &stmt.init {
            Some(ForInit::Declaration(decl)) => {
                self.forward_declare_variables(inner, head, decl)?;
                let mut names = Vec::new();
                for declarator in &decl.declarations {
                    declarator.id.bound_names(&mut names);
                }
                let constant = decl.kind == VariableKind::Const;
                loop_vars = names.iter().map(|id| (id.name.clone(), constant)).collect();
                head = self.lower_variable_declaration(inner, head, decl)?;
            }
            Some(ForInit::Expression(expr)) => {
                head = self.lower_expression(inner, head, expr)?.block;
            }
            None => {}
        }

        let test = self.new_block(ctx);
        let update = self.new_block(ctx);
        self.at(ctx, head).jump(test);

        if loop_vars.is_empty() {
            self.scopes.set_continue_target(scope, update);
            let body = self.new_block(ctx);
            self.lower_for_test(inner, test, stmt, body, exit)?;
            let end = self.lower_statement(inner, body, &stmt.body)?;
            self.at(ctx, end).jump(update);
        } else {
            let iteration = self.scopes.push_block(scope);
            let iter_ctx = ctx.with_scope(iteration);
            let iter_frame = self.open_scope(inner, iteration);
            let iter_end = self.new_block(ctx);
            self.scopes.set_continue_target(iteration, iter_end);
            self.lower_for_test(inner, test, stmt, iter_frame.entry, exit)?;

            let mut copies: Vec<(InstId, InstId)> = Vec::with_capacity(loop_vars.len());
            for (name, constant) in &loop_vars {
                let Some(outer) = self.scopes.lookup(iteration, name, false, true)? else {
                    return Err(self.internal(iter_ctx, "ForStatement", format!("loop variable '{name}' vanished")));
                };
                let outer = self.slot_address(iter_ctx, iter_frame.body, outer.binding);
                let mut b = self.at(ctx, iter_frame.body);
                let slot = b.alloca();
                let value = b.load(outer);
                b.store(slot, value);
                self.scopes.declare(iteration, name, Some(slot), *constant)?;
                copies.push((outer, slot));
            }

            let end = self.lower_statement(iter_ctx, iter_frame.body, &stmt.body)?;
            self.at(ctx, end).jump(iter_end);

            let mut b = self.at(ctx, iter_end);
            for &(outer, slot) in &copies {
                let value = b.load(slot);
                b.store(outer, value);
            }
            b.pop_scope(1);
            b.jump(update);
            self.close_scope(inner, &iter_frame)?;
        }

        let after_update = match &stmt.update {
            Some(expr) => self.lower_expression(inner, update, expr)?.block,
            None => update,
        };
        self.at(ctx, after_update).jump(test);

        self.close_scope(ctx, &frame)?;
        self.at(ctx, exit).pop_scope(1);
        Ok(exit)
    }

    fn lower_for_test(
        &mut self,
        ctx: Ctx,
        test: BlockId,
        stmt: &ForStatement,
        body: BlockId,
        exit: BlockId,
    ) -> Result<()> {
        match &stmt.test {
            Some(expr) => {
                let cond = self.lower_expression(ctx, test, expr)?;
                self.at(ctx, cond.block).branch(cond.value, body, exit);
            }
            None => {
                self.at(ctx, test).jump(body);
            }
        }
        Ok(())
    }

    /// `for (x in o)` walks `Object.keys(o)` with a phi-carried index;
    /// `for (x of it)` drives `it[Symbol.iterator]()`. Each iteration runs
    /// in a fresh frame that holds the loop binding.
    ///
    /// ```text
    /// block:     setup; jump next
    /// next:      [phi index] fetch; branch more iteration exit
    /// iteration: push_scope; bind; body; jump iter_end
    /// iter_end:  pop_scope 1; [index + 1]; jump next
    /// broken:    pop_scope 1; jump exit
    /// ```
    fn lower_for_each(
        &mut self,
        ctx: Ctx,
        block: BlockId,
        stmt: &ForEachStatement,
        kind: ForEachKind,
    ) -> Result<BlockId> {
        if stmt.is_await {
            return Err(Error::unsupported("for await", stmt.loc.as_ref()));
        }
        let right = self.lower_expression(ctx, block, &stmt.right)?;
        let setup = right.block;

        let next = self.new_block(ctx);
        let exit = self.new_block(ctx);
        let broken = self.new_block(ctx);
        let iteration = self.scopes.push_block(ctx.scope);
        let iter_ctx = ctx.with_scope(iteration);
        let frame = self.open_scope(ctx, iteration);
        let iter_end = self.new_block(ctx);
        self.scopes.set_break_target(iteration, broken);
        self.scopes.set_continue_target(iteration, iter_end);

        let element = match kind {
            ForEachKind::In => {
                let object = self.load_global(ctx, setup, "Object");
                let keys_fn = self.get_named(ctx, setup, object, "keys");
                let mut b = self.at(ctx, setup);
                let args = b.array(vec![right.value]);
                let keys = b.call(keys_fn, object, args);
                let zero = b.number(0.0);
                let length = self.get_named(ctx, setup, keys, "length");
                self.at(ctx, setup).jump(next);

                let mut b = self.at(ctx, next);
                let index = b.phi(Vec::new());
                let more = b.binary(BinaryOp::Lt, index, length);
                b.branch(more, frame.entry, exit);
                let element = self.at(ctx, frame.body).get_item(keys, index);

                let mut b = self.at(ctx, iter_end);
                b.pop_scope(1);
                let one = b.number(1.0);
                let bumped = b.binary(BinaryOp::Add, index, one);
                b.jump(next);
                if let Inst::Phi { incoming } = &mut self.module[ctx.func][index] {
                    *incoming = vec![(setup, zero), (iter_end, bumped)];
                }
                element
            }
            ForEachKind::Of => {
                let symbol = self.load_global(ctx, setup, "Symbol");
                let key = self.get_named(ctx, setup, symbol, "iterator");
                let mut b = self.at(ctx, setup);
                let method = b.get_item(right.value, key);
                let no_args = b.array(Vec::new());
                let iterator = b.call(method, right.value, no_args);
                b.jump(next);

                let next_fn = self.get_named(ctx, next, iterator, "next");
                let mut b = self.at(ctx, next);
                let no_args = b.array(Vec::new());
                let step = b.call(next_fn, iterator, no_args);
                let done = self.get_named(ctx, next, step, "done");
                self.at(ctx, next).branch(done, exit, frame.entry);
                let element = self.get_named(ctx, frame.body, step, "value");

                let mut b = self.at(ctx, iter_end);
                b.pop_scope(1);
                b.jump(next);
                element
            }
        };

        let body = self.bind_for_each_left(iter_ctx, frame.body, &stmt.left, element)?;
        let end = self.lower_statement(iter_ctx, body, &stmt.body)?;
        self.at(ctx, end).jump(iter_end);

        let mut b = self.at(ctx, broken);
        b.pop_scope(1);
        b.jump(exit);
        self.close_scope(ctx, &frame)?;
        Ok(exit)
    }

    fn bind_for_each_left(&mut self, ctx: Ctx, block: BlockId, left: &ForEachLeft, value: InstId) -> Result<BlockId> {
        match left {
            ForEachLeft::VariableDeclaration(decl) => {
                if decl.kind == VariableKind::Var {
                    return Err(Error::unsupported("var declaration", decl.loc.as_ref()));
                }
                let [declarator] = decl.declarations.as_slice() else {
                    return Err(Error::unsupported("multiple for-each bindings", decl.loc.as_ref()));
                };
                self.forward_declare_variables(ctx, block, decl)?;
                self.bind_pattern(ctx, block, &declarator.id, value, decl.kind == VariableKind::Const)
            }
            ForEachLeft::Identifier(id) => {
                let addr = self.identifier_address(ctx, block, &id.name, true)?;
                self.at(ctx, block).store(addr, value);
                Ok(block)
            }
            ForEachLeft::MemberExpression(member) => {
                let target = self.lower_member_target(ctx, block, member)?;
                self.at(ctx, target.block).set_item(target.object, target.key, value);
                Ok(target.block)
            }
            ForEachLeft::ArrayPattern(node) | ForEachLeft::ObjectPattern(node) => {
                Err(Error::unsupported("destructuring assignment", node.loc.as_ref()))
            }
        }
    }
}
