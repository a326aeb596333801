//! `let`/`const` declarations and destructuring binding patterns.

use super::{Compiler, Ctx, Lowered};
use crate::ast::{Expression, LiteralValue, ObjectPatternMember, Pattern, VariableDeclaration, VariableKind};
use crate::error::{Error, Result};
use crate::ir::{BinaryOp, BlockId, InstId};

impl Compiler {
    /// Gives every name bound by `decl` a slot in `block` and forward
    /// declares it in the current scope.
    pub(super) fn forward_declare_variables(&mut self, ctx: Ctx, block: BlockId, decl: &VariableDeclaration) -> Result<()> {
        if decl.kind == VariableKind::Var {
            return Err(Error::unsupported("var declaration", decl.loc.as_ref()));
        }
        let constant = decl.kind == VariableKind::Const;
        let mut names = Vec::new();
        for declarator in &decl.declarations {
            declarator.id.bound_names(&mut names);
        }
        for id in names {
            let slot = self.at(ctx, block).alloca();
            self.scopes.forward_declare(ctx.scope, &id.name, slot, constant)?;
        }
        Ok(())
    }

    /// Lowers each initializer and then declares and stores its targets,
    /// so an initializer cannot read the names it declares.
    pub(super) fn lower_variable_declaration(&mut self, ctx: Ctx, block: BlockId, decl: &VariableDeclaration) -> Result<BlockId> {
        if decl.kind == VariableKind::Var {
            return Err(Error::unsupported("var declaration", decl.loc.as_ref()));
        }
        let constant = decl.kind == VariableKind::Const;
        let mut block = block;
        for declarator in &decl.declarations {
            let value = match &declarator.init {
                Some(init) => {
                    let lowered = self.lower_expression(ctx, block, init)?;
                    block = lowered.block;
                    lowered.value
                }
                None => self.at(ctx, block).undefined(),
            };
            block = self.bind_pattern(ctx, block, &declarator.id, value, constant)?;
        }
        Ok(block)
    }

    /// Declares the names in `pattern` and stores the matching parts of
    /// `value` into them.
    pub(super) fn bind_pattern(
        &mut self,
        ctx: Ctx,
        block: BlockId,
        pattern: &Pattern,
        value: InstId,
        constant: bool,
    ) -> Result<BlockId> {
        match pattern {
            Pattern::Identifier(id) => {
                let slot = if self.scopes.has_local(ctx.scope, &id.name) {
                    self.scopes.declare(ctx.scope, &id.name, None, constant)?
                } else {
                    let slot = self.at(ctx, block).alloca();
                    self.scopes.declare(ctx.scope, &id.name, Some(slot), constant)?
                };
                self.at(ctx, block).store(slot, value);
                Ok(block)
            }
            Pattern::ArrayPattern(array) => {
                let mut block = block;
                for (index, element) in array.elements.iter().enumerate() {
                    let Some(element) = element else { continue };
                    if let Pattern::RestElement(rest) = element {
                        return Err(Error::unsupported("rest element in array pattern", rest.loc.as_ref()));
                    }
                    let mut b = self.at(ctx, block);
                    let key = b.number(index as f64);
                    let item = b.get_item(value, key);
                    block = self.bind_pattern(ctx, block, element, item, constant)?;
                }
                Ok(block)
            }
            Pattern::ObjectPattern(object) => {
                let mut block = block;
                for member in &object.properties {
                    let property = match member {
                        ObjectPatternMember::Property(property) => property,
                        ObjectPatternMember::RestElement(rest) => {
                            return Err(Error::unsupported("rest element in object pattern", rest.loc.as_ref()));
                        }
                    };
                    if property.computed {
                        return Err(Error::unsupported("computed key in object pattern", property.loc.as_ref()));
                    }
                    let name = property_key_name(&property.key)?;
                    let item = self.get_named(ctx, block, value, &name);
                    block = self.bind_pattern(ctx, block, &property.value, item, constant)?;
                }
                Ok(block)
            }
            Pattern::AssignmentPattern(assign) => {
                let lowered = self.default_value(ctx, block, value, &assign.right)?;
                self.bind_pattern(ctx, lowered.block, &assign.left, lowered.value, constant)
            }
            Pattern::RestElement(rest) => Err(Error::unsupported("rest element", rest.loc.as_ref())),
            Pattern::MemberExpression(node) => Err(Error::unsupported("member expression in declaration", node.loc.as_ref())),
        }
    }

    /// `value === undefined ? default : value`
    ///
    /// ```text
    /// block:    $u = undefined; $c = eqq value $u; branch $c fallback join
    /// fallback: <default>; jump join
    /// join:     phi [block value] [fallback default]
    /// ```
    fn default_value(&mut self, ctx: Ctx, block: BlockId, value: InstId, default: &Expression) -> Result<Lowered> {
        let fallback = self.new_block(ctx);
        let join = self.new_block(ctx);
        let mut b = self.at(ctx, block);
        let undefined = b.undefined();
        let missing = b.binary(BinaryOp::StrictEq, value, undefined);
        b.branch(missing, fallback, join);

        let lowered = self.lower_expression(ctx, fallback, default)?;
        self.at(ctx, lowered.block).jump(join);
        let merged = self
            .at(ctx, join)
            .phi(vec![(block, value), (lowered.block, lowered.value)]);
        Ok(Lowered {
            block: join,
            value: merged,
        })
    }
}

/// Static property name of a non-computed key.
pub(super) fn property_key_name(key: &Expression) -> Result<String> {
    match key {
        Expression::Identifier(id) => Ok(id.name.clone()),
        Expression::Literal(lit) => match &lit.value {
            LiteralValue::String(s) => Ok(s.clone()),
            LiteralValue::Number(n) if lit.bigint.is_none() => Ok(number_to_key(*n)),
            _ => Err(Error::unsupported("literal property key", lit.loc.as_ref())),
        },
        other => Err(Error::unsupported(
            format!("{} as property key", other.kind_name()),
            other.loc(),
        )),
    }
}

/// Formats a number the way JavaScript converts it to a property key.
pub(super) fn number_to_key(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n == f64::INFINITY {
        "Infinity".to_string()
    } else if n == f64::NEG_INFINITY {
        "-Infinity".to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if n.abs() >= 1e21 || n.abs() < 1e-6 {
        // shortest digits in exponent form, with an explicit sign on the exponent
        let formatted = format!("{n:e}");
        match formatted.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{mantissa}e+{exponent}"),
            _ => formatted,
        }
    } else {
        n.to_string()
    }
}
