//! Expression lowering.

use super::functions::FunctionNode;
use super::patterns::property_key_name;
use super::{Compiler, Ctx, Lowered};
use crate::ast::{
    ArrayExpression, AssignmentExpression, AssignmentOperator, AssignmentTarget, BinaryOperator, CallExpression,
    ConditionalExpression, Expression, Literal, LiteralValue, LogicalExpression, LogicalOperator, MemberExpression,
    ObjectExpression, ObjectMember, PropertyKind, TemplateLiteral, UnaryExpression, UnaryOperator, UpdateExpression,
    UpdateOperator,
};
use crate::error::{Error, Result};
use crate::ir::{BinaryOp, BlockId, InstId, UnaryOp};
use tracing::trace;

/// An evaluated `object[key]` reference.
#[derive(Debug, Clone, Copy)]
pub(super) struct MemberTarget {
    pub(super) block: BlockId,
    pub(super) object: InstId,
    pub(super) key: InstId,
}

/// Where an assignment or update writes to.
#[derive(Debug, Clone, Copy)]
enum Place {
    Slot(InstId),
    Member { object: InstId, key: InstId },
}

impl Compiler {
    pub(super) fn lower_expression(&mut self, ctx: Ctx, block: BlockId, expr: &Expression) -> Result<Lowered> {
        trace!(node = expr.kind_name(), %block, "lowering expression");
        match expr {
            Expression::Identifier(id) => {
                let value = self.read_identifier(ctx, block, id)?;
                Ok(Lowered { block, value })
            }
            Expression::Literal(lit) => {
                let value = self.lower_literal(ctx, block, lit)?;
                Ok(Lowered { block, value })
            }
            Expression::This(_) => {
                let value = self.at(ctx, block).this();
                Ok(Lowered { block, value })
            }
            Expression::Array(array) => self.lower_array(ctx, block, array),
            Expression::Object(object) => self.lower_object(ctx, block, object),
            Expression::Function(function) => self.lower_closure(ctx, block, FunctionNode::Function(function)),
            Expression::Arrow(arrow) => self.lower_closure(ctx, block, FunctionNode::Arrow(arrow)),
            Expression::Unary(unary) => self.lower_unary(ctx, block, unary),
            Expression::Update(update) => self.lower_update(ctx, block, update),
            Expression::Binary(binary) => {
                let lhs = self.lower_expression(ctx, block, &binary.left)?;
                let rhs = self.lower_expression(ctx, lhs.block, &binary.right)?;
                let value = self.apply_binary(ctx, rhs.block, binary.operator, lhs.value, rhs.value);
                Ok(Lowered {
                    block: rhs.block,
                    value,
                })
            }
            Expression::Logical(logical) => self.lower_logical(ctx, block, logical),
            Expression::Assignment(assignment) => self.lower_assignment(ctx, block, assignment),
            Expression::Conditional(conditional) => self.lower_conditional(ctx, block, conditional),
            Expression::Call(call) => self.lower_call(ctx, block, call),
            Expression::New(call) => {
                let callee = self.lower_expression(ctx, block, &call.callee)?;
                let args = self.lower_arguments(ctx, callee.block, &call.arguments)?;
                let value = self.at(ctx, args.block).new_instance(callee.value, args.value);
                Ok(Lowered {
                    block: args.block,
                    value,
                })
            }
            Expression::Member(member) => {
                let target = self.lower_member_target(ctx, block, member)?;
                let value = self.at(ctx, target.block).get_item(target.object, target.key);
                Ok(Lowered {
                    block: target.block,
                    value,
                })
            }
            Expression::Sequence(sequence) => {
                let mut last = None;
                let mut block = block;
                for expr in &sequence.expressions {
                    let lowered = self.lower_expression(ctx, block, expr)?;
                    block = lowered.block;
                    last = Some(lowered);
                }
                last.ok_or_else(|| self.internal(ctx, "SequenceExpression", "empty sequence expression"))
            }
            Expression::TemplateLiteral(template) => self.lower_template(ctx, block, template),
            Expression::Spread(spread) => Err(Error::unsupported("spread element", spread.loc.as_ref())),
            Expression::Super(node)
            | Expression::Class(node)
            | Expression::TaggedTemplateExpression(node)
            | Expression::Yield(node)
            | Expression::Await(node)
            | Expression::Chain(node)
            | Expression::Import(node)
            | Expression::MetaProperty(node)
            | Expression::PrivateIdentifier(node) => Err(Error::unsupported(expr.kind_name(), node.loc.as_ref())),
        }
    }

    /// Evaluates the object and key of a member expression.
    pub(super) fn lower_member_target(
        &mut self,
        ctx: Ctx,
        block: BlockId,
        member: &MemberExpression,
    ) -> Result<MemberTarget> {
        if let Expression::Super(node) = member.object.as_ref() {
            return Err(Error::unsupported("super property access", node.loc.as_ref()));
        }
        let object = self.lower_expression(ctx, block, &member.object)?;
        if member.computed {
            let key = self.lower_expression(ctx, object.block, &member.property)?;
            return Ok(MemberTarget {
                block: key.block,
                object: object.value,
                key: key.value,
            });
        }
        let key = match member.property.as_ref() {
            Expression::Identifier(id) => self.at(ctx, object.block).string(id.name.as_str()),
            Expression::PrivateIdentifier(node) => {
                return Err(Error::unsupported("private field access", node.loc.as_ref()));
            }
            other => {
                return Err(self.internal(
                    ctx,
                    "MemberExpression",
                    format!("non-computed member key is a {}", other.kind_name()),
                ));
            }
        };
        Ok(MemberTarget {
            block: object.block,
            object: object.value,
            key,
        })
    }

    fn lower_literal(&mut self, ctx: Ctx, block: BlockId, lit: &Literal) -> Result<InstId> {
        if let Some(regex) = &lit.regex {
            return Ok(self.at(ctx, block).regex(format!("/{}/{}", regex.pattern, regex.flags)));
        }
        if lit.bigint.is_some() {
            return Err(Error::unsupported("BigInt literal", lit.loc.as_ref()));
        }
        let mut b = self.at(ctx, block);
        Ok(match &lit.value {
            LiteralValue::Null => b.null(),
            LiteralValue::Boolean(value) => b.boolean(*value),
            LiteralValue::Number(value) => b.number(*value),
            LiteralValue::String(value) => b.string(value.as_str()),
            LiteralValue::Other(_) => return Err(Error::unsupported("literal", lit.loc.as_ref())),
        })
    }

    /// Plain elements are collected into `array` segments. Each spread
    /// becomes its own segment through `Array.from`, and several segments
    /// are joined with `Array.prototype.concat`.
    fn lower_array(&mut self, ctx: Ctx, block: BlockId, array: &ArrayExpression) -> Result<Lowered> {
        let mut block = block;
        let mut segments = Vec::new();
        let mut pending = Vec::new();
        for element in &array.elements {
            match element {
                None => pending.push(self.at(ctx, block).undefined()),
                Some(Expression::Spread(spread)) => {
                    if !pending.is_empty() {
                        segments.push(self.at(ctx, block).array(std::mem::take(&mut pending)));
                    }
                    let iterable = self.lower_expression(ctx, block, &spread.argument)?;
                    block = iterable.block;
                    let array_ctor = self.load_global(ctx, block, "Array");
                    let from = self.get_named(ctx, block, array_ctor, "from");
                    let mut b = self.at(ctx, block);
                    let args = b.array(vec![iterable.value]);
                    segments.push(b.call(from, array_ctor, args));
                }
                Some(expr) => {
                    let lowered = self.lower_expression(ctx, block, expr)?;
                    block = lowered.block;
                    pending.push(lowered.value);
                }
            }
        }
        if !pending.is_empty() || segments.is_empty() {
            segments.push(self.at(ctx, block).array(pending));
        }

        let mut segments = segments.into_iter();
        let Some(first) = segments.next() else {
            return Err(self.internal(ctx, "ArrayExpression", "array literal produced no segments"));
        };
        let rest: Vec<InstId> = segments.collect();
        if rest.is_empty() {
            return Ok(Lowered { block, value: first });
        }
        let array_ctor = self.load_global(ctx, block, "Array");
        let prototype = self.get_named(ctx, block, array_ctor, "prototype");
        let concat = self.get_named(ctx, block, prototype, "concat");
        let mut b = self.at(ctx, block);
        let args = b.array(rest);
        let value = b.call(concat, first, args);
        Ok(Lowered { block, value })
    }

    fn lower_object(&mut self, ctx: Ctx, block: BlockId, object: &ObjectExpression) -> Result<Lowered> {
        let mut block = block;
        let mut props = Vec::with_capacity(object.properties.len());
        for member in &object.properties {
            let property = match member {
                ObjectMember::Property(property) => property,
                ObjectMember::SpreadElement(spread) => {
                    return Err(Error::unsupported("object spread", spread.loc.as_ref()));
                }
            };
            if property.kind != PropertyKind::Init {
                return Err(Error::unsupported("accessor property", property.loc.as_ref()));
            }
            if property.method {
                return Err(Error::unsupported("method property", property.loc.as_ref()));
            }
            if property.computed {
                return Err(Error::unsupported("computed property key", property.loc.as_ref()));
            }
            let name = property_key_name(&property.key)?;
            let key = self.at(ctx, block).string(name);
            let value = self.lower_expression(ctx, block, &property.value)?;
            block = value.block;
            props.push((key, value.value));
        }
        let value = self.at(ctx, block).object(props);
        Ok(Lowered { block, value })
    }

    fn lower_unary(&mut self, ctx: Ctx, block: BlockId, unary: &UnaryExpression) -> Result<Lowered> {
        let op = match unary.operator {
            UnaryOperator::Delete => return self.lower_delete(ctx, block, &unary.argument),
            UnaryOperator::Minus => Some(UnaryOp::Neg),
            UnaryOperator::Not => Some(UnaryOp::Not),
            UnaryOperator::BitwiseNot => Some(UnaryOp::BitNot),
            UnaryOperator::Typeof => Some(UnaryOp::TypeOf),
            UnaryOperator::Plus | UnaryOperator::Void => None,
        };

        let operand = self.lower_expression(ctx, block, &unary.argument)?;
        let mut b = self.at(ctx, operand.block);
        let value = match (op, unary.operator) {
            (Some(op), _) => b.unary(op, operand.value),
            (None, UnaryOperator::Void) => b.undefined(),
            // `+x` as `x - 0`
            (None, _) => {
                let zero = b.number(0.0);
                b.binary(BinaryOp::Sub, operand.value, zero)
            }
        };
        Ok(Lowered {
            block: operand.block,
            value,
        })
    }

    fn lower_delete(&mut self, ctx: Ctx, block: BlockId, argument: &Expression) -> Result<Lowered> {
        let Expression::Member(member) = argument else {
            return Err(Error::unsupported("delete of a non-member expression", argument.loc()));
        };
        let target = self.lower_member_target(ctx, block, member)?;
        let value = self.at(ctx, target.block).del_item(target.object, target.key);
        Ok(Lowered {
            block: target.block,
            value,
        })
    }

    fn lower_update(&mut self, ctx: Ctx, block: BlockId, update: &UpdateExpression) -> Result<Lowered> {
        let (block, place) = match update.argument.as_ref() {
            Expression::Identifier(id) => {
                let addr = self.identifier_address(ctx, block, &id.name, true)?;
                (block, Place::Slot(addr))
            }
            Expression::Member(member) => {
                let target = self.lower_member_target(ctx, block, member)?;
                (target.block, Place::Member {
                    object: target.object,
                    key: target.key,
                })
            }
            other => return Err(Error::InvalidAssignmentTarget(other.kind_name())),
        };
        let op = match update.operator {
            UpdateOperator::Increment => BinaryOp::Add,
            UpdateOperator::Decrement => BinaryOp::Sub,
        };
        let old = self.read_place(ctx, block, place);
        let mut b = self.at(ctx, block);
        let one = b.number(1.0);
        let new = b.binary(op, old, one);
        self.write_place(ctx, block, place, new);
        let value = self
            .at(ctx, block)
            .move_value(if update.prefix { new } else { old });
        Ok(Lowered { block, value })
    }

    fn lower_logical(&mut self, ctx: Ctx, block: BlockId, logical: &LogicalExpression) -> Result<Lowered> {
        let left = self.lower_expression(ctx, block, &logical.left)?;
        let right_block = self.new_block(ctx);
        let following = self.new_block(ctx);
        let mut b = self.at(ctx, left.block);
        match logical.operator {
            LogicalOperator::And => b.branch(left.value, right_block, following),
            LogicalOperator::Or => b.branch(left.value, following, right_block),
            LogicalOperator::NullishCoalescing => {
                let null = b.null();
                let nullish = b.binary(BinaryOp::Eq, left.value, null);
                b.branch(nullish, right_block, following)
            }
        };

        let right = self.lower_expression(ctx, right_block, &logical.right)?;
        self.at(ctx, right.block).jump(following);
        let value = self
            .at(ctx, following)
            .phi(vec![(left.block, left.value), (right.block, right.value)]);
        Ok(Lowered {
            block: following,
            value,
        })
    }

    fn lower_conditional(&mut self, ctx: Ctx, block: BlockId, conditional: &ConditionalExpression) -> Result<Lowered> {
        let test = self.lower_expression(ctx, block, &conditional.test)?;
        let then_block = self.new_block(ctx);
        let else_block = self.new_block(ctx);
        let join = self.new_block(ctx);
        self.at(ctx, test.block).branch(test.value, then_block, else_block);

        let consequent = self.lower_expression(ctx, then_block, &conditional.consequent)?;
        self.at(ctx, consequent.block).jump(join);
        let alternate = self.lower_expression(ctx, else_block, &conditional.alternate)?;
        self.at(ctx, alternate.block).jump(join);

        let value = self.at(ctx, join).phi(vec![
            (consequent.block, consequent.value),
            (alternate.block, alternate.value),
        ]);
        Ok(Lowered { block: join, value })
    }

    /// The target is evaluated before the right-hand side.
    fn lower_assignment(&mut self, ctx: Ctx, block: BlockId, assignment: &AssignmentExpression) -> Result<Lowered> {
        if matches!(
            assignment.operator,
            AssignmentOperator::OrAssign | AssignmentOperator::AndAssign | AssignmentOperator::NullishAssign
        ) {
            return Err(Error::unsupported("logical assignment", assignment.right.loc()));
        }
        let (block, place) = match assignment.left.as_ref() {
            AssignmentTarget::Identifier(id) => {
                let addr = self.identifier_address(ctx, block, &id.name, true)?;
                (block, Place::Slot(addr))
            }
            AssignmentTarget::MemberExpression(member) => {
                let target = self.lower_member_target(ctx, block, member)?;
                (target.block, Place::Member {
                    object: target.object,
                    key: target.key,
                })
            }
            AssignmentTarget::ArrayPattern(node) | AssignmentTarget::ObjectPattern(node) => {
                return Err(Error::unsupported("destructuring assignment", node.loc.as_ref()));
            }
        };

        let compound = assignment.operator.binary_operator();
        let old = compound.map(|_| self.read_place(ctx, block, place));
        let right = self.lower_expression(ctx, block, &assignment.right)?;
        let block = right.block;
        let value = match (compound, old) {
            (Some(op), Some(old)) => self.apply_binary(ctx, block, op, old, right.value),
            _ => right.value,
        };
        self.write_place(ctx, block, place, value);
        let value = self.at(ctx, block).move_value(value);
        Ok(Lowered { block, value })
    }

    /// Member callees receive their object as `this`; any other callee
    /// receives `undefined`.
    fn lower_call(&mut self, ctx: Ctx, block: BlockId, call: &CallExpression) -> Result<Lowered> {
        let (block, callee, this) = match call.callee.as_ref() {
            Expression::Member(member) => {
                let target = self.lower_member_target(ctx, block, member)?;
                let callee = self.at(ctx, target.block).get_item(target.object, target.key);
                (target.block, callee, target.object)
            }
            other => {
                let callee = self.lower_expression(ctx, block, other)?;
                let this = self.at(ctx, callee.block).undefined();
                (callee.block, callee.value, this)
            }
        };
        let args = self.lower_arguments(ctx, block, &call.arguments)?;
        let value = self.at(ctx, args.block).call(callee, this, args.value);
        Ok(Lowered {
            block: args.block,
            value,
        })
    }

    /// Evaluates arguments left to right into an argument array.
    fn lower_arguments(&mut self, ctx: Ctx, block: BlockId, arguments: &[Expression]) -> Result<Lowered> {
        let mut block = block;
        let mut values = Vec::with_capacity(arguments.len());
        for argument in arguments {
            if let Expression::Spread(spread) = argument {
                return Err(Error::unsupported("spread argument", spread.loc.as_ref()));
            }
            let lowered = self.lower_expression(ctx, block, argument)?;
            block = lowered.block;
            values.push(lowered.value);
        }
        let value = self.at(ctx, block).array(values);
        Ok(Lowered { block, value })
    }

    /// `` `a${x}b` `` becomes `"a" + x + "b"`.
    fn lower_template(&mut self, ctx: Ctx, block: BlockId, template: &TemplateLiteral) -> Result<Lowered> {
        let mut block = block;
        let mut value = self.at(ctx, block).string(cooked(template, 0)?);
        for (i, expr) in template.expressions.iter().enumerate() {
            let lowered = self.lower_expression(ctx, block, expr)?;
            block = lowered.block;
            let text = cooked(template, i + 1)?;
            let mut b = self.at(ctx, block);
            value = b.binary(BinaryOp::Add, value, lowered.value);
            if !text.is_empty() {
                let text = b.string(text);
                value = b.binary(BinaryOp::Add, value, text);
            }
        }
        Ok(Lowered { block, value })
    }

    /// Emits `lhs op rhs`. `**` has no instruction and calls `Math.pow`.
    fn apply_binary(&mut self, ctx: Ctx, block: BlockId, op: BinaryOperator, lhs: InstId, rhs: InstId) -> InstId {
        match binary_op(op) {
            Some(op) => self.at(ctx, block).binary(op, lhs, rhs),
            None => {
                let math = self.load_global(ctx, block, "Math");
                let pow = self.get_named(ctx, block, math, "pow");
                let mut b = self.at(ctx, block);
                let args = b.array(vec![lhs, rhs]);
                b.call(pow, math, args)
            }
        }
    }

    fn read_place(&mut self, ctx: Ctx, block: BlockId, place: Place) -> InstId {
        let mut b = self.at(ctx, block);
        match place {
            Place::Slot(addr) => b.load(addr),
            Place::Member { object, key } => b.get_item(object, key),
        }
    }

    fn write_place(&mut self, ctx: Ctx, block: BlockId, place: Place, value: InstId) {
        let mut b = self.at(ctx, block);
        match place {
            Place::Slot(addr) => b.store(addr, value),
            Place::Member { object, key } => b.set_item(object, key, value),
        };
    }
}

/// Cooked text of the `index`th template element.
fn cooked(template: &TemplateLiteral, index: usize) -> Result<&str> {
    template
        .quasis
        .get(index)
        .and_then(|quasi| quasi.value.cooked.as_deref())
        .ok_or_else(|| Error::unsupported("template literal with an invalid escape", template.loc.as_ref()))
}

/// The instruction for a binary operator. `None` for `**`.
fn binary_op(op: BinaryOperator) -> Option<BinaryOp> {
    Some(match op {
        BinaryOperator::Equal => BinaryOp::Eq,
        BinaryOperator::NotEqual => BinaryOp::Ne,
        BinaryOperator::StrictEqual => BinaryOp::StrictEq,
        BinaryOperator::StrictNotEqual => BinaryOp::StrictNe,
        BinaryOperator::LessThan => BinaryOp::Lt,
        BinaryOperator::LessEqual => BinaryOp::Le,
        BinaryOperator::GreaterThan => BinaryOp::Gt,
        BinaryOperator::GreaterEqual => BinaryOp::Ge,
        BinaryOperator::LeftShift => BinaryOp::Shl,
        BinaryOperator::RightShift => BinaryOp::Shr,
        BinaryOperator::UnsignedRightShift => BinaryOp::UShr,
        BinaryOperator::Add => BinaryOp::Add,
        BinaryOperator::Subtract => BinaryOp::Sub,
        BinaryOperator::Multiply => BinaryOp::Mul,
        BinaryOperator::Divide => BinaryOp::Div,
        BinaryOperator::Modulo => BinaryOp::Mod,
        BinaryOperator::BitwiseOr => BinaryOp::BitOr,
        BinaryOperator::BitwiseXor => BinaryOp::BitXor,
        BinaryOperator::BitwiseAnd => BinaryOp::BitAnd,
        BinaryOperator::In => BinaryOp::In,
        BinaryOperator::Instanceof => BinaryOp::InstanceOf,
        BinaryOperator::Exponent => return None,
    })
}
