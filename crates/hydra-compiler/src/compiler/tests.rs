//! Tests for AST lowering.

use super::*;
use crate::ast::Program;
use crate::ir::{BinaryOp, IrFunction, UnaryOp};
use serde_json::{Value, json};

// ============================================================================
// AST builders
// ============================================================================

fn program(body: Vec<Value>) -> Program {
    serde_json::from_value(json!({ "type": "Program", "body": body })).expect("valid program")
}

fn compile_body(body: Vec<Value>) -> Result<IrModule> {
    compile(&program(body), "test.js", &FunctionIds::new())
}

fn compile_ok(body: Vec<Value>) -> IrModule {
    compile_body(body).expect("Compilation should succeed")
}

fn id(name: &str) -> Value {
    json!({ "type": "Identifier", "name": name })
}

fn num(value: f64) -> Value {
    json!({ "type": "Literal", "value": value })
}

fn str_lit(value: &str) -> Value {
    json!({ "type": "Literal", "value": value })
}

fn declare(kind: &str, target: Value, init: Option<Value>) -> Value {
    json!({
        "type": "VariableDeclaration",
        "kind": kind,
        "declarations": [{ "type": "VariableDeclarator", "id": target, "init": init }],
    })
}

fn let_(name: &str, init: Value) -> Value {
    declare("let", id(name), Some(init))
}

fn const_(name: &str, init: Value) -> Value {
    declare("const", id(name), Some(init))
}

fn stmt(expression: Value) -> Value {
    json!({ "type": "ExpressionStatement", "expression": expression })
}

fn block(body: Vec<Value>) -> Value {
    json!({ "type": "BlockStatement", "body": body })
}

fn ret(argument: Value) -> Value {
    json!({ "type": "ReturnStatement", "argument": argument })
}

fn binary(operator: &str, left: Value, right: Value) -> Value {
    json!({ "type": "BinaryExpression", "operator": operator, "left": left, "right": right })
}

fn logical(operator: &str, left: Value, right: Value) -> Value {
    json!({ "type": "LogicalExpression", "operator": operator, "left": left, "right": right })
}

fn assign(operator: &str, left: Value, right: Value) -> Value {
    json!({ "type": "AssignmentExpression", "operator": operator, "left": left, "right": right })
}

fn member(object: Value, name: &str) -> Value {
    json!({ "type": "MemberExpression", "object": object, "property": id(name), "computed": false })
}

fn call(callee: Value, arguments: Vec<Value>) -> Value {
    json!({ "type": "CallExpression", "callee": callee, "arguments": arguments })
}

fn spread(argument: Value) -> Value {
    json!({ "type": "SpreadElement", "argument": argument })
}

fn array(elements: Vec<Value>) -> Value {
    json!({ "type": "ArrayExpression", "elements": elements })
}

fn function(name: &str, params: &[&str], body: Vec<Value>) -> Value {
    let params: Vec<Value> = params.iter().map(|p| id(p)).collect();
    json!({
        "type": "FunctionDeclaration",
        "id": id(name),
        "params": params,
        "body": block(body),
        "generator": false,
        "async": false,
    })
}

fn arrow(params: &[&str], body: Value) -> Value {
    let params: Vec<Value> = params.iter().map(|p| id(p)).collect();
    json!({ "type": "ArrowFunctionExpression", "params": params, "body": body, "async": false })
}

fn for_let(name: &str, limit: f64, body: Value) -> Value {
    json!({
        "type": "ForStatement",
        "init": let_(name, num(0.0)),
        "test": binary("<", id(name), num(limit)),
        "update": { "type": "UpdateExpression", "operator": "++", "prefix": false, "argument": id(name) },
        "body": body,
    })
}

// ============================================================================
// IR inspection
// ============================================================================

fn function_named<'a>(module: &'a IrModule, name: &str) -> &'a IrFunction {
    module
        .functions()
        .iter()
        .find(|f| f.name() == name)
        .unwrap_or_else(|| panic!("no function named {name}"))
}

fn insts(function: &IrFunction) -> Vec<&Inst> {
    function
        .blocks()
        .iter()
        .flat_map(|b| b.insts().iter().map(|&id| &function[id]))
        .collect()
}

fn count(function: &IrFunction, pred: impl Fn(&Inst) -> bool) -> usize {
    insts(function).into_iter().filter(|i| pred(i)).count()
}

/// Instruction ids in block order.
fn inst_ids(function: &IrFunction) -> Vec<InstId> {
    function.blocks().iter().flat_map(|b| b.insts().iter().copied()).collect()
}

fn position(function: &IrFunction, inst: InstId) -> usize {
    inst_ids(function)
        .iter()
        .position(|&id| id == inst)
        .unwrap_or_else(|| panic!("{inst:?} is not placed"))
}

fn find_all(function: &IrFunction, pred: impl Fn(&Inst) -> bool) -> Vec<InstId> {
    inst_ids(function).into_iter().filter(|&id| pred(&function[id])).collect()
}

fn array_elements(function: &IrFunction, inst: InstId) -> Vec<InstId> {
    match &function[inst] {
        Inst::Array { elements } => elements.clone(),
        other => panic!("expected an array literal, got {other:?}"),
    }
}

fn is_key(function: &IrFunction, inst: InstId, name: &str) -> bool {
    matches!(&function[inst], Inst::GetItem { key, .. } if function[*key] == Inst::String(name.to_string()))
}

// ============================================================================
// Programs
// ============================================================================

#[test]
fn test_compile_empty_program() {
    let module = compile_ok(vec![]);
    assert_eq!(module.functions().len(), 1);
    let main = function_named(&module, "#main");
    assert_eq!(main.param_count(), 0);
    assert!(matches!(insts(main).last(), Some(Inst::Return { .. })));
}

#[test]
fn test_text_dump_of_let_declaration() {
    let module = compile_ok(vec![let_("a", num(1.0))]);
    let expected = "\
module \"test.js\"

function #0 \"#main\" (params: 0)
  blk_0:
    $0 = alloca
    $1 = number 1
    store $0 $1
    $2 = undefined
    return $2
";
    assert_eq!(module.to_string(), expected);
}

#[test]
fn test_unbound_identifier_is_a_global_address() {
    let module = compile_ok(vec![stmt(id("console"))]);
    let main = function_named(&module, "#main");
    let all = insts(main);
    assert!(matches!(all[0], Inst::GetGlobal { name } if name == "console"));
    assert!(matches!(all[1], Inst::Load { .. }));
}

#[test]
fn test_var_is_rejected() {
    let err = compile_body(vec![declare("var", id("x"), Some(num(1.0)))]).unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
    assert_eq!(err.category(), crate::ErrorCategory::Unsupported);
}

// ============================================================================
// Scoping
// ============================================================================

#[test]
fn test_function_captures_outer_binding() {
    let module = compile_ok(vec![
        let_("x", num(1.0)),
        function("f", &[], vec![ret(id("x"))]),
    ]);
    let main = function_named(&module, "#main");
    let f = function_named(&module, "f");

    let closure = insts(main)
        .into_iter()
        .find_map(|inst| match inst {
            Inst::Func { func, captured } => Some((*func, captured.clone())),
            _ => None,
        })
        .expect("closure creation");
    assert_eq!(closure.0, f.id());
    assert_eq!(closure.1.len(), 1);
    assert!(matches!(main[closure.1[0]], Inst::Alloca));
    assert_eq!(count(f, |i| matches!(i, Inst::Capture { index: 0 })), 1);
}

#[test]
fn test_parameters_resolve_to_arguments() {
    let module = compile_ok(vec![function("add", &["a", "b"], vec![ret(binary("+", id("a"), id("b")))])]);
    let add = function_named(&module, "add");
    assert_eq!(add.param_count(), 2);
    assert_eq!(count(add, |i| matches!(i, Inst::Arg { .. })), 2);
    assert_eq!(count(add, |i| matches!(i, Inst::Capture { .. })), 0);
}

#[test]
fn test_block_shadowing_uses_inner_slot() {
    let module = compile_ok(vec![
        let_("x", num(1.0)),
        block(vec![let_("x", num(2.0)), stmt(id("x"))]),
    ]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::Alloca)), 2);
    assert_eq!(count(main, |i| matches!(i, Inst::PushScope { size: 1, captured } if captured.is_empty())), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::PopScope { count: 1 })), 1);
}

#[test]
fn test_block_captures_outer_binding_in_entry() {
    let module = compile_ok(vec![let_("x", num(1.0)), block(vec![stmt(id("x"))])]);
    let main = function_named(&module, "#main");
    let push = insts(main)
        .into_iter()
        .find_map(|inst| match inst {
            Inst::PushScope { size, captured } => Some((*size, captured.clone())),
            _ => None,
        })
        .expect("push_scope");
    assert_eq!(push.0, 0);
    assert_eq!(push.1.len(), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::Capture { index: 0 })), 1);
}

#[test]
fn test_redeclaration_is_rejected() {
    let err = compile_body(vec![let_("a", num(1.0)), let_("a", num(2.0))]).unwrap_err();
    assert!(matches!(err, Error::Redeclaration(ref name) if name == "a"));
}

#[test]
fn test_use_before_declaration_is_rejected() {
    let err = compile_body(vec![stmt(id("x")), let_("x", num(1.0))]).unwrap_err();
    assert!(matches!(err, Error::Undefined(ref name) if name == "x"));
}

#[test]
fn test_hoisted_function_sees_later_binding() {
    let module = compile_ok(vec![
        function("f", &[], vec![ret(id("y"))]),
        let_("y", num(1.0)),
    ]);
    let f = function_named(&module, "f");
    assert_eq!(count(f, |i| matches!(i, Inst::Capture { index: 0 })), 1);
}

#[test]
fn test_block_closure_may_reference_later_outer_let() {
    let module = compile_ok(vec![
        block(vec![stmt(assign("=", id("g"), arrow(&[], id("y"))))]),
        let_("y", num(1.0)),
    ]);
    let main = function_named(&module, "#main");
    let all = inst_ids(main);

    // `y` is forward-declared in the entry block before anything else runs
    let slot = all[0];
    assert_eq!(main[slot], Inst::Alloca);

    let pushes = find_all(main, |i| matches!(i, Inst::PushScope { .. }));
    assert_eq!(pushes.len(), 1);
    assert!(matches!(&main[pushes[0]], Inst::PushScope { size: 0, captured } if captured == &vec![slot]));

    let arrows = find_all(main, |i| matches!(i, Inst::Arrow { .. }));
    assert_eq!(arrows.len(), 1);
    let Inst::Arrow { captured, .. } = &main[arrows[0]] else {
        unreachable!()
    };
    assert_eq!(captured.len(), 1);
    assert_eq!(main[captured[0]], Inst::Capture { index: 0 });

    let init = find_all(main, |i| matches!(i, Inst::Store { addr, .. } if *addr == slot));
    assert_eq!(init.len(), 1);
    let Inst::Store { value, .. } = &main[init[0]] else {
        unreachable!()
    };
    assert_eq!(main[*value], Inst::Number(1.0));
    assert!(position(main, init[0]) > position(main, arrows[0]));
}

#[test]
fn test_const_assignment_is_rejected() {
    let err = compile_body(vec![const_("c", num(1.0)), stmt(assign("=", id("c"), num(2.0)))]).unwrap_err();
    assert!(matches!(err, Error::ConstAssignment(ref name) if name == "c"));
}

#[test]
fn test_duplicate_parameter_is_rejected() {
    let err = compile_body(vec![function("f", &["a", "a"], vec![])]).unwrap_err();
    assert!(matches!(err, Error::Redeclaration(_)));
}

// ============================================================================
// Control flow
// ============================================================================

#[test]
fn test_break_outside_loop_is_rejected() {
    let err = compile_body(vec![json!({ "type": "BreakStatement", "label": null })]).unwrap_err();
    assert!(matches!(err, Error::IllegalBreak));
    let err = compile_body(vec![json!({ "type": "ContinueStatement", "label": null })]).unwrap_err();
    assert!(matches!(err, Error::IllegalContinue));
}

#[test]
fn test_labeled_break_is_unsupported() {
    let body = json!({ "type": "BreakStatement", "label": id("outer") });
    let while_loop = json!({ "type": "WhileStatement", "test": json!({"type": "Literal", "value": true}), "body": block(vec![body]) });
    let err = compile_body(vec![while_loop]).unwrap_err();
    assert!(matches!(err, Error::Unsupported { .. }));
}

#[test]
fn test_return_pops_block_scopes() {
    let module = compile_ok(vec![function("f", &[], vec![block(vec![ret(num(1.0))])])]);
    let f = function_named(&module, "f");
    let all = insts(f);
    let position = all
        .iter()
        .position(|i| matches!(i, Inst::Return { value } if matches!(f[*value], Inst::Number(_))))
        .expect("return of the literal");
    assert!(matches!(all[position - 1], Inst::PopScope { count: 1 }));
}

#[test]
fn test_break_pops_to_loop_scope() {
    let while_loop = json!({
        "type": "WhileStatement",
        "test": id("go"),
        "body": block(vec![json!({ "type": "BreakStatement" })]),
    });
    let module = compile_ok(vec![while_loop]);
    let main = function_named(&module, "#main");
    for block in main.blocks() {
        let insts = block.insts();
        if let Some(&last) = insts.last()
            && matches!(main[last], Inst::Jump { .. })
            && insts.len() >= 2
            && matches!(main[insts[insts.len() - 2]], Inst::PopScope { count } if count > 1)
        {
            panic!("break popped more than its body scope");
        }
    }
}

#[test]
fn test_if_else_branches() {
    let stmt_if = json!({
        "type": "IfStatement",
        "test": id("c"),
        "consequent": stmt(num(1.0)),
        "alternate": stmt(num(2.0)),
    });
    let module = compile_ok(vec![stmt_if]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::Branch { .. })), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::Jump { .. })), 2);
}

#[test]
fn test_for_let_gets_a_fresh_binding_per_iteration() {
    let push = call(member(id("fs"), "push"), vec![arrow(&[], id("i"))]);
    let module = compile_ok(vec![for_let("i", 3.0, block(vec![stmt(push)]))]);
    let main = function_named(&module, "#main");
    let arrow_fn = function_named(&module, "<arrow>");
    assert_eq!(count(arrow_fn, |i| matches!(i, Inst::Capture { index: 0 })), 1);

    // the loop slot is the one initialised with 0
    let init = find_all(main, |i| matches!(i, Inst::Store { .. }))
        .into_iter()
        .find(|&id| matches!(&main[id], Inst::Store { value, .. } if main[*value] == Inst::Number(0.0)))
        .expect("loop initialiser");
    let Inst::Store { addr: loop_slot, .. } = main[init] else {
        unreachable!()
    };
    assert_eq!(main[loop_slot], Inst::Alloca);

    // loop scope, iteration scope, body block
    let pushes = find_all(main, |i| matches!(i, Inst::PushScope { .. }));
    assert_eq!(pushes.len(), 3);
    assert!(matches!(&main[pushes[1]], Inst::PushScope { size: 1, captured } if captured == &vec![loop_slot]));
    let Inst::PushScope { captured: body_captured, .. } = &main[pushes[2]] else {
        unreachable!()
    };
    assert_eq!(body_captured.len(), 1);
    let copy = body_captured[0];
    assert_eq!(main[copy], Inst::Alloca);
    assert_ne!(copy, loop_slot);

    let arrows = find_all(main, |i| matches!(i, Inst::Arrow { .. }));
    assert_eq!(arrows.len(), 1);
    let Inst::Arrow { captured, .. } = &main[arrows[0]] else {
        unreachable!()
    };
    assert_eq!(captured.len(), 1);
    assert_eq!(main[captured[0]], Inst::Capture { index: 0 });

    // iteration end copies the binding back, leaves the frame, then updates
    let iter_end = main
        .blocks()
        .iter()
        .find(|b| {
            b.insts().windows(2).any(|pair| {
                main[pair[0]] == Inst::Load { addr: copy }
                    && matches!(&main[pair[1]], Inst::Store { addr, value }
                        if *value == pair[0] && main[*addr] == Inst::Capture { index: 0 })
            })
        })
        .expect("copy-back block");
    let tail = &iter_end.insts()[iter_end.insts().len() - 2..];
    assert_eq!(main[tail[0]], Inst::PopScope { count: 1 });
    let Inst::Jump { target: update } = main[tail[1]] else {
        panic!("iteration end must jump to the update");
    };
    assert!(
        main[update]
            .insts()
            .iter()
            .any(|&id| matches!(main[id], Inst::Binary { op: BinaryOp::Add, .. }))
    );
}

#[test]
fn test_for_in_and_for_of() {
    let for_of = json!({
        "type": "ForOfStatement",
        "left": declare("const", id("x"), None),
        "right": id("xs"),
        "body": stmt(id("x")),
        "await": false,
    });
    let for_in = json!({
        "type": "ForInStatement",
        "left": declare("let", id("k"), None),
        "right": id("o"),
        "body": stmt(id("k")),
    });
    let module = compile_ok(vec![for_of, for_in]);
    let text = module.to_string();
    assert!(text.contains("string \"iterator\""));
    assert!(text.contains("string \"done\""));
    assert!(text.contains("string \"keys\""));
    let main = function_named(&module, "#main");
    assert!(count(main, |i| matches!(i, Inst::Phi { .. })) >= 1);
}

#[test]
fn test_for_await_is_unsupported() {
    let for_of = json!({
        "type": "ForOfStatement",
        "left": declare("const", id("x"), None),
        "right": id("xs"),
        "body": block(vec![]),
        "await": true,
    });
    assert!(matches!(compile_body(vec![for_of]), Err(Error::Unsupported { .. })));
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_logical_or_merges_with_phi() {
    let module = compile_ok(vec![stmt(logical("||", id("a"), id("b")))]);
    let main = function_named(&module, "#main");
    let phi = insts(main)
        .into_iter()
        .find_map(|inst| match inst {
            Inst::Phi { incoming } => Some(incoming.clone()),
            _ => None,
        })
        .expect("phi");
    assert_eq!(phi.len(), 2);
    assert_ne!(phi[0].0, phi[1].0);
}

#[test]
fn test_nullish_coalescing_compares_with_null() {
    let module = compile_ok(vec![stmt(logical("??", id("a"), num(0.0)))]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::Binary { op: BinaryOp::Eq, .. })), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::Phi { .. })), 1);
}

#[test]
fn test_conditional_joins_both_arms() {
    let ternary = json!({ "type": "ConditionalExpression", "test": id("c"), "consequent": num(1.0), "alternate": num(2.0) });
    let module = compile_ok(vec![stmt(ternary)]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::Jump { .. })), 2);
    assert_eq!(count(main, |i| matches!(i, Inst::Phi { incoming } if incoming.len() == 2)), 1);
}

#[test]
fn test_array_spread_concatenates_segments() {
    let module = compile_ok(vec![stmt(array(vec![num(1.0), spread(id("xs")), num(2.0), num(3.0)]))]);
    let main = function_named(&module, "#main");
    let calls = find_all(main, |i| matches!(i, Inst::Call { .. }));
    assert_eq!(calls.len(), 2);

    // Array.from(xs)
    let from_call = calls[0];
    let Inst::Call { callee, args, .. } = main[from_call] else {
        unreachable!()
    };
    assert!(is_key(main, callee, "from"));
    let from_args = array_elements(main, args);
    assert_eq!(from_args.len(), 1);
    assert!(matches!(main[from_args[0]], Inst::Load { addr }
        if main[addr] == Inst::GetGlobal { name: "xs".to_string() }));

    // [1].concat(Array.from(xs), [2, 3])
    let Inst::Call { callee, this, args } = main[calls[1]] else {
        unreachable!()
    };
    assert!(is_key(main, callee, "concat"));
    let first = array_elements(main, this);
    assert_eq!(first.len(), 1);
    assert_eq!(main[first[0]], Inst::Number(1.0));
    let rest = array_elements(main, args);
    assert_eq!(rest.len(), 2);
    assert_eq!(rest[0], from_call);
    let second: Vec<&Inst> = array_elements(main, rest[1]).iter().map(|&e| &main[e]).collect();
    assert_eq!(second, [&Inst::Number(2.0), &Inst::Number(3.0)]);

    // segments are evaluated left to right
    assert!(position(main, this) < position(main, from_args[0]));
    assert!(position(main, from_call) < position(main, rest[1]));
    assert_eq!(count(main, |i| matches!(i, Inst::Array { .. })), 4);
}

#[test]
fn test_single_spread_needs_no_concat() {
    let module = compile_ok(vec![stmt(array(vec![spread(id("xs"))]))]);
    let text = module.to_string();
    assert!(text.contains("string \"from\""));
    assert!(!text.contains("concat"));
}

#[test]
fn test_array_holes_are_undefined() {
    let module = compile_ok(vec![stmt(array(vec![Value::Null, num(1.0)]))]);
    let main = function_named(&module, "#main");
    let elements = insts(main)
        .into_iter()
        .find_map(|inst| match inst {
            Inst::Array { elements } => Some(elements.clone()),
            _ => None,
        })
        .expect("array");
    assert!(matches!(main[elements[0]], Inst::Undefined));
}

#[test]
fn test_method_call_passes_object_as_this() {
    let module = compile_ok(vec![stmt(call(member(id("console"), "log"), vec![str_lit("hi")]))]);
    let main = function_named(&module, "#main");
    let (this, object) = insts(main)
        .into_iter()
        .find_map(|inst| match inst {
            Inst::Call { this, .. } => Some(*this),
            _ => None,
        })
        .map(|this| {
            let object = insts(main)
                .into_iter()
                .find_map(|inst| match inst {
                    Inst::GetItem { object, .. } => Some(*object),
                    _ => None,
                })
                .expect("get_item");
            (this, object)
        })
        .expect("call");
    assert_eq!(this, object);
}

#[test]
fn test_plain_call_passes_undefined_this() {
    let module = compile_ok(vec![stmt(call(id("f"), vec![]))]);
    let main = function_named(&module, "#main");
    let this = insts(main)
        .into_iter()
        .find_map(|inst| match inst {
            Inst::Call { this, .. } => Some(*this),
            _ => None,
        })
        .expect("call");
    assert!(matches!(main[this], Inst::Undefined));
}

#[test]
fn test_exponent_calls_math_pow() {
    let module = compile_ok(vec![stmt(binary("**", num(2.0), num(3.0)))]);
    let text = module.to_string();
    assert!(text.contains("get_global \"Math\""));
    assert!(text.contains("string \"pow\""));
}

#[test]
fn test_unary_operators() {
    let unary = |op: &str| json!({ "type": "UnaryExpression", "operator": op, "prefix": true, "argument": id("x") });
    let module = compile_ok(vec![
        stmt(unary("-")),
        stmt(unary("!")),
        stmt(unary("~")),
        stmt(unary("typeof")),
        stmt(unary("+")),
    ]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::Unary { op: UnaryOp::Neg, .. })), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::Unary { op: UnaryOp::Not, .. })), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::Unary { op: UnaryOp::BitNot, .. })), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::Unary { op: UnaryOp::TypeOf, .. })), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::Binary { op: BinaryOp::Sub, .. })), 1);
}

#[test]
fn test_delete_member() {
    let delete = json!({ "type": "UnaryExpression", "operator": "delete", "prefix": true, "argument": member(id("o"), "p") });
    let module = compile_ok(vec![stmt(delete)]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::DelItem { .. })), 1);

    let delete = json!({ "type": "UnaryExpression", "operator": "delete", "prefix": true, "argument": id("o") });
    assert!(matches!(compile_body(vec![stmt(delete)]), Err(Error::Unsupported { .. })));
}

#[test]
fn test_postfix_update_yields_old_value() {
    let update = json!({ "type": "UpdateExpression", "operator": "++", "prefix": false, "argument": id("n") });
    let module = compile_ok(vec![let_("n", num(0.0)), stmt(update)]);
    let main = function_named(&module, "#main");
    let moved = insts(main)
        .into_iter()
        .find_map(|inst| match inst {
            Inst::Move { value } => Some(*value),
            _ => None,
        })
        .expect("move");
    assert!(matches!(main[moved], Inst::Load { .. }));
}

#[test]
fn test_compound_member_assignment() {
    let module = compile_ok(vec![stmt(assign("+=", member(id("o"), "n"), num(1.0)))]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::GetItem { .. })), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::SetItem { .. })), 1);
    assert_eq!(count(main, |i| matches!(i, Inst::Binary { op: BinaryOp::Add, .. })), 1);
}

#[test]
fn test_template_literal_concatenates() {
    let template = json!({
        "type": "TemplateLiteral",
        "quasis": [
            { "type": "TemplateElement", "value": { "raw": "a", "cooked": "a" }, "tail": false },
            { "type": "TemplateElement", "value": { "raw": "b", "cooked": "b" }, "tail": true },
        ],
        "expressions": [id("x")],
    });
    let module = compile_ok(vec![stmt(template)]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::Binary { op: BinaryOp::Add, .. })), 2);
}

#[test]
fn test_object_literal() {
    let object = json!({
        "type": "ObjectExpression",
        "properties": [{
            "type": "Property", "key": id("a"), "value": num(1.0), "kind": "init",
            "method": false, "shorthand": false, "computed": false,
        }],
    });
    let module = compile_ok(vec![stmt(object)]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::Object { props } if props.len() == 1)), 1);
}

// ============================================================================
// Functions and patterns
// ============================================================================

#[test]
fn test_rest_parameter_slices_arguments() {
    let rest = json!({ "type": "RestElement", "argument": id("rest") });
    let f = json!({
        "type": "FunctionDeclaration",
        "id": id("f"),
        "params": [id("a"), rest],
        "body": block(vec![ret(id("rest"))]),
    });
    let module = compile_ok(vec![f]);
    let f = function_named(&module, "f");
    assert_eq!(f.param_count(), 1);
    assert!(f.to_string().contains("string \"slice\""));
}

#[test]
fn test_arrow_expression_body_returns_value() {
    let module = compile_ok(vec![stmt(arrow(&["v"], binary("*", id("v"), num(2.0))))]);
    let arrow_fn = function_named(&module, "<arrow>");
    assert_eq!(count(arrow_fn, |i| matches!(i, Inst::Arguments)), 0);
    assert!(matches!(insts(arrow_fn).last(), Some(Inst::Return { .. })));
}

#[test]
fn test_destructuring_declarations() {
    let object_pattern = json!({
        "type": "ObjectPattern",
        "properties": [
            { "type": "Property", "key": id("a"), "value": id("a"), "computed": false },
            { "type": "Property", "key": id("b"), "value": id("c"), "computed": false },
        ],
    });
    let array_pattern = json!({
        "type": "ArrayPattern",
        "elements": [id("x"), null, { "type": "AssignmentPattern", "left": id("y"), "right": num(1.0) }],
    });
    let module = compile_ok(vec![
        declare("const", object_pattern, Some(id("o"))),
        declare("let", array_pattern, Some(id("arr"))),
        stmt(binary("+", id("c"), id("y"))),
    ]);
    let main = function_named(&module, "#main");
    assert_eq!(count(main, |i| matches!(i, Inst::GetItem { .. })), 4);
    assert_eq!(count(main, |i| matches!(i, Inst::Phi { .. })), 1);
}

#[test]
fn test_unsupported_constructs() {
    let cases = vec![
        json!({ "type": "ClassDeclaration", "id": id("C") }),
        json!({ "type": "TryStatement" }),
        json!({ "type": "SwitchStatement" }),
        json!({ "type": "ThrowStatement" }),
        stmt(json!({ "type": "YieldExpression" })),
        stmt(call(id("f"), vec![spread(id("xs"))])),
        stmt(json!({ "type": "Literal", "value": null, "bigint": "1" })),
        json!({
            "type": "FunctionDeclaration", "id": id("g"), "params": [],
            "body": block(vec![]), "generator": true,
        }),
    ];
    for case in cases {
        let err = compile_body(vec![case.clone()]).unwrap_err();
        assert!(matches!(err, Error::Unsupported { .. }), "{case}: {err}");
    }
}

#[test]
fn test_function_ids_continue_across_modules() {
    let ids = FunctionIds::new();
    let first = compile(&program(vec![function("f", &[], vec![])]), "a.js", &ids).unwrap();
    let second = compile(&program(vec![]), "b.js", &ids).unwrap();
    let mut all: Vec<FuncId> = first.functions().iter().map(|f| f.id()).collect();
    all.extend(second.functions().iter().map(|f| f.id()));
    assert_eq!(all.len(), 3);
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 3);
}
