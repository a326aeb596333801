//! Abstract Syntax Tree (AST) definitions for JavaScript.
//!
//! These structures mirror ESTree and deserialize directly from the JSON
//! that ESTree parsers emit (node kind in the `type` field, positions in
//! `loc`). Every node kind the parsers can produce has a variant, so the
//! compiler matches them exhaustively; kinds the compiler never lowers
//! carry only their location.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Locations
// ============================================================================

/// A line/column position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    /// 1-based line
    pub line: u32,
    /// 0-based column
    pub column: u32,
}

/// A source range attached to a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Start of the node
    pub start: Position,
    /// End of the node
    pub end: Position,
    /// Source file name, if the parser recorded one
    #[serde(default)]
    pub source: Option<String>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(source) = &self.source {
            write!(f, "{source}:")?;
        }
        write!(f, "{}:{}", self.start.line, self.start.column)
    }
}

/// A node the compiler recognizes but never lowers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpaqueNode {
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

// ============================================================================
// Program and statements
// ============================================================================

/// A complete JavaScript program.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Program {
    /// The statements in the program
    pub body: Vec<Statement>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// An identifier.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Identifier {
    /// The name of the identifier
    pub name: String,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A JavaScript statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    /// Variable declaration (var, let, const)
    VariableDeclaration(VariableDeclaration),
    /// Function declaration
    FunctionDeclaration(Function),
    /// Class declaration
    ClassDeclaration(OpaqueNode),
    /// Expression statement
    #[serde(rename = "ExpressionStatement")]
    Expression(ExpressionStatement),
    /// Block statement { ... }
    #[serde(rename = "BlockStatement")]
    Block(BlockStatement),
    /// Empty statement (;)
    #[serde(rename = "EmptyStatement")]
    Empty(OpaqueNode),
    /// Debugger statement
    #[serde(rename = "DebuggerStatement")]
    Debugger(OpaqueNode),
    /// With statement
    #[serde(rename = "WithStatement")]
    With(OpaqueNode),
    /// Return statement
    #[serde(rename = "ReturnStatement")]
    Return(ReturnStatement),
    /// Labeled statement
    #[serde(rename = "LabeledStatement")]
    Labeled(OpaqueNode),
    /// Break statement
    #[serde(rename = "BreakStatement")]
    Break(JumpStatement),
    /// Continue statement
    #[serde(rename = "ContinueStatement")]
    Continue(JumpStatement),
    /// If statement
    #[serde(rename = "IfStatement")]
    If(IfStatement),
    /// Switch statement
    #[serde(rename = "SwitchStatement")]
    Switch(OpaqueNode),
    /// Throw statement
    #[serde(rename = "ThrowStatement")]
    Throw(OpaqueNode),
    /// Try statement
    #[serde(rename = "TryStatement")]
    Try(OpaqueNode),
    /// While statement
    #[serde(rename = "WhileStatement")]
    While(WhileStatement),
    /// Do-while statement
    #[serde(rename = "DoWhileStatement")]
    DoWhile(WhileStatement),
    /// For statement
    #[serde(rename = "ForStatement")]
    For(ForStatement),
    /// For-in statement
    #[serde(rename = "ForInStatement")]
    ForIn(ForEachStatement),
    /// For-of statement
    #[serde(rename = "ForOfStatement")]
    ForOf(ForEachStatement),
    /// `import ... from ...`
    ImportDeclaration(OpaqueNode),
    /// `export { ... }` or `export <declaration>`
    ExportNamedDeclaration(OpaqueNode),
    /// `export default ...`
    ExportDefaultDeclaration(OpaqueNode),
    /// `export * from ...`
    ExportAllDeclaration(OpaqueNode),
}

impl Statement {
    /// The ESTree node type name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Statement::VariableDeclaration(_) => "VariableDeclaration",
            Statement::FunctionDeclaration(_) => "FunctionDeclaration",
            Statement::ClassDeclaration(_) => "ClassDeclaration",
            Statement::Expression(_) => "ExpressionStatement",
            Statement::Block(_) => "BlockStatement",
            Statement::Empty(_) => "EmptyStatement",
            Statement::Debugger(_) => "DebuggerStatement",
            Statement::With(_) => "WithStatement",
            Statement::Return(_) => "ReturnStatement",
            Statement::Labeled(_) => "LabeledStatement",
            Statement::Break(_) => "BreakStatement",
            Statement::Continue(_) => "ContinueStatement",
            Statement::If(_) => "IfStatement",
            Statement::Switch(_) => "SwitchStatement",
            Statement::Throw(_) => "ThrowStatement",
            Statement::Try(_) => "TryStatement",
            Statement::While(_) => "WhileStatement",
            Statement::DoWhile(_) => "DoWhileStatement",
            Statement::For(_) => "ForStatement",
            Statement::ForIn(_) => "ForInStatement",
            Statement::ForOf(_) => "ForOfStatement",
            Statement::ImportDeclaration(_) => "ImportDeclaration",
            Statement::ExportNamedDeclaration(_) => "ExportNamedDeclaration",
            Statement::ExportDefaultDeclaration(_) => "ExportDefaultDeclaration",
            Statement::ExportAllDeclaration(_) => "ExportAllDeclaration",
        }
    }
}

/// Variable declaration kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// var declaration
    Var,
    /// let declaration
    Let,
    /// const declaration
    Const,
}

/// A variable declaration statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableDeclaration {
    /// The kind of declaration
    pub kind: VariableKind,
    /// The declarators
    pub declarations: Vec<VariableDeclarator>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A single variable declarator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VariableDeclarator {
    /// The binding target
    pub id: Pattern,
    /// Optional initializer expression
    #[serde(default)]
    pub init: Option<Expression>,
}

/// A function declaration or function expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Function {
    /// The function name (absent for anonymous expressions)
    #[serde(default)]
    pub id: Option<Identifier>,
    /// The parameters
    pub params: Vec<Pattern>,
    /// The function body
    pub body: BlockStatement,
    /// Whether this is a generator function
    #[serde(default)]
    pub generator: bool,
    /// Whether this is an async function
    #[serde(default, rename = "async")]
    pub is_async: bool,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// An arrow function expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrowFunction {
    /// The parameters
    pub params: Vec<Pattern>,
    /// Block or expression body
    pub body: ArrowBody,
    /// Whether this is an async arrow
    #[serde(default, rename = "async")]
    pub is_async: bool,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// Body of an arrow function.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ArrowBody {
    /// `() => { ... }`
    Block(BlockStatement),
    /// `() => expr`
    Expression(Box<Expression>),
}

/// An expression statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExpressionStatement {
    /// The expression
    pub expression: Expression,
}

/// A block statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlockStatement {
    /// The statements in the block
    pub body: Vec<Statement>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A return statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ReturnStatement {
    /// The return value
    #[serde(default)]
    pub argument: Option<Expression>,
}

/// A break or continue statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JumpStatement {
    /// Target label
    #[serde(default)]
    pub label: Option<Identifier>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// An if statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct IfStatement {
    /// The condition
    pub test: Expression,
    /// The consequent
    pub consequent: Box<Statement>,
    /// The alternate (else branch)
    #[serde(default)]
    pub alternate: Option<Box<Statement>>,
}

/// A while or do-while statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WhileStatement {
    /// The condition
    pub test: Expression,
    /// The body
    pub body: Box<Statement>,
}

/// A for statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForStatement {
    /// Initializer
    #[serde(default)]
    pub init: Option<ForInit>,
    /// Condition
    #[serde(default)]
    pub test: Option<Expression>,
    /// Update expression
    #[serde(default)]
    pub update: Option<Expression>,
    /// The body
    pub body: Box<Statement>,
}

/// For loop initializer.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ForInit {
    /// `for (let i = 0; ...)`
    Declaration(VariableDeclaration),
    /// `for (i = 0; ...)`
    Expression(Expression),
}

/// A for-in or for-of statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ForEachStatement {
    /// The loop binding
    pub left: ForEachLeft,
    /// The object or iterable
    pub right: Expression,
    /// The body
    pub body: Box<Statement>,
    /// `for await (...)`
    #[serde(default, rename = "await")]
    pub is_await: bool,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// Left-hand side of a for-in or for-of statement.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ForEachLeft {
    /// `for (let x of ...)`
    VariableDeclaration(VariableDeclaration),
    /// `for (x of ...)`
    Identifier(Identifier),
    /// `for (o.x of ...)`
    MemberExpression(MemberExpression),
    /// `for ([a, b] of ...)`
    ArrayPattern(OpaqueNode),
    /// `for ({a} of ...)`
    ObjectPattern(OpaqueNode),
}

// ============================================================================
// Patterns
// ============================================================================

/// A binding pattern.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Pattern {
    /// Simple identifier
    Identifier(Identifier),
    /// `[a, , b = 1]`
    ArrayPattern(ArrayPattern),
    /// `{a, b: c}`
    ObjectPattern(ObjectPattern),
    /// `a = default`
    AssignmentPattern(AssignmentPattern),
    /// `...rest`
    RestElement(RestElement),
    /// Member target, only valid in assignment positions
    MemberExpression(OpaqueNode),
}

impl Pattern {
    /// Appends every identifier this pattern binds, in source order.
    pub fn bound_names<'a>(&'a self, out: &mut Vec<&'a Identifier>) {
        match self {
            Pattern::Identifier(id) => out.push(id),
            Pattern::ArrayPattern(array) => {
                for element in array.elements.iter().flatten() {
                    element.bound_names(out);
                }
            }
            Pattern::ObjectPattern(object) => {
                for property in &object.properties {
                    match property {
                        ObjectPatternMember::Property(p) => p.value.bound_names(out),
                        ObjectPatternMember::RestElement(r) => r.argument.bound_names(out),
                    }
                }
            }
            Pattern::AssignmentPattern(assign) => assign.left.bound_names(out),
            Pattern::RestElement(rest) => rest.argument.bound_names(out),
            Pattern::MemberExpression(_) => {}
        }
    }

    /// The ESTree node type name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Pattern::Identifier(_) => "Identifier",
            Pattern::ArrayPattern(_) => "ArrayPattern",
            Pattern::ObjectPattern(_) => "ObjectPattern",
            Pattern::AssignmentPattern(_) => "AssignmentPattern",
            Pattern::RestElement(_) => "RestElement",
            Pattern::MemberExpression(_) => "MemberExpression",
        }
    }
}

/// An array destructuring pattern.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrayPattern {
    /// Elements; `None` for holes
    pub elements: Vec<Option<Pattern>>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// An object destructuring pattern.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectPattern {
    /// Properties
    pub properties: Vec<ObjectPatternMember>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A member of an object pattern.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectPatternMember {
    /// `key: pattern`
    Property(PatternProperty),
    /// `...rest`
    RestElement(RestElement),
}

/// A `key: value` entry in an object pattern.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatternProperty {
    /// The property key
    pub key: Box<Expression>,
    /// The binding target
    pub value: Box<Pattern>,
    /// Whether the key is computed
    #[serde(default)]
    pub computed: bool,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A pattern with a default value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssignmentPattern {
    /// The binding target
    pub left: Box<Pattern>,
    /// The default value
    pub right: Box<Expression>,
}

/// A rest element.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RestElement {
    /// The binding target
    pub argument: Box<Pattern>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

// ============================================================================
// Expressions
// ============================================================================

/// A JavaScript expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    /// Identifier reference
    Identifier(Identifier),
    /// Literal value
    Literal(Literal),
    /// `this`
    #[serde(rename = "ThisExpression")]
    This(OpaqueNode),
    /// `super`
    Super(OpaqueNode),
    /// Array literal
    #[serde(rename = "ArrayExpression")]
    Array(ArrayExpression),
    /// Object literal
    #[serde(rename = "ObjectExpression")]
    Object(ObjectExpression),
    /// Function expression
    #[serde(rename = "FunctionExpression")]
    Function(Function),
    /// Arrow function
    #[serde(rename = "ArrowFunctionExpression")]
    Arrow(ArrowFunction),
    /// Class expression
    #[serde(rename = "ClassExpression")]
    Class(OpaqueNode),
    /// Unary operation
    #[serde(rename = "UnaryExpression")]
    Unary(UnaryExpression),
    /// `++x` / `x--`
    #[serde(rename = "UpdateExpression")]
    Update(UpdateExpression),
    /// Binary operation
    #[serde(rename = "BinaryExpression")]
    Binary(BinaryExpression),
    /// `&&`, `||`, `??`
    #[serde(rename = "LogicalExpression")]
    Logical(LogicalExpression),
    /// Assignment
    #[serde(rename = "AssignmentExpression")]
    Assignment(AssignmentExpression),
    /// `a ? b : c`
    #[serde(rename = "ConditionalExpression")]
    Conditional(ConditionalExpression),
    /// Function call
    #[serde(rename = "CallExpression")]
    Call(CallExpression),
    /// `new C(...)`
    #[serde(rename = "NewExpression")]
    New(CallExpression),
    /// Property access
    #[serde(rename = "MemberExpression")]
    Member(MemberExpression),
    /// Comma expression
    #[serde(rename = "SequenceExpression")]
    Sequence(SequenceExpression),
    /// Untagged template literal
    TemplateLiteral(TemplateLiteral),
    /// Tagged template
    TaggedTemplateExpression(OpaqueNode),
    /// `...xs` in array literals and argument lists
    #[serde(rename = "SpreadElement")]
    Spread(SpreadElement),
    /// `yield`
    #[serde(rename = "YieldExpression")]
    Yield(OpaqueNode),
    /// `await`
    #[serde(rename = "AwaitExpression")]
    Await(OpaqueNode),
    /// Optional chain `a?.b`
    #[serde(rename = "ChainExpression")]
    Chain(OpaqueNode),
    /// `import(...)`
    #[serde(rename = "ImportExpression")]
    Import(OpaqueNode),
    /// `new.target`, `import.meta`
    MetaProperty(OpaqueNode),
    /// `#name` in `#name in obj`
    PrivateIdentifier(OpaqueNode),
}

impl Expression {
    /// The ESTree node type name, for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expression::Identifier(_) => "Identifier",
            Expression::Literal(_) => "Literal",
            Expression::This(_) => "ThisExpression",
            Expression::Super(_) => "Super",
            Expression::Array(_) => "ArrayExpression",
            Expression::Object(_) => "ObjectExpression",
            Expression::Function(_) => "FunctionExpression",
            Expression::Arrow(_) => "ArrowFunctionExpression",
            Expression::Class(_) => "ClassExpression",
            Expression::Unary(_) => "UnaryExpression",
            Expression::Update(_) => "UpdateExpression",
            Expression::Binary(_) => "BinaryExpression",
            Expression::Logical(_) => "LogicalExpression",
            Expression::Assignment(_) => "AssignmentExpression",
            Expression::Conditional(_) => "ConditionalExpression",
            Expression::Call(_) => "CallExpression",
            Expression::New(_) => "NewExpression",
            Expression::Member(_) => "MemberExpression",
            Expression::Sequence(_) => "SequenceExpression",
            Expression::TemplateLiteral(_) => "TemplateLiteral",
            Expression::TaggedTemplateExpression(_) => "TaggedTemplateExpression",
            Expression::Spread(_) => "SpreadElement",
            Expression::Yield(_) => "YieldExpression",
            Expression::Await(_) => "AwaitExpression",
            Expression::Chain(_) => "ChainExpression",
            Expression::Import(_) => "ImportExpression",
            Expression::MetaProperty(_) => "MetaProperty",
            Expression::PrivateIdentifier(_) => "PrivateIdentifier",
        }
    }

    /// The node's source location, when it carries one.
    pub fn loc(&self) -> Option<&SourceLocation> {
        match self {
            Expression::Identifier(n) => n.loc.as_ref(),
            Expression::Literal(n) => n.loc.as_ref(),
            Expression::Function(n) => n.loc.as_ref(),
            Expression::Arrow(n) => n.loc.as_ref(),
            Expression::Object(n) => n.loc.as_ref(),
            Expression::Member(n) => n.loc.as_ref(),
            Expression::Spread(n) => n.loc.as_ref(),
            Expression::This(n)
            | Expression::Super(n)
            | Expression::Class(n)
            | Expression::TaggedTemplateExpression(n)
            | Expression::Yield(n)
            | Expression::Await(n)
            | Expression::Chain(n)
            | Expression::Import(n)
            | Expression::MetaProperty(n)
            | Expression::PrivateIdentifier(n) => n.loc.as_ref(),
            Expression::Array(_)
            | Expression::Unary(_)
            | Expression::Update(_)
            | Expression::Binary(_)
            | Expression::Logical(_)
            | Expression::Assignment(_)
            | Expression::Conditional(_)
            | Expression::Call(_)
            | Expression::New(_)
            | Expression::Sequence(_)
            | Expression::TemplateLiteral(_) => None,
        }
    }
}

/// A literal value.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Literal {
    /// The decoded value
    #[serde(default)]
    pub value: LiteralValue,
    /// Source text of the literal
    #[serde(default)]
    pub raw: Option<String>,
    /// Present for regular expression literals
    #[serde(default)]
    pub regex: Option<RegexLiteral>,
    /// Present for BigInt literals
    #[serde(default)]
    pub bigint: Option<String>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// The JSON form of a literal's value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LiteralValue {
    /// `null` (also how regex values serialize when the parser cannot represent them)
    #[default]
    Null,
    /// Boolean literal
    Boolean(bool),
    /// Number literal
    Number(f64),
    /// String literal
    String(String),
    /// Any other JSON value (regex objects, bigint placeholders)
    Other(serde_json::Value),
}

/// Pattern and flags of a regular expression literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegexLiteral {
    /// The pattern source
    pub pattern: String,
    /// The flags
    pub flags: String,
}

/// An array literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ArrayExpression {
    /// Elements; `None` for holes
    pub elements: Vec<Option<Expression>>,
}

/// An object literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ObjectExpression {
    /// Properties
    pub properties: Vec<ObjectMember>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A member of an object literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum ObjectMember {
    /// `key: value`, shorthand, method or accessor
    Property(Property),
    /// `...obj`
    SpreadElement(SpreadElement),
}

/// Kind of an object literal property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    /// Plain value
    Init,
    /// Getter
    Get,
    /// Setter
    Set,
}

/// A property in an object literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Property {
    /// The property key
    pub key: Box<Expression>,
    /// The property value
    pub value: Box<Expression>,
    /// Init, get or set
    pub kind: PropertyKind,
    /// `{ m() {} }`
    #[serde(default)]
    pub method: bool,
    /// `{ a }`
    #[serde(default)]
    pub shorthand: bool,
    /// `{ [k]: v }`
    #[serde(default)]
    pub computed: bool,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A spread element.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SpreadElement {
    /// The spread operand
    pub argument: Box<Expression>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// Unary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UnaryOperator {
    /// `-`
    #[serde(rename = "-")]
    Minus,
    /// `+`
    #[serde(rename = "+")]
    Plus,
    /// `!`
    #[serde(rename = "!")]
    Not,
    /// `~`
    #[serde(rename = "~")]
    BitwiseNot,
    /// `typeof`
    #[serde(rename = "typeof")]
    Typeof,
    /// `void`
    #[serde(rename = "void")]
    Void,
    /// `delete`
    #[serde(rename = "delete")]
    Delete,
}

/// A unary expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UnaryExpression {
    /// The operator
    pub operator: UnaryOperator,
    /// The operand
    pub argument: Box<Expression>,
}

/// Update operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum UpdateOperator {
    /// `++`
    #[serde(rename = "++")]
    Increment,
    /// `--`
    #[serde(rename = "--")]
    Decrement,
}

/// An update expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UpdateExpression {
    /// The operator
    pub operator: UpdateOperator,
    /// `++x` when true, `x++` when false
    pub prefix: bool,
    /// The target
    pub argument: Box<Expression>,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum BinaryOperator {
    /// `==`
    #[serde(rename = "==")]
    Equal,
    /// `!=`
    #[serde(rename = "!=")]
    NotEqual,
    /// `===`
    #[serde(rename = "===")]
    StrictEqual,
    /// `!==`
    #[serde(rename = "!==")]
    StrictNotEqual,
    /// `<`
    #[serde(rename = "<")]
    LessThan,
    /// `<=`
    #[serde(rename = "<=")]
    LessEqual,
    /// `>`
    #[serde(rename = ">")]
    GreaterThan,
    /// `>=`
    #[serde(rename = ">=")]
    GreaterEqual,
    /// `<<`
    #[serde(rename = "<<")]
    LeftShift,
    /// `>>`
    #[serde(rename = ">>")]
    RightShift,
    /// `>>>`
    #[serde(rename = ">>>")]
    UnsignedRightShift,
    /// `+`
    #[serde(rename = "+")]
    Add,
    /// `-`
    #[serde(rename = "-")]
    Subtract,
    /// `*`
    #[serde(rename = "*")]
    Multiply,
    /// `/`
    #[serde(rename = "/")]
    Divide,
    /// `%`
    #[serde(rename = "%")]
    Modulo,
    /// `**`
    #[serde(rename = "**")]
    Exponent,
    /// `|`
    #[serde(rename = "|")]
    BitwiseOr,
    /// `^`
    #[serde(rename = "^")]
    BitwiseXor,
    /// `&`
    #[serde(rename = "&")]
    BitwiseAnd,
    /// `in`
    #[serde(rename = "in")]
    In,
    /// `instanceof`
    #[serde(rename = "instanceof")]
    Instanceof,
}

/// A binary expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BinaryExpression {
    /// The operator
    pub operator: BinaryOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand
    pub right: Box<Expression>,
}

/// Logical operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum LogicalOperator {
    /// `&&`
    #[serde(rename = "&&")]
    And,
    /// `||`
    #[serde(rename = "||")]
    Or,
    /// `??`
    #[serde(rename = "??")]
    NullishCoalescing,
}

/// A logical expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogicalExpression {
    /// The operator
    pub operator: LogicalOperator,
    /// Left operand
    pub left: Box<Expression>,
    /// Right operand
    pub right: Box<Expression>,
}

/// Assignment operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum AssignmentOperator {
    /// `=`
    #[serde(rename = "=")]
    Assign,
    /// `+=`
    #[serde(rename = "+=")]
    AddAssign,
    /// `-=`
    #[serde(rename = "-=")]
    SubtractAssign,
    /// `*=`
    #[serde(rename = "*=")]
    MultiplyAssign,
    /// `/=`
    #[serde(rename = "/=")]
    DivideAssign,
    /// `%=`
    #[serde(rename = "%=")]
    ModuloAssign,
    /// `**=`
    #[serde(rename = "**=")]
    ExponentAssign,
    /// `<<=`
    #[serde(rename = "<<=")]
    LeftShiftAssign,
    /// `>>=`
    #[serde(rename = ">>=")]
    RightShiftAssign,
    /// `>>>=`
    #[serde(rename = ">>>=")]
    UnsignedRightShiftAssign,
    /// `|=`
    #[serde(rename = "|=")]
    BitwiseOrAssign,
    /// `^=`
    #[serde(rename = "^=")]
    BitwiseXorAssign,
    /// `&=`
    #[serde(rename = "&=")]
    BitwiseAndAssign,
    /// `||=`
    #[serde(rename = "||=")]
    OrAssign,
    /// `&&=`
    #[serde(rename = "&&=")]
    AndAssign,
    /// `??=`
    #[serde(rename = "??=")]
    NullishAssign,
}

impl AssignmentOperator {
    /// The binary operator a compound assignment applies, `None` for `=`
    /// and the logical assignments.
    pub fn binary_operator(self) -> Option<BinaryOperator> {
        use AssignmentOperator::*;
        Some(match self {
            AddAssign => BinaryOperator::Add,
            SubtractAssign => BinaryOperator::Subtract,
            MultiplyAssign => BinaryOperator::Multiply,
            DivideAssign => BinaryOperator::Divide,
            ModuloAssign => BinaryOperator::Modulo,
            ExponentAssign => BinaryOperator::Exponent,
            LeftShiftAssign => BinaryOperator::LeftShift,
            RightShiftAssign => BinaryOperator::RightShift,
            UnsignedRightShiftAssign => BinaryOperator::UnsignedRightShift,
            BitwiseOrAssign => BinaryOperator::BitwiseOr,
            BitwiseXorAssign => BinaryOperator::BitwiseXor,
            BitwiseAndAssign => BinaryOperator::BitwiseAnd,
            Assign | OrAssign | AndAssign | NullishAssign => return None,
        })
    }
}

/// Target of an assignment expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum AssignmentTarget {
    /// `x = ...`
    Identifier(Identifier),
    /// `o.x = ...`
    MemberExpression(MemberExpression),
    /// `[a, b] = ...`
    ArrayPattern(OpaqueNode),
    /// `({a} = ...)`
    ObjectPattern(OpaqueNode),
}

/// An assignment expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct AssignmentExpression {
    /// The operator
    pub operator: AssignmentOperator,
    /// The target
    pub left: Box<AssignmentTarget>,
    /// The value
    pub right: Box<Expression>,
}

/// A conditional (ternary) expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConditionalExpression {
    /// The condition
    pub test: Box<Expression>,
    /// Value when truthy
    pub consequent: Box<Expression>,
    /// Value when falsy
    pub alternate: Box<Expression>,
}

/// A call or `new` expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CallExpression {
    /// The callee
    pub callee: Box<Expression>,
    /// The arguments
    pub arguments: Vec<Expression>,
}

/// A member expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MemberExpression {
    /// The object
    pub object: Box<Expression>,
    /// The property
    pub property: Box<Expression>,
    /// `o[k]` when true, `o.k` when false
    pub computed: bool,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A sequence (comma) expression.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SequenceExpression {
    /// The expressions, evaluated left to right
    pub expressions: Vec<Expression>,
}

/// A template literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateLiteral {
    /// Static string parts; always one more than `expressions`
    pub quasis: Vec<TemplateElement>,
    /// Interpolated expressions
    pub expressions: Vec<Expression>,
    /// Source location
    #[serde(default)]
    pub loc: Option<SourceLocation>,
}

/// A static part of a template literal.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateElement {
    /// Raw and cooked text
    pub value: TemplateValue,
}

/// Text of a template element.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TemplateValue {
    /// Source text
    pub raw: String,
    /// Escape-processed text; `None` for invalid escapes
    #[serde(default)]
    pub cooked: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_let_declaration() {
        let program: Program = serde_json::from_value(json!({
            "type": "Program",
            "body": [{
                "type": "VariableDeclaration",
                "kind": "let",
                "declarations": [{
                    "type": "VariableDeclarator",
                    "id": { "type": "Identifier", "name": "x" },
                    "init": { "type": "Literal", "value": 1, "raw": "1" }
                }]
            }]
        }))
        .unwrap();

        let Statement::VariableDeclaration(decl) = &program.body[0] else {
            panic!("expected a declaration");
        };
        assert_eq!(decl.kind, VariableKind::Let);
        assert!(matches!(
            decl.declarations[0].init,
            Some(Expression::Literal(Literal { value: LiteralValue::Number(n), .. })) if n == 1.0
        ));
    }

    #[test]
    fn test_deserialize_literal_values() {
        let lit = |v: serde_json::Value| -> Literal {
            serde_json::from_value(json!({ "type": "Literal", "value": v })).unwrap()
        };
        assert_eq!(lit(json!(null)).value, LiteralValue::Null);
        assert_eq!(lit(json!(true)).value, LiteralValue::Boolean(true));
        assert_eq!(lit(json!(2.5)).value, LiteralValue::Number(2.5));
        assert_eq!(lit(json!("s")).value, LiteralValue::String("s".into()));

        let regex: Literal = serde_json::from_value(json!({
            "type": "Literal",
            "value": {},
            "regex": { "pattern": "a+", "flags": "g" }
        }))
        .unwrap();
        assert_eq!(regex.regex.unwrap().pattern, "a+");
    }

    #[test]
    fn test_deserialize_arrow_bodies() {
        let block: Expression = serde_json::from_value(json!({
            "type": "ArrowFunctionExpression",
            "params": [],
            "body": { "type": "BlockStatement", "body": [] }
        }))
        .unwrap();
        assert!(matches!(block, Expression::Arrow(ArrowFunction { body: ArrowBody::Block(_), .. })));

        let expr: Expression = serde_json::from_value(json!({
            "type": "ArrowFunctionExpression",
            "params": [{ "type": "Identifier", "name": "a" }],
            "body": { "type": "Identifier", "name": "a" },
            "expression": true
        }))
        .unwrap();
        assert!(matches!(expr, Expression::Arrow(ArrowFunction { body: ArrowBody::Expression(_), .. })));
    }

    #[test]
    fn test_deserialize_for_init_forms() {
        let with_decl: ForStatement = serde_json::from_value(json!({
            "init": {
                "type": "VariableDeclaration",
                "kind": "let",
                "declarations": [{ "type": "VariableDeclarator", "id": { "type": "Identifier", "name": "i" }, "init": null }]
            },
            "test": null,
            "update": null,
            "body": { "type": "EmptyStatement" }
        }))
        .unwrap();
        assert!(matches!(with_decl.init, Some(ForInit::Declaration(_))));

        let with_expr: ForStatement = serde_json::from_value(json!({
            "init": { "type": "Identifier", "name": "i" },
            "body": { "type": "EmptyStatement" }
        }))
        .unwrap();
        assert!(matches!(with_expr.init, Some(ForInit::Expression(Expression::Identifier(_)))));
    }

    #[test]
    fn test_unknown_node_type_is_rejected() {
        let result: Result<Statement, _> =
            serde_json::from_value(json!({ "type": "GotoStatement" }));
        assert!(result.is_err());
    }

    #[test]
    fn test_bound_names_in_source_order() {
        let pattern: Pattern = serde_json::from_value(json!({
            "type": "ArrayPattern",
            "elements": [
                { "type": "Identifier", "name": "a" },
                null,
                {
                    "type": "ObjectPattern",
                    "properties": [{
                        "type": "Property",
                        "key": { "type": "Identifier", "name": "k" },
                        "value": {
                            "type": "AssignmentPattern",
                            "left": { "type": "Identifier", "name": "b" },
                            "right": { "type": "Literal", "value": 0 }
                        },
                        "computed": false
                    }]
                }
            ]
        }))
        .unwrap();
        let mut names = Vec::new();
        pattern.bound_names(&mut names);
        let names: Vec<_> = names.iter().map(|id| id.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
    }

    #[test]
    fn test_location_display() {
        let loc = SourceLocation {
            start: Position { line: 2, column: 7 },
            end: Position { line: 2, column: 9 },
            source: Some("main.js".into()),
        };
        assert_eq!(loc.to_string(), "main.js:2:7");
    }
}
