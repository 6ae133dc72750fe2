//! AST node types for the typed Python (ChocoPy) dialect.
//!
//! Every node carries a [`Span`] named `location`, mirroring the front-end's
//! JSON. Nodes are tagged by a `"kind"` field on the wire; nested nodes that
//! the grammar fixes to one shape (a call's callee, a method call's member
//! access) are plain structs and ignore their redundant tag.
//! Large recursive types are boxed to keep enum sizes reasonable.

use crate::Span;
use serde::{Deserialize, Serialize};
use std::fmt;

// ══════════════════════════════════════════════════════════════════════════════
// Top Level
// ══════════════════════════════════════════════════════════════════════════════

/// A complete program: top-level declarations followed by top-level statements.
///
/// The front-end also ships its diagnostics under `errors`; an interpreted
/// program has already passed type checking, so that field is ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    #[serde(default)]
    pub location: Span,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub statements: Vec<Stmt>,
}

impl Program {
    /// Parse a program from the front-end's JSON encoding.
    ///
    /// Every `elif` and every left-nested operator adds a level of JSON
    /// nesting, so the parser's depth limit is lifted and the parse runs on
    /// a dedicated stack.
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        with_parse_stack(|| {
            let mut de = serde_json::Deserializer::from_str(json);
            de.disable_recursion_limit();
            let program = Program::deserialize(&mut de)?;
            de.end()?;
            Ok(program)
        })
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn with_parse_stack<R>(f: impl FnOnce() -> R) -> R {
    const PARSE_STACK: usize = 256 * 1024 * 1024;
    stacker::grow(PARSE_STACK, f)
}

#[cfg(target_arch = "wasm32")]
fn with_parse_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}

// ══════════════════════════════════════════════════════════════════════════════
// Identifiers & Types
// ══════════════════════════════════════════════════════════════════════════════

/// A spanned identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Identifier {
    pub location: Span,
    pub name: String,
}

impl Identifier {
    pub fn new(name: impl Into<String>, location: Span) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }
}

/// A declared type: `int`, `MyClass`, `[int]`, `[[str]]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum TypeAnnotation {
    ClassType(ClassType),
    ListType(ListType),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassType {
    pub location: Span,
    pub class_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListType {
    pub location: Span,
    pub element_type: Box<TypeAnnotation>,
}

impl TypeAnnotation {
    /// Shorthand for a class type annotation.
    pub fn class(name: impl Into<String>, location: Span) -> Self {
        Self::ClassType(ClassType {
            location,
            class_name: name.into(),
        })
    }

    /// Shorthand for a list type annotation.
    pub fn list(element: TypeAnnotation, location: Span) -> Self {
        Self::ListType(ListType {
            location,
            element_type: Box::new(element),
        })
    }
}

impl fmt::Display for TypeAnnotation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassType(t) => write!(f, "{}", t.class_name),
            Self::ListType(t) => write!(f, "[{}]", t.element_type),
        }
    }
}

/// A type inferred by the checker and attached to expressions as `inferredType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all_fields = "camelCase")]
pub enum ValueType {
    ClassValueType { class_name: String },
    ListValueType { element_type: Box<ValueType> },
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ClassValueType { class_name } => write!(f, "{class_name}"),
            Self::ListValueType { element_type } => write!(f, "[{element_type}]"),
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Declarations
// ══════════════════════════════════════════════════════════════════════════════

/// A declaration at program, class or function level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Declaration {
    VarDef(VarDef),
    FuncDef(FuncDef),
    ClassDef(ClassDef),
    GlobalDecl(GlobalDecl),
    NonLocalDecl(NonLocalDecl),
}

/// `name: type`, used for variables, attributes and parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypedVar {
    pub location: Span,
    pub identifier: Identifier,
    #[serde(rename = "type")]
    pub type_ann: TypeAnnotation,
}

/// `x: int = 5`. The initializer is always a literal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VarDef {
    pub location: Span,
    pub var: TypedVar,
    pub value: Literal,
}

/// `def name(params) -> type: declarations statements`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FuncDef {
    pub location: Span,
    pub name: Identifier,
    #[serde(default)]
    pub params: Vec<TypedVar>,
    #[serde(default)]
    pub return_type: Option<TypeAnnotation>,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
    #[serde(default)]
    pub statements: Vec<Stmt>,
}

/// `class Name(SuperClass): declarations`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDef {
    pub location: Span,
    pub name: Identifier,
    pub super_class: Identifier,
    #[serde(default)]
    pub declarations: Vec<Declaration>,
}

/// `global x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalDecl {
    pub location: Span,
    pub variable: Identifier,
}

/// `nonlocal x`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NonLocalDecl {
    pub location: Span,
    pub variable: Identifier,
}

// ══════════════════════════════════════════════════════════════════════════════
// Statements
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Stmt {
    ExprStmt(ExprStmt),
    AssignStmt(AssignStmt),
    IfStmt(IfStmt),
    WhileStmt(WhileStmt),
    ForStmt(ForStmt),
    ReturnStmt(ReturnStmt),
}

impl Stmt {
    pub fn location(&self) -> Span {
        match self {
            Self::ExprStmt(s) => s.location,
            Self::AssignStmt(s) => s.location,
            Self::IfStmt(s) => s.location,
            Self::WhileStmt(s) => s.location,
            Self::ForStmt(s) => s.location,
            Self::ReturnStmt(s) => s.location,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExprStmt {
    pub location: Span,
    pub expr: Expr,
}

/// `a = b[0] = obj.x = value` — targets are assigned left to right.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignStmt {
    pub location: Span,
    pub targets: Vec<Expr>,
    pub value: Expr,
}

/// `if cond: ... else: ...` (`elif` arrives desugared into a nested else body).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfStmt {
    pub location: Span,
    pub condition: Expr,
    #[serde(default)]
    pub then_body: Vec<Stmt>,
    #[serde(default)]
    pub else_body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WhileStmt {
    pub location: Span,
    pub condition: Expr,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

/// `for identifier in iterable: body`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForStmt {
    pub location: Span,
    pub identifier: Identifier,
    pub iterable: Expr,
    #[serde(default)]
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnStmt {
    pub location: Span,
    #[serde(default)]
    pub value: Option<Expr>,
}

// ══════════════════════════════════════════════════════════════════════════════
// Expressions
// ══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Expr {
    BinaryExpr(BinaryExpr),
    UnaryExpr(UnaryExpr),
    CallExpr(CallExpr),
    MethodCallExpr(MethodCallExpr),
    MemberExpr(MemberExpr),
    IndexExpr(IndexExpr),
    IfExpr(IfExpr),
    ListExpr(ListExpr),
    Identifier(Identifier),
    IntegerLiteral(IntegerLiteral),
    BooleanLiteral(BooleanLiteral),
    StringLiteral(StringLiteral),
    NoneLiteral(NoneLiteral),
}

impl Expr {
    pub fn location(&self) -> Span {
        match self {
            Self::BinaryExpr(e) => e.location,
            Self::UnaryExpr(e) => e.location,
            Self::CallExpr(e) => e.location,
            Self::MethodCallExpr(e) => e.location,
            Self::MemberExpr(e) => e.location,
            Self::IndexExpr(e) => e.location,
            Self::IfExpr(e) => e.location,
            Self::ListExpr(e) => e.location,
            Self::Identifier(e) => e.location,
            Self::IntegerLiteral(e) => e.location,
            Self::BooleanLiteral(e) => e.location,
            Self::StringLiteral(e) => e.location,
            Self::NoneLiteral(e) => e.location,
        }
    }
}

/// Binary operators, serialized as their source spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BinOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "//")]
    FloorDiv,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "<")]
    Less,
    #[serde(rename = ">")]
    Greater,
    #[serde(rename = "<=")]
    LessEq,
    #[serde(rename = ">=")]
    GreaterEq,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    NotEq,
    #[serde(rename = "is")]
    Is,
    #[serde(rename = "and")]
    And,
    #[serde(rename = "or")]
    Or,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::FloorDiv => "//",
            Self::Mod => "%",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEq => "<=",
            Self::GreaterEq => ">=",
            Self::Eq => "==",
            Self::NotEq => "!=",
            Self::Is => "is",
            Self::And => "and",
            Self::Or => "or",
        }
    }
}

impl fmt::Display for BinOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "-")]
    Neg,
    #[serde(rename = "not")]
    Not,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BinaryExpr {
    pub location: Span,
    pub left: Box<Expr>,
    pub operator: BinOp,
    pub right: Box<Expr>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnaryExpr {
    pub location: Span,
    pub operator: UnaryOp,
    pub operand: Box<Expr>,
}

/// `f(args)` — also covers builtins, primitive constructors and class instantiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallExpr {
    pub location: Span,
    pub function: Identifier,
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// `obj.method(args)`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodCallExpr {
    pub location: Span,
    pub method: MemberExpr,
    #[serde(default)]
    pub args: Vec<Expr>,
}

/// `obj.member`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberExpr {
    pub location: Span,
    pub object: Box<Expr>,
    pub member: Identifier,
}

/// `list[index]` (the receiver may also be a string).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexExpr {
    pub location: Span,
    pub list: Box<Expr>,
    pub index: Box<Expr>,
}

/// `then_expr if condition else else_expr`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IfExpr {
    pub location: Span,
    pub condition: Box<Expr>,
    pub then_expr: Box<Expr>,
    pub else_expr: Box<Expr>,
}

/// `[a, b, c]`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListExpr {
    pub location: Span,
    #[serde(default)]
    pub elements: Vec<Expr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inferred_type: Option<ValueType>,
}

impl ListExpr {
    /// Element type name recorded by the type checker, if any.
    pub fn element_type(&self) -> Option<String> {
        match &self.inferred_type {
            Some(ValueType::ListValueType { element_type }) => Some(element_type.to_string()),
            _ => None,
        }
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Literals
// ══════════════════════════════════════════════════════════════════════════════

/// The literal initializers permitted in variable and attribute definitions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum Literal {
    IntegerLiteral(IntegerLiteral),
    BooleanLiteral(BooleanLiteral),
    StringLiteral(StringLiteral),
    NoneLiteral(NoneLiteral),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntegerLiteral {
    pub location: Span,
    pub value: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BooleanLiteral {
    pub location: Span,
    pub value: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StringLiteral {
    pub location: Span,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoneLiteral {
    pub location: Span,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_type_annotation_display() {
        let t = TypeAnnotation::list(
            TypeAnnotation::list(TypeAnnotation::class("int", Span::default()), Span::default()),
            Span::default(),
        );
        assert_eq!(t.to_string(), "[[int]]");
    }

    #[test]
    fn test_value_type_display() {
        let t: ValueType = serde_json::from_str(
            r#"{"kind":"ListValueType","elementType":{"kind":"ClassValueType","className":"str"}}"#,
        )
        .unwrap();
        assert_eq!(t.to_string(), "[str]");
    }

    #[test]
    fn test_binop_spelling() {
        let op: BinOp = serde_json::from_str(r#""//""#).unwrap();
        assert_eq!(op, BinOp::FloorDiv);
        assert_eq!(BinOp::Is.to_string(), "is");
    }

    #[test]
    fn test_expr_ignores_checker_metadata() {
        let e: Expr = serde_json::from_str(
            r#"{
                "kind": "IntegerLiteral",
                "location": [1, 5, 1, 6],
                "inferredType": {"kind": "ClassValueType", "className": "int"},
                "value": 7
            }"#,
        )
        .unwrap();
        assert_eq!(
            e,
            Expr::IntegerLiteral(IntegerLiteral {
                location: Span::new(1, 5, 1, 6),
                value: 7
            })
        );
        assert_eq!(e.location(), Span::new(1, 5, 1, 6));
    }

    #[test]
    fn test_list_expr_element_type() {
        let e: Expr = serde_json::from_str(
            r#"{
                "kind": "ListExpr",
                "location": [1, 1, 1, 7],
                "inferredType": {
                    "kind": "ListValueType",
                    "elementType": {"kind": "ClassValueType", "className": "int"}
                },
                "elements": []
            }"#,
        )
        .unwrap();
        match e {
            Expr::ListExpr(list) => assert_eq!(list.element_type().as_deref(), Some("int")),
            other => panic!("expected list expression, got {other:?}"),
        }
    }

    fn sum_chain(terms: i32) -> Expr {
        let lit = |value| {
            Expr::IntegerLiteral(IntegerLiteral {
                location: Span::default(),
                value,
            })
        };
        (1..terms).fold(lit(0), |acc, n| {
            Expr::BinaryExpr(BinaryExpr {
                location: Span::default(),
                left: Box::new(acc),
                operator: BinOp::Add,
                right: Box::new(lit(n)),
            })
        })
    }

    #[test]
    fn test_from_json_reads_deep_nesting() {
        // if c0: ... elif c1: ... elif c2: ... (300 branches)
        let mut chain = Vec::new();
        for i in (0..300).rev() {
            chain = vec![Stmt::IfStmt(IfStmt {
                location: Span::default(),
                condition: sum_chain(2 + i % 3),
                then_body: vec![],
                else_body: chain,
            })];
        }
        let program = Program {
            location: Span::default(),
            declarations: vec![],
            statements: vec![
                chain.remove(0),
                Stmt::ExprStmt(ExprStmt {
                    location: Span::default(),
                    expr: sum_chain(1_000),
                }),
            ],
        };

        let json = serde_json::to_string(&program).unwrap();
        let back = Program::from_json(&json).unwrap();
        assert_eq!(back, program);
    }

    #[test]
    fn test_from_json_rejects_trailing_input() {
        assert!(Program::from_json(r#"{"statements": []} []"#).is_err());
        assert!(Program::from_json(r#"{"statements": []}"#).is_ok());
    }

    #[test]
    fn test_method_call_member_ignores_nested_kind() {
        let e: Expr = serde_json::from_str(
            r#"{
                "kind": "MethodCallExpr",
                "location": [3, 1, 3, 12],
                "method": {
                    "kind": "MemberExpr",
                    "location": [3, 1, 3, 10],
                    "object": {"kind": "Identifier", "location": [3, 1, 3, 2], "name": "c"},
                    "member": {"kind": "Identifier", "location": [3, 3, 3, 10], "name": "inc"}
                },
                "args": []
            }"#,
        )
        .unwrap();
        let Expr::MethodCallExpr(call) = e else {
            panic!("expected method call");
        };
        assert_eq!(call.method.member.name, "inc");
    }
}
