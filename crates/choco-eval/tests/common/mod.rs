//! Helpers for building ASTs by hand in tests.
#![allow(dead_code)]

use choco_eval::{run_live, run_trace, EventLog, Limits, RunSummary, Trace};
use choco_types::ast::*;
use choco_types::Span;

fn sp() -> Span {
    Span::default()
}

// ── Expressions ───────────────────────────────────────────────────────────

pub fn int(value: i32) -> Expr {
    Expr::IntegerLiteral(IntegerLiteral { location: sp(), value })
}

pub fn boolean(value: bool) -> Expr {
    Expr::BooleanLiteral(BooleanLiteral { location: sp(), value })
}

pub fn string(value: &str) -> Expr {
    Expr::StringLiteral(StringLiteral {
        location: sp(),
        value: value.to_string(),
    })
}

pub fn none() -> Expr {
    Expr::NoneLiteral(NoneLiteral { location: sp() })
}

pub fn var(name: &str) -> Expr {
    Expr::Identifier(Identifier::new(name, sp()))
}

pub fn bin(left: Expr, operator: BinOp, right: Expr) -> Expr {
    Expr::BinaryExpr(BinaryExpr {
        location: sp(),
        left: Box::new(left),
        operator,
        right: Box::new(right),
    })
}

pub fn neg(operand: Expr) -> Expr {
    Expr::UnaryExpr(UnaryExpr {
        location: sp(),
        operator: UnaryOp::Neg,
        operand: Box::new(operand),
    })
}

pub fn not(operand: Expr) -> Expr {
    Expr::UnaryExpr(UnaryExpr {
        location: sp(),
        operator: UnaryOp::Not,
        operand: Box::new(operand),
    })
}

pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::CallExpr(CallExpr {
        location: sp(),
        function: Identifier::new(name, sp()),
        args,
    })
}

fn member_expr(object: Expr, name: &str) -> MemberExpr {
    MemberExpr {
        location: sp(),
        object: Box::new(object),
        member: Identifier::new(name, sp()),
    }
}

pub fn member(object: Expr, name: &str) -> Expr {
    Expr::MemberExpr(member_expr(object, name))
}

pub fn method(object: Expr, name: &str, args: Vec<Expr>) -> Expr {
    Expr::MethodCallExpr(MethodCallExpr {
        location: sp(),
        method: member_expr(object, name),
        args,
    })
}

pub fn index(list: Expr, idx: Expr) -> Expr {
    Expr::IndexExpr(IndexExpr {
        location: sp(),
        list: Box::new(list),
        index: Box::new(idx),
    })
}

pub fn list(elements: Vec<Expr>) -> Expr {
    Expr::ListExpr(ListExpr {
        location: sp(),
        elements,
        inferred_type: None,
    })
}

pub fn ternary(condition: Expr, then_expr: Expr, else_expr: Expr) -> Expr {
    Expr::IfExpr(IfExpr {
        location: sp(),
        condition: Box::new(condition),
        then_expr: Box::new(then_expr),
        else_expr: Box::new(else_expr),
    })
}

// ── Statements ────────────────────────────────────────────────────────────

pub fn expr(expr: Expr) -> Stmt {
    Stmt::ExprStmt(ExprStmt { location: sp(), expr })
}

pub fn print(value: Expr) -> Stmt {
    expr(call("print", vec![value]))
}

pub fn assign(target: Expr, value: Expr) -> Stmt {
    assign_all(vec![target], value)
}

pub fn assign_all(targets: Vec<Expr>, value: Expr) -> Stmt {
    Stmt::AssignStmt(AssignStmt {
        location: sp(),
        targets,
        value,
    })
}

pub fn if_else(condition: Expr, then_body: Vec<Stmt>, else_body: Vec<Stmt>) -> Stmt {
    Stmt::IfStmt(IfStmt {
        location: sp(),
        condition,
        then_body,
        else_body,
    })
}

pub fn while_loop(condition: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::WhileStmt(WhileStmt {
        location: sp(),
        condition,
        body,
    })
}

pub fn for_loop(name: &str, iterable: Expr, body: Vec<Stmt>) -> Stmt {
    Stmt::ForStmt(ForStmt {
        location: sp(),
        identifier: Identifier::new(name, sp()),
        iterable,
        body,
    })
}

pub fn ret(value: Expr) -> Stmt {
    Stmt::ReturnStmt(ReturnStmt {
        location: sp(),
        value: Some(value),
    })
}

pub fn ret_none() -> Stmt {
    Stmt::ReturnStmt(ReturnStmt {
        location: sp(),
        value: None,
    })
}

/// Place `stmt` on source line `line`.
pub fn on_line(mut stmt: Stmt, line: u32) -> Stmt {
    let location = Span::line(line, 80);
    match &mut stmt {
        Stmt::ExprStmt(s) => s.location = location,
        Stmt::AssignStmt(s) => s.location = location,
        Stmt::IfStmt(s) => s.location = location,
        Stmt::WhileStmt(s) => s.location = location,
        Stmt::ForStmt(s) => s.location = location,
        Stmt::ReturnStmt(s) => s.location = location,
    }
    stmt
}

// ── Declarations ──────────────────────────────────────────────────────────

pub fn ty(name: &str) -> TypeAnnotation {
    TypeAnnotation::class(name, sp())
}

pub fn list_of(element: TypeAnnotation) -> TypeAnnotation {
    TypeAnnotation::list(element, sp())
}

fn typed(name: &str, type_ann: TypeAnnotation) -> TypedVar {
    TypedVar {
        location: sp(),
        identifier: Identifier::new(name, sp()),
        type_ann,
    }
}

/// `name: ty = value`; `value` must be a literal expression.
pub fn var_def(name: &str, type_ann: TypeAnnotation, value: Expr) -> Declaration {
    let value = match value {
        Expr::IntegerLiteral(l) => Literal::IntegerLiteral(l),
        Expr::BooleanLiteral(l) => Literal::BooleanLiteral(l),
        Expr::StringLiteral(l) => Literal::StringLiteral(l),
        Expr::NoneLiteral(l) => Literal::NoneLiteral(l),
        other => panic!("not a literal: {other:?}"),
    };
    Declaration::VarDef(VarDef {
        location: sp(),
        var: typed(name, type_ann),
        value,
    })
}

pub fn func(
    name: &str,
    params: &[(&str, &str)],
    declarations: Vec<Declaration>,
    statements: Vec<Stmt>,
) -> Declaration {
    Declaration::FuncDef(FuncDef {
        location: sp(),
        name: Identifier::new(name, sp()),
        params: params.iter().map(|(n, t)| typed(n, ty(t))).collect(),
        return_type: None,
        declarations,
        statements,
    })
}

pub fn class(name: &str, super_class: &str, declarations: Vec<Declaration>) -> Declaration {
    Declaration::ClassDef(ClassDef {
        location: sp(),
        name: Identifier::new(name, sp()),
        super_class: Identifier::new(super_class, sp()),
        declarations,
    })
}

pub fn global(name: &str) -> Declaration {
    Declaration::GlobalDecl(GlobalDecl {
        location: sp(),
        variable: Identifier::new(name, sp()),
    })
}

pub fn nonlocal(name: &str) -> Declaration {
    Declaration::NonLocalDecl(NonLocalDecl {
        location: sp(),
        variable: Identifier::new(name, sp()),
    })
}

pub fn program(declarations: Vec<Declaration>, statements: Vec<Stmt>) -> Program {
    Program {
        location: sp(),
        declarations,
        statements,
    }
}

// ── Running ───────────────────────────────────────────────────────────────

/// Run in live mode with no input available.
pub fn live(program: &Program) -> (EventLog, RunSummary) {
    live_with_inputs(program, Vec::<String>::new())
}

pub fn live_with_inputs<S: Into<String>>(
    program: &Program,
    inputs: impl IntoIterator<Item = S>,
) -> (EventLog, RunSummary) {
    let mut log = EventLog::with_inputs(inputs);
    let summary = run_live(program, &mut log, Limits::default());
    (log, summary)
}

/// Output lines of a live run, asserting it did not fault.
pub fn output(program: &Program) -> Vec<String> {
    let (log, summary) = live(program);
    assert!(summary.is_ok(), "unexpected fault: {:?}", summary.fault);
    log.output().into_iter().map(String::from).collect()
}

/// Fault message of a live run, asserting it faulted.
pub fn fault_message(program: &Program) -> String {
    let (_, summary) = live(program);
    summary
        .fault
        .map(|f| f.message())
        .expect("expected the run to fault")
}

pub fn trace(program: &Program) -> Trace {
    run_trace(program, Limits::default())
}
