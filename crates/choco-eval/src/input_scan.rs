//! Static check for calls to `input()`.
//!
//! The scan is conservative: it looks at every statement and expression in
//! the program, reachable or not, including function, method and nested
//! function bodies and assignment targets.

use choco_types::ast::*;

const INPUT: &str = "input";

pub fn reaches_input(program: &Program) -> bool {
    decls_reach_input(&program.declarations) || block_reaches_input(&program.statements)
}

fn decls_reach_input(decls: &[Declaration]) -> bool {
    decls.iter().any(|decl| match decl {
        Declaration::FuncDef(func) => {
            decls_reach_input(&func.declarations) || block_reaches_input(&func.statements)
        }
        Declaration::ClassDef(class) => decls_reach_input(&class.declarations),
        Declaration::VarDef(_) | Declaration::GlobalDecl(_) | Declaration::NonLocalDecl(_) => false,
    })
}

fn block_reaches_input(stmts: &[Stmt]) -> bool {
    stmts.iter().any(stmt_reaches_input)
}

fn stmt_reaches_input(stmt: &Stmt) -> bool {
    match stmt {
        Stmt::ExprStmt(s) => expr_reaches_input(&s.expr),
        Stmt::AssignStmt(s) => {
            expr_reaches_input(&s.value) || s.targets.iter().any(expr_reaches_input)
        }
        Stmt::IfStmt(s) => {
            expr_reaches_input(&s.condition)
                || block_reaches_input(&s.then_body)
                || block_reaches_input(&s.else_body)
        }
        Stmt::WhileStmt(s) => expr_reaches_input(&s.condition) || block_reaches_input(&s.body),
        Stmt::ForStmt(s) => expr_reaches_input(&s.iterable) || block_reaches_input(&s.body),
        Stmt::ReturnStmt(s) => s.value.as_ref().is_some_and(expr_reaches_input),
    }
}

fn expr_reaches_input(expr: &Expr) -> bool {
    match expr {
        Expr::CallExpr(e) => e.function.name == INPUT || e.args.iter().any(expr_reaches_input),
        Expr::MethodCallExpr(e) => {
            expr_reaches_input(&e.method.object) || e.args.iter().any(expr_reaches_input)
        }
        Expr::BinaryExpr(e) => expr_reaches_input(&e.left) || expr_reaches_input(&e.right),
        Expr::UnaryExpr(e) => expr_reaches_input(&e.operand),
        Expr::IfExpr(e) => {
            expr_reaches_input(&e.condition)
                || expr_reaches_input(&e.then_expr)
                || expr_reaches_input(&e.else_expr)
        }
        Expr::ListExpr(e) => e.elements.iter().any(expr_reaches_input),
        Expr::IndexExpr(e) => expr_reaches_input(&e.list) || expr_reaches_input(&e.index),
        Expr::MemberExpr(e) => expr_reaches_input(&e.object),
        Expr::Identifier(_)
        | Expr::IntegerLiteral(_)
        | Expr::BooleanLiteral(_)
        | Expr::StringLiteral(_)
        | Expr::NoneLiteral(_) => false,
    }
}
