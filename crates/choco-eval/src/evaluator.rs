//! Core statement and expression evaluator.
//!
//! One engine serves both execution modes. What differs between them
//! (snapshot capture, where output goes, how input is obtained) is supplied
//! by a [`Mode`].

use crate::builtins::{self, Builtin, Console};
use crate::classes::ClassRegistry;
use crate::env::{Environment, FrameId, GLOBAL_FRAME};
use crate::error::{EvalError, EvalResult};
use crate::limits::Limits;
use crate::ops;
use crate::stack::ensure_sufficient_stack;
use crate::value::{ObjectRef, Value};
use choco_types::ast::*;
use choco_types::Span;
use std::collections::BTreeMap;

/// Name of the bottom call-stack entry.
pub const MODULE_FRAME_NAME: &str = "<module>";

/// Read-only view of interpreter state handed to [`Mode::on_statement`].
pub struct StateView<'a> {
    pub env: &'a Environment,
    /// Oldest first, starting with `<module>`.
    pub call_stack: &'a [String],
}

/// Execution strategy: console I/O plus a hook run before every statement.
pub trait Mode: Console {
    /// Called after a statement's step is counted and before it executes.
    fn on_statement(&mut self, _state: &StateView<'_>, _location: Span) {}
}

/// How a statement or block finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal,
    Return(Value),
}

/// A function declared inside a call, visible while that call is active.
#[derive(Debug, Clone, Copy)]
struct NestedFunction<'p> {
    decl: &'p FuncDef,
    /// Frame of the call that declared it.
    scope: FrameId,
}

/// All state of one interpretation run.
pub struct Interpreter<'p, M: Mode> {
    program: &'p Program,
    env: Environment,
    classes: ClassRegistry<'p>,
    functions: BTreeMap<&'p str, &'p FuncDef>,
    nested: Vec<NestedFunction<'p>>,
    call_stack: Vec<String>,
    steps: u64,
    limits: Limits,
    mode: M,
}

impl<'p, M: Mode> Interpreter<'p, M> {
    pub fn new(program: &'p Program, mode: M, limits: Limits) -> Self {
        Self {
            program,
            env: Environment::new(),
            classes: ClassRegistry::new(),
            functions: BTreeMap::new(),
            nested: Vec::new(),
            call_stack: vec![MODULE_FRAME_NAME.to_string()],
            steps: 0,
            limits,
            mode,
        }
    }

    /// Register declarations, then execute the top-level statements.
    ///
    /// Stops at the first fault. A top-level `return` ends the run normally.
    pub fn run(&mut self) -> EvalResult<()> {
        let program = self.program;
        tracing::debug!(
            declarations = program.declarations.len(),
            statements = program.statements.len(),
            max_steps = self.limits.max_steps,
            "starting run"
        );

        let result = self.register_declarations().and_then(|()| {
            for stmt in &program.statements {
                if let Flow::Return(_) = self.exec_stmt(stmt)? {
                    break;
                }
            }
            Ok(())
        });

        match &result {
            Ok(()) => tracing::debug!(steps = self.steps, "run finished"),
            Err(fault) => tracing::debug!(steps = self.steps, error = %fault, "run faulted"),
        }
        result
    }

    /// Steps consumed so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn mode(&self) -> &M {
        &self.mode
    }

    pub fn into_mode(self) -> M {
        self.mode
    }

    fn tick(&mut self) -> EvalResult<()> {
        if self.steps >= self.limits.max_steps {
            return Err(EvalError::StepLimit(self.limits.max_steps).into());
        }
        self.steps += 1;
        Ok(())
    }

    // ── Declarations ──────────────────────────────────────────────────────

    fn register_declarations(&mut self) -> EvalResult<()> {
        let program = self.program;
        for decl in &program.declarations {
            match decl {
                Declaration::ClassDef(class) => self
                    .classes
                    .register_class(class)
                    .map_err(|e| e.at(class.location))?,
                Declaration::FuncDef(func) => {
                    self.functions.insert(func.name.name.as_str(), func);
                }
                Declaration::VarDef(var) => self
                    .env
                    .define(&var.var.identifier.name, Value::from_literal(&var.value)),
                Declaration::GlobalDecl(_) | Declaration::NonLocalDecl(_) => {}
            }
        }
        Ok(())
    }

    // ══════════════════════════════════════════════════════════════════════
    // Statements
    // ══════════════════════════════════════════════════════════════════════

    fn exec_stmt(&mut self, stmt: &'p Stmt) -> EvalResult<Flow> {
        self.tick()?;
        self.mode.on_statement(
            &StateView {
                env: &self.env,
                call_stack: &self.call_stack,
            },
            stmt.location(),
        );

        match stmt {
            Stmt::ExprStmt(s) => {
                self.eval_expr(&s.expr)?;
                Ok(Flow::Normal)
            }
            Stmt::AssignStmt(s) => {
                let value = self.eval_expr(&s.value)?;
                for target in &s.targets {
                    self.assign(target, value.clone())?;
                }
                Ok(Flow::Normal)
            }
            Stmt::IfStmt(s) => {
                if self.eval_expr(&s.condition)?.is_truthy() {
                    self.exec_block(&s.then_body)
                } else {
                    ensure_sufficient_stack(|| self.exec_block(&s.else_body))
                }
            }
            Stmt::WhileStmt(s) => {
                loop {
                    self.tick()?;
                    if !self.eval_expr(&s.condition)?.is_truthy() {
                        break;
                    }
                    if let Flow::Return(v) = self.exec_block(&s.body)? {
                        return Ok(Flow::Return(v));
                    }
                }
                Ok(Flow::Normal)
            }
            Stmt::ForStmt(s) => self.exec_for(s),
            Stmt::ReturnStmt(s) => {
                let value = match &s.value {
                    Some(expr) => self.eval_expr(expr)?,
                    None => Value::None,
                };
                Ok(Flow::Return(value))
            }
        }
    }

    fn exec_block(&mut self, stmts: &'p [Stmt]) -> EvalResult<Flow> {
        for stmt in stmts {
            if let Flow::Return(v) = self.exec_stmt(stmt)? {
                return Ok(Flow::Return(v));
            }
        }
        Ok(Flow::Normal)
    }

    /// Strings iterate by character over a fixed copy. Lists iterate by live
    /// index, so elements appended by the body are visited too.
    fn exec_for(&mut self, stmt: &'p ForStmt) -> EvalResult<Flow> {
        let name = stmt.identifier.name.as_str();
        match self.eval_expr(&stmt.iterable)? {
            Value::Str(s) => {
                for ch in s.chars() {
                    self.tick()?;
                    self.env.set(name, Value::Str(ch.to_string()));
                    if let Flow::Return(v) = self.exec_block(&stmt.body)? {
                        return Ok(Flow::Return(v));
                    }
                }
            }
            Value::List(list) => {
                let mut i = 0;
                loop {
                    let Some(elem) = list.borrow().elements.get(i).cloned() else {
                        break;
                    };
                    self.tick()?;
                    self.env.set(name, elem);
                    if let Flow::Return(v) = self.exec_block(&stmt.body)? {
                        return Ok(Flow::Return(v));
                    }
                    i += 1;
                }
            }
            other => {
                return Err(EvalError::NotIterable(other.type_name()).at(stmt.location));
            }
        }
        Ok(Flow::Normal)
    }

    fn assign(&mut self, target: &'p Expr, value: Value) -> EvalResult<()> {
        match target {
            Expr::Identifier(id) => {
                self.env.set(&id.name, value);
                Ok(())
            }
            Expr::MemberExpr(member) => {
                let receiver = self.eval_expr(&member.object)?;
                let obj = expect_object(receiver, "set attribute").map_err(|e| e.at(member.location))?;
                obj.borrow_mut()
                    .attrs
                    .insert(member.member.name.clone(), value);
                Ok(())
            }
            Expr::IndexExpr(ix) => {
                let target = self.eval_expr(&ix.list)?;
                let index = self.eval_expr(&ix.index)?;
                let list = match target {
                    Value::List(list) => list,
                    other => {
                        return Err(EvalError::NotIndexable(other.type_name()).at(ix.location))
                    }
                };
                let i = index
                    .as_int()
                    .ok_or(EvalError::NonIntegerIndex)
                    .map_err(|e| e.at(ix.location))?;
                let mut data = list.borrow_mut();
                let i = ops::checked_index(i, data.elements.len()).map_err(|e| e.at(ix.location))?;
                data.elements[i] = value;
                Ok(())
            }
            other => Err(EvalError::InvalidAssignTarget.at(other.location())),
        }
    }

    // ══════════════════════════════════════════════════════════════════════
    // Expressions
    // ══════════════════════════════════════════════════════════════════════

    fn eval_expr(&mut self, expr: &'p Expr) -> EvalResult<Value> {
        self.tick()?;
        match expr {
            Expr::IntegerLiteral(lit) => Ok(Value::Int(lit.value)),
            Expr::BooleanLiteral(lit) => Ok(Value::Bool(lit.value)),
            Expr::StringLiteral(lit) => Ok(Value::Str(lit.value.clone())),
            Expr::NoneLiteral(_) => Ok(Value::None),
            Expr::Identifier(id) => Ok(self.env.get(&id.name)),

            Expr::UnaryExpr(e) => {
                let operand = self.eval_expr(&e.operand)?;
                match e.operator {
                    UnaryOp::Neg => ops::negate(&operand).map_err(|err| err.at(e.location)),
                    UnaryOp::Not => Ok(Value::Bool(!operand.is_truthy())),
                }
            }
            Expr::BinaryExpr(e) => ensure_sufficient_stack(|| self.eval_binary(e)),
            Expr::IfExpr(e) => {
                if self.eval_expr(&e.condition)?.is_truthy() {
                    self.eval_expr(&e.then_expr)
                } else {
                    self.eval_expr(&e.else_expr)
                }
            }
            Expr::ListExpr(e) => {
                let mut elements = Vec::with_capacity(e.elements.len());
                for elem in &e.elements {
                    elements.push(self.eval_expr(elem)?);
                }
                let element_type = e.element_type().unwrap_or_else(|| "object".to_string());
                Ok(Value::list(elements, element_type))
            }
            Expr::IndexExpr(e) => {
                let target = self.eval_expr(&e.list)?;
                let index = self.eval_expr(&e.index)?;
                ops::index(&target, &index).map_err(|err| err.at(e.location))
            }
            Expr::MemberExpr(e) => self.eval_member(e),
            Expr::CallExpr(e) => self.eval_call(e),
            Expr::MethodCallExpr(e) => self.eval_method_call(e),
        }
    }

    fn eval_binary(&mut self, e: &'p BinaryExpr) -> EvalResult<Value> {
        match e.operator {
            BinOp::And => {
                let left = self.eval_expr(&e.left)?;
                if !left.is_truthy() {
                    return Ok(left);
                }
                self.eval_expr(&e.right)
            }
            BinOp::Or => {
                let left = self.eval_expr(&e.left)?;
                if left.is_truthy() {
                    return Ok(left);
                }
                self.eval_expr(&e.right)
            }
            op => {
                let left = self.eval_expr(&e.left)?;
                let right = self.eval_expr(&e.right)?;
                ops::binary(op, &left, &right).map_err(|err| err.at(e.location))
            }
        }
    }

    fn eval_member(&mut self, e: &'p MemberExpr) -> EvalResult<Value> {
        let receiver = self.eval_expr(&e.object)?;
        let obj = expect_object(receiver, "access attribute").map_err(|err| err.at(e.location))?;
        let value = obj.borrow().attrs.get(&e.member.name).cloned();
        value.ok_or_else(|| EvalError::NoSuchAttribute(e.member.name.clone()).at(e.location))
    }

    /// Attributes shadow methods: a stored attribute with the method's name
    /// makes the call fault as "not callable".
    fn eval_method_call(&mut self, e: &'p MethodCallExpr) -> EvalResult<Value> {
        let receiver = self.eval_expr(&e.method.object)?;
        let obj = expect_object(receiver, "call method").map_err(|err| err.at(e.location))?;
        let name = &e.method.member.name;

        let class_name = {
            let data = obj.borrow();
            if data.attrs.contains_key(name) {
                return Err(EvalError::NotCallable(name.clone()).at(e.location));
            }
            data.class_name.clone()
        };
        let method = self
            .classes
            .resolve_method(&class_name, name)
            .map_err(|err| err.at(e.location))?;

        let mut args = Vec::with_capacity(e.args.len() + 1);
        args.push(Value::Object(obj));
        for arg in &e.args {
            args.push(self.eval_expr(arg)?);
        }
        self.call_function(method, GLOBAL_FRAME, args, e.location)
    }

    /// Dispatch order: builtins, primitive constructors, classes, user functions.
    fn eval_call(&mut self, e: &'p CallExpr) -> EvalResult<Value> {
        let mut args = Vec::with_capacity(e.args.len());
        for arg in &e.args {
            args.push(self.eval_expr(arg)?);
        }
        let name = e.function.name.as_str();

        if let Some(builtin) = Builtin::lookup(name) {
            return builtins::call(builtin, args, &mut self.mode).map_err(|err| err.at(e.location));
        }
        if let Some(value) = builtins::primitive_constructor(name) {
            return Ok(value);
        }
        if let Some(instance) = self.classes.instantiate(name) {
            if let Some(init) = self.classes.find_method(name, "__init__") {
                args.insert(0, instance.clone());
                self.call_function(init, GLOBAL_FRAME, args, e.location)?;
            }
            return Ok(instance);
        }
        if let Some((decl, scope)) = self.resolve_function(name) {
            return self.call_function(decl, scope, args, e.location);
        }
        if !self.env.get(name).is_none() {
            return Err(EvalError::NotCallable(name.to_string()).at(e.location));
        }
        Err(EvalError::UnknownFunction(name.to_string()).at(e.location))
    }

    /// Find a function by name: nested declarations along the lexical chain,
    /// innermost first, then top-level functions.
    fn resolve_function(&self, name: &str) -> Option<(&'p FuncDef, FrameId)> {
        for frame in self.env.chain() {
            let found = self
                .nested
                .iter()
                .rev()
                .find(|n| n.scope == frame && n.decl.name.name == name);
            if let Some(nested) = found {
                return Some((nested.decl, frame));
            }
        }
        self.functions
            .get(name)
            .map(|decl| (*decl, GLOBAL_FRAME))
    }

    /// Call `decl` in a new frame lexically parented at `scope`.
    ///
    /// The frame, call-stack entry and nested declarations are released on
    /// every exit path.
    fn call_function(
        &mut self,
        decl: &'p FuncDef,
        scope: FrameId,
        args: Vec<Value>,
        location: Span,
    ) -> EvalResult<Value> {
        if self.call_stack.len() > self.limits.max_call_depth {
            return Err(EvalError::RecursionLimit(self.limits.max_call_depth).at(location));
        }

        let frame = self.env.push_frame_in(scope);
        self.call_stack.push(decl.name.name.clone());
        let nested_mark = self.nested.len();

        let result = ensure_sufficient_stack(|| self.run_body(decl, frame, args));

        self.nested.truncate(nested_mark);
        self.call_stack.pop();
        self.env.pop_frame();
        result
    }

    fn run_body(&mut self, decl: &'p FuncDef, frame: FrameId, args: Vec<Value>) -> EvalResult<Value> {
        for local in &decl.declarations {
            match local {
                Declaration::VarDef(var) => self
                    .env
                    .define(&var.var.identifier.name, Value::from_literal(&var.value)),
                Declaration::GlobalDecl(g) => self.env.declare_global(&g.variable.name),
                Declaration::NonLocalDecl(n) => self.env.declare_nonlocal(&n.variable.name),
                Declaration::FuncDef(nested) => self.nested.push(NestedFunction {
                    decl: nested,
                    scope: frame,
                }),
                Declaration::ClassDef(_) => {}
            }
        }

        let mut args = args.into_iter();
        for param in &decl.params {
            self.env
                .define(&param.identifier.name, args.next().unwrap_or(Value::None));
        }

        match self.exec_block(&decl.statements)? {
            Flow::Return(value) => Ok(value),
            Flow::Normal => Ok(Value::None),
        }
    }
}

fn expect_object(value: Value, action: &'static str) -> Result<ObjectRef, EvalError> {
    match value {
        Value::Object(obj) => Ok(obj),
        Value::None => Err(EvalError::NoneReceiver { action }),
        other => Err(EvalError::NotAnObject {
            action,
            found: other.type_name(),
        }),
    }
}
