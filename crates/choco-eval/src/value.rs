//! Runtime values.
//!
//! Lists and objects are shared handles: every alias sees every mutation,
//! and `is` compares handles. Copies happen only through [`Value::deep_copy`]
//! (attribute defaults) and snapshot capture.

use choco_types::ast::Literal;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::mem;
use std::rc::Rc;

/// Backing storage of a list value.
#[derive(Debug, Clone, PartialEq)]
pub struct ListData {
    pub elements: Vec<Value>,
    /// Element type name as reported by the type checker (`"int"`, `"[str]"`, ...).
    pub element_type: String,
}

/// Backing storage of an object instance.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectData {
    pub class_name: String,
    pub attrs: BTreeMap<String, Value>,
}

pub type ListRef = Rc<RefCell<ListData>>;
pub type ObjectRef = Rc<RefCell<ObjectData>>;

// Dropping a long chain of handles through the derived glue recurses once
// per link. Both storage types hand their children to `release` instead,
// which unlinks uniquely owned storage on a heap worklist.

impl Drop for ListData {
    fn drop(&mut self) {
        release(mem::take(&mut self.elements));
    }
}

impl Drop for ObjectData {
    fn drop(&mut self) {
        release(mem::take(&mut self.attrs).into_values().collect());
    }
}

fn release(mut pending: Vec<Value>) {
    while let Some(value) = pending.pop() {
        match value {
            Value::List(list) => {
                if let Ok(cell) = Rc::try_unwrap(list) {
                    pending.append(&mut cell.into_inner().elements);
                }
            }
            Value::Object(obj) => {
                if let Ok(cell) = Rc::try_unwrap(obj) {
                    pending.extend(mem::take(&mut cell.into_inner().attrs).into_values());
                }
            }
            _ => {}
        }
    }
}

/// A runtime value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i32),
    Bool(bool),
    Str(String),
    None,
    List(ListRef),
    Object(ObjectRef),
}

impl Value {
    /// A fresh list handle.
    pub fn list(elements: Vec<Value>, element_type: impl Into<String>) -> Self {
        Value::List(Rc::new(RefCell::new(ListData {
            elements,
            element_type: element_type.into(),
        })))
    }

    /// A fresh object handle.
    pub fn object(class_name: impl Into<String>, attrs: BTreeMap<String, Value>) -> Self {
        Value::Object(Rc::new(RefCell::new(ObjectData {
            class_name: class_name.into(),
            attrs,
        })))
    }

    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Value of a literal initializer.
    pub fn from_literal(literal: &Literal) -> Self {
        match literal {
            Literal::IntegerLiteral(l) => Value::Int(l.value),
            Literal::BooleanLiteral(l) => Value::Bool(l.value),
            Literal::StringLiteral(l) => Value::Str(l.value.clone()),
            Literal::NoneLiteral(_) => Value::None,
        }
    }

    /// Zero value of a primitive type; `None` for everything else.
    pub fn default_for(type_name: &str) -> Self {
        match type_name {
            "int" => Value::Int(0),
            "bool" => Value::Bool(false),
            "str" => Value::Str(String::new()),
            _ => Value::None,
        }
    }

    /// Runtime kind name, used in fault messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Bool(_) => "bool",
            Value::Str(_) => "str",
            Value::None => "none",
            Value::List(_) => "list",
            Value::Object(_) => "object",
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Bool(b) => *b,
            Value::Str(s) => !s.is_empty(),
            Value::None => false,
            Value::List(list) => !list.borrow().elements.is_empty(),
            Value::Object(_) => true,
        }
    }

    /// The `is` operator.
    ///
    /// `None is None` holds, `None` is never anything else, and lists and
    /// objects are the same only when they are the same handle. Primitive
    /// values have no identity.
    pub fn is_identical(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Copy that shares no list or object storage with `self`.
    ///
    /// Values reachable through a cycle are copied once per path, so this
    /// must only be used on acyclic values (attribute defaults are literals).
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::List(list) => {
                let data = list.borrow();
                Value::list(
                    data.elements.iter().map(Value::deep_copy).collect(),
                    data.element_type.clone(),
                )
            }
            Value::Object(obj) => {
                let data = obj.borrow();
                Value::object(
                    data.class_name.clone(),
                    data.attrs
                        .iter()
                        .map(|(k, v)| (k.clone(), v.deep_copy()))
                        .collect(),
                )
            }
            other => other.clone(),
        }
    }
}

/// Value equality: primitives by value, lists and objects by handle.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::None, Value::None) => true,
            (Value::List(a), Value::List(b)) => Rc::ptr_eq(a, b),
            (Value::Object(a), Value::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// What `print` shows. A list reached again while it is being printed
/// shows as `[...]`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_display(f, &mut Vec::new())
    }
}

impl Value {
    fn write_display(
        &self,
        f: &mut fmt::Formatter<'_>,
        path: &mut Vec<*const RefCell<ListData>>,
    ) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(true) => f.write_str("True"),
            Value::Bool(false) => f.write_str("False"),
            Value::Str(s) => f.write_str(s),
            Value::None => f.write_str("None"),
            Value::List(list) => {
                let ptr = Rc::as_ptr(list);
                if path.contains(&ptr) {
                    return f.write_str("[...]");
                }
                path.push(ptr);
                f.write_str("[")?;
                for (i, elem) in list.borrow().elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    elem.write_display(f, path)?;
                }
                path.pop();
                f.write_str("]")
            }
            Value::Object(obj) => write!(f, "<{} object>", obj.borrow().class_name),
        }
    }
}
