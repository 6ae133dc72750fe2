//! Built-in functions and primitive constructors.
//!
//! Builtins see the outside world only through [`Console`].

use crate::error::EvalError;
use crate::value::Value;

/// Line-oriented I/O used by `print` and `input`.
pub trait Console {
    fn write_line(&mut self, text: String);

    /// Read one line of input. Errors when no input can be supplied.
    fn read_line(&mut self) -> Result<String, EvalError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Print,
    Input,
    Len,
}

impl Builtin {
    pub fn lookup(name: &str) -> Option<Self> {
        match name {
            "print" => Some(Self::Print),
            "input" => Some(Self::Input),
            "len" => Some(Self::Len),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Print => "print",
            Self::Input => "input",
            Self::Len => "len",
        }
    }

    fn arity(self) -> usize {
        match self {
            Self::Print | Self::Len => 1,
            Self::Input => 0,
        }
    }
}

/// Invoke a builtin on already-evaluated arguments.
pub fn call<C: Console + ?Sized>(
    builtin: Builtin,
    args: Vec<Value>,
    console: &mut C,
) -> Result<Value, EvalError> {
    if args.len() != builtin.arity() {
        return Err(EvalError::WrongArgumentCount {
            function: builtin.name(),
            expected: builtin.arity(),
            found: args.len(),
        });
    }

    match builtin {
        Builtin::Print => {
            console.write_line(args[0].to_string());
            Ok(Value::None)
        }
        Builtin::Input => console.read_line().map(Value::Str),
        Builtin::Len => len(&args[0]),
    }
}

fn len(value: &Value) -> Result<Value, EvalError> {
    let n = match value {
        Value::Str(s) => s.chars().count(),
        Value::List(list) => list.borrow().elements.len(),
        other => return Err(EvalError::BadLenArgument(other.type_name())),
    };
    Ok(Value::Int(i32::try_from(n).unwrap_or(i32::MAX)))
}

/// Zero-argument constructors of the primitive types.
pub fn primitive_constructor(name: &str) -> Option<Value> {
    match name {
        "int" | "bool" | "str" => Some(Value::default_for(name)),
        _ => None,
    }
}
