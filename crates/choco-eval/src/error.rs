//! Runtime error types for the interpreter.

use choco_types::ast::BinOp;
use choco_types::Span;
use serde::Serialize;
use thiserror::Error;

/// What went wrong at runtime.
///
/// `StepLimit` is the governor abort; everything else is an ordinary fault.
/// `return` is not an error and never appears here.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvalError {
    /// `//` or `%` with a zero divisor.
    #[error("Division by zero")]
    DivisionByZero,
    #[error("Index out of bounds: {0}")]
    IndexOutOfBounds(i32),
    #[error("Index must be an integer")]
    NonIntegerIndex,
    #[error("Cannot index into {0}")]
    NotIndexable(&'static str),
    #[error("Cannot iterate over {0}")]
    NotIterable(&'static str),
    #[error("Unsupported operation: {left} {op} {right}")]
    UnsupportedOperation {
        left: &'static str,
        op: BinOp,
        right: &'static str,
    },
    #[error("Cannot negate {0}")]
    UnsupportedNegation(&'static str),
    /// Attribute read/write or method call on `None`.
    #[error("Cannot {action} on None")]
    NoneReceiver { action: &'static str },
    /// Attribute read/write or method call on a value that is not an object.
    #[error("Cannot {action} on non-object {found}")]
    NotAnObject {
        action: &'static str,
        found: &'static str,
    },
    #[error("Object has no attribute '{0}'")]
    NoSuchAttribute(String),
    #[error("No method '{method}' on {class}")]
    NoSuchMethod { class: String, method: String },
    #[error("Unknown class: {0}")]
    UnknownClass(String),
    #[error("Unknown superclass '{superclass}' for class {class}")]
    UnknownSuperclass { class: String, superclass: String },
    #[error("Unknown function: {0}")]
    UnknownFunction(String),
    #[error("'{0}' is not callable")]
    NotCallable(String),
    #[error("Cannot assign to this expression")]
    InvalidAssignTarget,
    #[error("{function}() takes {expected} argument(s) but {found} were given")]
    WrongArgumentCount {
        function: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("len() argument must be a string or list, not {0}")]
    BadLenArgument(&'static str),
    #[error("input() is unavailable: {0}")]
    InputUnavailable(&'static str),
    #[error("Maximum recursion depth exceeded ({0} nested calls)")]
    RecursionLimit(usize),
    #[error("Execution limit exceeded ({0} operations). Possible infinite loop.")]
    StepLimit(u64),
}

impl EvalError {
    /// Attach a source location.
    pub fn at(self, location: Span) -> RuntimeFault {
        RuntimeFault {
            error: self,
            location: Some(location),
        }
    }
}

/// A runtime fault: the error plus where it happened, if known.
///
/// Serializes as `{ "message": ..., "location": [..] | null }`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(into = "FaultReport")]
#[error("{error}")]
pub struct RuntimeFault {
    pub error: EvalError,
    pub location: Option<Span>,
}

impl RuntimeFault {
    /// Human-readable message, without location.
    pub fn message(&self) -> String {
        self.error.to_string()
    }

    /// Whether this fault is the step governor's abort.
    pub fn is_step_limit(&self) -> bool {
        matches!(self.error, EvalError::StepLimit(_))
    }
}

impl From<EvalError> for RuntimeFault {
    fn from(error: EvalError) -> Self {
        Self {
            error,
            location: None,
        }
    }
}

/// Wire shape of a [`RuntimeFault`].
#[derive(Debug, Clone, Serialize)]
pub struct FaultReport {
    pub message: String,
    pub location: Option<Span>,
}

impl From<RuntimeFault> for FaultReport {
    fn from(fault: RuntimeFault) -> Self {
        Self {
            message: fault.message(),
            location: fault.location,
        }
    }
}

/// Result alias for evaluator operations.
pub type EvalResult<T> = Result<T, RuntimeFault>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(EvalError::DivisionByZero.to_string(), "Division by zero");
        assert_eq!(
            EvalError::UnsupportedOperation {
                left: "int",
                op: BinOp::Add,
                right: "str"
            }
            .to_string(),
            "Unsupported operation: int + str"
        );
        assert_eq!(
            EvalError::StepLimit(1_000_000).to_string(),
            "Execution limit exceeded (1000000 operations). Possible infinite loop."
        );
    }

    #[test]
    fn test_fault_serialization() {
        let fault = EvalError::IndexOutOfBounds(3).at(Span::new(2, 7, 2, 11));
        let json = serde_json::to_string(&fault).unwrap();
        assert_eq!(json, r#"{"message":"Index out of bounds: 3","location":[2,7,2,11]}"#);

        let bare: RuntimeFault = EvalError::StepLimit(10).into();
        assert!(bare.is_step_limit());
        assert!(serde_json::to_string(&bare).unwrap().contains(r#""location":null"#));
    }
}
