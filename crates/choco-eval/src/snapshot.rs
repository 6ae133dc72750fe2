//! Trace mode: run a program to completion while recording a bounded
//! sequence of state snapshots for step-through debugging.

use crate::builtins::Console;
use crate::error::{EvalError, RuntimeFault};
use crate::evaluator::{Interpreter, Mode, StateView};
use crate::input_scan::reaches_input;
use crate::limits::Limits;
use crate::value::Value;
use choco_types::ast::Program;
use choco_types::Span;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

/// An owned copy of a runtime value, detached from the live heap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum CapturedValue {
    Int {
        value: i32,
    },
    Bool {
        value: bool,
    },
    Str {
        value: String,
    },
    None,
    List {
        element_type: String,
        elements: Vec<CapturedValue>,
    },
    Object {
        class_name: String,
        attrs: BTreeMap<String, CapturedValue>,
    },
    /// A list or object reached again while already being captured.
    Cycle {
        target: String,
    },
}

impl CapturedValue {
    pub fn capture(value: &Value) -> Self {
        Capture::default().value(value)
    }
}

/// Handles on the path from the root being captured.
#[derive(Default)]
struct Capture {
    path: Vec<*const ()>,
}

impl Capture {
    fn value(&mut self, value: &Value) -> CapturedValue {
        match value {
            Value::Int(n) => CapturedValue::Int { value: *n },
            Value::Bool(b) => CapturedValue::Bool { value: *b },
            Value::Str(s) => CapturedValue::Str { value: s.clone() },
            Value::None => CapturedValue::None,
            Value::List(list) => {
                let ptr = Rc::as_ptr(list).cast::<()>();
                let data = list.borrow();
                if self.path.contains(&ptr) {
                    return CapturedValue::Cycle {
                        target: format!("[{}]", data.element_type),
                    };
                }
                self.path.push(ptr);
                let elements = data.elements.iter().map(|v| self.value(v)).collect();
                self.path.pop();
                CapturedValue::List {
                    element_type: data.element_type.clone(),
                    elements,
                }
            }
            Value::Object(obj) => {
                let ptr = Rc::as_ptr(obj).cast::<()>();
                let data = obj.borrow();
                if self.path.contains(&ptr) {
                    return CapturedValue::Cycle {
                        target: data.class_name.clone(),
                    };
                }
                self.path.push(ptr);
                let attrs = data
                    .attrs
                    .iter()
                    .map(|(k, v)| (k.clone(), self.value(v)))
                    .collect();
                self.path.pop();
                CapturedValue::Object {
                    class_name: data.class_name.clone(),
                    attrs,
                }
            }
        }
    }
}

/// Same rendering as `print`, with `...` standing in for a cycle.
impl fmt::Display for CapturedValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int { value } => write!(f, "{value}"),
            Self::Bool { value: true } => f.write_str("True"),
            Self::Bool { value: false } => f.write_str("False"),
            Self::Str { value } => f.write_str(value),
            Self::None => f.write_str("None"),
            Self::List { elements, .. } => {
                f.write_str("[")?;
                for (i, elem) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{elem}")?;
                }
                f.write_str("]")
            }
            Self::Object { class_name, .. } => write!(f, "<{class_name} object>"),
            Self::Cycle { .. } => f.write_str("..."),
        }
    }
}

/// Interpreter state just before one statement ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Position in the trace, starting at 0.
    pub step: usize,
    pub location: Option<Span>,
    /// Visible variables; inner frames shadow outer ones.
    pub variables: BTreeMap<String, CapturedValue>,
    pub console_output: Vec<String>,
    pub call_stack: Vec<String>,
}

/// Outcome of a trace-mode run.
///
/// `completed` is true only when the program ended normally and every
/// executed statement has a snapshot. A fault keeps the snapshots taken
/// before it; an overflow or a rejected program has none.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Trace {
    pub snapshots: Vec<Snapshot>,
    pub completed: bool,
    pub final_output: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fault: Option<RuntimeFault>,
}

impl Trace {
    /// Result for a program that may read input and so cannot be traced.
    pub fn rejected() -> Self {
        Self::default()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Trace-mode strategy: captures snapshots and buffers output in memory.
#[derive(Debug)]
pub struct Recorder {
    snapshots: Vec<Snapshot>,
    output: Vec<String>,
    max_snapshots: usize,
    overflowed: bool,
}

impl Recorder {
    pub fn new(max_snapshots: usize) -> Self {
        Self {
            snapshots: Vec::new(),
            output: Vec::new(),
            max_snapshots,
            overflowed: false,
        }
    }

    pub fn snapshots(&self) -> &[Snapshot] {
        &self.snapshots
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn overflowed(&self) -> bool {
        self.overflowed
    }

    /// Build the final result from the recorded state and the run's fault, if any.
    pub fn finish(self, fault: Option<RuntimeFault>) -> Trace {
        let snapshots = if self.overflowed {
            Vec::new()
        } else {
            self.snapshots
        };
        Trace {
            completed: !self.overflowed && fault.is_none(),
            snapshots,
            final_output: self.output,
            fault,
        }
    }
}

impl Console for Recorder {
    fn write_line(&mut self, text: String) {
        self.output.push(text);
    }

    fn read_line(&mut self) -> Result<String, EvalError> {
        Err(EvalError::InputUnavailable("trace mode does not accept input"))
    }
}

impl Mode for Recorder {
    fn on_statement(&mut self, state: &StateView<'_>, location: Span) {
        if self.overflowed {
            return;
        }
        if self.snapshots.len() >= self.max_snapshots {
            tracing::debug!(max_snapshots = self.max_snapshots, "snapshot limit reached");
            self.overflowed = true;
            return;
        }
        self.snapshots.push(Snapshot {
            step: self.snapshots.len(),
            location: Some(location),
            variables: state.env.snapshot_variables(CapturedValue::capture),
            console_output: self.output.clone(),
            call_stack: state.call_stack.to_vec(),
        });
    }
}

/// Run `program` in trace mode.
///
/// Programs that contain a call to `input()` anywhere are not executed.
#[tracing::instrument(level = "debug", skip_all)]
pub fn run_trace(program: &Program, limits: Limits) -> Trace {
    if reaches_input(program) {
        tracing::debug!("program reads input; trace rejected");
        return Trace::rejected();
    }

    let mut interpreter = Interpreter::new(program, Recorder::new(limits.max_snapshots), limits);
    let fault = interpreter.run().err();
    interpreter.into_mode().finish(fault)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_capture_is_detached() {
        let list = Value::list(vec![Value::Int(1)], "int");
        let captured = CapturedValue::capture(&list);
        if let Value::List(l) = &list {
            l.borrow_mut().elements.push(Value::Int(2));
        }
        assert_eq!(captured.to_string(), "[1]");
    }

    #[test]
    fn test_capture_breaks_cycles() {
        let node = Value::object("Node", BTreeMap::new());
        if let Value::Object(obj) = &node {
            obj.borrow_mut().attrs.insert("next".into(), node.clone());
        }
        let CapturedValue::Object { attrs, .. } = CapturedValue::capture(&node) else {
            panic!("expected object");
        };
        assert_eq!(
            attrs["next"],
            CapturedValue::Cycle {
                target: "Node".into()
            }
        );
    }

    #[test]
    fn test_shared_but_acyclic_is_copied_twice() {
        let shared = Value::list(vec![Value::Int(7)], "int");
        let outer = Value::list(vec![shared.clone(), shared], "[int]");
        assert_eq!(CapturedValue::capture(&outer).to_string(), "[[7], [7]]");
    }

    #[test]
    fn test_captured_wire_format() {
        let value = Value::list(vec![Value::Bool(true), Value::None], "object");
        assert_eq!(
            serde_json::to_value(CapturedValue::capture(&value)).unwrap(),
            serde_json::json!({
                "kind": "list",
                "elementType": "object",
                "elements": [{"kind": "bool", "value": true}, {"kind": "none"}]
            })
        );
    }

    #[test]
    fn test_recorder_overflow_discards_snapshots() {
        let mut recorder = Recorder::new(2);
        let env = crate::env::Environment::new();
        let stack = vec!["<module>".to_string()];
        for _ in 0..3 {
            recorder.on_statement(
                &StateView {
                    env: &env,
                    call_stack: &stack,
                },
                Span::default(),
            );
        }
        assert!(recorder.overflowed());
        recorder.write_line("done".into());
        let trace = recorder.finish(None);
        assert!(!trace.completed);
        assert!(trace.snapshots.is_empty());
        assert_eq!(trace.final_output, vec!["done"]);
    }
}
