//! Tree-walking interpreter for type-checked ChocoPy programs.
//!
//! One evaluation core runs in two modes:
//! - live mode ([`run_live`], [`LiveSession`]) streams output to a [`Host`]
//!   and blocks on `input()`;
//! - trace mode ([`run_trace`]) records a bounded list of [`Snapshot`]s and
//!   refuses programs that call `input()`.

mod builtins;
mod classes;
mod env;
mod error;
mod evaluator;
mod host;
mod input_scan;
mod limits;
mod live;
mod ops;
mod snapshot;
mod stack;
mod value;

pub use builtins::{Builtin, Console};
pub use classes::{AttrInfo, ClassInfo, ClassRegistry, ROOT_CLASS};
pub use env::{Environment, FrameId, GLOBAL_FRAME};
pub use error::{EvalError, EvalResult, FaultReport, RuntimeFault};
pub use evaluator::{Flow, Interpreter, Mode, StateView, MODULE_FRAME_NAME};
pub use host::{Event, EventKind, EventLog, Host};
pub use input_scan::reaches_input;
pub use limits::{Limits, MAX_CALL_DEPTH, MAX_SNAPSHOTS, MAX_STEPS};
pub use live::{run_live, LiveMode, RunSummary, STATUS_ABORTED, STATUS_FINISHED};
pub use snapshot::{run_trace, CapturedValue, Recorder, Snapshot, Trace};
pub use value::{ListData, ListRef, ObjectData, ObjectRef, Value};

#[cfg(not(target_arch = "wasm32"))]
pub use live::LiveSession;
