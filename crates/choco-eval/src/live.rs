//! Live mode: output is streamed to a [`Host`] as it happens and `input()`
//! blocks until the host supplies a line.

use crate::builtins::Console;
use crate::error::{EvalError, RuntimeFault};
use crate::evaluator::{Interpreter, Mode};
use crate::host::Host;
use crate::limits::Limits;
use choco_types::ast::Program;
use serde::Serialize;

/// Status text sent when a run ends normally.
pub const STATUS_FINISHED: &str = "finished";
/// Status text sent when a run ends with a fault.
pub const STATUS_ABORTED: &str = "aborted";

/// Live-mode strategy: forwards console traffic to the host.
pub struct LiveMode<'h, H: Host + ?Sized> {
    host: &'h mut H,
}

impl<'h, H: Host + ?Sized> LiveMode<'h, H> {
    pub fn new(host: &'h mut H) -> Self {
        Self { host }
    }
}

impl<H: Host + ?Sized> Console for LiveMode<'_, H> {
    fn write_line(&mut self, text: String) {
        self.host.emit_output(&text);
    }

    fn read_line(&mut self) -> Result<String, EvalError> {
        self.host
            .request_input()
            .ok_or(EvalError::InputUnavailable("input stream closed"))
    }
}

impl<H: Host + ?Sized> Mode for LiveMode<'_, H> {}

/// What a live run did.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub steps: u64,
    pub fault: Option<RuntimeFault>,
}

impl RunSummary {
    pub fn is_ok(&self) -> bool {
        self.fault.is_none()
    }
}

/// Run `program` against `host`.
///
/// A fault is reported to the host once, followed by a status event.
#[tracing::instrument(level = "debug", skip_all)]
pub fn run_live<H: Host + ?Sized>(program: &Program, host: &mut H, limits: Limits) -> RunSummary {
    let mut interpreter = Interpreter::new(program, LiveMode::new(host), limits);
    let fault = interpreter.run().err();
    let steps = interpreter.steps();
    drop(interpreter);

    match &fault {
        Some(fault) => {
            host.report_error(&fault.message(), fault.location);
            host.status(STATUS_ABORTED);
        }
        None => host.status(STATUS_FINISHED),
    }
    RunSummary { steps, fault }
}

#[cfg(not(target_arch = "wasm32"))]
pub use session::LiveSession;

#[cfg(not(target_arch = "wasm32"))]
mod session {
    use super::{run_live, RunSummary};
    use crate::host::{Event, EventKind, Host};
    use crate::limits::Limits;
    use choco_types::ast::Program;
    use choco_types::Span;
    use crossbeam::channel::{self, Receiver, Sender};
    use std::thread::{self, JoinHandle};

    /// A live run on its own thread, driven through channels.
    ///
    /// Events arrive on [`LiveSession::events`] as the program produces them.
    /// After an `input-request` event the worker waits for
    /// [`LiveSession::provide_input`]. Closing input, or dropping the
    /// session, makes a pending `input()` fault instead of waiting forever.
    pub struct LiveSession {
        events: Receiver<Event>,
        inputs: Option<Sender<String>>,
        worker: Option<JoinHandle<RunSummary>>,
    }

    impl LiveSession {
        pub fn spawn(program: Program, limits: Limits) -> Self {
            let (event_tx, event_rx) = channel::unbounded();
            let (input_tx, input_rx) = channel::unbounded();
            let worker = thread::spawn(move || {
                let mut host = ChannelHost {
                    events: event_tx,
                    inputs: input_rx,
                };
                run_live(&program, &mut host, limits)
            });
            Self {
                events: event_rx,
                inputs: Some(input_tx),
                worker: Some(worker),
            }
        }

        pub fn events(&self) -> &Receiver<Event> {
            &self.events
        }

        /// Queue a line for `input()`. Returns false once input is closed
        /// or the worker has exited.
        pub fn provide_input(&self, text: impl Into<String>) -> bool {
            self.inputs
                .as_ref()
                .is_some_and(|tx| tx.send(text.into()).is_ok())
        }

        pub fn close_input(&mut self) {
            self.inputs = None;
        }

        /// Close input and wait for the run to end.
        ///
        /// Returns `None` if the worker panicked.
        pub fn join(mut self) -> Option<RunSummary> {
            self.close_input();
            self.worker.take()?.join().ok()
        }
    }

    impl Drop for LiveSession {
        fn drop(&mut self) {
            self.inputs = None;
        }
    }

    struct ChannelHost {
        events: Sender<Event>,
        inputs: Receiver<String>,
    }

    impl ChannelHost {
        // The session may already be gone; the run still finishes.
        fn send(&self, event: Event) {
            let _ = self.events.send(event);
        }
    }

    impl Host for ChannelHost {
        fn emit_output(&mut self, text: &str) {
            self.send(Event::output(text));
        }

        fn request_input(&mut self) -> Option<String> {
            self.send(Event::new(EventKind::InputRequest, ""));
            self.inputs.recv().ok()
        }

        fn report_error(&mut self, message: &str, location: Option<Span>) {
            self.send(Event::error(message, location));
        }

        fn status(&mut self, text: &str) {
            self.send(Event::new(EventKind::Status, text));
        }
    }
}
