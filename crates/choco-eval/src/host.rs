//! The host side of a live run: output sink, input source, error channel.

use choco_types::Span;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// I/O capability a live run is driven through.
pub trait Host {
    fn emit_output(&mut self, text: &str);

    /// Block until the user supplies a line. `None` means no more input will come.
    fn request_input(&mut self) -> Option<String>;

    fn report_error(&mut self, message: &str, location: Option<Span>);

    /// Lifecycle notice ("finished", "aborted", ...).
    fn status(&mut self, _text: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    Output,
    Error,
    InputRequest,
    Status,
}

/// One entry in the live event stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub kind: EventKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Span>,
}

impl Event {
    pub fn new(kind: EventKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            location: None,
        }
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::new(EventKind::Output, text)
    }

    pub fn error(text: impl Into<String>, location: Option<Span>) -> Self {
        Self {
            kind: EventKind::Error,
            text: text.into(),
            location,
        }
    }
}

/// Host that records every event and answers input from a fixed queue.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    pub events: Vec<Event>,
    inputs: VecDeque<String>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inputs<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            events: Vec::new(),
            inputs: inputs.into_iter().map(Into::into).collect(),
        }
    }

    /// Text of the output events, in order.
    pub fn output(&self) -> Vec<&str> {
        self.texts(EventKind::Output)
    }

    pub fn errors(&self) -> Vec<&str> {
        self.texts(EventKind::Error)
    }

    fn texts(&self, kind: EventKind) -> Vec<&str> {
        self.events
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.text.as_str())
            .collect()
    }
}

impl Host for EventLog {
    fn emit_output(&mut self, text: &str) {
        self.events.push(Event::output(text));
    }

    fn request_input(&mut self) -> Option<String> {
        self.events.push(Event::new(EventKind::InputRequest, ""));
        self.inputs.pop_front()
    }

    fn report_error(&mut self, message: &str, location: Option<Span>) {
        self.events.push(Event::error(message, location));
    }

    fn status(&mut self, text: &str) {
        self.events.push(Event::new(EventKind::Status, text));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_wire_format() {
        let event = Event::new(EventKind::InputRequest, "");
        assert_eq!(
            serde_json::to_string(&event).unwrap(),
            r#"{"kind":"input-request","text":""}"#
        );
        let err = Event::error("Division by zero", Some(Span::new(2, 7, 2, 12)));
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!({"kind": "error", "text": "Division by zero", "location": [2, 7, 2, 12]})
        );
    }

    #[test]
    fn test_event_log_consumes_inputs_in_order() {
        let mut log = EventLog::with_inputs(["a", "b"]);
        assert_eq!(log.request_input().as_deref(), Some("a"));
        assert_eq!(log.request_input().as_deref(), Some("b"));
        assert_eq!(log.request_input(), None);
        assert_eq!(log.events.len(), 3);
        assert!(log.events.iter().all(|e| e.kind == EventKind::InputRequest));
    }
}
