//! Run configuration: resource ceilings for one interpretation.

use serde::{Deserialize, Serialize};

/// Step ceiling shared by both execution modes.
pub const MAX_STEPS: u64 = 1_000_000;

/// Snapshot cap for trace mode.
pub const MAX_SNAPSHOTS: usize = 5_000;

/// Nested user-level calls allowed before a run faults.
pub const MAX_CALL_DEPTH: usize = 1_000;

/// Resource limits for a single run.
///
/// Deserializes from partial camelCase JSON; missing fields take their
/// defaults. The snake_case spellings are accepted as well.
///
/// ```
/// let limits: choco_eval::Limits = serde_json::from_str(r#"{"maxSteps": 500}"#).unwrap();
/// assert_eq!(limits.max_steps, 500);
/// assert_eq!(limits.max_snapshots, choco_eval::MAX_SNAPSHOTS);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Limits {
    /// Statements + expressions + loop checks counted before aborting.
    #[serde(alias = "max_steps")]
    pub max_steps: u64,
    /// Snapshots recorded before a trace is declared overflowed.
    #[serde(alias = "max_snapshots")]
    pub max_snapshots: usize,
    #[serde(alias = "max_call_depth")]
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: MAX_STEPS,
            max_snapshots: MAX_SNAPSHOTS,
            max_call_depth: MAX_CALL_DEPTH,
        }
    }
}

impl Limits {
    pub fn with_max_steps(mut self, max_steps: u64) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_max_snapshots(mut self, max_snapshots: usize) -> Self {
        self.max_snapshots = max_snapshots;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wire_keys_are_camel_case() {
        let limits = Limits::default().with_max_steps(10).with_max_snapshots(2);
        assert_eq!(
            serde_json::to_value(limits).unwrap(),
            json!({"maxSteps": 10, "maxSnapshots": 2, "maxCallDepth": MAX_CALL_DEPTH})
        );
    }

    #[test]
    fn test_partial_options_keep_defaults() {
        let limits: Limits = serde_json::from_str(r#"{"maxCallDepth": 50}"#).unwrap();
        assert_eq!(limits.max_call_depth, 50);
        assert_eq!(limits.max_steps, MAX_STEPS);

        let legacy: Limits = serde_json::from_str(r#"{"max_snapshots": 3}"#).unwrap();
        assert_eq!(legacy.max_snapshots, 3);
        assert_eq!(legacy.max_call_depth, MAX_CALL_DEPTH);
    }
}
