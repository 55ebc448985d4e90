//! Event scripts.
//!
//! A script is JSON lines, one [`ScriptStep`] per line, tagged by `type`:
//!
//! ```text
//! {"type": "connected"}
//! {"type": "presence_state", "payload": {"alice": {"metas": [...]}}}
//! {"type": "compose", "text": "hello"}
//! {"type": "send"}
//! {"type": "ack", "ok": false, "reason": "timeout"}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use serde::Deserialize;
use serde_json::Value;

use crate::ReplayError;

/// One scripted event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptStep {
    /// Channel joined.
    Connected,
    /// Channel lost.
    Disconnected,
    /// Full presence state.
    PresenceState {
        /// Raw presence payload.
        payload: Value,
    },
    /// Presence diff.
    PresenceDiff {
        /// Raw diff payload.
        payload: Value,
    },
    /// Custom channel event.
    Message {
        /// Event name.
        event: String,
        /// Raw event payload.
        payload: Value,
    },
    /// Replace the composed text.
    Compose {
        /// New text.
        text: String,
    },
    /// Push the composed text.
    Send,
    /// Acknowledge the oldest pushed message.
    Ack {
        /// Whether the server accepted it.
        #[serde(default = "accepted")]
        ok: bool,
        /// Failure reason reported when `ok` is false.
        #[serde(default)]
        reason: Option<String>,
    },
}

fn accepted() -> bool {
    true
}

/// A step with its 1-based line number.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberedStep {
    /// Line in the script.
    pub line: usize,
    /// Parsed step.
    pub step: ScriptStep,
}

/// Parse a whole script.
///
/// # Errors
///
/// `ReplayError::Parse` for the first line that is not a valid step.
pub fn parse_script(input: &str) -> Result<Vec<NumberedStep>, ReplayError> {
    let mut steps = Vec::new();

    for (index, raw) in input.lines().enumerate() {
        let line = index + 1;
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let step = serde_json::from_str(trimmed)
            .map_err(|source| ReplayError::Parse { line, source })?;
        steps.push(NumberedStep { line, step });
    }

    Ok(steps)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_tagged_steps() {
        let script = r#"
# join the lobby
{"type": "connected"}
{"type": "presence_state", "payload": {}}

{"type": "compose", "text": "hi"}
{"type": "ack"}
{"type": "ack", "ok": false, "reason": "timeout"}
"#;

        let steps = parse_script(script).unwrap();

        assert_eq!(
            steps,
            vec![
                NumberedStep { line: 3, step: ScriptStep::Connected },
                NumberedStep { line: 4, step: ScriptStep::PresenceState { payload: json!({}) } },
                NumberedStep { line: 6, step: ScriptStep::Compose { text: "hi".into() } },
                NumberedStep { line: 7, step: ScriptStep::Ack { ok: true, reason: None } },
                NumberedStep {
                    line: 8,
                    step: ScriptStep::Ack { ok: false, reason: Some("timeout".into()) }
                },
            ]
        );
    }

    #[test]
    fn reports_line_of_bad_step() {
        let script = "{\"type\": \"connected\"}\n{\"type\": \"teleport\"}\n";

        let err = parse_script(script).unwrap_err();

        assert!(matches!(err, ReplayError::Parse { line: 2, .. }));
    }
}
