use serde::Serialize;

use crate::domain::session::SessionState;

/// Events published by the session controller.
///
/// The controller is the single publisher; the shell (and tests) subscribe
/// through a broadcast channel, so no subscriber can affect the session.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum SessionEvent {
    /// Session state changed.
    StateChanged {
        from: SessionState,
        to: SessionState,
    },
    /// Human-readable log line for the shell's log pane.
    Log { message: String },
    /// A transcription completed and its text was placed on the clipboard.
    TranscriptReady { text: String },
    /// Input level update while recording (RMS, 0.0 - 1.0).
    Level { rms: f32 },
}

impl SessionEvent {
    pub fn log(message: impl Into<String>) -> Self {
        SessionEvent::Log {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_serialize_tagged() {
        let ev = SessionEvent::StateChanged {
            from: SessionState::Idle,
            to: SessionState::Recording,
        };
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "state_changed");
        assert_eq!(json["data"]["from"], "Idle");
        assert_eq!(json["data"]["to"], "Recording");

        let ev = SessionEvent::log("hello");
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["type"], "log");
        assert_eq!(json["data"]["message"], "hello");
    }
}
