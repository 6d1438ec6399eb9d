use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU8, Ordering};

/// Recording-session state machine.
///
/// State transitions:
/// - Idle -> Recording (toggle, device selected, stream opened)
/// - Recording -> Transcribing (toggle, non-empty buffer handed to the worker)
/// - Recording -> Idle (toggle, empty buffer: nothing to transcribe)
/// - Transcribing -> Idle (worker completion, success or failure)
///
/// A toggle while Transcribing is ignored; a new recording cannot start until
/// the in-flight transcription completes. Capture may only be active while
/// Recording and the worker only while Transcribing, so the two never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum SessionState {
    /// Ready to record, no active capture or worker.
    Idle = 0,
    /// Actively capturing microphone audio.
    Recording = 1,
    /// Background worker is running the model on a finished buffer.
    Transcribing = 2,
}

impl SessionState {
    /// Check if a recording can be started from this state.
    #[must_use]
    pub fn can_start_recording(&self) -> bool {
        matches!(self, SessionState::Idle)
    }

    /// Check if a recording can be stopped from this state.
    #[must_use]
    pub fn can_stop_recording(&self) -> bool {
        matches!(self, SessionState::Recording)
    }

    /// Check if the model may be swapped in this state.
    /// The worker reads the model reference, so swaps are Idle-only.
    #[must_use]
    pub fn can_switch_model(&self) -> bool {
        matches!(self, SessionState::Idle)
    }
}

impl From<u8> for SessionState {
    fn from(value: u8) -> Self {
        match value {
            1 => SessionState::Recording,
            2 => SessionState::Transcribing,
            _ => SessionState::Idle,
        }
    }
}

impl From<SessionState> for u8 {
    fn from(state: SessionState) -> Self {
        state as u8
    }
}

/// Atomic wrapper for SessionState for lock-free reads.
#[derive(Debug)]
pub struct AtomicSessionState(AtomicU8);

impl AtomicSessionState {
    pub fn new(state: SessionState) -> Self {
        Self(AtomicU8::new(state.into()))
    }

    pub fn load(&self) -> SessionState {
        self.0.load(Ordering::Acquire).into()
    }

    pub fn store(&self, state: SessionState) {
        self.0.store(state.into(), Ordering::Release);
    }

    /// Compare and swap, returns true if successful.
    pub fn compare_exchange(&self, current: SessionState, new: SessionState) -> bool {
        self.0
            .compare_exchange(
                current.into(),
                new.into(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_ok()
    }
}

impl Default for AtomicSessionState {
    fn default() -> Self {
        Self::new(SessionState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_state_can_start_recording() {
        assert!(SessionState::Idle.can_start_recording());
        assert!(!SessionState::Recording.can_start_recording());
        assert!(!SessionState::Transcribing.can_start_recording());
    }

    #[test]
    fn test_session_state_can_stop_recording() {
        assert!(!SessionState::Idle.can_stop_recording());
        assert!(SessionState::Recording.can_stop_recording());
        assert!(!SessionState::Transcribing.can_stop_recording());
    }

    #[test]
    fn test_session_state_can_switch_model() {
        assert!(SessionState::Idle.can_switch_model());
        assert!(!SessionState::Recording.can_switch_model());
        assert!(!SessionState::Transcribing.can_switch_model());
    }

    #[test]
    fn test_session_state_roundtrip() {
        for state in [
            SessionState::Idle,
            SessionState::Recording,
            SessionState::Transcribing,
        ] {
            let value: u8 = state.into();
            let recovered: SessionState = value.into();
            assert_eq!(state, recovered);
        }
    }

    #[test]
    fn test_atomic_session_state() {
        let atomic = AtomicSessionState::default();
        assert_eq!(atomic.load(), SessionState::Idle);

        atomic.store(SessionState::Recording);
        assert_eq!(atomic.load(), SessionState::Recording);

        // Successful CAS
        assert!(atomic.compare_exchange(SessionState::Recording, SessionState::Transcribing));
        assert_eq!(atomic.load(), SessionState::Transcribing);

        // Failed CAS (wrong current value)
        assert!(!atomic.compare_exchange(SessionState::Recording, SessionState::Idle));
        assert_eq!(atomic.load(), SessionState::Transcribing);
    }
}
