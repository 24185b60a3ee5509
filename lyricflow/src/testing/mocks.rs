//! Mock generation backends for testing.

use crate::errors::StageError;
use crate::executor::{BackendCall, GenerationBackend};
use crate::state::SongState;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

type Script = VecDeque<Result<String, String>>;

/// A backend that replays scripted responses and records every call.
///
/// Responses are keyed by call name and consumed in FIFO order; a call with
/// no remaining script entry gets the fallback text. Review calls can be
/// scripted per panel seat, with optional per-seat delays to scramble
/// completion order in fan-out tests.
pub struct ScriptedBackend {
    scripts: Mutex<HashMap<&'static str, Script>>,
    seat_responses: Mutex<HashMap<usize, Result<String, String>>>,
    seat_delays: Mutex<HashMap<usize, Duration>>,
    call_delays: Mutex<HashMap<&'static str, Duration>>,
    calls: Mutex<Vec<BackendCall>>,
    fallback: String,
}

impl ScriptedBackend {
    /// Creates a backend whose unscripted calls return `"stub output"`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            seat_responses: Mutex::new(HashMap::new()),
            seat_delays: Mutex::new(HashMap::new()),
            call_delays: Mutex::new(HashMap::new()),
            calls: Mutex::new(Vec::new()),
            fallback: "stub output".to_string(),
        }
    }

    /// Queues a successful response for a call name.
    pub fn script(&self, call_name: &'static str, output: impl Into<String>) {
        self.scripts
            .lock()
            .entry(call_name)
            .or_default()
            .push_back(Ok(output.into()));
    }

    /// Queues a failure for a call name.
    pub fn script_failure(&self, call_name: &'static str, message: impl Into<String>) {
        self.scripts
            .lock()
            .entry(call_name)
            .or_default()
            .push_back(Err(message.into()));
    }

    /// Drops any queued responses for a call name.
    pub fn clear_script(&self, call_name: &'static str) {
        self.scripts.lock().remove(call_name);
    }

    /// Fixes the response for one review-panel seat.
    pub fn respond_for_seat(&self, seat: usize, response: impl Into<String>) {
        self.seat_responses.lock().insert(seat, Ok(response.into()));
    }

    /// Makes one review-panel seat fail.
    pub fn fail_for_seat(&self, seat: usize, message: impl Into<String>) {
        self.seat_responses.lock().insert(seat, Err(message.into()));
    }

    /// Delays one review-panel seat's response.
    pub fn delay_seat(&self, seat: usize, delay: Duration) {
        self.seat_delays.lock().insert(seat, delay);
    }

    /// Delays every invocation of a call name.
    pub fn delay_call(&self, call_name: &'static str, delay: Duration) {
        self.call_delays.lock().insert(call_name, delay);
    }

    /// Returns every call made, in invocation order.
    #[must_use]
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().clone()
    }

    /// Returns the number of calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl Default for ScriptedBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedBackend")
            .field("calls", &self.call_count())
            .finish()
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn invoke(&self, call: BackendCall, _state: &SongState) -> Result<String, StageError> {
        self.calls.lock().push(call);

        let call_delay = self.call_delays.lock().get(call.name()).copied();
        if let Some(delay) = call_delay {
            tokio::time::sleep(delay).await;
        }

        if let BackendCall::ReviewLyrics { seat } = call {
            let seat_delay = self.seat_delays.lock().get(&seat).copied();
            if let Some(delay) = seat_delay {
                tokio::time::sleep(delay).await;
            }
            let scripted = self.seat_responses.lock().get(&seat).cloned();
            if let Some(result) = scripted {
                return result.map_err(StageError::Backend);
            }
        }

        let next = self
            .scripts
            .lock()
            .get_mut(call.name())
            .and_then(VecDeque::pop_front);
        match next {
            Some(Ok(output)) => Ok(output),
            Some(Err(message)) => Err(StageError::Backend(message)),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// A backend that answers every call with the same text.
#[derive(Debug, Clone)]
pub struct StaticBackend {
    response: String,
}

impl StaticBackend {
    /// Creates a backend returning `response` for every call.
    #[must_use]
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }
}

#[async_trait]
impl GenerationBackend for StaticBackend {
    async fn invoke(&self, _call: BackendCall, _state: &SongState) -> Result<String, StageError> {
        Ok(self.response.clone())
    }
}

/// A backend that fails every call.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    message: String,
}

impl FailingBackend {
    /// Creates a backend failing with `message`.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl GenerationBackend for FailingBackend {
    async fn invoke(&self, _call: BackendCall, _state: &SongState) -> Result<String, StageError> {
        Err(StageError::Backend(self.message.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures::seeded_state;

    #[tokio::test]
    async fn test_scripted_fifo_then_fallback() {
        let backend = ScriptedBackend::new();
        backend.script("draft_lyrics", "first");
        backend.script("draft_lyrics", "second");

        let state = seeded_state();
        assert_eq!(
            backend.invoke(BackendCall::DraftLyrics, &state).await.unwrap(),
            "first"
        );
        assert_eq!(
            backend.invoke(BackendCall::DraftLyrics, &state).await.unwrap(),
            "second"
        );
        assert_eq!(
            backend.invoke(BackendCall::DraftLyrics, &state).await.unwrap(),
            "stub output"
        );
        assert_eq!(backend.call_count(), 3);
    }

    #[tokio::test]
    async fn test_scripted_failure() {
        let backend = ScriptedBackend::new();
        backend.script_failure("score_lyrics", "scorer offline");

        let err = backend
            .invoke(BackendCall::ScoreLyrics, &seeded_state())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "scorer offline");
    }

    #[tokio::test]
    async fn test_seat_responses_are_stable() {
        let backend = ScriptedBackend::new();
        backend.respond_for_seat(2, "seat two");

        let state = seeded_state();
        let call = BackendCall::ReviewLyrics { seat: 2 };
        assert_eq!(backend.invoke(call, &state).await.unwrap(), "seat two");
        assert_eq!(backend.invoke(call, &state).await.unwrap(), "seat two");
    }

    #[tokio::test]
    async fn test_failing_backend() {
        let backend = FailingBackend::new("down for maintenance");
        let err = backend
            .invoke(BackendCall::DraftLyrics, &seeded_state())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("maintenance"));
    }
}
