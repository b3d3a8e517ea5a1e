use futures::future::BoxFuture;
use std::sync::Arc;

use crate::error::ChatError;
use crate::models::Role;
use crate::services::chat_client::CompletionBackend;
use crate::services::conversation::ConversationStore;

/// Substituted when the server answers without a reply field, or with an
/// empty one.
pub const FALLBACK_REPLY: &str = "No response";

/// The one error text users ever see; the real error goes to the log.
pub const ERROR_REPLY: &str = "Error: Unable to get response. Please try again.";

/// The in-flight call produced by an accepted submit. Resolving it and feeding
/// the result to [`RequestDispatcher::finish`] completes the round trip.
pub type PendingReply = BoxFuture<'static, Result<Option<String>, ChatError>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Idle,
    Sending,
}

/// Single-flight request state machine.
///
/// `Idle --submit(valid)--> Sending --finish--> Idle`. The `Sending` flag is
/// the whole mutual exclusion: a submit while one call is in flight is
/// rejected outright, nothing is queued and nothing can be cancelled.
pub struct RequestDispatcher {
    state: DispatchState,
    backend: Arc<dyn CompletionBackend>,
}

impl RequestDispatcher {
    pub fn new(backend: Arc<dyn CompletionBackend>) -> Self {
        Self {
            state: DispatchState::Idle,
            backend,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn is_sending(&self) -> bool {
        self.state == DispatchState::Sending
    }

    /// Start a round trip for `raw`.
    ///
    /// Returns `None` without touching the transcript when the trimmed prompt
    /// is empty or a call is already in flight. Otherwise the user message is
    /// appended before the outbound future is handed back, so transcript order
    /// is always user-then-outcome. The caller clears its pending input
    /// exactly when this returns `Some`.
    pub fn submit(&mut self, store: &mut ConversationStore, raw: &str) -> Option<PendingReply> {
        let prompt = raw.trim();
        if prompt.is_empty() {
            return None;
        }
        if self.state == DispatchState::Sending {
            tracing::debug!("submit ignored: a request is already in flight");
            return None;
        }

        self.state = DispatchState::Sending;
        store.append(Role::User, prompt);

        let backend = Arc::clone(&self.backend);
        let prompt = prompt.to_string();
        Some(Box::pin(async move { backend.complete(&prompt).await }))
    }

    /// Reconcile a settled outcome into the transcript.
    ///
    /// Called for every outcome of the future returned by `submit`, success or
    /// failure; returning to `Idle` is unconditionally the last step, which is
    /// what re-enables the input surface after any exit path.
    pub fn finish(
        &mut self,
        store: &mut ConversationStore,
        outcome: Result<Option<String>, ChatError>,
    ) {
        match outcome {
            Ok(Some(reply)) if !reply.is_empty() => {
                store.append(Role::Assistant, &reply);
            }
            Ok(_) => {
                store.append(Role::Assistant, FALLBACK_REPLY);
            }
            Err(error) => {
                tracing::error!(%error, "chat request failed");
                store.append(Role::Assistant, ERROR_REPLY);
            }
        }
        self.state = DispatchState::Idle;
    }
}

/// Run an outbound call to completion on its own task.
///
/// A panic inside the backend settles as an error outcome instead of
/// vanishing, so `finish` still runs and the `Sending` state is released on
/// that exit path too.
pub async fn settle(call: PendingReply) -> Result<Option<String>, ChatError> {
    match tokio::spawn(call).await {
        Ok(outcome) => outcome,
        Err(join_error) => Err(ChatError::Task(join_error)),
    }
}
