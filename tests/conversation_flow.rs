use async_trait::async_trait;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::sync::Arc;

use career_pal::models::Role;
use career_pal::services::{
    CompletionBackend, ConversationStore, RequestDispatcher, ERROR_REPLY,
};
use career_pal::ui::{InputAction, InputController};
use career_pal::ChatError;

/// Replies with a canned string, like the local dev server would.
struct CannedBackend(&'static str);

#[async_trait]
impl CompletionBackend for CannedBackend {
    async fn complete(&self, _prompt: &str) -> Result<Option<String>, ChatError> {
        Ok(Some(self.0.to_string()))
    }
}

struct FailingBackend;

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn complete(&self, _prompt: &str) -> Result<Option<String>, ChatError> {
        Err(ChatError::Status {
            status: reqwest::StatusCode::BAD_GATEWAY,
            body: "upstream down".to_string(),
        })
    }
}

fn type_str(input: &mut InputController, text: &str) {
    for ch in text.chars() {
        input.handle_key(KeyEvent::new(KeyCode::Char(ch), KeyModifiers::NONE));
    }
}

/// Drive one full round trip the way the event loop does: commit key, submit,
/// await the call, reconcile the outcome.
async fn press_enter_and_settle(
    input: &mut InputController,
    dispatcher: &mut RequestDispatcher,
    store: &mut ConversationStore,
) {
    let action = input.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
    assert_eq!(action, InputAction::Submitted);

    if let Some(call) = dispatcher.submit(store, input.text()) {
        input.clear();
        let outcome = call.await;
        dispatcher.finish(store, outcome);
    }
}

#[tokio::test]
async fn commit_key_matches_direct_submit() {
    let backend = Arc::new(CannedBackend("hi there"));

    // Via the commit key.
    let mut input = InputController::new();
    let mut dispatcher =
        RequestDispatcher::new(Arc::clone(&backend) as Arc<dyn CompletionBackend>);
    let mut via_key = ConversationStore::new();
    type_str(&mut input, "hello");
    press_enter_and_settle(&mut input, &mut dispatcher, &mut via_key).await;
    assert_eq!(input.text(), "", "accepted submit clears the buffer");

    // Direct submit with the same content.
    let mut dispatcher = RequestDispatcher::new(backend as Arc<dyn CompletionBackend>);
    let mut direct = ConversationStore::new();
    let call = dispatcher.submit(&mut direct, "hello").expect("accepted");
    let outcome = call.await;
    dispatcher.finish(&mut direct, outcome);

    let texts = |store: &ConversationStore| -> Vec<(Role, String)> {
        store
            .messages()
            .iter()
            .map(|m| (m.role, m.text.clone()))
            .collect()
    };
    assert_eq!(texts(&via_key), texts(&direct));
    assert_eq!(
        texts(&direct),
        vec![
            (Role::User, "hello".to_string()),
            (Role::Assistant, "hi there".to_string()),
        ]
    );
}

#[tokio::test]
async fn shift_enter_adds_a_newline_and_sends_nothing() {
    let backend = Arc::new(CannedBackend("unused"));
    let mut input = InputController::new();
    let mut dispatcher = RequestDispatcher::new(backend as Arc<dyn CompletionBackend>);
    let mut store = ConversationStore::new();

    type_str(&mut input, "hello");
    let action = input.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::SHIFT));
    assert_eq!(action, InputAction::Edited);
    assert_eq!(input.text(), "hello\n");
    assert!(store.is_empty());
    assert!(!dispatcher.is_sending());

    // The newline survives into the submitted prompt on the next commit.
    type_str(&mut input, "world");
    press_enter_and_settle(&mut input, &mut dispatcher, &mut store).await;
    assert_eq!(store.messages()[0].text, "hello\nworld");
}

#[tokio::test]
async fn failed_round_trip_shows_the_apology_not_the_cause() {
    let mut input = InputController::new();
    let mut dispatcher = RequestDispatcher::new(Arc::new(FailingBackend) as Arc<dyn CompletionBackend>);
    let mut store = ConversationStore::new();

    type_str(&mut input, "hello");
    press_enter_and_settle(&mut input, &mut dispatcher, &mut store).await;

    let messages = store.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].text, ERROR_REPLY);
    assert!(!messages[1].text.contains("upstream down"));
    assert!(!dispatcher.is_sending(), "idle again after a failure");
    type_str(&mut input, "try again");
    assert!(
        input.send_enabled(!dispatcher.is_sending()),
        "input is usable again after a failure"
    );
}
