use crate::models::{Message, Role};

/// Emitted synchronously after every transcript mutation.
#[derive(Debug, Clone)]
pub enum ConversationEvent {
    Appended(Message),
    Cleared,
}

type Listener = Box<dyn FnMut(&ConversationEvent)>;

/// The ordered transcript shown to the user.
///
/// Append-only apart from [`reset`](ConversationStore::reset). Dependents
/// (renderer dirty flag, scroll follow) register listeners instead of polling;
/// every mutation notifies them before the mutating call returns.
pub struct ConversationStore {
    messages: Vec<Message>,
    listeners: Vec<Listener>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            listeners: Vec::new(),
        }
    }

    /// Register a callback invoked after each append or reset.
    pub fn subscribe(&mut self, listener: Listener) {
        self.listeners.push(listener);
    }

    /// Append a new message and return a copy of the stored entry.
    pub fn append(&mut self, role: Role, text: &str) -> Message {
        let message = Message::new(role, text);
        self.messages.push(message.clone());
        self.notify(&ConversationEvent::Appended(message.clone()));
        message
    }

    /// Empty the transcript. No confirmation, no partial clears.
    pub fn reset(&mut self) {
        self.messages.clear();
        self.notify(&ConversationEvent::Cleared);
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    fn notify(&mut self, event: &ConversationEvent) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }
}

impl Default for ConversationStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashSet;
    use std::rc::Rc;

    #[test]
    fn append_preserves_order() {
        let mut store = ConversationStore::new();
        store.append(Role::User, "first");
        store.append(Role::Assistant, "second");
        store.append(Role::User, "third");

        let texts: Vec<&str> = store.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, ["first", "second", "third"]);
    }

    #[test]
    fn rapid_appends_get_unique_ids() {
        let mut store = ConversationStore::new();
        for i in 0..100 {
            store.append(Role::User, &format!("msg {i}"));
        }
        let ids: HashSet<_> = store.messages().iter().map(|m| m.id).collect();
        assert_eq!(ids.len(), 100);
    }

    #[test]
    fn reset_empties_the_transcript() {
        let mut store = ConversationStore::new();
        store.append(Role::User, "hello");
        store.append(Role::Assistant, "hi");
        store.reset();
        assert!(store.is_empty());
    }

    #[test]
    fn listeners_run_after_every_mutation() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);

        let mut store = ConversationStore::new();
        store.subscribe(Box::new(move |event| {
            sink.borrow_mut().push(match event {
                ConversationEvent::Appended(m) => format!("append:{}", m.text),
                ConversationEvent::Cleared => "cleared".to_string(),
            });
        }));

        store.append(Role::User, "hello");
        store.reset();

        assert_eq!(*seen.borrow(), ["append:hello", "cleared"]);
    }
}
