pub mod chat_client;
pub mod config_service;
pub mod conversation;
pub mod dispatcher;

pub use chat_client::{ChatClient, CompletionBackend};
pub use conversation::{ConversationEvent, ConversationStore};
pub use dispatcher::{DispatchState, PendingReply, RequestDispatcher, ERROR_REPLY, FALLBACK_REPLY};
