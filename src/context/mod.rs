//! Conversation history for model providers.
//!
//! Each provider owns a [`ContextArena`] of append-only message logs keyed
//! by session id. Retries get their memory of earlier attempts from here.

mod arena;
mod message;

pub use arena::{ContextArena, ConversationContext};
pub use message::{ChatMessage, ChatRole, WireMessage};
