//! Model providers and the process-wide provider cache.
//!
//! - `ProviderKind`: supported backend families
//! - `LLMProvider`: chat capability plus per-session history
//! - `HttpChatProvider`: OpenAI-compatible HTTP implementation
//! - `ProviderRegistry`: lazy `{kind}_{model}` cache shared across runs

mod gateway;
mod http;
mod kind;
mod registry;

pub use gateway::{LLMProvider, ProviderReply};
pub use http::HttpChatProvider;
pub use kind::ProviderKind;
pub use registry::ProviderRegistry;
