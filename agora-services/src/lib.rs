//! agora-services: integrations the HTTP layer calls out to
//!
//! - [`HttpClient`]: JSON over reqwest with exponential backoff
//! - [`ChatCompletion`]: chat-completion API behind [`ChatCompletionService`]
//! - [`S3Storage`]: S3 objects behind [`ObjectStorage`]
//! - [`ConnectionManager`]: registry of connected WebSocket clients

pub mod chat;
pub mod error;
pub mod http;
pub mod storage;
pub mod ws;

pub use chat::{ChatCompletion, ChatCompletionService, ChatMessage};
pub use error::{Result, ServiceError};
pub use http::{Backoff, HttpClient};
pub use storage::{ObjectStorage, S3Storage, StoredObject};
pub use ws::{ClientId, ConnectionManager};
