//! Request models with validation at construction
//!
//! All user input is validated when converting into these types.
//! Invalid input returns ValidationError, not panic.

pub mod chat;
pub mod file;
pub mod pagination;
pub mod user;
pub mod validation;

pub use chat::ChatCompletionRequest;
pub use file::{FileName, UrlParams};
pub use pagination::{Pagination, PaginationParams};
pub use user::{UserPatch, UserRequest, UserResponse};
pub use validation::ValidationError;
