//! Persisted entities
//!
//! Every table carries `created_at`/`updated_at` timestamps defaulting to
//! `NOW()`. Deleting a user cascades to its posts, likes and comments.

pub mod comment;
pub mod like;
pub mod post;
pub mod user;

pub use comment::Comment;
pub use like::Like;
pub use post::Post;
pub use user::{FilterValue, NewUser, User, UserField, UserFilter, UserUpdate};

use crate::registry::{Registry, RegistryBuilder};

/// Registry with every agora entity, parents first.
pub fn registry() -> Registry {
    try_registry().expect("built-in entity registry is consistent")
}

fn try_registry() -> crate::Result<Registry> {
    Ok(RegistryBuilder::new()
        .register::<User>()?
        .register::<Post>()?
        .register::<Like>()?
        .register::<Comment>()?
        .build())
}
