//! Repository implementations for database access
//!
//! Each repository borrows a [`Session`](crate::Session) for the length of
//! one unit of work and commits its own writes.

pub mod users;

pub use users::UserRepo;
