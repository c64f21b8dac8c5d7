//! Route handlers organized by resource

pub mod ai;
pub mod files;
pub mod health;
pub mod users;
pub mod ws;
