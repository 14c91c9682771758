//! Data models for Lobby

mod message;
mod user;

pub use message::*;
pub use user::*;
