//! Lobby Core Library
//!
//! Chat message models, the polling chat feed, configuration, and storage
//! for the Lobby chat.

pub mod backend;
pub mod config;
pub mod error;
pub mod feed;
pub mod invariants;
pub mod models;
pub mod storage;

pub use backend::MessageBackend;
pub use config::{ChatConfig, LobbyConfig, StoreConfig, DEFAULT_PORT};
pub use error::{Error, Result};
pub use feed::{ChatFeed, FeedEvent, FeedPhase, FeedView, MessageItem, Rejection, SendOutcome};
pub use models::*;
pub use storage::{Database, MemoryLog, MessageLog, MessageStore, SessionStore};
