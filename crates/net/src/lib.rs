//! Lobby Network Library
//!
//! TCP transport between the chat feed and the reference message store.
//!
//! # Architecture
//!
//! - **Server**: Holds the message log, answers one request per frame
//! - **StoreClient**: Implements `MessageBackend` over a fresh connection per request
//! - **Protocol**: Length-prefixed JSON messages
//!
//! # Usage
//!
//! ```ignore
//! // Store side
//! let server = Server::start(7331, MemoryLog::new(), &ChatConfig::default()).await?;
//!
//! // Feed side
//! let client = StoreClient::new("127.0.0.1:7331", Duration::from_secs(10));
//! let (feed, mut events) = ChatFeed::new(Arc::new(client), ChatConfig::default(), None);
//! feed.open().await;
//! ```

pub mod client;
pub mod error;
mod frame;
pub mod protocol;
pub mod server;

pub use client::StoreClient;
pub use error::{Error, Result};
pub use protocol::{Request, Response};
pub use server::Server;
