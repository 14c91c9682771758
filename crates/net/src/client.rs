//! TCP client for the reference message store

use std::time::Duration;

use lobby_core::{ChatMessage, MessageBackend};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{Request, Response};

/// Client handle for the store.
///
/// Opens one connection per request, so a dropped server only fails the
/// request in flight. Every request is bounded by `timeout`.
#[derive(Debug, Clone)]
pub struct StoreClient {
    addr: String,
    timeout: Duration,
}

impl StoreClient {
    pub fn new(addr: impl Into<String>, timeout: Duration) -> Self {
        Self {
            addr: addr.into(),
            timeout,
        }
    }

    /// Send one request and wait for its response
    pub async fn request(&self, request: &Request) -> Result<Response> {
        let exchange = async {
            let mut stream = TcpStream::connect(&self.addr).await?;
            write_frame(&mut stream, request).await?;
            read_frame::<_, Response>(&mut stream).await
        };

        match tokio::time::timeout(self.timeout, exchange).await {
            Ok(result) => result,
            Err(_) => {
                warn!(addr = %self.addr, "Store request timed out");
                Err(Error::Timeout)
            }
        }
    }

    /// Full message log, ascending by id
    pub async fn fetch_messages(&self) -> Result<Vec<ChatMessage>> {
        match self.request(&Request::GetMessages).await? {
            Response::Messages { messages } => {
                debug!(count = messages.len(), "Fetched messages");
                Ok(messages)
            }
            Response::Error { reason } => Err(Error::Rejected(reason)),
            other => Err(unexpected(&other)),
        }
    }

    /// Append a message; returns it as stored
    pub async fn post(&self, sender: &str, text: &str) -> Result<ChatMessage> {
        let request = Request::PostMessage {
            sender: sender.to_string(),
            text: text.to_string(),
        };
        match self.request(&request).await? {
            Response::Posted { message } => Ok(message),
            Response::Error { reason } => Err(Error::Rejected(reason)),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(response: &Response) -> Error {
    Error::Protocol(format!("Unexpected response: {:?}", response))
}

impl MessageBackend for StoreClient {
    async fn get_messages(&self) -> lobby_core::Result<Vec<ChatMessage>> {
        Ok(self.fetch_messages().await?)
    }

    async fn post_message(&self, sender: &str, text: &str) -> lobby_core::Result<()> {
        self.post(sender, text).await?;
        Ok(())
    }
}
