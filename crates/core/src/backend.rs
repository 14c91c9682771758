//! Store contract consumed by the chat feed

use std::future::Future;

use crate::error::Result;
use crate::models::ChatMessage;

/// Remote message store.
///
/// Implementations report every failure as an error; the feed never
/// inspects the error kind.
pub trait MessageBackend: Send + Sync + 'static {
    /// Full current log, ascending by assignment order
    fn get_messages(&self) -> impl Future<Output = Result<Vec<ChatMessage>>> + Send;

    /// Append one message; the store assigns `id` and `timestamp`
    fn post_message(&self, sender: &str, text: &str) -> impl Future<Output = Result<()>> + Send;
}
