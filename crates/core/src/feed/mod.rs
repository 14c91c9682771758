//! Chat sync client
//!
//! Keeps a local copy of the store's message log fresh while the panel is
//! open, and posts new messages optimistically.
//!
//! # Lifecycle
//!
//! - **Closed**: no polling. The cache is kept so reopening shows the last
//!   known messages immediately.
//! - **Opening**: one fetch in flight.
//! - **Open**: a background refresh runs every `poll_interval`.
//!
//! Every successful fetch replaces the cache wholesale. Results of a fetch
//! issued before the most recent open/close are discarded.

mod view;

use std::sync::Arc;

use tokio::sync::{mpsc, oneshot, Mutex, RwLock};
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::backend::MessageBackend;
use crate::config::ChatConfig;
use crate::invariants::find_order_violation;
use crate::models::{ChatMessage, Username};

pub use view::{FeedView, MessageItem};

/// Capacity of the feed event channel
const EVENT_CHANNEL_SIZE: usize = 64;

/// Panel visibility phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Closed,
    Opening,
    Open,
}

/// Notification for the UI layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEvent {
    /// The cache was replaced by a fresh snapshot
    Refreshed { count: usize },
    /// The first fetch after open resolved, successfully or not
    Opened,
    /// A post failed; the attempted text is back in the input
    SendFailed { reason: String },
}

/// Why a send was refused locally
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Nothing but whitespace
    Empty,
    /// Another send has not resolved yet
    AlreadySending,
    /// No display name chosen
    NoSession,
    /// Longer than `max_message_length`
    TooLong,
}

/// Result of a send attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    Sent,
    /// Refused before any network call; nothing surfaced to the user
    Rejected(Rejection),
    /// The store did not accept the message
    Failed,
}

/// A send between "input cleared" and "store answered"
#[derive(Debug)]
struct PendingSend {
    /// Exactly what was in the input, restored on failure
    attempted: String,
    /// Trimmed text sent to the store
    body: String,
    sender: Username,
}

struct FeedState {
    phase: FeedPhase,
    /// Bumped on every open and close
    generation: u64,
    messages: Vec<ChatMessage>,
    /// At least one snapshot has been applied
    loaded: bool,
    input: String,
    sending: bool,
    username: Option<Username>,
}

/// Chat feed handle
pub struct ChatFeed<B> {
    backend: Arc<B>,
    config: ChatConfig,
    state: Arc<RwLock<FeedState>>,
    event_tx: mpsc::Sender<FeedEvent>,
    /// Stops the poll loop when fired or dropped
    poll_stop: Mutex<Option<oneshot::Sender<()>>>,
}

impl<B: MessageBackend> ChatFeed<B> {
    /// Create a closed feed and the receiver for its events
    pub fn new(
        backend: Arc<B>,
        config: ChatConfig,
        username: Option<Username>,
    ) -> (Self, mpsc::Receiver<FeedEvent>) {
        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_SIZE);

        let state = Arc::new(RwLock::new(FeedState {
            phase: FeedPhase::Closed,
            generation: 0,
            messages: Vec::new(),
            loaded: false,
            input: String::new(),
            sending: false,
            username,
        }));

        let feed = Self {
            backend,
            config,
            state,
            event_tx,
            poll_stop: Mutex::new(None),
        };
        (feed, event_rx)
    }

    /// Show the panel: fetch once, then poll. No-op if already open.
    pub async fn open(&self) {
        let mut poll_stop = self.poll_stop.lock().await;

        let generation = {
            let mut s = self.state.write().await;
            if s.phase != FeedPhase::Closed {
                return;
            }
            s.generation += 1;
            s.phase = FeedPhase::Opening;
            s.generation
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        *poll_stop = Some(stop_tx);

        tokio::spawn(poll_task(
            self.backend.clone(),
            self.state.clone(),
            self.event_tx.clone(),
            generation,
            self.config.poll_interval(),
            stop_rx,
        ));

        info!(generation, "Chat panel opened");
    }

    /// Hide the panel and stop polling. The cache is kept.
    ///
    /// Requests already in flight are not cancelled; their results are
    /// dropped when they arrive.
    pub async fn close(&self) {
        let mut poll_stop = self.poll_stop.lock().await;

        {
            let mut s = self.state.write().await;
            if s.phase == FeedPhase::Closed {
                return;
            }
            s.generation += 1;
            s.phase = FeedPhase::Closed;
        }

        if let Some(stop_tx) = poll_stop.take() {
            let _ = stop_tx.send(());
        }

        info!("Chat panel closed");
    }

    /// Fetch the full log and replace the cache.
    ///
    /// Returns true if the snapshot was applied. Failures leave the cache
    /// untouched and are not surfaced.
    pub async fn refresh(&self) -> bool {
        let generation = self.state.read().await.generation;
        refresh_snapshot(&*self.backend, &self.state, &self.event_tx, generation).await
    }

    /// Send `text` as the current user.
    ///
    /// The input is cleared before the store answers. On failure it is
    /// restored to exactly `text` and a `SendFailed` event is emitted.
    pub async fn send(&self, text: &str) -> SendOutcome {
        let pending = match self.begin_send(text).await {
            Ok(pending) => pending,
            Err(rejection) => {
                debug!(?rejection, "Send refused");
                return SendOutcome::Rejected(rejection);
            }
        };

        match self
            .backend
            .post_message(pending.sender.as_str(), &pending.body)
            .await
        {
            Ok(()) => {
                // Show the store's copy with its real id, not a local one
                self.refresh().await;
                self.commit(pending).await;
                SendOutcome::Sent
            }
            Err(e) => {
                warn!(error = %e, "Failed to send message");
                self.restore(pending).await;
                self.emit(FeedEvent::SendFailed {
                    reason: e.to_string(),
                });
                SendOutcome::Failed
            }
        }
    }

    /// Send whatever is in the input
    pub async fn submit(&self) -> SendOutcome {
        let text = self.input().await;
        self.send(&text).await
    }

    /// Clear the input and mark the feed as sending
    async fn begin_send(&self, text: &str) -> Result<PendingSend, Rejection> {
        let mut s = self.state.write().await;

        if s.sending {
            return Err(Rejection::AlreadySending);
        }
        let body = text.trim();
        if body.is_empty() {
            return Err(Rejection::Empty);
        }
        if body.chars().count() > self.config.max_message_length {
            return Err(Rejection::TooLong);
        }
        let sender = s.username.clone().ok_or(Rejection::NoSession)?;

        s.sending = true;
        s.input.clear();

        Ok(PendingSend {
            attempted: text.to_string(),
            body: body.to_string(),
            sender,
        })
    }

    async fn commit(&self, pending: PendingSend) {
        let mut s = self.state.write().await;
        s.sending = false;
        debug!(sender = %pending.sender, "Message sent");
    }

    async fn restore(&self, pending: PendingSend) {
        let mut s = self.state.write().await;
        s.input = pending.attempted;
        s.sending = false;
    }

    fn emit(&self, event: FeedEvent) {
        emit(&self.event_tx, event);
    }

    /// Replace the input, capped at `max_message_length` characters
    pub async fn set_input(&self, text: &str) {
        let capped: String = text.chars().take(self.config.max_message_length).collect();
        self.state.write().await.input = capped;
    }

    pub async fn input(&self) -> String {
        self.state.read().await.input.clone()
    }

    pub async fn set_username(&self, username: Option<Username>) {
        self.state.write().await.username = username;
    }

    pub async fn username(&self) -> Option<Username> {
        self.state.read().await.username.clone()
    }

    pub async fn phase(&self) -> FeedPhase {
        self.state.read().await.phase
    }

    pub async fn is_sending(&self) -> bool {
        self.state.read().await.sending
    }

    /// Copy of the cached log
    pub async fn messages(&self) -> Vec<ChatMessage> {
        self.state.read().await.messages.clone()
    }

    /// Current panel contents
    pub async fn view(&self) -> FeedView {
        let s = self.state.read().await;
        match s.phase {
            FeedPhase::Closed => FeedView::Closed,
            FeedPhase::Opening if !s.loaded => FeedView::Loading,
            _ if s.messages.is_empty() => FeedView::Empty,
            _ => {
                let username = s.username.as_ref().map(Username::as_str);
                FeedView::Messages(
                    s.messages
                        .iter()
                        .map(|m| MessageItem::from_message(m, username))
                        .collect(),
                )
            }
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }
}

/// Initial fetch, then one refresh per tick until stopped
async fn poll_task<B: MessageBackend>(
    backend: Arc<B>,
    state: Arc<RwLock<FeedState>>,
    event_tx: mpsc::Sender<FeedEvent>,
    generation: u64,
    period: std::time::Duration,
    mut stop_rx: oneshot::Receiver<()>,
) {
    refresh_snapshot(&*backend, &state, &event_tx, generation).await;

    let opened = {
        let mut s = state.write().await;
        let current = s.generation == generation && s.phase == FeedPhase::Opening;
        if current {
            s.phase = FeedPhase::Open;
        }
        current
    };
    if opened {
        emit(&event_tx, FeedEvent::Opened);
    }

    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => break,
            _ = ticker.tick() => {}
        }

        if state.read().await.generation != generation {
            break;
        }

        refresh_snapshot(&*backend, &state, &event_tx, generation).await;
    }

    debug!(generation, "Poll loop stopped");
}

/// Fetch and apply one snapshot issued under `generation`
async fn refresh_snapshot<B: MessageBackend>(
    backend: &B,
    state: &RwLock<FeedState>,
    event_tx: &mpsc::Sender<FeedEvent>,
    generation: u64,
) -> bool {
    let messages = match backend.get_messages().await {
        Ok(messages) => messages,
        Err(e) => {
            debug!(error = %e, "Fetch failed, keeping cached messages");
            return false;
        }
    };

    if let Some((prev, next)) = find_order_violation(&messages) {
        warn!(prev, next, "Store returned messages out of id order");
    }

    let count = messages.len();
    {
        let mut s = state.write().await;
        if s.generation != generation {
            debug!(
                generation,
                current = s.generation,
                "Discarding stale snapshot"
            );
            return false;
        }
        s.messages = messages;
        s.loaded = true;
    }

    emit(event_tx, FeedEvent::Refreshed { count });
    true
}

fn emit(event_tx: &mpsc::Sender<FeedEvent>, event: FeedEvent) {
    if let Err(mpsc::error::TrySendError::Full(event)) = event_tx.try_send(event) {
        debug!(?event, "Event channel full, dropping event");
    }
}
