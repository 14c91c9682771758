//! TCP server for the reference message store
//!
//! Accepts connections, answers `GetMessages` with the full log and
//! appends `PostMessage` requests. A connection may carry any number of
//! request/response exchanges.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use lobby_core::{validate_text, ChatConfig, MessageLog, Username};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{broadcast, Mutex};
use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::frame::{read_frame, write_frame};
use crate::protocol::{Request, Response};

/// Maximum number of concurrent connections
const MAX_CONNECTIONS: usize = 256;

/// Server state shared across tasks
struct ServerState {
    log: Mutex<Box<dyn MessageLog + Send>>,
    max_message_length: usize,
    max_sender_name_length: usize,
    connections: AtomicUsize,
}

/// Store server handle
pub struct Server {
    addr: SocketAddr,
    shutdown_tx: broadcast::Sender<()>,
}

impl Server {
    /// Start a new server on the given port, all interfaces
    pub async fn start<L>(port: u16, log: L, limits: &ChatConfig) -> Result<Self>
    where
        L: MessageLog + Send + 'static,
    {
        Self::bind(SocketAddr::from(([0, 0, 0, 0], port)), log, limits).await
    }

    /// Start a new server on a specific address
    pub async fn bind<L>(addr: SocketAddr, log: L, limits: &ChatConfig) -> Result<Self>
    where
        L: MessageLog + Send + 'static,
    {
        let listener = TcpListener::bind(addr).await?;
        let bound_addr = listener.local_addr()?;

        let existing = log.len()?;
        info!(addr = %bound_addr, messages = existing, "Store server started");

        let (shutdown_tx, _) = broadcast::channel(1);

        let state = Arc::new(ServerState {
            log: Mutex::new(Box::new(log)),
            max_message_length: limits.max_message_length,
            max_sender_name_length: limits.max_sender_name_length,
            connections: AtomicUsize::new(0),
        });

        tokio::spawn(accept_loop(listener, state, shutdown_tx.clone()));

        Ok(Server {
            addr: bound_addr,
            shutdown_tx,
        })
    }

    /// Get the server's bound address
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(());
        info!("Server shutdown initiated");
    }
}

/// Accept incoming connections
async fn accept_loop(
    listener: TcpListener,
    state: Arc<ServerState>,
    shutdown_tx: broadcast::Sender<()>,
) {
    let mut shutdown_rx = shutdown_tx.subscribe();

    loop {
        tokio::select! {
            result = listener.accept() => {
                match result {
                    Ok((stream, addr)) => {
                        debug!(addr = %addr, "New connection");
                        let state = state.clone();
                        let shutdown_rx = shutdown_tx.subscribe();
                        tokio::spawn(handle_connection(stream, addr, state, shutdown_rx));
                    }
                    Err(e) => {
                        error!(error = %e, "Accept failed");
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                info!("Accept loop shutting down");
                break;
            }
        }
    }
}

/// Handle a single client connection
async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    let active = state.connections.fetch_add(1, Ordering::SeqCst) + 1;
    if active > MAX_CONNECTIONS {
        warn!(addr = %addr, active, "Too many connections");
        let _ = write_frame(
            &mut stream,
            &Response::Error {
                reason: Error::ServerFull.to_string(),
            },
        )
        .await;
        state.connections.fetch_sub(1, Ordering::SeqCst);
        return;
    }

    loop {
        let request: Request = tokio::select! {
            result = read_frame(&mut stream) => match result {
                Ok(request) => request,
                Err(Error::ConnectionClosed) => {
                    debug!(addr = %addr, "Connection closed");
                    break;
                }
                Err(e) => {
                    warn!(addr = %addr, error = %e, "Read error");
                    break;
                }
            },
            _ = shutdown_rx.recv() => break,
        };

        let response = handle_request(request, &state).await;
        if let Err(e) = write_frame(&mut stream, &response).await {
            debug!(addr = %addr, error = %e, "Write failed");
            break;
        }
    }

    state.connections.fetch_sub(1, Ordering::SeqCst);
}

/// Answer one request
async fn handle_request(request: Request, state: &ServerState) -> Response {
    match request {
        Request::GetMessages => match state.log.lock().await.snapshot() {
            Ok(messages) => Response::Messages { messages },
            Err(e) => {
                error!(error = %e, "Failed to read log");
                Response::Error {
                    reason: "Store unavailable".into(),
                }
            }
        },
        Request::PostMessage { sender, text } => {
            let sender = match Username::parse(&sender, state.max_sender_name_length) {
                Ok(sender) => sender,
                Err(e) => return Response::Error { reason: e.to_string() },
            };
            let text = match validate_text(&text, state.max_message_length) {
                Ok(text) => text,
                Err(e) => return Response::Error { reason: e.to_string() },
            };

            match state.log.lock().await.append(sender.as_str(), text) {
                Ok(message) => {
                    debug!(id = message.id, sender = %message.sender, "Message appended");
                    Response::Posted { message }
                }
                Err(e) => {
                    error!(error = %e, "Failed to append message");
                    Response::Error {
                        reason: "Store unavailable".into(),
                    }
                }
            }
        }
    }
}
