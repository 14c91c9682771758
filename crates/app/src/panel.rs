//! Terminal chat panel
//!
//! Reads commands and messages from stdin, drives a `ChatFeed`, and prints
//! the log as it changes.

use std::sync::Arc;

use anyhow::Result;
use lobby_core::{
    ChatFeed, Error as CoreError, FeedEvent, FeedView, MessageItem, SendOutcome, Username,
};
use lobby_net::StoreClient;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing::debug;

use crate::state::AppState;

type Input = Lines<BufReader<Stdin>>;

/// One line typed at the prompt
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    Open,
    Close,
    /// Forget the name and choose another
    Rename,
    Quit,
    Help,
    Message(String),
    /// Blank line
    Nothing,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim() {
            "" => Command::Nothing,
            "/open" => Command::Open,
            "/close" => Command::Close,
            "/name" => Command::Rename,
            "/quit" | "/exit" => Command::Quit,
            "/help" => Command::Help,
            _ => Command::Message(line.to_string()),
        }
    }
}

const HELP: &str = "\
/open  show the chat
/close hide the chat
/name  change your name
/quit  exit";

/// Turns feed views into printable lines, remembering what was shown
#[derive(Debug, Default)]
pub struct Renderer {
    last_shown: Option<u64>,
    /// Last full render was the loading placeholder
    loading: bool,
}

impl Renderer {
    /// Header plus every row
    pub fn full(&mut self, view: &FeedView) -> Vec<String> {
        self.loading = matches!(view, FeedView::Loading);
        let mut lines = Vec::new();
        match view {
            FeedView::Closed => {
                lines.push("Chat closed. Type /open to show it.".to_string());
                return lines;
            }
            FeedView::Loading => lines.push("Loading messages...".to_string()),
            FeedView::Empty => {
                lines.push(format!("-- Chat ({}) --", view.header()));
                lines.push("No messages yet. Start the conversation!".to_string());
            }
            FeedView::Messages(items) => {
                lines.push(format!("-- Chat ({}) --", view.header()));
                lines.extend(items.iter().map(format_row));
            }
        }
        self.last_shown = last_id(view);
        lines
    }

    /// Only rows newer than the last one printed. Redraws everything after
    /// the loading placeholder, or if the log no longer reaches the last
    /// printed row.
    pub fn incremental(&mut self, view: &FeedView) -> Vec<String> {
        let items = match view {
            FeedView::Closed | FeedView::Loading => return Vec::new(),
            FeedView::Empty if self.stale() => return self.full(view),
            FeedView::Empty => return Vec::new(),
            FeedView::Messages(items) => items,
        };

        match self.last_shown {
            Some(shown) if last_id(view).is_some_and(|id| id < shown) => self.full(view),
            Some(shown) => {
                let lines: Vec<String> = items
                    .iter()
                    .filter(|item| item.id > shown)
                    .map(format_row)
                    .collect();
                self.last_shown = last_id(view);
                lines
            }
            None => self.full(view),
        }
    }
}

impl Renderer {
    /// Something is on screen that an empty log must replace
    fn stale(&self) -> bool {
        self.loading || self.last_shown.is_some()
    }
}

fn last_id(view: &FeedView) -> Option<u64> {
    match view {
        FeedView::Messages(items) => items.last().map(|item| item.id),
        _ => None,
    }
}

pub fn format_row(item: &MessageItem) -> String {
    if item.is_own {
        format!("[{}] {} (you): {}", item.time, item.sender, item.text)
    } else {
        format!("[{}] {}: {}", item.time, item.sender, item.text)
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

/// Ask for a name until a valid one is given. None on end of input.
pub async fn prompt_name(state: &AppState, input: &mut Input) -> Result<Option<Username>> {
    loop {
        println!("What should we call you?");
        let Some(line) = input.next_line().await? else {
            return Ok(None);
        };
        match state.choose_name(&line) {
            Ok(name) => return Ok(Some(name)),
            Err(CoreError::InvalidUsername(reason)) => println!("{}", reason),
            Err(e) => return Err(e.into()),
        }
    }
}

/// Run the panel until `/quit` or end of input
pub async fn run(state: AppState, client: StoreClient) -> Result<()> {
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    let username = match state.saved_name()? {
        Some(name) => name,
        None => match prompt_name(&state, &mut input).await? {
            Some(name) => name,
            None => return Ok(()),
        },
    };
    println!("Hi {}! Type /open to see the chat, /help for commands.", username);

    let chat_config = state.config.chat.clone();
    let (feed, mut events) = ChatFeed::new(Arc::new(client), chat_config, Some(username));
    let feed = Arc::new(feed);
    let (outcome_tx, mut outcomes) = mpsc::channel::<SendOutcome>(16);
    let mut renderer = Renderer::default();

    loop {
        tokio::select! {
            line = input.next_line() => {
                let Some(line) = line? else { break };
                match Command::parse(&line) {
                    Command::Nothing => {}
                    Command::Help => println!("{}", HELP),
                    Command::Quit => break,
                    Command::Open => {
                        feed.open().await;
                        print_lines(renderer.full(&feed.view().await));
                    }
                    Command::Close => {
                        feed.close().await;
                        print_lines(renderer.full(&feed.view().await));
                    }
                    Command::Rename => {
                        state.clear_name()?;
                        feed.set_username(None).await;
                        match prompt_name(&state, &mut input).await? {
                            Some(name) => {
                                println!("You are now {}.", name);
                                feed.set_username(Some(name)).await;
                            }
                            None => break,
                        }
                    }
                    Command::Message(text) => {
                        let feed = feed.clone();
                        let outcome_tx = outcome_tx.clone();
                        tokio::spawn(async move {
                            let outcome = feed.send(&text).await;
                            let _ = outcome_tx.send(outcome).await;
                        });
                    }
                }
            }
            Some(event) = events.recv() => match event {
                FeedEvent::Refreshed { count } => {
                    debug!(count, "Feed refreshed");
                    print_lines(renderer.incremental(&feed.view().await));
                }
                FeedEvent::Opened => print_lines(renderer.incremental(&feed.view().await)),
                FeedEvent::SendFailed { reason } => {
                    debug!(%reason, "Send failed");
                    println!("Failed to send message");
                    let draft = feed.input().await;
                    if !draft.is_empty() {
                        println!("Your draft: {}", draft);
                    }
                }
            },
            Some(outcome) = outcomes.recv() => {
                if let SendOutcome::Rejected(rejection) = outcome {
                    debug!(?rejection, "Message not sent");
                }
            }
        }
    }

    feed.close().await;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use lobby_core::{ChatConfig, MemoryLog};
    use lobby_net::Server;
    use tokio::net::TcpListener;

    fn item(id: u64, sender: &str, is_own: bool) -> MessageItem {
        MessageItem {
            id,
            sender: sender.to_string(),
            text: format!("text {}", id),
            time: "12:00".to_string(),
            is_own,
        }
    }

    #[test]
    fn test_command_parse() {
        assert_eq!(Command::parse("/open"), Command::Open);
        assert_eq!(Command::parse("  /close "), Command::Close);
        assert_eq!(Command::parse("/name"), Command::Rename);
        assert_eq!(Command::parse("/exit"), Command::Quit);
        assert_eq!(Command::parse("   "), Command::Nothing);
        assert_eq!(
            Command::parse(" hi there "),
            Command::Message(" hi there ".to_string())
        );
        assert_eq!(
            Command::parse("/opening"),
            Command::Message("/opening".to_string())
        );
    }

    #[test]
    fn test_format_row() {
        assert_eq!(format_row(&item(1, "Ann", false)), "[12:00] Ann: text 1");
        assert_eq!(format_row(&item(2, "Bob", true)), "[12:00] Bob (you): text 2");
    }

    #[test]
    fn test_full_render() {
        let mut renderer = Renderer::default();
        assert_eq!(renderer.full(&FeedView::Loading), vec!["Loading messages..."]);

        let lines = renderer.full(&FeedView::Empty);
        assert_eq!(lines[0], "-- Chat (0 messages) --");

        let view = FeedView::Messages(vec![item(1, "Ann", false)]);
        let lines = renderer.full(&view);
        assert_eq!(lines, vec!["-- Chat (1 message) --", "[12:00] Ann: text 1"]);
    }

    #[test]
    fn test_incremental_prints_only_new_rows() {
        let mut renderer = Renderer::default();
        renderer.full(&FeedView::Messages(vec![item(1, "Ann", false)]));

        let view = FeedView::Messages(vec![item(1, "Ann", false), item(2, "Bob", true)]);
        assert_eq!(renderer.incremental(&view), vec!["[12:00] Bob (you): text 2"]);
        assert!(renderer.incremental(&view).is_empty());
    }

    #[test]
    fn test_incremental_redraws_when_log_shrinks() {
        let mut renderer = Renderer::default();
        renderer.full(&FeedView::Messages(vec![item(1, "Ann", false), item(2, "Bob", false)]));

        let lines = renderer.incremental(&FeedView::Messages(vec![item(1, "Ann", false)]));
        assert_eq!(lines[0], "-- Chat (1 message) --");

        let lines = renderer.incremental(&FeedView::Empty);
        assert_eq!(lines[1], "No messages yet. Start the conversation!");
    }

    #[test]
    fn test_loading_gives_way_to_empty() {
        let mut renderer = Renderer::default();
        renderer.full(&FeedView::Loading);

        let lines = renderer.incremental(&FeedView::Empty);
        assert_eq!(
            lines,
            vec!["-- Chat (0 messages) --", "No messages yet. Start the conversation!"]
        );
        // Later empty polls print nothing new
        assert!(renderer.incremental(&FeedView::Empty).is_empty());
    }

    #[test]
    fn test_loading_gives_way_to_messages() {
        let mut renderer = Renderer::default();
        renderer.full(&FeedView::Loading);

        let lines = renderer.incremental(&FeedView::Messages(vec![item(1, "Ann", false)]));
        assert_eq!(lines, vec!["-- Chat (1 message) --", "[12:00] Ann: text 1"]);
    }

    /// Render as `run` does, from `/open` until the first fetch resolves
    async fn open_and_render(client: StoreClient) -> Vec<String> {
        let (feed, mut events) = ChatFeed::new(Arc::new(client), ChatConfig::default(), None);
        let mut renderer = Renderer::default();

        feed.open().await;
        let mut lines = renderer.full(&feed.view().await);
        loop {
            let event = tokio::time::timeout(Duration::from_secs(5), events.recv())
                .await
                .unwrap()
                .unwrap();
            lines.extend(renderer.incremental(&feed.view().await));
            if event == FeedEvent::Opened {
                break;
            }
        }
        feed.close().await;
        lines
    }

    #[tokio::test]
    async fn test_open_on_empty_store_shows_empty_state() {
        let server = Server::bind(
            "127.0.0.1:0".parse().unwrap(),
            MemoryLog::new(),
            &ChatConfig::default(),
        )
        .await
        .unwrap();
        let client = StoreClient::new(server.addr().to_string(), Duration::from_secs(5));

        let lines = open_and_render(client).await;
        assert_eq!(
            lines.last().map(String::as_str),
            Some("No messages yet. Start the conversation!")
        );
        server.shutdown();
    }

    #[tokio::test]
    async fn test_failed_first_fetch_shows_empty_state() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let client = StoreClient::new(addr.to_string(), Duration::from_secs(5));

        let lines = open_and_render(client).await;
        assert_eq!(
            lines.last().map(String::as_str),
            Some("No messages yet. Start the conversation!")
        );
    }

    #[test]
    fn test_incremental_silent_while_closed() {
        let mut renderer = Renderer::default();
        renderer.full(&FeedView::Messages(vec![item(1, "Ann", false)]));
        assert!(renderer.incremental(&FeedView::Closed).is_empty());
    }
}
