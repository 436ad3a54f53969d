//! A gateway that reads messages from stdin and prints replies to stdout.

use std::fmt::Write as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use nakaaa::prelude::*;
use nakaaa::core::{ChannelId, MessageId, ReadyInfo};
use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, info};

const CONSOLE_CHANNEL: ChannelId = ChannelId(1);

/// Turns every line typed on the terminal into a text message.
pub struct ConsoleGateway {
    user: RequestingUser,
    permissions: Permissions,
    next_id: Arc<AtomicU64>,
    reader: Mutex<Option<JoinHandle<()>>>,
}

impl ConsoleGateway {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            user: RequestingUser::new(1000, username),
            permissions: Permissions::SEND_MESSAGES | Permissions::VIEW_CHANNEL,
            next_id: Arc::new(AtomicU64::new(1)),
            reader: Mutex::new(None),
        }
    }

    /// Permissions of the console user; the bot always has full rights.
    pub fn with_permissions(mut self, permissions: Permissions) -> Self {
        self.permissions = permissions;
        self
    }
}

#[async_trait]
impl Gateway for ConsoleGateway {
    fn name(&self) -> &'static str {
        "console"
    }

    fn requires_token(&self) -> bool {
        false
    }

    async fn connect(&self, _token: &str, sink: BoxedEventSink) -> TransportResult<()> {
        sink.emit(GatewayEvent::ready(ReadyInfo {
            user: RequestingUser::new(1, "console-bot").as_bot(),
            guild_count: 1,
        }))
        .await;

        let user = self.user.clone();
        let permissions = self.permissions;
        let next_id = Arc::clone(&self.next_id);

        let handle = tokio::spawn(async move {
            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if line.trim().is_empty() {
                    continue;
                }
                let message = ConsoleMessage {
                    id: MessageId(next_id.fetch_add(1, Ordering::Relaxed)),
                    author: user.clone(),
                    content: line,
                    permissions,
                    next_id: Arc::clone(&next_id),
                };
                sink.emit(GatewayEvent::message_create(Arc::new(message))).await;
            }
            debug!("stdin closed");
        });

        *self.reader.lock() = Some(handle);
        info!("Type a command, e.g. `$ping`");
        Ok(())
    }

    async fn shutdown(&self) {
        if let Some(handle) = self.reader.lock().take() {
            handle.abort();
        }
    }
}

/// One line of terminal input.
pub struct ConsoleMessage {
    id: MessageId,
    author: RequestingUser,
    content: String,
    permissions: Permissions,
    next_id: Arc<AtomicU64>,
}

impl ConsoleMessage {
    fn print(&self, payload: &ReplyPayload) -> SentReply {
        println!("{}", render(payload));
        if payload.fetch_reply {
            let id = MessageId(self.next_id.fetch_add(1, Ordering::Relaxed));
            SentReply::fetched(id, CONSOLE_CHANNEL)
        } else {
            SentReply::acknowledged()
        }
    }
}

#[async_trait]
impl TextMessage for ConsoleMessage {
    fn id(&self) -> MessageId {
        self.id
    }

    fn channel_id(&self) -> ChannelId {
        CONSOLE_CHANNEL
    }

    fn author(&self) -> &RequestingUser {
        &self.author
    }

    fn content(&self) -> &str {
        &self.content
    }

    fn member_permissions(&self) -> Permissions {
        self.permissions
    }

    fn bot_permissions(&self) -> Permissions {
        Permissions::ALL
    }

    async fn send_to_channel(&self, payload: &ReplyPayload) -> TransportResult<SentReply> {
        Ok(self.print(payload))
    }

    async fn reply(&self, payload: &ReplyPayload) -> TransportResult<SentReply> {
        Ok(self.print(payload))
    }
}

/// Plain-text rendering of a reply.
pub fn render(payload: &ReplyPayload) -> String {
    let mut out = String::new();
    if let Some(content) = &payload.content {
        out.push_str(content);
    }
    for embed in &payload.embeds {
        let data = embed.data();
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("┃ ");
        if let Some(title) = &data.title {
            out.push_str(title);
        }
        if let Some(description) = &data.description {
            for line in description.lines() {
                let _ = write!(out, "\n┃ {line}");
            }
        }
        if let Some(footer) = &data.footer {
            let _ = write!(out, "\n┃ -- {}", footer.text);
        }
    }
    out
}
