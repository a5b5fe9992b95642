//! Local terminal adapter: stdin lines become text messages, replies are
//! printed to stdout.

use {
    async_trait::async_trait,
    herald_channels::{EventSource, Feed, Payload, ReplySink, TextMessage},
    herald_common::Reply,
    tokio::io::{AsyncBufReadExt, BufReader},
    tracing::debug,
    uuid::Uuid,
};

pub const CHANNEL_ID: &str = "console";
const GUILD_ID: &str = "local";

/// Reads one message per line from stdin until EOF.
///
/// The read is blocking under the hood, so shutdown after ctrl-c completes
/// once the pending line (or EOF) arrives.
pub struct ConsoleSource {
    author_id: String,
}

impl ConsoleSource {
    pub fn new(author_id: impl Into<String>) -> Self {
        Self {
            author_id: author_id.into(),
        }
    }
}

#[async_trait]
impl EventSource for ConsoleSource {
    fn name(&self) -> &str {
        "console"
    }

    async fn listen(self: Box<Self>, feed: Feed) -> anyhow::Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            feed.on_text_message(TextMessage {
                message_id: Uuid::new_v4().to_string(),
                channel_id: CHANNEL_ID.into(),
                guild_id: Some(GUILD_ID.into()),
                author_id: self.author_id.clone(),
                author_is_bot: false,
                content: line,
            })
            .await?;
        }
        debug!("stdin closed");
        Ok(())
    }
}

/// Prints replies, marking ephemeral ones.
#[derive(Debug, Default)]
pub struct ConsoleSink;

#[async_trait]
impl ReplySink for ConsoleSink {
    async fn send(&self, origin: &Payload, reply: Reply) -> anyhow::Result<()> {
        let marker = if reply.ephemeral { " (only you)" } else { "" };
        println!("[{}]{marker} {}", origin.source_id(), reply.text);
        if let Some(body) = &reply.body {
            println!("{}", serde_json::to_string_pretty(body)?);
        }
        Ok(())
    }
}
