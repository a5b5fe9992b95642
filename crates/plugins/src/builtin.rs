//! Control plugins shipped with the crate.

use {async_trait::async_trait, herald_channels::gating, herald_common::Reply, tracing::debug};

use crate::{context::Context, plugin::ControlPlugin, signal::Signal};

/// Which id of the invocation an [`AllowList`] matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subject {
    #[default]
    Author,
    Channel,
    Guild,
}

/// Lets an invocation through only when its subject id matches one of the
/// patterns. An empty pattern list allows everyone.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    subject: Subject,
    patterns: Vec<String>,
    denial: Option<Reply>,
}

impl AllowList {
    pub fn new(subject: Subject, patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            subject,
            patterns: patterns.into_iter().map(Into::into).collect(),
            denial: None,
        }
    }

    pub fn authors(patterns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self::new(Subject::Author, patterns)
    }

    /// Reply sent when the check fails. Without one the dispatch stops silently.
    #[must_use]
    pub fn with_denial(mut self, reply: impl Into<Reply>) -> Self {
        self.denial = Some(reply.into());
        self
    }

    fn subject_id<'a>(&self, ctx: &'a Context) -> Option<&'a str> {
        match self.subject {
            Subject::Author => Some(ctx.author_id()),
            Subject::Channel => Some(ctx.source_id()),
            Subject::Guild => ctx.guild_id(),
        }
    }
}

#[async_trait]
impl ControlPlugin for AllowList {
    fn name(&self) -> &str {
        "allow_list"
    }

    async fn check(&self, ctx: &mut Context) -> anyhow::Result<Signal> {
        if self.patterns.is_empty() {
            return Ok(Signal::Next);
        }
        let allowed = self
            .subject_id(ctx)
            .is_some_and(|id| gating::is_allowed(id, &self.patterns));
        if allowed {
            return Ok(Signal::Next);
        }
        debug!(module = %ctx.module(), subject = ?self.subject, "allow list denied invocation");
        Ok(match &self.denial {
            Some(reply) => Signal::StopWith(reply.clone()),
            None => Signal::Stop,
        })
    }
}

/// Stops events that did not happen inside a guild (direct messages,
/// scheduled ticks, external events).
#[derive(Debug, Clone)]
pub struct GuildOnly {
    reply: Reply,
}

impl GuildOnly {
    pub fn new(reply: impl Into<Reply>) -> Self {
        Self {
            reply: reply.into(),
        }
    }
}

impl Default for GuildOnly {
    fn default() -> Self {
        Self::new(Reply::text("This command can only be used in a server").ephemeral())
    }
}

#[async_trait]
impl ControlPlugin for GuildOnly {
    fn name(&self) -> &str {
        "guild_only"
    }

    async fn check(&self, ctx: &mut Context) -> anyhow::Result<Signal> {
        Ok(match ctx.guild_id() {
            Some(_) => Signal::Next,
            None => Signal::StopWith(self.reply.clone()),
        })
    }
}

/// Stops silently unless an earlier plugin stored `key` as a context local.
#[derive(Debug, Clone)]
pub struct RequireLocal {
    key: String,
}

impl RequireLocal {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }
}

#[async_trait]
impl ControlPlugin for RequireLocal {
    fn name(&self) -> &str {
        "require_local"
    }

    async fn check(&self, ctx: &mut Context) -> anyhow::Result<Signal> {
        Ok(if ctx.has_local(&self.key) {
            Signal::Next
        } else {
            Signal::Stop
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use herald_channels::{ExternalEvent, Payload, TextMessage};

    use super::*;

    fn text_ctx(author: &str, guild: Option<&str>) -> Context {
        let payload: Payload = TextMessage {
            message_id: "m1".into(),
            channel_id: "general".into(),
            guild_id: guild.map(str::to_string),
            author_id: author.into(),
            author_is_bot: false,
            content: "!ban bob".into(),
        }
        .into();
        Context::new("ban", payload, Arc::default())
    }

    #[tokio::test]
    async fn allow_list_matches_author_patterns() {
        let plugin = AllowList::authors(["mod_*"]).with_denial("No permission");
        assert_eq!(
            plugin.check(&mut text_ctx("mod_alice", None)).await.unwrap(),
            Signal::Next
        );
        assert_eq!(
            plugin.check(&mut text_ctx("bob", None)).await.unwrap(),
            Signal::stop_with("No permission")
        );
    }

    #[tokio::test]
    async fn allow_list_without_denial_stops_silently() {
        let plugin = AllowList::new(Subject::Channel, ["staff"]);
        assert_eq!(
            plugin.check(&mut text_ctx("bob", None)).await.unwrap(),
            Signal::Stop
        );
    }

    #[tokio::test]
    async fn empty_allow_list_is_open() {
        let plugin = AllowList::new(Subject::Guild, Vec::<String>::new());
        assert_eq!(
            plugin.check(&mut text_ctx("anyone", None)).await.unwrap(),
            Signal::Next
        );
    }

    #[tokio::test]
    async fn guild_subject_requires_a_guild() {
        let plugin = AllowList::new(Subject::Guild, ["*"]);
        assert_eq!(
            plugin.check(&mut text_ctx("bob", Some("g1"))).await.unwrap(),
            Signal::Next
        );
        assert_eq!(
            plugin.check(&mut text_ctx("bob", None)).await.unwrap(),
            Signal::Stop
        );
    }

    #[tokio::test]
    async fn guild_only_rejects_direct_and_external_events() {
        let plugin = GuildOnly::default();
        assert_eq!(
            plugin.check(&mut text_ctx("bob", Some("g1"))).await.unwrap(),
            Signal::Next
        );
        assert!(matches!(
            plugin.check(&mut text_ctx("bob", None)).await.unwrap(),
            Signal::StopWith(reply) if reply.ephemeral
        ));

        let external: Payload = ExternalEvent {
            emitter: "webhook".into(),
            event_name: "deploy".into(),
            data: serde_json::Value::Null,
        }
        .into();
        let mut ctx = Context::new("deploy", external, Arc::default());
        assert!(!plugin.check(&mut ctx).await.unwrap().is_next());
    }

    #[tokio::test]
    async fn require_local_checks_earlier_plugins() {
        let plugin = RequireLocal::new("verified");
        let mut ctx = text_ctx("bob", None);
        assert_eq!(plugin.check(&mut ctx).await.unwrap(), Signal::Stop);
        ctx.insert_local("verified", true).unwrap();
        assert_eq!(plugin.check(&mut ctx).await.unwrap(), Signal::Next);
    }
}
