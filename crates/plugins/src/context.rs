//! Per-invocation execution context.

use std::{collections::HashMap, fmt, sync::Arc};

use {
    herald_channels::{EventBus, Envelope, NullSink, Payload, PayloadKind, ReplySink},
    herald_common::Services,
    serde::{Serialize, de::DeserializeOwned},
    serde_json::Value,
    uuid::Uuid,
};

use crate::{
    args::Args,
    error::{Context as _, Result},
};

// ── Dependencies ────────────────────────────────────────────────────────────

/// Collaborators assembled once at boot and shared by every dispatch.
#[derive(Clone)]
pub struct Dependencies {
    pub reply: Arc<dyn ReplySink>,
    pub services: Services,
    pub events: EventBus,
}

impl Dependencies {
    pub fn new(reply: Arc<dyn ReplySink>, services: Services, events: EventBus) -> Self {
        Self {
            reply,
            services,
            events,
        }
    }
}

impl Default for Dependencies {
    fn default() -> Self {
        Self::new(Arc::new(NullSink), Services::default(), EventBus::default())
    }
}

impl fmt::Debug for Dependencies {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependencies")
            .field("services", &self.services)
            .finish_non_exhaustive()
    }
}

// ── Context ─────────────────────────────────────────────────────────────────

/// Everything one dispatch knows about the event it is handling.
///
/// A context is created by the router after the target module is resolved,
/// handed by `&mut` to each control plugin in turn and finally to the
/// module's `execute`. Plugins can pass data forward through
/// [`Context::insert_local`].
pub struct Context {
    id: Uuid,
    module: String,
    payload: Payload,
    args: Args,
    locals: HashMap<String, Value>,
    deps: Arc<Dependencies>,
}

impl Context {
    /// Build a context whose arguments come from the payload's raw input.
    ///
    /// Meant for payloads that carry no command text (interactions,
    /// components, ticks). A text message is tokenized whole, prefix and
    /// command name included; build those with [`Context::with_args`] from
    /// the classified remainder instead.
    pub fn new(module: impl Into<String>, payload: Payload, deps: Arc<Dependencies>) -> Self {
        let args = Args::from_raw(payload.envelope().raw);
        Self::with_args(module, payload, args, deps)
    }

    pub fn with_args(
        module: impl Into<String>,
        payload: Payload,
        args: Args,
        deps: Arc<Dependencies>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            module: module.into(),
            payload,
            args,
            locals: HashMap::new(),
            deps,
        }
    }

    /// Unique id of this dispatch, for correlating log lines.
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Name of the module being dispatched to.
    pub fn module(&self) -> &str {
        &self.module
    }

    pub fn payload(&self) -> &Payload {
        &self.payload
    }

    pub fn kind(&self) -> PayloadKind {
        self.payload.kind()
    }

    pub fn envelope(&self) -> Envelope {
        self.payload.envelope()
    }

    pub fn author_id(&self) -> &str {
        self.payload.author_id()
    }

    pub fn source_id(&self) -> &str {
        self.payload.source_id()
    }

    pub fn guild_id(&self) -> Option<&str> {
        self.payload.guild_id()
    }

    pub fn args(&self) -> &Args {
        &self.args
    }

    pub fn set_args(&mut self, args: Args) {
        self.args = args;
    }

    /// Take the arguments out, leaving [`Args::Empty`].
    pub fn take_args(&mut self) -> Args {
        std::mem::take(&mut self.args)
    }

    pub fn local(&self, key: &str) -> Option<&Value> {
        self.locals.get(key)
    }

    pub fn has_local(&self, key: &str) -> bool {
        self.locals.contains_key(key)
    }

    /// Typed read of a local.
    pub fn local_as<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.locals
            .get(key)
            .map(|v| T::deserialize(v).with_context(|| format!("local `{key}`")))
            .transpose()
    }

    pub fn insert_local(&mut self, key: impl Into<String>, value: impl Serialize) -> Result<()> {
        self.locals.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn services(&self) -> &Services {
        &self.deps.services
    }

    pub fn events(&self) -> &EventBus {
        &self.deps.events
    }

    pub fn reply_sink(&self) -> &Arc<dyn ReplySink> {
        &self.deps.reply
    }

    pub fn deps(&self) -> &Arc<Dependencies> {
        &self.deps
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("id", &self.id)
            .field("module", &self.module)
            .field("kind", &self.payload.kind())
            .field("args", &self.args)
            .field("locals", &self.locals)
            .finish_non_exhaustive()
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use herald_channels::{CommandOption, InteractionCommand, InteractionMeta, OptionValue};

    use super::*;

    fn slash(options: Vec<CommandOption>) -> Payload {
        InteractionCommand {
            meta: InteractionMeta {
                interaction_id: "i1".into(),
                channel_id: "c1".into(),
                guild_id: Some("g1".into()),
                user_id: "u1".into(),
            },
            command_name: "ban".into(),
            options,
        }
        .into()
    }

    #[test]
    fn new_context_derives_args_from_payload() {
        let ctx = Context::new(
            "ban",
            slash(vec![CommandOption::new("user", OptionValue::User("42".into()))]),
            Arc::default(),
        );
        assert_eq!(ctx.module(), "ban");
        assert_eq!(ctx.author_id(), "u1");
        assert_eq!(ctx.guild_id(), Some("g1"));
        assert_eq!(
            ctx.args().option("user"),
            Some(&OptionValue::User("42".into()))
        );
    }

    #[test]
    fn new_context_tokenizes_whole_text_content() {
        let payload: Payload = herald_channels::TextMessage {
            message_id: "m1".into(),
            channel_id: "c1".into(),
            guild_id: Some("g1".into()),
            author_id: "u1".into(),
            author_is_bot: false,
            content: "!roll 20".into(),
        }
        .into();
        let ctx = Context::new("roll", payload.clone(), Arc::default());
        assert_eq!(ctx.args().tokens(), ["!roll", "20"]);

        let ctx = Context::with_args("roll", payload, Args::from_text("20"), Arc::default());
        assert_eq!(ctx.args().tokens(), ["20"]);
    }

    #[test]
    fn locals_round_trip_through_json() {
        let mut ctx = Context::new("ban", slash(vec![]), Arc::default());
        assert!(!ctx.has_local("role"));
        ctx.insert_local("role", "moderator").unwrap();
        assert_eq!(
            ctx.local_as::<String>("role").unwrap().as_deref(),
            Some("moderator")
        );
        assert_eq!(ctx.local_as::<String>("missing").unwrap(), None);
        assert!(ctx.local_as::<u32>("role").is_err());
    }

    #[test]
    fn take_args_leaves_empty() {
        let mut ctx = Context::with_args(
            "echo",
            slash(vec![]),
            Args::from_text("hello"),
            Arc::default(),
        );
        assert_eq!(ctx.take_args().tokens(), ["hello"]);
        assert_eq!(ctx.args(), &Args::Empty);
    }

    #[test]
    fn each_context_gets_its_own_id() {
        let a = Context::new("ban", slash(vec![]), Arc::default());
        let b = Context::new("ban", slash(vec![]), Arc::default());
        assert_ne!(a.id(), b.id());
    }
}
