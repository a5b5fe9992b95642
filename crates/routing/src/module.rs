//! Handler modules.

use std::{fmt, sync::Arc};

use {
    async_trait::async_trait,
    herald_common::Reply,
    herald_plugins::{Args, Context, ControlPlugin, InitPlugin, Plugin, Signal},
    serde::{Deserialize, Serialize},
};

use crate::{
    error::{Error, Result},
    kind::ModuleType,
};

// ── Handler ─────────────────────────────────────────────────────────────────

/// The behavior behind a module.
#[async_trait]
pub trait ModuleHandler: Send + Sync {
    /// Turn the raw argument set into the shape `execute` expects. An `Err`
    /// ends the dispatch and the reply is sent back as is.
    async fn parse(&self, _ctx: &Context, args: Args) -> std::result::Result<Args, Reply> {
        Ok(args)
    }

    /// Run the module. Long-running work is simply awaited; the reply (if
    /// any) is delivered once this returns.
    async fn execute(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Option<Reply>>;
}

/// [`ModuleHandler`] backed by a synchronous function, without a parse step.
pub struct FnHandler<F>(F);

pub fn handler_fn<F>(f: F) -> FnHandler<F>
where
    F: Fn(&mut Context, Args) -> anyhow::Result<Option<Reply>> + Send + Sync,
{
    FnHandler(f)
}

#[async_trait]
impl<F> ModuleHandler for FnHandler<F>
where
    F: Fn(&mut Context, Args) -> anyhow::Result<Option<Reply>> + Send + Sync,
{
    async fn execute(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Option<Reply>> {
        (self.0)(ctx, args)
    }
}

// ── Options ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptionKind {
    String,
    Integer,
    Number,
    Boolean,
    User,
    Channel,
    Role,
}

/// Declared option of an interactive command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDefinition {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub kind: OptionKind,
    #[serde(default)]
    pub required: bool,
}

impl OptionDefinition {
    pub fn new(name: impl Into<String>, kind: OptionKind) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            kind,
            required: false,
        }
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

// ── Module ──────────────────────────────────────────────────────────────────

/// A named unit of behavior.
///
/// Fields are public so init plugins can rewrite them while the module
/// registers. Once registered the module is shared as `Arc<Module>` and no
/// longer changes.
pub struct Module {
    pub name: String,
    pub aliases: Vec<String>,
    pub kind: ModuleType,
    pub description: String,
    pub options: Vec<OptionDefinition>,
    pub plugins: Vec<Plugin<Module>>,
    pub handler: Arc<dyn ModuleHandler>,
}

impl Module {
    pub fn builder(name: impl Into<String>, kind: ModuleType) -> ModuleBuilder {
        ModuleBuilder {
            name: name.into(),
            aliases: Vec::new(),
            kind,
            description: String::new(),
            options: Vec::new(),
            plugins: Vec::new(),
        }
    }

    /// Primary name followed by every alias.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    pub fn init_plugins(&self) -> Vec<Arc<dyn InitPlugin<Module>>> {
        self.plugins
            .iter()
            .filter_map(Plugin::as_init)
            .cloned()
            .collect()
    }

    pub fn control_plugins(&self) -> Vec<Arc<dyn ControlPlugin>> {
        self.plugins
            .iter()
            .filter_map(Plugin::as_control)
            .cloned()
            .collect()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("kind", &self.kind)
            .field("description", &self.description)
            .field("options", &self.options)
            .field("plugins", &self.plugins)
            .finish_non_exhaustive()
    }
}

pub struct ModuleBuilder {
    name: String,
    aliases: Vec<String>,
    kind: ModuleType,
    description: String,
    options: Vec<OptionDefinition>,
    plugins: Vec<Plugin<Module>>,
}

impl ModuleBuilder {
    #[must_use]
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn option(mut self, option: OptionDefinition) -> Self {
        self.options.push(option);
        self
    }

    #[must_use]
    pub fn plugin(mut self, plugin: Plugin<Module>) -> Self {
        self.plugins.push(plugin);
        self
    }

    #[must_use]
    pub fn init(self, plugin: impl InitPlugin<Module> + 'static) -> Self {
        self.plugin(Plugin::init(plugin))
    }

    #[must_use]
    pub fn control(self, plugin: impl ControlPlugin + 'static) -> Self {
        self.plugin(Plugin::control(plugin))
    }

    pub fn handler(self, handler: impl ModuleHandler + 'static) -> Module {
        self.handler_arc(Arc::new(handler))
    }

    pub fn handler_arc(self, handler: Arc<dyn ModuleHandler>) -> Module {
        Module {
            name: self.name,
            aliases: self.aliases,
            kind: self.kind,
            description: self.description,
            options: self.options,
            plugins: self.plugins,
            handler,
        }
    }
}

// ── Declarative definitions ─────────────────────────────────────────────────

/// Serializable module metadata, for modules declared in data files. The type
/// is kept as text and checked in [`ModuleDefinition::into_module`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModuleDefinition {
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub options: Vec<OptionDefinition>,
}

impl ModuleDefinition {
    pub fn into_module(self, handler: Arc<dyn ModuleHandler>) -> Result<Module> {
        let kind = self
            .kind
            .parse::<ModuleType>()
            .map_err(|e| Error::invalid_type(&self.name, e.0))?;
        let mut builder = Module::builder(self.name, kind).description(self.description);
        for alias in self.aliases {
            builder = builder.alias(alias);
        }
        for option in self.options {
            builder = builder.option(option);
        }
        Ok(builder.handler_arc(handler))
    }
}

// ── Built-in init plugins ───────────────────────────────────────────────────

/// Init plugin that fills an empty description.
pub struct Describe(String);

pub fn describe(text: impl Into<String>) -> Describe {
    Describe(text.into())
}

#[async_trait]
impl InitPlugin<Module> for Describe {
    fn name(&self) -> &str {
        "describe"
    }

    async fn init(&self, module: &mut Module) -> anyhow::Result<Signal> {
        if module.description.trim().is_empty() {
            module.description.clone_from(&self.0);
        }
        Ok(Signal::Next)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use herald_plugins::{AllowList, init_fn};

    use super::*;

    struct Noop;

    #[async_trait]
    impl ModuleHandler for Noop {
        async fn execute(&self, _ctx: &mut Context, _args: Args) -> anyhow::Result<Option<Reply>> {
            Ok(None)
        }
    }

    fn noop() -> Noop {
        Noop
    }

    #[test]
    fn builder_collects_fields() {
        let module = Module::builder("kick", ModuleType::Both)
            .alias("k")
            .description("Kick a member")
            .option(OptionDefinition::new("user", OptionKind::User).required())
            .init(describe("unused"))
            .control(AllowList::authors(["mod_*"]))
            .handler(noop());

        assert_eq!(module.names().collect::<Vec<_>>(), vec!["kick", "k"]);
        assert_eq!(module.init_plugins().len(), 1);
        assert_eq!(module.control_plugins().len(), 1);
        assert!(module.options[0].required);
    }

    #[test]
    fn plugin_roles_keep_declared_order() {
        let module = Module::builder("ban", ModuleType::Text)
            .control(AllowList::authors(["a"]))
            .init(init_fn("first", |_m: &mut Module| Ok(Signal::Next)))
            .control(AllowList::authors(["b"]))
            .handler(noop());

        let names: Vec<&str> = module.plugins.iter().map(Plugin::name).collect();
        assert_eq!(names, vec!["allow_list", "first", "allow_list"]);
    }

    #[tokio::test]
    async fn describe_only_fills_empty_descriptions() {
        let plugin = describe("Pings the bot");
        let mut blank = Module::builder("ping", ModuleType::Text).handler(noop());
        plugin.init(&mut blank).await.unwrap();
        assert_eq!(blank.description, "Pings the bot");

        let mut set = Module::builder("ping", ModuleType::Text)
            .description("Custom")
            .handler(noop());
        plugin.init(&mut set).await.unwrap();
        assert_eq!(set.description, "Custom");
    }

    #[test]
    fn definitions_validate_their_type() {
        let def: ModuleDefinition = serde_json::from_value(serde_json::json!({
            "name": "ping",
            "aliases": ["p"],
            "type": "text",
        }))
        .unwrap();
        let module = def.into_module(Arc::new(noop())).unwrap();
        assert_eq!(module.kind, ModuleType::Text);
        assert_eq!(module.aliases, vec!["p"]);

        let def = ModuleDefinition {
            name: "weird".into(),
            aliases: vec![],
            kind: "hologram".into(),
            description: String::new(),
            options: vec![],
        };
        let err = def.into_module(Arc::new(noop())).unwrap_err();
        assert!(matches!(err, Error::InvalidModuleType { ref given, .. } if given == "hologram"));
        assert!(!err.is_fatal());
    }
}
