//! Module registry.
//!
//! Registration happens on an owned [`RegistryBuilder`] during boot. Calling
//! [`RegistryBuilder::freeze`] yields an immutable [`Registry`] that the
//! router shares across dispatch tasks. Lookups are keyed per
//! [`Namespace`], so a text command and a button may share a name, while two
//! text commands may not.

use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
    time::{Duration, Instant},
};

use {
    herald_channels::{EventBus, LifecycleEvent, PayloadKind},
    herald_plugins::{Outcome, pipeline},
    serde::Serialize,
    tracing::{debug, info, warn},
};

use crate::{
    error::{Error, Result},
    kind::{ModuleType, Namespace, accepts},
    module::{Module, OptionDefinition},
};

#[cfg(feature = "metrics")]
use herald_metrics::{counter, gauge, registry as registry_metrics};

type NameTable = HashMap<String, Arc<Module>>;

// ── Builder ─────────────────────────────────────────────────────────────────

/// Write side of the registry, only available during boot.
pub struct RegistryBuilder {
    tables: HashMap<Namespace, NameTable>,
    modules: Vec<Arc<Module>>,
    rejected: usize,
    events: EventBus,
    started: Instant,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::with_events(EventBus::default())
    }

    /// Publish registration events on `events`.
    pub fn with_events(events: EventBus) -> Self {
        Self {
            tables: HashMap::new(),
            modules: Vec::new(),
            rejected: 0,
            events,
            started: Instant::now(),
        }
    }

    /// Register one module.
    ///
    /// Names and aliases are checked for conflicts before and after the
    /// module's init plugins run (init plugins may rename). A conflict leaves
    /// the registry untouched and keeps the earlier module.
    pub async fn register(&mut self, mut module: Module) -> Result<()> {
        self.check_conflicts(&module)?;

        let inits = module.init_plugins();
        match pipeline::run_init(&inits, &mut module).await {
            Outcome::Proceed => {},
            Outcome::Halted { plugin, reply } => {
                let reason = reply.map_or_else(|| "stopped".to_string(), |r| r.text);
                return Err(self.reject(Error::rejected(&module.name, plugin, reason)));
            },
            Outcome::Failed { plugin, error } => {
                return Err(self.reject(Error::rejected(&module.name, plugin, error.to_string())));
            },
        }

        self.check_conflicts(&module)?;
        self.insert(module);
        Ok(())
    }

    /// Register `modules` in order, logging and skipping the non-fatal
    /// failures. Returns how many were registered, or the first fatal error.
    pub async fn register_all(
        &mut self,
        modules: impl IntoIterator<Item = Result<Module>>,
    ) -> Result<usize> {
        let mut registered = 0;
        for module in modules {
            let outcome = match module {
                Ok(module) => self.register(module).await,
                Err(e) => Err(self.reject(e)),
            };
            match outcome {
                Ok(()) => registered += 1,
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => warn!(error = %e, "module skipped"),
            }
        }
        Ok(registered)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// End the build phase.
    pub fn freeze(self) -> Registry {
        let elapsed = self.started.elapsed();
        let count = self.modules.len();
        info!(
            modules = count,
            rejected = self.rejected,
            elapsed_ms = elapsed.as_millis() as u64,
            "modules loaded"
        );
        #[cfg(feature = "metrics")]
        gauge!(registry_metrics::MODULES_REGISTERED).set(count as f64);
        self.events
            .publish(LifecycleEvent::ModulesLoaded { count, elapsed });

        Registry {
            tables: self.tables,
            modules: self.modules,
            load_time: elapsed,
        }
    }

    fn check_conflicts(&self, module: &Module) -> Result<()> {
        for &namespace in module.kind.namespaces() {
            let table = self.tables.get(&namespace);
            let mut seen = BTreeSet::new();
            for name in module.names() {
                if !seen.insert(name) || table.is_some_and(|t| t.contains_key(name)) {
                    warn!(module = %module.name, name, namespace = %namespace, "registration conflict");
                    return Err(Error::conflict(name, namespace));
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, module: Module) {
        let module = Arc::new(module);
        for &namespace in module.kind.namespaces() {
            let table = self.tables.entry(namespace).or_default();
            for name in module.names() {
                table.insert(name.to_string(), Arc::clone(&module));
            }
        }
        debug!(module = %module.name, kind = %module.kind, aliases = ?module.aliases, "module registered");
        self.events.publish(LifecycleEvent::ModuleRegistered {
            name: module.name.clone(),
            kind: module.kind.to_string(),
        });
        self.modules.push(module);
    }

    fn reject(&mut self, error: Error) -> Error {
        self.rejected += 1;
        #[cfg(feature = "metrics")]
        counter!(registry_metrics::MODULES_REJECTED_TOTAL).increment(1);
        if let Error::ModuleRejectedAtInit { name, .. } | Error::InvalidModuleType { name, .. } =
            &error
        {
            self.events.publish(LifecycleEvent::ModuleRejected {
                name: name.clone(),
                reason: error.to_string(),
            });
        }
        error
    }
}

// ── Frozen registry ─────────────────────────────────────────────────────────

/// Read-only registry shared by every dispatch.
#[derive(Debug)]
pub struct Registry {
    tables: HashMap<Namespace, NameTable>,
    modules: Vec<Arc<Module>>,
    load_time: Duration,
}

impl Registry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Module registered under `name` (or alias) that handles `kind`.
    /// Case-sensitive.
    pub fn resolve(&self, name: &str, kind: PayloadKind) -> Option<Arc<Module>> {
        self.tables
            .get(&Namespace::for_payload(kind))?
            .get(name)
            .filter(|m| accepts(m.kind, kind))
            .cloned()
    }

    /// Types of every module answering to `name`, across all namespaces.
    pub fn kinds_named(&self, name: &str) -> Vec<ModuleType> {
        let mut kinds: Vec<ModuleType> = self
            .tables
            .values()
            .filter_map(|t| t.get(name))
            .map(|m| m.kind)
            .collect();
        kinds.sort_by_key(ModuleType::as_str);
        kinds.dedup();
        kinds
    }

    /// Registered modules, in registration order.
    pub fn modules(&self) -> impl Iterator<Item = &Arc<Module>> {
        self.modules.iter()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Time spent between the builder's creation and `freeze`.
    pub fn load_time(&self) -> Duration {
        self.load_time
    }

    /// Metadata of every module that is published as a platform command.
    pub fn command_manifest(&self) -> Vec<CommandManifestEntry> {
        self.modules
            .iter()
            .filter(|m| m.kind.is_command())
            .map(|m| CommandManifestEntry {
                name: m.name.clone(),
                description: m.description.clone(),
                kind: m.kind,
                options: m.options.clone(),
            })
            .collect()
    }
}

/// One command as handed to an external command publisher.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandManifestEntry {
    pub name: String,
    pub description: String,
    pub kind: ModuleType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<OptionDefinition>,
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        async_trait::async_trait,
        herald_common::Reply,
        herald_plugins::{Args, Context, Signal, init_fn},
    };

    use {
        super::*,
        crate::module::{ModuleHandler, OptionKind, describe},
    };

    struct Noop;

    #[async_trait]
    impl ModuleHandler for Noop {
        async fn execute(&self, _ctx: &mut Context, _args: Args) -> anyhow::Result<Option<Reply>> {
            Ok(None)
        }
    }

    fn module(name: &str, kind: ModuleType) -> Module {
        Module::builder(name, kind).handler(Noop)
    }

    #[tokio::test]
    async fn resolves_by_name_and_alias_to_same_module() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(
                Module::builder("kick", ModuleType::Both)
                    .alias("k")
                    .handler(Noop),
            )
            .await
            .unwrap();
        let registry = builder.freeze();

        let by_name = registry.resolve("kick", PayloadKind::TextMessage).unwrap();
        let by_alias = registry.resolve("k", PayloadKind::TextMessage).unwrap();
        let slash = registry
            .resolve("kick", PayloadKind::InteractionCommand)
            .unwrap();
        assert!(Arc::ptr_eq(&by_name, &by_alias));
        assert!(Arc::ptr_eq(&by_name, &slash));
        assert!(Arc::ptr_eq(
            &by_name,
            &registry.resolve("kick", PayloadKind::TextMessage).unwrap()
        ));
        assert!(registry.resolve("kick", PayloadKind::ComponentButton).is_none());
        assert!(registry.resolve("Kick", PayloadKind::TextMessage).is_none());
    }

    #[tokio::test]
    async fn incompatible_type_is_not_found() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(module("ping", ModuleType::Text))
            .await
            .unwrap();
        let registry = builder.freeze();
        assert!(registry.resolve("ping", PayloadKind::TextMessage).is_some());
        assert!(
            registry
                .resolve("ping", PayloadKind::InteractionCommand)
                .is_none()
        );
        assert_eq!(registry.kinds_named("ping"), vec![ModuleType::Text]);
    }

    #[tokio::test]
    async fn duplicate_name_conflicts_and_keeps_first() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(
                Module::builder("info", ModuleType::Text)
                    .description("first")
                    .handler(Noop),
            )
            .await
            .unwrap();
        let err = builder
            .register(
                Module::builder("info", ModuleType::Text)
                    .description("second")
                    .handler(Noop),
            )
            .await
            .unwrap_err();
        assert!(
            matches!(err, Error::RegistrationConflict { ref name, namespace: Namespace::Text } if name == "info")
        );
        assert!(err.is_fatal());

        let registry = builder.freeze();
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry
                .resolve("info", PayloadKind::TextMessage)
                .unwrap()
                .description,
            "first"
        );
    }

    #[tokio::test]
    async fn alias_colliding_with_name_conflicts() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(module("kick", ModuleType::Text))
            .await
            .unwrap();
        let err = builder
            .register(
                Module::builder("boot", ModuleType::Both)
                    .alias("kick")
                    .handler(Noop),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RegistrationConflict { .. }));

        let err = builder
            .register(
                Module::builder("self", ModuleType::Text)
                    .alias("self")
                    .handler(Noop),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RegistrationConflict { .. }));
    }

    #[tokio::test]
    async fn different_namespaces_may_share_names() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(module("confirm", ModuleType::Text))
            .await
            .unwrap();
        builder
            .register(module("confirm", ModuleType::ComponentButton))
            .await
            .unwrap();
        builder
            .register(module("confirm", ModuleType::Interactive))
            .await
            .unwrap();
        let registry = builder.freeze();

        assert_eq!(
            registry
                .resolve("confirm", PayloadKind::ComponentButton)
                .unwrap()
                .kind,
            ModuleType::ComponentButton
        );
        assert_eq!(registry.kinds_named("confirm").len(), 3);
    }

    #[tokio::test]
    async fn both_conflicts_with_text_and_interactive() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(module("help", ModuleType::Interactive))
            .await
            .unwrap();
        let err = builder
            .register(module("help", ModuleType::Both))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::RegistrationConflict {
                namespace: Namespace::Interactive,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn init_stop_rejects_module() {
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let mut builder = RegistryBuilder::with_events(bus);

        let err = builder
            .register(
                Module::builder("secret", ModuleType::Text)
                    .init(init_fn("disabled", |_m: &mut Module| {
                        Ok(Signal::stop_with("feature flag off"))
                    }))
                    .handler(Noop),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModuleRejectedAtInit { ref reason, .. } if reason == "feature flag off"));
        assert!(!err.is_fatal());

        match events.recv().await.unwrap() {
            LifecycleEvent::ModuleRejected { name, .. } => assert_eq!(name, "secret"),
            other => panic!("unexpected event {other:?}"),
        }
        assert!(builder.freeze().resolve("secret", PayloadKind::TextMessage).is_none());
    }

    #[tokio::test]
    async fn init_plugins_mutate_before_insertion() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(
                Module::builder("ping", ModuleType::Interactive)
                    .init(describe("Check latency"))
                    .init(init_fn("alias", |m: &mut Module| {
                        m.aliases.push("latency".into());
                        Ok(Signal::Next)
                    }))
                    .handler(Noop),
            )
            .await
            .unwrap();
        let registry = builder.freeze();
        let module = registry
            .resolve("latency", PayloadKind::InteractionCommand)
            .unwrap();
        assert_eq!(module.description, "Check latency");
    }

    #[tokio::test]
    async fn rename_during_init_is_rechecked() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(module("taken", ModuleType::Text))
            .await
            .unwrap();
        let err = builder
            .register(
                Module::builder("fresh", ModuleType::Text)
                    .init(init_fn("rename", |m: &mut Module| {
                        m.name = "taken".into();
                        Ok(Signal::Next)
                    }))
                    .handler(Noop),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::RegistrationConflict { .. }));
    }

    #[tokio::test]
    async fn failing_init_plugin_rejects() {
        let mut builder = RegistryBuilder::new();
        let err = builder
            .register(
                Module::builder("flaky", ModuleType::Text)
                    .init(init_fn("load", |_m: &mut Module| {
                        anyhow::bail!("config missing")
                    }))
                    .handler(Noop),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ModuleRejectedAtInit { ref plugin, .. } if plugin == "load"));
    }

    #[tokio::test]
    async fn register_all_skips_non_fatal_and_stops_on_conflict() {
        let mut builder = RegistryBuilder::new();
        let count = builder
            .register_all(vec![
                Ok(module("a", ModuleType::Text)),
                Err(Error::invalid_type("b", "hologram")),
                Ok(module("c", ModuleType::Scheduled)),
            ])
            .await
            .unwrap();
        assert_eq!(count, 2);

        let err = builder
            .register_all(vec![Ok(module("a", ModuleType::Text))])
            .await
            .unwrap_err();
        assert!(err.is_fatal());
        assert_eq!(builder.len(), 2);
    }

    #[tokio::test]
    async fn freeze_publishes_loaded_event() {
        let bus = EventBus::new(8);
        let mut events = bus.subscribe();
        let mut builder = RegistryBuilder::with_events(bus);
        builder
            .register(module("ping", ModuleType::Text))
            .await
            .unwrap();
        let _registry = builder.freeze();

        assert!(matches!(
            events.recv().await.unwrap(),
            LifecycleEvent::ModuleRegistered { .. }
        ));
        assert!(matches!(
            events.recv().await.unwrap(),
            LifecycleEvent::ModulesLoaded { count: 1, .. }
        ));
    }

    #[tokio::test]
    async fn manifest_lists_command_modules_only() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(
                Module::builder("ban", ModuleType::Interactive)
                    .description("Ban a member")
                    .option(OptionDefinition::new("user", OptionKind::User).required())
                    .handler(Noop),
            )
            .await
            .unwrap();
        builder
            .register(module("ping", ModuleType::Text))
            .await
            .unwrap();
        builder
            .register(module("Report", ModuleType::ContextMenuMessage))
            .await
            .unwrap();
        let manifest = builder.freeze().command_manifest();

        let names: Vec<&str> = manifest.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ban", "Report"]);
        let json = serde_json::to_value(&manifest[0]).unwrap();
        assert_eq!(json["kind"], "interactive");
        assert_eq!(json["options"][0]["kind"], "user");
        assert!(serde_json::to_value(&manifest[1]).unwrap().get("options").is_none());
    }
}
