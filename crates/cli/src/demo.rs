//! Built-in modules served by `herald serve`.

use std::{sync::Arc, time::Instant};

use {
    async_trait::async_trait,
    herald_common::{Reply, Services},
    herald_plugins::{
        AllowList, Args, Context, GuildOnly,
        args::to_positive_int,
    },
    herald_routing::{
        Module, ModuleDefinition, ModuleHandler, ModuleType, OptionDefinition, OptionKind,
        describe, handler_fn,
    },
    uuid::Uuid,
};

/// Boot-time facts shared with modules through [`Services`].
pub struct BootInfo {
    pub started: Instant,
    pub version: &'static str,
}

pub fn services() -> Services {
    Services::builder()
        .singleton(BootInfo {
            started: Instant::now(),
            version: env!("CARGO_PKG_VERSION"),
        })
        .build()
}

const ABOUT: &str = r#"{
    "name": "about",
    "aliases": ["info"],
    "type": "both",
    "description": "What this bot is"
}"#;

/// Every demo module, in registration order. `admins` gates `purge`; an
/// empty list leaves it open to everyone.
pub fn modules(admins: &[String]) -> anyhow::Result<Vec<herald_routing::Result<Module>>> {
    let about: ModuleDefinition = serde_json::from_str(ABOUT)?;

    Ok(vec![
        Ok(Module::builder("ping", ModuleType::Both)
            .alias("p")
            .init(describe("Check that the bot responds"))
            .handler(handler_fn(|_ctx: &mut Context, _args: Args| {
                Ok(Some(Reply::text("pong")))
            }))),
        Ok(Module::builder("echo", ModuleType::Text)
            .alias("say")
            .description("Repeat the message back")
            .handler(handler_fn(|_ctx: &mut Context, args: Args| {
                Ok(Some(match args.raw_text() {
                    Some(text) if !text.is_empty() => Reply::text(text),
                    _ => Reply::text("Nothing to echo").ephemeral(),
                }))
            }))),
        Ok(Module::builder("roll", ModuleType::Both)
            .description("Roll a die")
            .option(
                OptionDefinition::new("sides", OptionKind::Integer).description("Number of sides"),
            )
            .handler(Roll)),
        Ok(Module::builder("uptime", ModuleType::Text)
            .description("How long the bot has been running")
            .handler(Uptime)),
        Ok(Module::builder("purge", ModuleType::Text)
            .description("Moderator-only cleanup")
            .control(GuildOnly::default())
            .control(AllowList::authors(admins.iter().cloned()).with_denial("No permission"))
            .handler(handler_fn(|ctx: &mut Context, _args: Args| {
                Ok(Some(Reply::text(format!("Purged channel {}", ctx.source_id()))))
            }))),
        Ok(Module::builder("crash", ModuleType::Text)
            .description("Always fails; shows the error boundary")
            .handler(handler_fn(|_ctx: &mut Context, _args: Args| {
                anyhow::bail!("this command always fails")
            }))),
        about.into_module(Arc::new(About)),
    ])
}

struct About;

#[async_trait]
impl ModuleHandler for About {
    async fn execute(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Option<Reply>> {
        let info = ctx.services().resolve::<BootInfo>()?;
        Ok(Some(Reply::text(format!(
            "herald {} (dispatch {})",
            info.version,
            ctx.id()
        ))))
    }
}

/// `roll [sides]`, six sides by default.
struct Roll;

#[async_trait]
impl ModuleHandler for Roll {
    async fn parse(&self, _ctx: &Context, args: Args) -> Result<Args, Reply> {
        let sides = match &args {
            Args::Options(_) => args
                .option("sides")
                .and_then(|v| v.as_i64())
                .unwrap_or(6),
            _ => match args.tokens().first() {
                Some(token) => to_positive_int(token, "Expected a number")?,
                None => 6,
            },
        };
        if sides < 2 {
            return Err(Reply::text("A die needs at least two sides").ephemeral());
        }
        Ok(Args::Parsed(serde_json::json!(sides)))
    }

    async fn execute(&self, _ctx: &mut Context, args: Args) -> anyhow::Result<Option<Reply>> {
        let sides: u64 = args.parsed()?;
        let roll = (Uuid::new_v4().as_u128() % u128::from(sides)) + 1;
        Ok(Some(Reply::text(format!("🎲 {roll} (d{sides})"))))
    }
}

/// `uptime`, reading [`BootInfo`] from the service provider.
struct Uptime;

#[async_trait]
impl ModuleHandler for Uptime {
    async fn execute(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Option<Reply>> {
        let info = ctx.services().resolve::<BootInfo>()?;
        let secs = info.started.elapsed().as_secs();
        Ok(Some(Reply::text(format!("up {}m {}s", secs / 60, secs % 60))))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use herald_routing::RegistryBuilder;

    use super::*;

    #[tokio::test]
    async fn demo_modules_register_without_conflicts() {
        let mut builder = RegistryBuilder::new();
        let count = builder
            .register_all(modules(&["admin".to_string()]).unwrap())
            .await
            .unwrap();
        assert_eq!(count, 7);

        let registry = builder.freeze();
        let manifest = registry.command_manifest();
        let names: Vec<&str> = manifest.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ping", "roll", "about"]);
        let ping = registry
            .resolve("p", herald_channels::PayloadKind::TextMessage)
            .unwrap();
        assert_eq!(ping.description, "Check that the bot responds");
    }
}
