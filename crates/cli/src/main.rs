mod config_commands;
mod console;
mod demo;

use std::{path::PathBuf, sync::Arc};

use {
    clap::{Parser, Subcommand},
    herald_channels::{EventBus, FanIn, LifecycleEvent, ReplySink},
    herald_config::HeraldConfig,
    herald_plugins::{Dependencies, args::to_list},
    herald_router::Router,
    herald_routing::{Registry, RegistryBuilder},
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

#[derive(Parser)]
#[command(name = "herald", about = "Herald, an event dispatcher for chat bots")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error). Overrides the config file.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, global = true, default_value_t = false)]
    json_logs: bool,

    /// Config file to load instead of searching the standard locations.
    #[arg(long, global = true, env = "HERALD_CONFIG")]
    config: Option<PathBuf>,

    /// Comma-separated user ids allowed to run moderator modules.
    #[arg(long, global = true, env = "HERALD_ADMINS", default_value = "")]
    admins: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Read commands from stdin and print replies (default).
    Serve {
        /// User id the console messages are attributed to.
        #[arg(long, env = "USER", default_value = "console")]
        user: String,
    },
    /// Print the command manifest of interactive modules as JSON.
    Modules,
    /// Configuration management.
    Config {
        #[command(subcommand)]
        action: config_commands::ConfigAction,
    },
}

/// Initialise tracing with an env filter and a human or JSON formatter.
fn init_telemetry(cli: &Cli, config: &HeraldConfig) {
    let level = cli.log_level.as_deref().unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs || config.logging.json {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .init();
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<HeraldConfig> {
    match &cli.config {
        Some(path) => herald_config::load_config(path),
        None => Ok(herald_config::discover_and_load()),
    }
}

async fn build_registry(admins: &[String], events: &EventBus) -> anyhow::Result<Registry> {
    let mut builder = RegistryBuilder::with_events(events.clone());
    builder.register_all(demo::modules(admins)?).await?;
    Ok(builder.freeze())
}

async fn serve(config: HeraldConfig, admins: Vec<String>, user: String) -> anyhow::Result<()> {
    let diagnostics = herald_config::validate(&config);
    for d in &diagnostics.diagnostics {
        warn!(path = %d.path, severity = %d.severity, "{}", d.message);
    }
    if diagnostics.has_errors() {
        anyhow::bail!("invalid configuration, run `herald config check` for details");
    }

    let events = EventBus::default();
    let mut lifecycle = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = lifecycle.recv().await {
            match event {
                LifecycleEvent::ModuleRejected { name, reason } => {
                    warn!(module = %name, reason = %reason, "module rejected");
                },
                other => debug!(event = ?other, "lifecycle event"),
            }
        }
    });

    let registry = Arc::new(build_registry(&admins, &events).await?);
    let deps = Arc::new(Dependencies::new(
        Arc::new(console::ConsoleSink) as Arc<dyn ReplySink>,
        demo::services(),
        events,
    ));
    let router = Router::new(
        registry,
        deps,
        config.router.clone(),
        config.messages.clone(),
    );

    let mut fan_in = FanIn::new(config.router.channel_capacity);
    fan_in.spawn(Box::new(console::ConsoleSource::new(user)));
    let inbound = fan_in.finish();

    let shutdown = CancellationToken::new();
    let ctrl_c = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("interrupt received, shutting down");
            ctrl_c.cancel();
        }
    });

    eprintln!(
        "type `{}ping` (or another command) and press enter; ctrl-d to quit",
        config.router.prefix
    );
    router.serve(inbound, shutdown).await;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_telemetry(&cli, &config);

    info!(version = env!("CARGO_PKG_VERSION"), "herald starting");

    let admins = to_list(&cli.admins, ",");
    match cli.command {
        None => serve(config, admins, "console".into()).await,
        Some(Commands::Serve { user }) => serve(config, admins, user).await,
        Some(Commands::Modules) => {
            let registry = build_registry(&admins, &EventBus::default()).await?;
            println!(
                "{}",
                serde_json::to_string_pretty(&registry.command_manifest())?
            );
            Ok(())
        },
        Some(Commands::Config { action }) => config_commands::handle_config(action, &config),
    }
}
