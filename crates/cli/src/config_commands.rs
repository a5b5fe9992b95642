use {anyhow::Result, clap::Subcommand, herald_config::HeraldConfig};

use herald_config::validate::{self, Severity};

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Validate the configuration and report errors/warnings.
    Check,
    /// Print the effective configuration as JSON.
    Show,
}

pub fn handle_config(action: ConfigAction, config: &HeraldConfig) -> Result<()> {
    match action {
        ConfigAction::Check => check(config),
        ConfigAction::Show => {
            println!("{}", serde_json::to_string_pretty(config)?);
            Ok(())
        },
    }
}

/// ANSI color codes.
const RED: &str = "\x1b[31m";
const YELLOW: &str = "\x1b[33m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

fn check(config: &HeraldConfig) -> Result<()> {
    match herald_config::find_config_file() {
        Some(path) => eprintln!("Checking {}\n", path.display()),
        None => eprintln!("No config file found; checking defaults.\n"),
    }

    let result = validate::validate(config);
    for d in &result.diagnostics {
        let color = match d.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        eprintln!("  {BOLD}{color}{}{RESET} {}: {}", d.severity, d.path, d.message);
    }

    let errors = result.count(Severity::Error);
    let warnings = result.count(Severity::Warning);
    if !result.diagnostics.is_empty() {
        eprintln!();
    }
    if errors == 0 && warnings == 0 {
        eprintln!("No issues found.");
    } else {
        eprintln!("{errors} error(s), {warnings} warning(s)");
    }

    if errors > 0 {
        anyhow::bail!("configuration has {errors} error(s)");
    }
    Ok(())
}
