use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::HeraldConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &["herald.toml", "herald.yaml", "herald.yml", "herald.json"];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<HeraldConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./herald.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/herald/herald.{toml,yaml,yml,json}` (user-global)
///
/// Returns `HeraldConfig::default()` if no config file is found or the one
/// found fails to parse.
pub fn discover_and_load() -> HeraldConfig {
    if let Some(path) = find_config_file() {
        debug!(path = %path.display(), "loading config");
        match load_config(&path) {
            Ok(cfg) => return cfg,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            },
        }
    } else {
        debug!("no config file found, using defaults");
    }
    HeraldConfig::default()
}

/// Find the first config file in standard locations.
pub fn find_config_file() -> Option<PathBuf> {
    if let Some(path) = find_in(Path::new(".")) {
        return Some(path);
    }
    config_dir().and_then(|dir| find_in(&dir))
}

/// Returns the user-global config directory (`~/.config/herald/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "herald").map(|d| d.config_dir().to_path_buf())
}

fn find_in(dir: &Path) -> Option<PathBuf> {
    CONFIG_FILENAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|p| p.exists())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<HeraldConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "herald.toml", "[router]\nprefix = \"$\"\n");
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.router.prefix, "$");
    }

    #[test]
    fn loads_yaml_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = write(&dir, "herald.yaml", "router:\n  channel_capacity: 8\n");
        assert_eq!(load_config(&yaml).unwrap().router.channel_capacity, 8);

        let json = write(&dir, "herald.json", r#"{"logging": {"json": true}}"#);
        assert!(load_config(&json).unwrap().logging.json);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "herald.ini", "prefix=!");
        let err = load_config(&path).unwrap_err();
        assert!(err.to_string().contains("unsupported config format"));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = load_config(Path::new("/definitely/not/here/herald.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read"));
    }

    #[test]
    fn find_in_prefers_toml() {
        let dir = tempfile::tempdir().unwrap();
        write(&dir, "herald.json", "{}");
        write(&dir, "herald.toml", "");
        let found = find_in(dir.path()).unwrap();
        assert!(found.ends_with("herald.toml"));
    }
}
