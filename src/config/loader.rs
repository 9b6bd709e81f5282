// Configuration loader
// Layers ~/.deck-debater/config.toml and environment overrides over the defaults

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use super::constants::{BACKEND_URL_ENV, BIND_ADDR_ENV};
use super::settings::Config;

/// Default location of the user config file, if a home directory exists.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".deck-debater").join("config.toml"))
}

/// Load configuration from an explicit file path, then apply environment overrides.
///
/// A missing file is not an error; the defaults are used instead.
pub fn load_config_from(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(path) if path.exists() => {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            let config: Config = toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?;
            tracing::debug!("Loaded configuration from {}", path.display());
            config
        }
        _ => Config::default(),
    };

    apply_env_overrides(&mut config, |key| std::env::var(key).ok());

    config
        .validate()
        .context("Configuration validation failed")?;

    Ok(config)
}

/// Apply `PYTHON_API_URL` / `DECK_DEBATER_BIND` style overrides.
///
/// Takes a lookup function so tests don't have to mutate the process environment.
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(BACKEND_URL_ENV).filter(|v| !v.trim().is_empty()) {
        config.backend.base_url = url.trim().to_string();
    }
    if let Some(addr) = lookup(BIND_ADDR_ENV).filter(|v| !v.trim().is_empty()) {
        config.server.bind_address = addr.trim().to_string();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config_from(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
    }

    #[test]
    fn test_file_values_are_loaded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            credential_env = "DECK_KEY"

            [server]
            bind_address = "0.0.0.0:4000"
            cors_permissive = true

            [backend]
            request_timeout_secs = 90
            "#,
        )
        .unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.server.bind_address, "0.0.0.0:4000");
        assert!(config.server.cors_permissive);
        assert_eq!(config.backend.request_timeout_secs, Some(90));
        assert_eq!(config.credential_env, "DECK_KEY");
    }

    #[test]
    fn test_invalid_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nbind_address = ").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(format!("{err:#}").contains("Failed to parse config file"));
    }

    #[test]
    fn test_env_overrides_win_over_file() {
        let mut config = Config::default();
        let env: HashMap<&str, &str> = [
            ("PYTHON_API_URL", "http://analysis.internal:8000"),
            ("DECK_DEBATER_BIND", "0.0.0.0:8080"),
        ]
        .into_iter()
        .collect();

        apply_env_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));
        assert_eq!(config.backend.base_url, "http://analysis.internal:8000");
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        apply_env_overrides(&mut config, |_| Some("  ".to_string()));
        assert_eq!(config, Config::default());
    }
}
