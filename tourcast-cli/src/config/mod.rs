//! Configuration file handling for the `tourcast` command.
//!
//! Settings are layered:
//! 1. Default values
//! 2. Config file (`--config`, `$TOURCAST_CONFIG` or `~/.tourcast/config.toml`)
//! 3. Environment variables (`OPENAI_API_KEY`, `OPENAI_BASE_URL`, `TOURCAST_LANGUAGE`)
//!
//! Command-line flags are applied on top by the caller.

use std::path::{Path, PathBuf};

use tourcast::config::TourConfig;
use tracing::{debug, info};

/// Error type for configuration file operations.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("failed to parse {path}: {source}")]
    TomlParse {
        /// File that failed to parse.
        path: PathBuf,
        /// Parser error.
        source: toml::de::Error,
    },
    /// TOML serialization error.
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// An explicitly requested file does not exist.
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    /// Refused to overwrite an existing file.
    #[error("config file already exists: {0} (use --force to overwrite)")]
    AlreadyExists(PathBuf),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Get the default config directory path.
#[must_use]
pub fn default_config_dir() -> PathBuf {
    dirs_next::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".tourcast")
}

/// Get the default config file path.
#[must_use]
pub fn config_path() -> PathBuf {
    default_config_dir().join("config.toml")
}

/// Loads settings from `explicit` or the default location, then applies the
/// environment.
///
/// An explicit path must exist; a missing default file means defaults.
pub async fn load_config(explicit: Option<&Path>) -> ConfigResult<TourConfig> {
    let config = match explicit {
        Some(path) if !path.exists() => return Err(ConfigError::NotFound(path.to_path_buf())),
        Some(path) => load_config_from(path).await?,
        None => {
            let path = config_path();
            if path.exists() {
                load_config_from(&path).await?
            } else {
                debug!(path = %path.display(), "config file not found, using defaults");
                TourConfig::default()
            }
        }
    };
    Ok(config.with_env())
}

/// Load configuration from a specific file, without environment overrides.
pub async fn load_config_from(path: &Path) -> ConfigResult<TourConfig> {
    let content = tokio::fs::read_to_string(path).await?;
    let config = parse_config(&content).map_err(|source| ConfigError::TomlParse {
        path: path.to_path_buf(),
        source,
    })?;
    debug!(path = %path.display(), "loaded config file");
    Ok(config)
}

/// Parses TOML text into settings.
pub fn parse_config(content: &str) -> Result<TourConfig, toml::de::Error> {
    toml::from_str(content)
}

/// Save configuration to a specific path, creating parent directories.
pub async fn save_config_to(config: &TourConfig, path: &Path) -> ConfigResult<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = toml::to_string_pretty(config)?;
    tokio::fs::write(path, content).await?;
    info!(path = %path.display(), "saved config file");

    Ok(())
}

/// Writes a default configuration file to `path`.
///
/// The API key is never written; it is expected in `OPENAI_API_KEY`.
pub async fn init_config(path: &Path, force: bool) -> ConfigResult<TourConfig> {
    if path.exists() && !force {
        return Err(ConfigError::AlreadyExists(path.to_path_buf()));
    }
    let config = TourConfig::default();
    save_config_to(&config, path).await?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use tourcast::tour::{BudgetStrategy, LengthPolicy};

    fn scratch(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("tourcast-cli-{}-{name}", std::process::id()))
            .join("config.toml")
    }

    #[test]
    fn test_default_paths() {
        assert!(default_config_dir().ends_with(".tourcast"));
        assert!(config_path().ends_with("config.toml"));
    }

    #[test]
    fn test_parse_sample_config() {
        let config = parse_config(
            r#"
            language = "fr"
            voice = "alloy"
            budget_strategy = "planned"
            length_policy = { strict = { retries = 1 } }

            [models]
            specialist = "gpt-4o-search-preview"
            "#,
        )
        .unwrap();

        assert_eq!(config.language, "fr");
        assert_eq!(config.voice, "alloy");
        assert_eq!(config.budget_strategy, BudgetStrategy::Planned);
        assert_eq!(config.length_policy, LengthPolicy::Strict { retries: 1 });
        assert_eq!(config.models.specialist, "gpt-4o-search-preview");
        assert_eq!(config.models.planner, "gpt-4o");
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(parse_config("colour = \"blue\"").is_err());
    }

    #[tokio::test]
    async fn test_missing_explicit_file_is_error() {
        let path = scratch("missing");
        let err = load_config(Some(path.as_path())).await.unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_init_then_load() {
        let path = scratch("init");
        let _ = tokio::fs::remove_file(&path).await;

        init_config(&path, false).await.unwrap();
        let err = init_config(&path, false).await.unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists(_)));
        init_config(&path, true).await.unwrap();

        let loaded = load_config_from(&path).await.unwrap();
        assert_eq!(loaded, TourConfig::default());

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert!(!written.contains("api_key"));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }

    #[tokio::test]
    async fn test_invalid_file_names_path() {
        let path = scratch("invalid");
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, "words_per_minute = \"fast\"").await.unwrap();

        let err = load_config_from(&path).await.unwrap_err();
        assert!(err.to_string().contains("config.toml"));

        let _ = tokio::fs::remove_dir_all(path.parent().unwrap()).await;
    }
}
