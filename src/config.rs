use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default location of the optional config file, relative to the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".gh-stats.toml";

/// Base URL of the public GitHub REST API.
pub const DEFAULT_API_URL: &str = "https://api.github.com";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level configuration loaded from .gh-stats.toml.
///
/// All fields are optional, the tool works with zero config as long as
/// GITHUB_TOKEN is set in the environment.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// GitHub-specific settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// On-disk response cache settings
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubConfig {
    /// GitHub API token. If None, falls back to GITHUB_TOKEN env var.
    pub token: Option<String>,

    /// API base URL, mainly useful for GitHub Enterprise. Defaults to api.github.com.
    pub api_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheConfig {
    /// Directory holding cached responses. If None, falls back to CACHE env var.
    pub dir: Option<PathBuf>,
}

impl Config {
    /// Load configuration from `path`, or from .gh-stats.toml in the current
    /// directory when no path is given. A missing default file yields the
    /// default config; an explicitly requested file must exist.
    ///
    /// Values left unset by the file are filled from GITHUB_TOKEN and CACHE.
    pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
        let mut config = match path {
            Some(path) => Self::load_from(path)?,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from(default_path)?
                } else {
                    Config::default()
                }
            }
        };

        config.apply_env(
            std::env::var("GITHUB_TOKEN").ok(),
            std::env::var_os("CACHE").map(PathBuf::from),
        );

        Ok(config)
    }

    /// Load from a specific path (useful for testing).
    pub fn load_from(path: &Path) -> Result<Config, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Fill unset fields from environment-provided values. The config file
    /// takes precedence; empty environment values count as unset.
    fn apply_env(&mut self, token: Option<String>, cache_dir: Option<PathBuf>) {
        if self.github.token.is_none() {
            self.github.token = token.filter(|t| !t.trim().is_empty());
        }
        if self.cache.dir.is_none() {
            self.cache.dir = cache_dir.filter(|d| !d.as_os_str().is_empty());
        }
    }

    pub fn github_token(&self) -> Option<&str> {
        self.github.token.as_deref()
    }

    pub fn api_url(&self) -> &str {
        self.github.api_url.as_deref().unwrap_or(DEFAULT_API_URL)
    }

    pub fn cache_dir(&self) -> Option<&Path> {
        self.cache.dir.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.github_token().is_none());
        assert!(config.cache_dir().is_none());
        assert_eq!(config.api_url(), DEFAULT_API_URL);
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[github]
token = "abc"
api_url = "https://github.example.com/api/v3"

[cache]
dir = "/tmp/gh-cache"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.github_token(), Some("abc"));
        assert_eq!(config.api_url(), "https://github.example.com/api/v3");
        assert_eq!(config.cache_dir(), Some(Path::new("/tmp/gh-cache")));
    }

    #[test]
    fn test_env_fills_unset_fields() {
        let mut config = Config::default();
        config.apply_env(Some("from-env".to_string()), Some(PathBuf::from("cache")));
        assert_eq!(config.github_token(), Some("from-env"));
        assert_eq!(config.cache_dir(), Some(Path::new("cache")));
    }

    #[test]
    fn test_file_values_take_precedence_over_env() {
        let mut config: Config = toml::from_str(
            r#"
[github]
token = "from-file"

[cache]
dir = "file-cache"
"#,
        )
        .unwrap();
        config.apply_env(Some("from-env".to_string()), Some(PathBuf::from("env-cache")));
        assert_eq!(config.github_token(), Some("from-file"));
        assert_eq!(config.cache_dir(), Some(Path::new("file-cache")));
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(Some("  ".to_string()), Some(PathBuf::new()));
        assert!(config.github_token().is_none());
        assert!(config.cache_dir().is_none());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gh-stats.toml");
        std::fs::write(&path, "[cache]\ndir = \"responses\"\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.cache_dir(), Some(Path::new("responses")));
    }

    #[test]
    fn test_load_from_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gh-stats.toml");
        std::fs::write(&path, "[github\n").unwrap();

        assert!(matches!(Config::load_from(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = Config::load(Some(dir.path().join("missing.toml").as_path()));
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }
}
