//! Configuration management.
//!
//! Settings are layered with the `config` crate: built-in defaults, then an
//! optional TOML file, then `REFAUDIT_`-prefixed environment variables
//! (sections separated by `__`, e.g. `REFAUDIT_HTTP__PAUSE_MS=0`).
//!
//! # Configuration File Format
//!
//! ```toml
//! [contact]
//! email = "editor@example.org"
//! tool = "refaudit"
//!
//! [http]
//! timeout_secs = 30
//! pause_ms = 200
//!
//! [endpoints]
//! crossref = "https://api.crossref.org"
//! pubmed = "https://eutils.ncbi.nlm.nih.gov/entrez/eutils"
//!
//! [resolution]
//! strict = true
//! search_rows = 5
//! debug_rows = 3
//! pubmed_rows = 5
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up in the working directory
pub const LOCAL_CONFIG_FILE: &str = "refaudit.toml";

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Identification sent to the registries
    #[serde(default)]
    pub contact: ContactConfig,

    /// Transport settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Registry base URLs
    #[serde(default)]
    pub endpoints: EndpointConfig,

    /// Resolution pipeline settings
    #[serde(default)]
    pub resolution: ResolutionConfig,
}

impl Config {
    /// `User-Agent` sent to every registry
    pub fn user_agent(&self) -> String {
        format!(
            "{}/{} (mailto:{})",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            self.contact.email
        )
    }

    /// Render the effective configuration as TOML
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::from)
    }
}

/// Contact details for registry etiquette
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactConfig {
    /// Contact email (`mailto:` in the User-Agent, `email` for E-utilities)
    #[serde(default = "default_email")]
    pub email: String,

    /// E-utilities `tool` parameter
    #[serde(default = "default_tool")]
    pub tool: String,
}

impl Default for ContactConfig {
    fn default() -> Self {
        Self {
            email: default_email(),
            tool: default_tool(),
        }
    }
}

fn default_email() -> String {
    std::env::var("CONTACT_EMAIL")
        .ok()
        .filter(|email| !email.trim().is_empty())
        .unwrap_or_else(|| "you@example.com".to_string())
}

fn default_tool() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

/// HTTP transport configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Pause after every registry call, in milliseconds
    #[serde(default = "default_pause_ms")]
    pub pause_ms: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            pause_ms: default_pause_ms(),
        }
    }
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_pause_ms() -> u64 {
    200
}

/// Registry base URLs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointConfig {
    #[serde(default = "default_crossref_url")]
    pub crossref: String,

    #[serde(default = "default_pubmed_url")]
    pub pubmed: String,
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            crossref: default_crossref_url(),
            pubmed: default_pubmed_url(),
        }
    }
}

fn default_crossref_url() -> String {
    "https://api.crossref.org".to_string()
}

fn default_pubmed_url() -> String {
    "https://eutils.ncbi.nlm.nih.gov/entrez/eutils".to_string()
}

/// Resolution pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionConfig {
    /// Require title/year/author agreement on search-based matches
    #[serde(default = "default_true")]
    pub strict: bool,

    /// Bibliographic candidates fetched per search
    #[serde(default = "default_search_rows")]
    pub search_rows: usize,

    /// Candidates attached to misses in debug mode
    #[serde(default = "default_debug_rows")]
    pub debug_rows: usize,

    /// PubMed `retmax`
    #[serde(default = "default_pubmed_rows")]
    pub pubmed_rows: usize,
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            strict: true,
            search_rows: default_search_rows(),
            debug_rows: default_debug_rows(),
            pubmed_rows: default_pubmed_rows(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_search_rows() -> usize {
    5
}

fn default_debug_rows() -> usize {
    3
}

fn default_pubmed_rows() -> usize {
    5
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Load configuration from an optional file plus the environment
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path));
    }

    let settings = builder
        .add_source(
            config::Environment::with_prefix("REFAUDIT")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

/// Locate a configuration file: `./refaudit.toml`, then the user config directory
pub fn find_config_file() -> Option<PathBuf> {
    let local = PathBuf::from(LOCAL_CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }

    dirs::config_dir()
        .map(|dir| dir.join(env!("CARGO_PKG_NAME")).join("config.toml"))
        .filter(|path| path.is_file())
}

/// Resolve the effective configuration: explicit path, discovered file, or defaults
pub fn get_config(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    match explicit {
        Some(path) => load_config(Some(path)),
        None => load_config(find_config_file().as_deref()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.resolution.strict);
        assert_eq!(config.resolution.search_rows, 5);
        assert_eq!(config.resolution.debug_rows, 3);
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.pause_ms, 200);
        assert_eq!(config.endpoints.crossref, "https://api.crossref.org");
        assert_eq!(config.contact.tool, "refaudit");
    }

    #[test]
    fn test_user_agent_carries_contact() {
        let mut config = Config::default();
        config.contact.email = "editor@example.org".to_string();
        let ua = config.user_agent();
        assert!(ua.starts_with("refaudit/"));
        assert!(ua.ends_with("(mailto:editor@example.org)"));
    }

    #[test]
    fn test_load_config_file_partial() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("refaudit.toml");
        std::fs::write(
            &path,
            r#"
[http]
pause_ms = 0

[resolution]
strict = false
"#,
        )
        .unwrap();

        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.http.pause_ms, 0);
        assert_eq!(config.http.timeout_secs, 30);
        assert!(!config.resolution.strict);
        assert_eq!(config.resolution.pubmed_rows, 5);
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config(Some(Path::new("/nonexistent/refaudit.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_invalid_toml() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("invalid.toml");
        std::fs::write(&path, "invalid = toml = content").unwrap();

        assert!(load_config(Some(&path)).is_err());
    }

    #[test]
    fn test_to_toml_reloads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("roundtrip.toml");

        let mut config = Config::default();
        config.endpoints.pubmed = "http://localhost:1234".to_string();
        config.resolution.debug_rows = 7;
        std::fs::write(&path, config.to_toml().unwrap()).unwrap();

        let loaded = load_config(Some(&path)).unwrap();
        assert_eq!(loaded.endpoints.pubmed, "http://localhost:1234");
        assert_eq!(loaded.resolution.debug_rows, 7);
    }
}
