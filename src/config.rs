//! TOML configuration parsing.
//!
//! Every command reads the same file (default `./config/kb.toml`):
//!
//! ```toml
//! [db]
//! path = "./data/kb.sqlite"
//!
//! [server]
//! bind = "127.0.0.1:8000"
//!
//! [snippets]
//! max_content_length = 400
//!
//! [classifier]
//! provider = "huggingface"
//! endpoint = "https://router.huggingface.co/hf-inference/models/facebook/bart-large-mnli"
//! api_key_env = "HF_API_KEY"
//! timeout_secs = 20
//! ```
//!
//! An optional `[keywords]` table replaces the built-in keyword lists used
//! by the fallback classifier.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    pub server: ServerConfig,
    #[serde(default)]
    pub snippets: SnippetsConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
    #[serde(default)]
    pub keywords: Option<KeywordsConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnippetsConfig {
    #[serde(default = "default_max_content_length")]
    pub max_content_length: usize,
}

impl Default for SnippetsConfig {
    fn default() -> Self {
        Self {
            max_content_length: default_max_content_length(),
        }
    }
}

fn default_max_content_length() -> usize {
    400
}

#[derive(Debug, Deserialize, Clone)]
pub struct ClassifierConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Name of the environment variable holding the bearer token.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            endpoint: default_endpoint(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_endpoint() -> String {
    "https://router.huggingface.co/hf-inference/models/facebook/bart-large-mnli".to_string()
}
fn default_api_key_env() -> String {
    "HF_API_KEY".to_string()
}
fn default_timeout_secs() -> u64 {
    20
}

impl ClassifierConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

/// Replacement keyword lists for the fallback classifier.
///
/// A label left out of the table keeps no keywords at all; to extend the
/// defaults, copy them into the config file.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct KeywordsConfig {
    #[serde(default)]
    pub technical: Vec<String>,
    #[serde(default)]
    pub urgent: Vec<String>,
    #[serde(default)]
    pub general: Vec<String>,
}

impl Config {
    /// Defaults used when no config file is available (e.g. `kb tag`).
    pub fn minimal() -> Self {
        Self {
            db: DbConfig {
                path: PathBuf::from("./data/kb.sqlite"),
            },
            server: ServerConfig {
                bind: "127.0.0.1:8000".to_string(),
            },
            snippets: SnippetsConfig::default(),
            classifier: ClassifierConfig::default(),
            keywords: None,
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    if config.snippets.max_content_length == 0 {
        anyhow::bail!("snippets.max_content_length must be > 0");
    }

    if config.classifier.timeout_secs == 0 {
        anyhow::bail!("classifier.timeout_secs must be > 0");
    }

    match config.classifier.provider.as_str() {
        "disabled" | "huggingface" => {}
        other => anyhow::bail!(
            "Unknown classifier provider: '{}'. Must be disabled or huggingface.",
            other
        ),
    }

    if config.classifier.is_enabled() && config.classifier.endpoint.trim().is_empty() {
        anyhow::bail!(
            "classifier.endpoint must be set when provider is '{}'",
            config.classifier.provider
        );
    }

    if let Some(keywords) = &config.keywords {
        let all = keywords
            .technical
            .iter()
            .chain(&keywords.urgent)
            .chain(&keywords.general);
        for keyword in all {
            if keyword.trim().is_empty() {
                anyhow::bail!("keywords entries must not be empty");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_src: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_src)?;
        validate(&config)?;
        Ok(config)
    }

    const BASE: &str = r#"
[db]
path = "./data/kb.sqlite"

[server]
bind = "127.0.0.1:8000"
"#;

    #[test]
    fn test_defaults_applied() {
        let config = parse(BASE).unwrap();
        assert_eq!(config.snippets.max_content_length, 400);
        assert_eq!(config.classifier.provider, "disabled");
        assert_eq!(config.classifier.api_key_env, "HF_API_KEY");
        assert_eq!(config.classifier.timeout_secs, 20);
        assert!(!config.classifier.is_enabled());
        assert!(config.keywords.is_none());
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let src = format!("{}\n[classifier]\nprovider = \"openai\"\n", BASE);
        let err = parse(&src).unwrap_err();
        assert!(err.to_string().contains("Unknown classifier provider"));
    }

    #[test]
    fn test_zero_max_length_rejected() {
        let src = format!("{}\n[snippets]\nmax_content_length = 0\n", BASE);
        assert!(parse(&src).is_err());
    }

    #[test]
    fn test_empty_keyword_rejected() {
        let src = format!("{}\n[keywords]\nurgent = [\"asap\", \"  \"]\n", BASE);
        assert!(parse(&src).is_err());
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/kb.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
