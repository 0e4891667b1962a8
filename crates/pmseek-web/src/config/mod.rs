//! Configuration loading for pmseek.
//! Reads pmseek.toml from the current directory or the path in PMSEEK_CONFIG,
//! then applies environment overrides (NCBI_API_KEY, PORT).

use pmseek_literature::models::{DEFAULT_MAX_RESULTS, MAX_ABS, MAX_RESULTS_LIMIT};
use pmseek_literature::sources::pubmed::{EFETCH_URL, ESEARCH_URL};
use pmseek_literature::PubMedConfig;
use secrecy::SecretString;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pubmed: PubMedSettings,
    #[serde(default)]
    pub search: SearchSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16    { 8080 }

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: default_host(), port: default_port() }
    }
}

#[derive(Clone, Deserialize)]
pub struct PubMedSettings {
    #[serde(default = "default_esearch_url")]
    pub esearch_url: String,
    #[serde(default = "default_efetch_url")]
    pub efetch_url: String,
    pub api_key: Option<String>,
    #[serde(default = "default_tool")]
    pub tool: String,
    pub email: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_delay_with_key_ms")]
    pub delay_with_key_ms: u64,
    #[serde(default = "default_delay_without_key_ms")]
    pub delay_without_key_ms: u64,
}

fn default_esearch_url()         -> String { ESEARCH_URL.to_string() }
fn default_efetch_url()          -> String { EFETCH_URL.to_string() }
fn default_tool()                -> String { "pmseek".to_string() }
fn default_timeout_secs()        -> u64    { 30 }
fn default_delay_with_key_ms()   -> u64    { 110 }
fn default_delay_without_key_ms() -> u64   { 340 }

impl Default for PubMedSettings {
    fn default() -> Self {
        Self {
            esearch_url: default_esearch_url(),
            efetch_url: default_efetch_url(),
            api_key: None,
            tool: default_tool(),
            email: None,
            timeout_secs: default_timeout_secs(),
            delay_with_key_ms: default_delay_with_key_ms(),
            delay_without_key_ms: default_delay_without_key_ms(),
        }
    }
}

impl fmt::Debug for PubMedSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PubMedSettings")
            .field("esearch_url", &self.esearch_url)
            .field("efetch_url", &self.efetch_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("tool", &self.tool)
            .field("email", &self.email)
            .field("timeout_secs", &self.timeout_secs)
            .field("delay_with_key_ms", &self.delay_with_key_ms)
            .field("delay_without_key_ms", &self.delay_without_key_ms)
            .finish()
    }
}

impl PubMedSettings {
    /// Client configuration; the API key moves into a `SecretString`.
    pub fn client_config(&self) -> PubMedConfig {
        PubMedConfig {
            esearch_url: self.esearch_url.clone(),
            efetch_url: self.efetch_url.clone(),
            api_key: self.api_key.clone().map(SecretString::from),
            tool: self.tool.clone(),
            email: self.email.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            delay_with_key: Duration::from_millis(self.delay_with_key_ms),
            delay_without_key: Duration::from_millis(self.delay_without_key_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SearchSettings {
    #[serde(default = "default_max_results")]
    pub default_max_results: usize,
    #[serde(default = "default_max_results_limit")]
    pub max_results_limit: usize,
    /// Abstract budget in characters; 0 disables clipping.
    #[serde(default = "default_max_abstract_chars")]
    pub max_abstract_chars: usize,
}

fn default_max_results()        -> usize { DEFAULT_MAX_RESULTS }
fn default_max_results_limit()  -> usize { MAX_RESULTS_LIMIT }
fn default_max_abstract_chars() -> usize { MAX_ABS }

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            default_max_results: default_max_results(),
            max_results_limit: default_max_results_limit(),
            max_abstract_chars: default_max_abstract_chars(),
        }
    }
}


impl Config {
    /// Load configuration: `.env`, then pmseek.toml (or PMSEEK_CONFIG), then env overrides.
    /// A missing default config file means built-in defaults; a missing
    /// PMSEEK_CONFIG path is an error.
    pub fn load() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let explicit = std::env::var("PMSEEK_CONFIG").ok();
        let path = explicit.clone().unwrap_or_else(|| "pmseek.toml".to_string());

        let mut config = if Path::new(&path).exists() {
            let content = std::fs::read_to_string(&path)?;
            Self::from_toml(&content)?
        } else if explicit.is_some() {
            anyhow::bail!(
                "Config file not found: {}\n\
                 Copy pmseek.example.toml to pmseek.toml and edit it.",
                path
            );
        } else {
            Config::default()
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Overrides from the environment. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F) -> anyhow::Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var("NCBI_API_KEY") {
            self.pubmed.api_key = Some(key.trim().to_string());
        }
        if let Some(port) = var("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("Invalid PORT {:?}: {}", port, e))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let s = &self.search;
        if s.max_results_limit == 0 || s.max_results_limit > MAX_RESULTS_LIMIT {
            anyhow::bail!(
                "search.max_results_limit must be between 1 and {}, got {}",
                MAX_RESULTS_LIMIT,
                s.max_results_limit
            );
        }
        if s.default_max_results == 0 || s.default_max_results > s.max_results_limit {
            anyhow::bail!(
                "search.default_max_results must be between 1 and {}, got {}",
                s.max_results_limit,
                s.default_max_results
            );
        }
        if self.pubmed.timeout_secs == 0 {
            anyhow::bail!("pubmed.timeout_secs must be positive");
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
