use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MODEL: &str = "gpt-5-nano";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TEMPERATURE: f32 = 0.2;
pub const DEFAULT_TIMEOUT_SECS: u64 = 90;
pub const DEFAULT_SECRETS_PATH: &str = ".amea/secrets.toml";

/// Model name prefixes that reject the `temperature` parameter
pub const NO_TEMPERATURE_MODELS: [&str; 4] = ["gpt-5", "o1", "o3", "o4"];

pub const KEY_API_KEY: &str = "OPENAI_API_KEY";
pub const KEY_BASE_URL: &str = "OPENAI_BASE_URL";
pub const KEY_BASE_URL_ALIAS: &str = "AMEA_OPENAI_BASE_URL";
pub const KEY_MODEL: &str = "AMEA_OPENAI_MODEL";
pub const KEY_TEMPERATURE: &str = "AMEA_OPENAI_TEMPERATURE";
pub const KEY_TIMEOUT: &str = "AMEA_TIMEOUT_SECS";
pub const KEY_FAILURE_POLICY: &str = "AMEA_MARKET_FAILURE_POLICY";
pub const KEY_INDICATORS: &str = "AMEA_INDICATORS_PATH";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {key} from {provider}: {value:?}")]
    Invalid {
        key: String,
        provider: String,
        value: String,
    },
    #[error("failed to read secrets file {path}: {source}")]
    SecretsIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid secrets file {path}: {source}")]
    SecretsParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// What to do when a single market snapshot fails for a reason other than
/// missing credentials.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketFailurePolicy {
    /// Fail the whole run, naming the market
    #[default]
    Abort,
    /// Substitute the heuristic snapshot when curated indicators exist
    Fallback,
}

impl FromStr for MarketFailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(MarketFailurePolicy::Abort),
            "fallback" => Ok(MarketFailurePolicy::Fallback),
            other => Err(format!("unknown market failure policy: {other}")),
        }
    }
}

impl fmt::Display for MarketFailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketFailurePolicy::Abort => write!(f, "abort"),
            MarketFailurePolicy::Fallback => write!(f, "fallback"),
        }
    }
}

/// Chat-completion connection settings, passed explicitly to every call.
#[derive(Clone)]
pub struct ChatGptConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl fmt::Debug for ChatGptConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChatGptConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl Default for ChatGptConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ChatGptConfig {
    pub fn new(api_key: &str) -> Self {
        Self {
            api_key: Some(api_key.to_string()),
            ..Self::default()
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = Some(url.to_string());
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }

    /// Temperature to send, or None for models that reject the parameter
    pub fn resolved_temperature(&self) -> Option<f32> {
        let model = self.model.to_lowercase();
        if NO_TEMPERATURE_MODELS.iter().any(|p| model.starts_with(p)) {
            None
        } else {
            Some(self.temperature)
        }
    }

    pub fn completions_url(&self) -> String {
        let base = self.base_url.as_deref().unwrap_or(DEFAULT_BASE_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }
}

pub fn is_chatgpt_configured(config: &ChatGptConfig) -> bool {
    config.is_configured()
}

/// A named source of string settings.
pub trait SettingsProvider: Send + Sync {
    fn name(&self) -> &str;
    fn get(&self, key: &str) -> Option<String>;
}

/// Values entered interactively for the current session (CLI flags or a UI form)
#[derive(Debug, Clone, Default)]
pub struct SessionSettings {
    values: HashMap<String, String>,
}

impl SessionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: &str, value: Option<impl ToString>) -> &mut Self {
        if let Some(v) = value {
            self.values.insert(key.to_string(), v.to_string());
        }
        self
    }
}

impl SettingsProvider for SessionSettings {
    fn name(&self) -> &str {
        "session"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSettings;

impl SettingsProvider for EnvSettings {
    fn name(&self) -> &str {
        "env"
    }

    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Flat TOML secrets file. A missing file provides nothing.
#[derive(Debug, Clone, Default)]
pub struct SecretsFile {
    values: HashMap<String, String>,
}

impl SecretsFile {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!("No secrets file at {}", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::SecretsIo {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| ConfigError::SecretsParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        let table: toml::Table = text.parse()?;
        let values = table
            .into_iter()
            .filter_map(|(key, value)| {
                let value = match value {
                    toml::Value::String(s) => s,
                    toml::Value::Integer(i) => i.to_string(),
                    toml::Value::Float(f) => f.to_string(),
                    toml::Value::Boolean(b) => b.to_string(),
                    _ => return None,
                };
                Some((key, value))
            })
            .collect();
        Ok(Self { values })
    }
}

impl SettingsProvider for SecretsFile {
    fn name(&self) -> &str {
        "secrets"
    }

    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Ordered provider chain; the first non-blank value wins.
#[derive(Default)]
pub struct LayeredSettings {
    providers: Vec<Box<dyn SettingsProvider>>,
}

impl LayeredSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// session (only when the caller has one) -> env -> secrets
    pub fn standard(
        session: SessionSettings,
        session_available: bool,
        secrets: SecretsFile,
    ) -> Self {
        let mut layered = Self::new();
        if session_available {
            layered = layered.with_provider(session);
        }
        layered.with_provider(EnvSettings).with_provider(secrets)
    }

    pub fn with_provider(mut self, provider: impl SettingsProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Returns the value and the name of the provider that supplied it
    pub fn lookup(&self, key: &str) -> Option<(String, &str)> {
        self.providers.iter().find_map(|p| {
            p.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .map(|v| (v, p.name()))
        })
    }

    fn lookup_any(&self, keys: &[&str]) -> Option<(String, &str)> {
        keys.iter().find_map(|k| self.lookup(k))
    }

    fn parsed<T: FromStr>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.lookup(key) {
            None => Ok(None),
            Some((value, provider)) => value.parse().map(Some).map_err(|_| ConfigError::Invalid {
                key: key.to_string(),
                provider: provider.to_string(),
                value,
            }),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub chatgpt: ChatGptConfig,
    pub market_failure_policy: MarketFailurePolicy,
    pub indicators_path: Option<PathBuf>,
}

impl Config {
    /// Load a `.env` file into the process environment (a specific file, or the default `.env`).
    pub fn load_env_file(path: Option<&str>) {
        match path {
            Some(p) => {
                dotenvy::from_filename(p).ok();
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
    }

    pub fn resolve(settings: &LayeredSettings) -> Result<Self, ConfigError> {
        let chatgpt = ChatGptConfig {
            api_key: settings.lookup(KEY_API_KEY).map(|(v, _)| v),
            base_url: settings
                .lookup_any(&[KEY_BASE_URL, KEY_BASE_URL_ALIAS])
                .map(|(v, _)| v),
            model: settings
                .lookup(KEY_MODEL)
                .map(|(v, _)| v)
                .unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: settings
                .parsed(KEY_TEMPERATURE)?
                .unwrap_or(DEFAULT_TEMPERATURE),
            timeout_secs: settings.parsed(KEY_TIMEOUT)?.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        Ok(Self {
            chatgpt,
            market_failure_policy: settings.parsed(KEY_FAILURE_POLICY)?.unwrap_or_default(),
            indicators_path: settings.lookup(KEY_INDICATORS).map(|(v, _)| PathBuf::from(v)),
        })
    }
}
