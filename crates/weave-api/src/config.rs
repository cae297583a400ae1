use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use weave_llm::{ModelId, ProviderCredentials};
use weave_types::{CostFunction, GraphConfig};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub llm: LlmSettings,
    pub graph: GraphSettings,
    pub tools: ToolsConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(skip)]
    pub mongodb_uri: String,
    #[serde(skip)]
    pub tavily_api_key: Option<String>,
    #[serde(skip)]
    pub credentials: ProviderCredentials,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MongoDbConfig {
    pub database: String,
    pub pool_size: u32,
    pub timeout_ms: u64,
}

impl Default for MongoDbConfig {
    fn default() -> Self {
        Self {
            database: "weave".to_string(),
            pool_size: 5,
            timeout_ms: 5000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    /// Model used when a request names none
    pub default_model: ModelId,
    /// Model that titles new threads; `None` keeps the word fallback only
    pub naming_model: Option<ModelId>,
    /// Sent to the provider only when set
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            default_model: ModelId::Gpt4oMini,
            naming_model: Some(ModelId::Gpt35Turbo),
            temperature: None,
            max_tokens: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GraphSettings {
    pub max_iterations: usize,
    pub model_timeout_secs: u64,
    pub history_budget: usize,
    pub cost_function: CostFunction,
    pub chunk_words: usize,
    pub chunk_delay_ms: u64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            model_timeout_secs: 120,
            history_budget: 10_000,
            cost_function: CostFunction::Tokens,
            chunk_words: 5,
            chunk_delay_ms: 100,
        }
    }
}

impl From<&GraphSettings> for GraphConfig {
    fn from(settings: &GraphSettings) -> Self {
        GraphConfig::new()
            .with_max_iterations(settings.max_iterations)
            .with_model_timeout(Duration::from_secs(settings.model_timeout_secs))
            .with_history_budget(settings.history_budget, settings.cost_function)
            .with_chunking(settings.chunk_words, Duration::from_millis(settings.chunk_delay_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub web_search_max_results: u32,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            web_search_max_results: 3,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. `WEAVE_<SECTION>__<KEY>` environment variables
    /// 4. `PORT`
    ///
    /// Secrets never come from files.
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(
                Environment::with_prefix("WEAVE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let mut cfg: Config = builder.build()?.try_deserialize()?;
        cfg.apply_env(|name| std::env::var(name).ok())?;
        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        ConfigLoader::builder()
            .add_source(File::from(path.as_ref()))
            .build()?
            .try_deserialize()
    }

    /// Read secrets and the `PORT` override through `lookup`
    ///
    /// A missing database URI is an error: the server never runs without a store.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        self.mongodb_uri = read("MONGODB_URI")
            .or_else(|| read("MONGODB_ATLAS_URI"))
            .ok_or_else(|| ConfigError::Message("MONGODB_URI environment variable is required".to_string()))?;

        if let Some(port) = read("PORT") {
            self.server.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::Message(format!("PORT is not a valid port: {}", port)))?;
        }

        self.tavily_api_key = read("TAVILY_API_KEY");
        self.credentials = ProviderCredentials {
            openai_api_key: read("OPENAI_API_KEY"),
            anthropic_api_key: read("ANTHROPIC_API_KEY"),
            deepseek_api_key: read("DEEPSEEK_API_KEY"),
            ..Default::default()
        };

        Ok(())
    }

    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig::from(&self.graph)
    }
}
