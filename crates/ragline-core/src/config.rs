use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    /// Wrap an already assembled figment, e.g. one built in a test.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{key}': {e}")))
    }

    pub fn settings(&self) -> Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))
    }

    fn validate_for_env(&self, env: &str) -> Result<()> {
        let settings = self.settings()?;
        if !(0.0..=1.0).contains(&settings.retrieval.score_threshold) {
            return Err(Error::InvalidConfig(format!(
                "retrieval.score_threshold must be within [0, 1], got {}",
                settings.retrieval.score_threshold
            )));
        }
        if settings.retrieval.limit == 0 {
            return Err(Error::InvalidConfig("retrieval.limit must be at least 1".into()));
        }
        if settings.embedding.batch_size == 0 {
            return Err(Error::InvalidConfig("embedding.batch_size must be at least 1".into()));
        }
        if matches!(env, "prod" | "production") && settings.embedding.provider == EmbeddingProvider::Hashed {
            return Err(Error::InvalidConfig(
                "the hashed embedder is for tests and development, not production".into(),
            ));
        }
        Ok(())
    }
}

/// Every tunable of the system. All fields have defaults so an empty
/// configuration is valid.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataConfig,
    pub embedding: EmbeddingConfig,
    pub vector: VectorConfig,
    pub llm: LlmConfig,
    pub retrieval: RetrievalConfig,
    pub pipeline: PipelineConfig,
    pub assistant: AssistantConfig,
    pub fast_responses: BTreeMap<String, String>,
    pub logging: LoggingConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            embedding: EmbeddingConfig::default(),
            vector: VectorConfig::default(),
            llm: LlmConfig::default(),
            retrieval: RetrievalConfig::default(),
            pipeline: PipelineConfig::default(),
            assistant: AssistantConfig::default(),
            fast_responses: default_fast_responses(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Greetings and thanks answered without any model call.
pub fn default_fast_responses() -> BTreeMap<String, String> {
    [
        ("hello", "Hi there! How can I help you today?"),
        ("hi", "Hello! What can I do for you?"),
        ("hey", "Hey! How's it going?"),
        ("good morning", "Good morning! Hope you have a great day."),
        ("good afternoon", "Good afternoon! How can I assist you?"),
        ("good evening", "Good evening! What brings you here?"),
        ("how are you", "I'm doing well, thank you for asking! How are you?"),
        ("how's it going", "It's going well, thanks! And yourself?"),
        ("what's up", "Not much, just here to help! What about you?"),
        ("nice to meet you", "Nice to meet you too!"),
        ("greetings", "Greetings! How may I be of service?"),
        ("hiya", "Hiya! What's up?"),
        ("thank you", "You're very welcome!"),
        ("thanks", "No problem at all!"),
        ("thank you so much", "My pleasure! Glad I could help."),
        ("i appreciate it", "Glad to be of assistance!"),
        ("cheers", "Cheers! Happy to help."),
        ("much appreciated", "You're most welcome!"),
        ("i'm grateful", "I'm happy to help!"),
        ("thanks a lot", "Anytime!"),
    ]
    .into_iter()
    .map(|(phrase, reply)| (phrase.to_string(), reply.to_string()))
    .collect()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub documents_dir: String,
    pub lancedb_dir: String,
    pub collection: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            documents_dir: "./documents".to_string(),
            lancedb_dir: "./data/lancedb".to_string(),
            collection: "documents".to_string(),
        }
    }
}

impl DataConfig {
    pub fn documents_dir(&self) -> PathBuf {
        expand_path(&self.documents_dir)
    }

    pub fn lancedb_dir(&self) -> PathBuf {
        expand_path(&self.lancedb_dir)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingProvider {
    BgeM3,
    Hashed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProvider,
    pub model_dir: Option<String>,
    pub max_len: usize,
    pub batch_size: usize,
    /// Only used by the hashed provider; BGE-M3 is fixed at 1024.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::BgeM3,
            model_dir: None,
            max_len: 256,
            batch_size: 32,
            dimension: 384,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    #[default]
    Lancedb,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub backend: VectorBackend,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub model: String,
    pub api_key_env: String,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: u64,
    pub safety_threshold: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash".to_string(),
            api_key_env: "GOOGLE_AI_API_KEY".to_string(),
            api_key: None,
            base_url: None,
            timeout_secs: 120,
            safety_threshold: "BLOCK_LOW_AND_ABOVE".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub limit: usize,
    pub score_threshold: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { limit: 3, score_threshold: 0.2 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub max_question_chars: usize,
    pub min_question_chars: usize,
    pub history_turns: usize,
    pub query_max_tokens: u32,
    pub answer_max_tokens: u32,
    pub temperature: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_question_chars: 180,
            min_question_chars: 2,
            history_turns: 5,
            query_max_tokens: 500,
            answer_max_tokens: 3000,
            temperature: 0.1,
        }
    }
}

/// Who the assistant speaks for. Rendered into both system instructions and
/// the fallback sentence used when the context cannot answer a question.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub company: String,
    pub domain_description: String,
    pub support_email: String,
    pub support_phone: String,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            company: "AuraTech".to_string(),
            domain_description: "a technology company that manufactures phones, laptops, and accessories"
                .to_string(),
            support_email: "support@auratech.com".to_string(),
            support_phone: "0800-2872-8324".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub default: String,
    pub modules: BTreeMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { default: "info".to_string(), modules: BTreeMap::new() }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
