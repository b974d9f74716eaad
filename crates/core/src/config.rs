//! Configuration management for Paperbot.
//!
//! Configuration is merged from several sources, later ones winning:
//! - Built-in defaults
//! - Config file (`paperbot.yaml` in the workspace, or an explicit path)
//! - Environment variables
//! - Command-line flags
//!
//! Relative paths are resolved against the workspace directory.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};

/// Name of the config file looked up in the workspace root.
pub const CONFIG_FILE_NAME: &str = "paperbot.yaml";

/// File name of the persisted similarity index inside the index directory.
pub const INDEX_FILE_NAME: &str = "index.sqlite";

/// Embedding providers understood by the knowledge crate.
pub const KNOWN_EMBEDDING_PROVIDERS: [&str; 2] = ["ollama", "trigram"];

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Workspace root; relative paths below are resolved against it
    pub workspace: PathBuf,

    /// Config file that was merged, if any
    pub config_file: Option<PathBuf>,

    /// Log filter override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    pub ingest: IngestSettings,
    pub embedding: EmbeddingSettings,
    pub llm: LlmSettings,
    pub bot: BotSettings,
}

/// Where documents are read from and how they are chunked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct IngestSettings {
    /// Directory scanned for source documents
    pub papers_dir: PathBuf,

    /// Directory the index is written to
    pub index_dir: PathBuf,

    /// File extension of eligible documents, without the dot
    pub extension: String,

    /// Maximum chunk length in characters
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            papers_dir: PathBuf::from("papers"),
            index_dir: PathBuf::from("models/index"),
            extension: "tex".to_string(),
            chunk_size: 2000,
            chunk_overlap: 50,
        }
    }
}

/// Embedding provider selection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct EmbeddingSettings {
    /// Provider name: "ollama" or "trigram"
    pub provider: String,

    /// Provider-specific model identifier
    pub model: String,

    /// Expected vector dimensionality
    pub dimensions: usize,

    /// Texts sent per embedding batch
    pub batch_size: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            model: "all-minilm".to_string(),
            dimensions: 384,
            batch_size: 32,
        }
    }
}

/// Language model endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct LlmSettings {
    /// Ollama base URL (also used for embeddings)
    pub endpoint: String,

    /// Chat model identifier; required to answer questions
    pub model: Option<String>,

    /// Upper bound for one generation call
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: None,
            timeout_secs: 120,
        }
    }
}

/// Messaging front-end settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "camelCase")]
pub struct BotSettings {
    /// Telegram bot token; required to serve
    pub token: Option<String>,

    /// Questions answered at the same time
    pub max_concurrent_requests: usize,
}

impl Default for BotSettings {
    fn default() -> Self {
        Self {
            token: None,
            max_concurrent_requests: 4,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    ingest: Option<IngestSettings>,
    embedding: Option<EmbeddingSettings>,
    llm: Option<LlmSettings>,
    bot: Option<BotSettings>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            ingest: IngestSettings::default(),
            embedding: EmbeddingSettings::default(),
            llm: LlmSettings::default(),
            bot: BotSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from defaults, the config file and the process
    /// environment.
    ///
    /// Environment variables:
    /// - `TG_BOT_TOKEN`: Telegram bot token
    /// - `OLLAMA_MODEL`: chat model identifier
    /// - `OLLAMA_URL`: Ollama base URL
    /// - `PAPERBOT_PAPERS_DIR`, `PAPERBOT_INDEX_DIR`: ingestion paths
    /// - `PAPERBOT_EMBEDDING_PROVIDER`, `PAPERBOT_EMBEDDING_MODEL`
    /// - `RUST_LOG`: log filter
    /// - `NO_COLOR`: disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use paperbot_core::config::AppConfig;
    ///
    /// let config = AppConfig::load(None, None).expect("Failed to load config");
    /// println!("Index: {:?}", config.index_file());
    /// ```
    pub fn load(workspace: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        Self::load_with(workspace, config_file, |key| std::env::var(key).ok())
    }

    /// Same as [`AppConfig::load`] with an injectable environment lookup.
    pub fn load_with<F>(
        workspace: Option<PathBuf>,
        config_file: Option<PathBuf>,
        env: F,
    ) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = workspace {
            config.workspace = workspace;
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = match config_file {
            Some(path) => Some(path),
            None => {
                let default_path = config.workspace.join(CONFIG_FILE_NAME);
                default_path.exists().then_some(default_path)
            }
        };

        if let Some(path) = config_path {
            config.merge_yaml(&path)?;
            config.config_file = Some(path);
        }

        config.apply_env(env);

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(ingest) = file.ingest {
            self.ingest = ingest;
        }
        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }
        if let Some(llm) = file.llm {
            self.llm = llm;
        }
        if let Some(bot) = file.bot {
            self.bot = bot;
        }
        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(())
    }

    /// Environment variables override the config file.
    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(token) = env("TG_BOT_TOKEN") {
            self.bot.token = Some(token);
        }
        if let Some(model) = env("OLLAMA_MODEL") {
            self.llm.model = Some(model);
        }
        if let Some(url) = env("OLLAMA_URL") {
            self.llm.endpoint = url;
        }
        if let Some(dir) = env("PAPERBOT_PAPERS_DIR") {
            self.ingest.papers_dir = PathBuf::from(dir);
        }
        if let Some(dir) = env("PAPERBOT_INDEX_DIR") {
            self.ingest.index_dir = PathBuf::from(dir);
        }
        if let Some(provider) = env("PAPERBOT_EMBEDDING_PROVIDER") {
            self.embedding.provider = provider;
        }
        if let Some(model) = env("PAPERBOT_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Some(level) = env("RUST_LOG") {
            self.log_level = Some(level);
        }
        if env("NO_COLOR").is_some() {
            self.no_color = true;
        }
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over the environment and the file.
    pub fn with_overrides(
        mut self,
        model: Option<String>,
        log_level: Option<String>,
        verbose: bool,
        no_color: bool,
    ) -> Self {
        if let Some(model) = model {
            self.llm.model = Some(model);
        }

        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Resolve a possibly relative path against the workspace.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.workspace.join(path)
        }
    }

    /// Absolute directory scanned for documents.
    pub fn papers_dir(&self) -> PathBuf {
        self.resolve_path(&self.ingest.papers_dir)
    }

    /// Absolute directory holding the index.
    pub fn index_dir(&self) -> PathBuf {
        self.resolve_path(&self.ingest.index_dir)
    }

    /// Absolute path of the persisted index file.
    pub fn index_file(&self) -> PathBuf {
        self.index_dir().join(INDEX_FILE_NAME)
    }

    /// The Telegram token, or a config error when it is not set.
    pub fn require_bot_token(&self) -> AppResult<&str> {
        self.bot
            .token
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "Telegram bot token is not set. Export TG_BOT_TOKEN or set bot.token"
                        .to_string(),
                )
            })
    }

    /// The chat model identifier, or a config error when it is not set.
    pub fn require_model(&self) -> AppResult<&str> {
        self.llm
            .model
            .as_deref()
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| {
                AppError::Config(
                    "Language model is not set. Export OLLAMA_MODEL or set llm.model".to_string(),
                )
            })
    }

    /// Validate value ranges and provider names.
    pub fn validate(&self) -> AppResult<()> {
        if self.ingest.chunk_size == 0 {
            return Err(AppError::Config("ingest.chunkSize must be positive".to_string()));
        }

        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            return Err(AppError::Config(format!(
                "ingest.chunkOverlap ({}) must be smaller than ingest.chunkSize ({})",
                self.ingest.chunk_overlap, self.ingest.chunk_size
            )));
        }

        let provider = self.embedding.provider.as_str();
        if !KNOWN_EMBEDDING_PROVIDERS.contains(&provider) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                provider,
                KNOWN_EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 || self.embedding.batch_size == 0 {
            return Err(AppError::Config(
                "embedding.dimensions and embedding.batchSize must be positive".to_string(),
            ));
        }

        if self.llm.timeout_secs == 0 {
            return Err(AppError::Config("llm.timeoutSecs must be positive".to_string()));
        }

        if self.bot.max_concurrent_requests == 0 {
            return Err(AppError::Config(
                "bot.maxConcurrentRequests must be positive".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.ingest.chunk_size, 2000);
        assert_eq!(config.ingest.chunk_overlap, 50);
        assert_eq!(config.ingest.extension, "tex");
        assert_eq!(config.embedding.provider, "ollama");
        assert!(config.llm.model.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_required_settings_missing() {
        let temp = TempDir::new().unwrap();
        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), None, env_from(&[]))
            .unwrap();

        assert!(matches!(config.require_bot_token(), Err(AppError::Config(_))));
        assert!(matches!(config.require_model(), Err(AppError::Config(_))));
    }

    #[test]
    fn test_env_provides_required_settings() {
        let temp = TempDir::new().unwrap();
        let env = env_from(&[("TG_BOT_TOKEN", "123:abc"), ("OLLAMA_MODEL", "llama3.2")]);
        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), None, env).unwrap();

        assert_eq!(config.require_bot_token().unwrap(), "123:abc");
        assert_eq!(config.require_model().unwrap(), "llama3.2");
    }

    #[test]
    fn test_yaml_then_env_precedence() {
        let temp = TempDir::new().unwrap();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "ingest:\n  chunkSize: 800\n  chunkOverlap: 40\nllm:\n  model: from-file\n  timeoutSecs: 30\n",
        )
        .unwrap();

        let env = env_from(&[("OLLAMA_MODEL", "from-env")]);
        let config = AppConfig::load_with(Some(temp.path().to_path_buf()), None, env).unwrap();

        assert_eq!(config.ingest.chunk_size, 800);
        assert_eq!(config.ingest.chunk_overlap, 40);
        // Unset fields in a section keep their defaults
        assert_eq!(config.ingest.extension, "tex");
        assert_eq!(config.llm.timeout_secs, 30);
        assert_eq!(config.llm.model.as_deref(), Some("from-env"));
        assert!(config.config_file.is_some());
    }

    #[test]
    fn test_missing_workspace() {
        let result = AppConfig::load_with(
            Some(PathBuf::from("/definitely/not/here")),
            None,
            env_from(&[]),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(
            Some("mistral".to_string()),
            None,
            true,
            false,
        );

        assert_eq!(config.llm.model.as_deref(), Some("mistral"));
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_paths_resolve_against_workspace() {
        let mut config = AppConfig::default();
        config.workspace = PathBuf::from("/srv/bot");

        assert_eq!(config.papers_dir(), PathBuf::from("/srv/bot/papers"));
        assert_eq!(
            config.index_file(),
            PathBuf::from("/srv/bot/models/index/index.sqlite")
        );
    }

    #[test]
    fn test_validate_overlap_bound() {
        let mut config = AppConfig::default();
        config.ingest.chunk_size = 100;
        config.ingest.chunk_overlap = 100;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_unknown_provider() {
        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());
    }
}
