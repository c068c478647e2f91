//! TOML-based configuration for the research orchestrator
//!
//! Server, workflow, report, planner and vocabulary settings live in a single
//! TOML file (`repurpose.toml`). Every section is optional and falls back to
//! built-in defaults.
//!
//! # Reloading
//!
//! Use [`ConfigManager`] for lock-free access to the current configuration and
//! for swapping in a freshly loaded file at runtime.

use crate::types::WorkerKind;
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Root configuration structure loaded from repurpose.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub report: ReportConfig,

    #[serde(default)]
    pub planner: PlannerConfig,

    /// Extra entity names appended to the built-in vocabularies
    #[serde(default)]
    pub vocabulary: VocabularyConfig,

    /// Optional text-generation provider for executive summaries
    #[serde(default)]
    pub llm: Option<ProviderConfig>,
}

// ============= Server Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
        }
    }
}

// ============= Workflow Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Run independent worker tasks concurrently
    #[serde(default = "default_true")]
    pub parallel_workers: bool,

    /// Upper bound on in-flight worker tasks
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Per-task timeout; a timed out task counts as failed
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout_secs: u64,

    /// Timeout for the executive summary generation call
    #[serde(default = "default_summary_timeout")]
    pub summary_timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_max_concurrency() -> usize {
    4
}

fn default_worker_timeout() -> u64 {
    30
}

fn default_summary_timeout() -> u64 {
    20
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            parallel_workers: true,
            max_concurrency: default_max_concurrency(),
            worker_timeout_secs: default_worker_timeout(),
            summary_timeout_secs: default_summary_timeout(),
        }
    }
}

impl WorkflowConfig {
    pub fn worker_timeout(&self) -> Duration {
        Duration::from_secs(self.worker_timeout_secs)
    }

    pub fn summary_timeout(&self) -> Duration {
        Duration::from_secs(self.summary_timeout_secs)
    }
}

// ============= Report Configuration =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Markdown,
    Json,
}

impl ReportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ReportFormat::Markdown => "md",
            ReportFormat::Json => "json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default)]
    pub format: ReportFormat,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("./reports")
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            format: ReportFormat::default(),
        }
    }
}

// ============= Planner Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Priority overrides keyed by worker identifier (1 = earliest)
    #[serde(default)]
    pub priorities: BTreeMap<String, u8>,
}

impl PlannerConfig {
    /// Parsed priority overrides, rejecting unknown workers and out-of-range ranks
    pub fn overrides(&self) -> Result<Vec<(WorkerKind, u8)>, ConfigError> {
        self.priorities
            .iter()
            .map(|(name, &priority)| {
                let worker: WorkerKind = name.parse().map_err(|_| {
                    ConfigError::ValidationError(format!(
                        "planner.priorities references unknown worker '{}'",
                        name
                    ))
                })?;
                if worker.is_report() {
                    return Err(ConfigError::ValidationError(
                        "planner.priorities cannot override report_generator; it always runs last"
                            .to_string(),
                    ));
                }
                if !(1..=4).contains(&priority) {
                    return Err(ConfigError::ValidationError(format!(
                        "planner.priorities.{} must be between 1 and 4, got {}",
                        name, priority
                    )));
                }
                Ok((worker, priority))
            })
            .collect()
    }
}

// ============= Vocabulary Configuration =============

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Drug-like names
    #[serde(default)]
    pub primary_entities: Vec<String>,

    /// Therapy-area-like names
    #[serde(default)]
    pub secondary_entities: Vec<String>,
}

// ============= LLM Provider Configuration =============

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Ollama {
        #[serde(default = "default_ollama_url")]
        base_url: String,
        model: String,
    },
    OpenAI {
        api_key_env: String,
        #[serde(default = "default_openai_base")]
        api_base: String,
        model: String,
    },
}

fn default_ollama_url() -> String {
    "http://localhost:11434".to_string()
}

fn default_openai_base() -> String {
    "https://api.openai.com/v1".to_string()
}

// ============= Configuration Loading & Validation =============

/// Errors that can occur during configuration loading
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Environment variable '{0}' referenced in config is not set")]
    MissingEnvVar(String),

    #[error("Configuration has no backing file to reload from")]
    NoBackingFile,
}

impl AppConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate configuration from TOML text
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate ranges and cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workflow.max_concurrency == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.max_concurrency must be at least 1".to_string(),
            ));
        }

        if self.workflow.worker_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "workflow.worker_timeout_secs must be at least 1".to_string(),
            ));
        }

        self.planner.overrides()?;

        let names = self
            .vocabulary
            .primary_entities
            .iter()
            .chain(&self.vocabulary.secondary_entities);
        for name in names {
            if name.trim().is_empty() {
                return Err(ConfigError::ValidationError(
                    "vocabulary entries must not be blank".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Resolve an environment variable value
    pub fn resolve_env(&self, env_name: &str) -> Option<String> {
        std::env::var(env_name).ok()
    }

    /// API key for the configured OpenAI-compatible provider, if any
    pub fn llm_api_key(&self) -> Result<Option<String>, ConfigError> {
        match &self.llm {
            Some(ProviderConfig::OpenAI { api_key_env, .. }) => self
                .resolve_env(api_key_env)
                .map(Some)
                .ok_or_else(|| ConfigError::MissingEnvVar(api_key_env.clone())),
            _ => Ok(None),
        }
    }
}

// ============= Reloadable Configuration Manager =============

/// Thread-safe configuration manager with reload support
#[derive(Clone)]
pub struct ConfigManager {
    config: Arc<ArcSwap<AppConfig>>,
    config_path: Option<PathBuf>,
}

impl ConfigManager {
    /// Create a new configuration manager and load the initial config
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(ConfigError::ReadError)?
                .join(path)
        };

        let config = AppConfig::load(&path)?;

        Ok(Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: Some(path),
        })
    }

    /// Create a config manager directly from a config, without a backing file
    pub fn from_config(config: AppConfig) -> Self {
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path: None,
        }
    }

    /// Get the current configuration (lockless read)
    pub fn config(&self) -> Arc<AppConfig> {
        self.config.load_full()
    }

    pub fn path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }

    /// Load and validate the backing file without activating it.
    pub fn load_pending(&self) -> Result<AppConfig, ConfigError> {
        let path = self.path().ok_or(ConfigError::NoBackingFile)?;
        info!("Reloading configuration from {:?}", path);
        AppConfig::load(path)
    }

    /// Make `config` the active configuration
    pub fn store(&self, config: AppConfig) {
        self.config.store(Arc::new(config));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn create_test_config() -> String {
        r#"
[server]
host = "0.0.0.0"
port = 8080
log_level = "debug"

[workflow]
parallel_workers = false
max_concurrency = 2
worker_timeout_secs = 5

[report]
output_dir = "/tmp/reports"
format = "json"

[planner.priorities]
web_intelligence = 1

[vocabulary]
primary_entities = ["DrugX"]

[llm]
type = "ollama"
model = "granite4:tiny-h"
"#
        .to_string()
    }

    #[test]
    fn test_parse_config() {
        let config = AppConfig::parse(&create_test_config()).unwrap();

        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(!config.workflow.parallel_workers);
        assert_eq!(config.workflow.max_concurrency, 2);
        assert_eq!(config.workflow.summary_timeout_secs, 20);
        assert_eq!(config.report.format, ReportFormat::Json);
        assert_eq!(
            config.planner.overrides().unwrap(),
            vec![(WorkerKind::WebIntelligence, 1)]
        );
        assert_eq!(config.vocabulary.primary_entities, vec!["DrugX"]);

        match config.llm {
            Some(ProviderConfig::Ollama { base_url, model }) => {
                assert_eq!(base_url, "http://localhost:11434");
                assert_eq!(model, "granite4:tiny-h");
            }
            other => panic!("Expected Ollama provider, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::parse("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.workflow.parallel_workers);
        assert_eq!(config.workflow.worker_timeout(), Duration::from_secs(30));
        assert_eq!(config.report.output_dir, PathBuf::from("./reports"));
        assert!(config.llm.is_none());
    }

    #[test]
    fn test_example_config_parses() {
        let config = AppConfig::parse(include_str!("../../repurpose.example.toml")).unwrap();
        assert_eq!(config.report.format, ReportFormat::Markdown);
        assert!(config.vocabulary.primary_entities.is_empty());
    }

    #[test]
    fn test_priority_out_of_range_is_rejected() {
        let err = AppConfig::parse("[planner.priorities]\npatent_landscape = 5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_report_priority_override_is_rejected() {
        let err = AppConfig::parse("[planner.priorities]\nreport_generator = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_unknown_worker_in_priorities_is_rejected() {
        let err = AppConfig::parse("[planner.priorities]\nweather = 1\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let err = AppConfig::parse("[workflow]\nmax_concurrency = 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load("/definitely/not/here/repurpose.toml").unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound(_)));
    }

    #[test]
    fn test_manager_reload_picks_up_changes() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nport = 4000").unwrap();

        let manager = ConfigManager::new(file.path()).unwrap();
        assert_eq!(manager.config().server.port, 4000);

        fs::write(file.path(), "[server]\nport = 4001\n").unwrap();

        let pending = manager.load_pending().unwrap();
        assert_eq!(pending.server.port, 4001);
        assert_eq!(manager.config().server.port, 4000);

        manager.store(pending);
        assert_eq!(manager.config().server.port, 4001);
    }

    #[test]
    fn test_manager_keeps_old_config_on_invalid_reload() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[workflow]\nmax_concurrency = 3").unwrap();
        let manager = ConfigManager::new(file.path()).unwrap();

        fs::write(file.path(), "[workflow]\nmax_concurrency = 0\n").unwrap();

        assert!(matches!(
            manager.load_pending(),
            Err(ConfigError::ValidationError(_))
        ));
        assert_eq!(manager.config().workflow.max_concurrency, 3);
    }

    #[test]
    fn test_manager_without_file_cannot_reload() {
        let manager = ConfigManager::from_config(AppConfig::default());
        assert!(manager.path().is_none());
        assert!(matches!(
            manager.load_pending(),
            Err(ConfigError::NoBackingFile)
        ));
    }

    #[test]
    fn test_missing_api_key_env() {
        let config = AppConfig::parse(
            "[llm]\ntype = \"openai\"\napi_key_env = \"REPURPOSE_TEST_MISSING_KEY\"\nmodel = \"gpt-4o-mini\"\n",
        )
        .unwrap();
        assert!(matches!(
            config.llm_api_key(),
            Err(ConfigError::MissingEnvVar(_))
        ));
    }
}
