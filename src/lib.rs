//! # repurpose - Drug Repurposing Research Orchestrator
//!
//! Routes a free-text research question to specialized data workers, runs
//! them with per-task failure isolation, and synthesizes their output into
//! one answer with an optional stored report.
//!
//! ## Overview
//!
//! repurpose can be used in two ways:
//!
//! 1. **As a command line tool or server** - Run the `repurpose` binary
//! 2. **As a library** - Embed the workflow engine in your own Rust project
//!
//! ### Basic Example
//!
//! ```rust,ignore
//! use repurpose::{AppConfig, Query, WorkerRegistry, WorkflowEngine};
//! use arc_swap::ArcSwap;
//! ```

pub mod agents;
pub mod api;
pub mod cli;
pub mod llm;
pub mod research;
pub mod types;
pub mod utils;
pub mod workflows;

pub use agents::WorkerRegistry;
pub use llm::{LLMClient, Provider};
pub use types::{AppError, Query, QueryOptions, Result};
pub use utils::toml_config::{AppConfig, ConfigManager};
pub use workflows::{RunStatus, WorkflowEngine, WorkflowEvent, WorkflowOutput};

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

/// Registry and engine built from one configuration
pub struct Services {
    /// Workers available to the engine
    pub registry: Arc<WorkerRegistry>,
    /// Workflow engine shared by all requests
    pub engine: WorkflowEngine,
}

impl Services {
    /// Build the registry, optional LLM client and engine
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let registry = Arc::new(WorkerRegistry::synthetic(&config.report));

        let llm = match Provider::from_config(config)? {
            Some(provider) => Some(provider.create_client()?),
            None => None,
        };

        let engine = WorkflowEngine::from_config(config, registry.clone(), llm)?;
        Ok(Self { registry, engine })
    }
}

/// Application state shared across handlers
///
/// Runs already in flight keep the engine they started with; a reload only
/// affects runs started after it.
#[derive(Clone)]
pub struct AppState {
    /// TOML configuration with reload support
    pub config_manager: Arc<ConfigManager>,
    services: Arc<ArcSwap<Services>>,
}

impl AppState {
    /// Build the services from the current config
    pub fn from_config_manager(config_manager: Arc<ConfigManager>) -> Result<Self> {
        let services = Services::from_config(&config_manager.config())?;
        Ok(Self {
            config_manager,
            services: Arc::new(ArcSwap::from_pointee(services)),
        })
    }

    /// Engine for the next run
    pub fn engine(&self) -> WorkflowEngine {
        self.services.load().engine.clone()
    }

    pub fn registry(&self) -> Arc<WorkerRegistry> {
        self.services.load().registry.clone()
    }

    /// Re-read the config file and rebuild the services from it. On any error
    /// the previous config and services stay active.
    pub fn reload(&self) -> Result<()> {
        let config = self.config_manager.load_pending()?;
        let services = Services::from_config(&config)?;

        self.config_manager.store(config);
        self.services.store(Arc::new(services));
        info!(path = ?self.config_manager.path(), "Configuration reloaded successfully");
        Ok(())
    }
}
