//! Mock implementations for testing.
//!
//! Workers with fixed behavior (static output, failure, delay, panic) and a
//! mock LLM client, shared across the integration test files.

use async_trait::async_trait;
use repurpose::agents::{Worker, WorkerRegistry, WorkerRegistryBuilder};
use repurpose::llm::LLMClient;
use repurpose::research::{
    DispatchConfig, QueryAnalyzer, ResponseSynthesizer, TaskPlanner, Vocabulary, WorkerDispatcher,
};
use repurpose::types::{AppError, Result, TaskParameters, WorkerKind, WorkerOutput};
use repurpose::utils::toml_config::VocabularyConfig;
use repurpose::WorkflowEngine;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Mock LLM client returning a fixed reply or always failing.
#[derive(Clone)]
pub struct MockLLMClient {
    response: String,
    should_fail: bool,
    calls: Arc<AtomicUsize>,
}

impl MockLLMClient {
    /// Create a new mock client that returns the given response.
    pub fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            should_fail: false,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Create a mock client that always returns an error.
    pub fn failing() -> Self {
        Self {
            response: String::new(),
            should_fail: true,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LLMClient for MockLLMClient {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail {
            return Err(AppError::LLM("Mock LLM failure".to_string()));
        }
        Ok(self.response.clone())
    }

    async fn generate_with_system(&self, _system: &str, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }

    fn model_name(&self) -> &str {
        "mock-model"
    }
}

/// Worker returning the same summary and references every time.
pub struct StaticWorker {
    kind: WorkerKind,
    summary: String,
    references: Vec<String>,
}

impl StaticWorker {
    pub fn new(kind: WorkerKind, summary: &str) -> Self {
        Self {
            kind,
            summary: summary.to_string(),
            references: Vec::new(),
        }
    }

    pub fn with_references(mut self, references: &[&str]) -> Self {
        self.references = references.iter().map(|s| s.to_string()).collect();
        self
    }
}

#[async_trait]
impl Worker for StaticWorker {
    fn kind(&self) -> WorkerKind {
        self.kind
    }

    async fn execute(&self, _instruction: &str, _params: &TaskParameters) -> Result<WorkerOutput> {
        Ok(WorkerOutput {
            summary: self.summary.clone(),
            references: self.references.clone(),
            ..Default::default()
        })
    }
}

/// Worker whose data source is always down.
pub struct FailingWorker(pub WorkerKind);

#[async_trait]
impl Worker for FailingWorker {
    fn kind(&self) -> WorkerKind {
        self.0
    }

    async fn execute(&self, _instruction: &str, _params: &TaskParameters) -> Result<WorkerOutput> {
        Err(AppError::Worker(format!("{} source unavailable", self.0)))
    }
}

/// Worker that sleeps before answering.
pub struct SlowWorker(pub WorkerKind, pub Duration);

#[async_trait]
impl Worker for SlowWorker {
    fn kind(&self) -> WorkerKind {
        self.0
    }

    async fn execute(&self, _instruction: &str, _params: &TaskParameters) -> Result<WorkerOutput> {
        tokio::time::sleep(self.1).await;
        Ok(WorkerOutput {
            summary: "late answer".to_string(),
            ..Default::default()
        })
    }
}

/// Worker that panics mid-call.
pub struct PanickingWorker(pub WorkerKind);

#[async_trait]
impl Worker for PanickingWorker {
    fn kind(&self) -> WorkerKind {
        self.0
    }

    async fn execute(&self, _instruction: &str, _params: &TaskParameters) -> Result<WorkerOutput> {
        panic!("unexpected payload from {}", self.0);
    }
}

/// Registry from a list of workers, without a report writer.
pub fn registry(workers: Vec<Arc<dyn Worker>>) -> WorkerRegistryBuilder {
    workers
        .into_iter()
        .fold(WorkerRegistryBuilder::new(), |builder, w| builder.with_worker(w))
}

/// Engine with "DrugX" in the vocabulary and a short worker timeout.
pub fn engine(
    registry: WorkerRegistry,
    llm: Option<Arc<dyn LLMClient>>,
    worker_timeout: Duration,
) -> WorkflowEngine {
    let vocabulary = Vocabulary::from_config(&VocabularyConfig {
        primary_entities: vec!["DrugX".to_string()],
        secondary_entities: Vec::new(),
    });

    WorkflowEngine::new(
        QueryAnalyzer::new(vocabulary).unwrap(),
        TaskPlanner::default(),
        WorkerDispatcher::new(
            Arc::new(registry),
            DispatchConfig {
                parallel: true,
                max_concurrency: 4,
                worker_timeout,
            },
        ),
        ResponseSynthesizer::new(llm, Duration::from_secs(1)),
    )
}
