//! Worker Registry
//!
//! Maps each [`WorkerKind`] to the implementation that serves it. The registry
//! is built once, then shared read-only across concurrent runs.

use crate::agents::clinical_trials::ClinicalTrialsWorker;
use crate::agents::exim::EximTrendsWorker;
use crate::agents::internal_knowledge::InternalKnowledgeWorker;
use crate::agents::iqvia::IqviaInsightsWorker;
use crate::agents::patent::PatentLandscapeWorker;
use crate::agents::report::MarkdownReportWriter;
use crate::agents::web_intelligence::WebIntelligenceWorker;
use crate::agents::{ReportWorker, Worker};
use crate::types::{AppError, Result, WorkerKind};
use crate::utils::toml_config::ReportConfig;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of data workers plus the optional report writer
pub struct WorkerRegistry {
    workers: HashMap<WorkerKind, Arc<dyn Worker>>,
    reporter: Option<Arc<dyn ReportWorker>>,
}

impl WorkerRegistry {
    /// Registry wired with the synthetic workers and a file-backed report writer
    pub fn synthetic(report: &ReportConfig) -> Self {
        let workers: [Arc<dyn Worker>; 6] = [
            Arc::new(IqviaInsightsWorker),
            Arc::new(EximTrendsWorker),
            Arc::new(PatentLandscapeWorker),
            Arc::new(ClinicalTrialsWorker),
            Arc::new(InternalKnowledgeWorker),
            Arc::new(WebIntelligenceWorker),
        ];

        Self {
            workers: workers.into_iter().map(|w| (w.kind(), w)).collect(),
            reporter: Some(Arc::new(MarkdownReportWriter::new(
                report.output_dir.clone(),
                report.format,
            ))),
        }
    }

    /// Look up the worker for a kind
    pub fn get(&self, kind: WorkerKind) -> Option<Arc<dyn Worker>> {
        self.workers.get(&kind).cloned()
    }

    pub fn reporter(&self) -> Option<Arc<dyn ReportWorker>> {
        self.reporter.clone()
    }

    /// Check if a worker kind is served
    pub fn has_worker(&self, kind: WorkerKind) -> bool {
        if kind.is_report() {
            self.reporter.is_some()
        } else {
            self.workers.contains_key(&kind)
        }
    }

    /// Served kinds in declaration order
    pub fn kinds(&self) -> Vec<WorkerKind> {
        WorkerKind::ALL
            .into_iter()
            .filter(|kind| self.has_worker(*kind))
            .collect()
    }
}

/// Builder for creating WorkerRegistry with fluent API
#[derive(Default)]
pub struct WorkerRegistryBuilder {
    workers: Vec<Arc<dyn Worker>>,
    reporter: Option<Arc<dyn ReportWorker>>,
}

impl WorkerRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a data worker; a later worker of the same kind replaces an earlier one
    pub fn with_worker(mut self, worker: Arc<dyn Worker>) -> Self {
        self.workers.push(worker);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn ReportWorker>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Build the WorkerRegistry
    pub fn build(self) -> Result<WorkerRegistry> {
        let mut workers = HashMap::new();
        for worker in self.workers {
            let kind = worker.kind();
            if kind.is_report() {
                return Err(AppError::Configuration(
                    "report_generator must be registered with with_reporter".into(),
                ));
            }
            workers.insert(kind, worker);
        }

        Ok(WorkerRegistry {
            workers,
            reporter: self.reporter,
        })
    }
}
