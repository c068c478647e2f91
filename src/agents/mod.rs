pub mod clinical_trials;
pub mod data;
pub mod exim;
pub mod internal_knowledge;
pub mod iqvia;
pub mod patent;
pub mod registry;
pub mod report;
pub mod web_intelligence;

use crate::types::{Result, SynthesizedResponse, TaskParameters, WorkerKind, WorkerOutput, WorkerResult};
use async_trait::async_trait;

// Re-export commonly used types
pub use registry::{WorkerRegistry, WorkerRegistryBuilder};
pub use report::MarkdownReportWriter;

/// Base trait for all data workers
///
/// A returned `Err` is captured by the dispatcher and recorded as a failed
/// result; it never aborts the run.
#[async_trait]
pub trait Worker: Send + Sync {
    /// The worker slot this implementation fills
    fn kind(&self) -> WorkerKind;

    /// Run one task
    async fn execute(&self, instruction: &str, params: &TaskParameters) -> Result<WorkerOutput>;
}

/// Input for the report step, assembled once synthesis has finished.
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub title: String,
    pub query: String,
    /// Every result of the run, failed ones included
    pub results: Vec<WorkerResult>,
    pub synthesis: SynthesizedResponse,
}

/// Worker that turns a finished run into a stored artifact.
///
/// Its output `data` must carry the artifact location under `report_path`.
#[async_trait]
pub trait ReportWorker: Send + Sync {
    async fn generate(&self, request: &ReportRequest) -> Result<WorkerOutput>;
}
