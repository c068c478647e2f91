//! Run state
//!
//! A [`WorkflowRun`] is an immutable snapshot. Each engine step takes the
//! current snapshot and returns the next one, so every transition can be
//! exercised on its own.

use crate::types::{
    Analysis, Query, QueryResponse, SynthesizedResponse, Task, WorkerResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;
use utoipa::ToSchema;
use uuid::Uuid;

/// Pipeline position of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Initialized,
    Analyzed,
    Planned,
    Executed,
    Synthesized,
    ReportGenerated,
    Completed,
    Failed,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Initialized => "initialized",
            RunStatus::Analyzed => "analyzed",
            RunStatus::Planned => "planned",
            RunStatus::Executed => "executed",
            RunStatus::Synthesized => "synthesized",
            RunStatus::ReportGenerated => "report_generated",
            RunStatus::Completed => "completed",
            RunStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Failed)
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Snapshot of one run between two pipeline stages
#[derive(Debug, Clone)]
pub struct WorkflowRun {
    pub id: String,
    pub query: Query,
    pub analysis: Option<Analysis>,
    pub tasks: Vec<Task>,
    /// Every result in plan order, the report result last
    pub results: Vec<WorkerResult>,
    pub synthesis: Option<SynthesizedResponse>,
    pub report_path: Option<String>,
    /// Rendered document, set on completion
    pub response: Option<String>,
    pub status: RunStatus,
    pub error: Option<String>,
    pub started: Instant,
}

impl WorkflowRun {
    pub fn new(query: Query) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            query,
            analysis: None,
            tasks: Vec::new(),
            results: Vec::new(),
            synthesis: None,
            report_path: None,
            response: None,
            status: RunStatus::Initialized,
            error: None,
            started: Instant::now(),
        }
    }

    /// Merged report flag: query analysis OR the caller's option
    pub fn needs_report(&self) -> bool {
        self.analysis.as_ref().is_some_and(|a| a.needs_report) || self.query.options.generate_report
    }

    /// Terminal failure snapshot, keeping whatever was gathered so far.
    pub fn failed(&self, error: impl Into<String>) -> Self {
        Self {
            status: RunStatus::Failed,
            error: Some(error.into()),
            response: None,
            ..self.clone()
        }
    }

    /// Number of worker results, report included
    pub fn agent_count(&self) -> usize {
        self.results.len()
    }

    pub fn section_count(&self) -> usize {
        self.synthesis.as_ref().map_or(0, |s| s.sections.len())
    }

    /// Short progress line for the current status
    pub fn stage_message(&self) -> String {
        match self.status {
            RunStatus::Initialized => "Run created".to_string(),
            RunStatus::Analyzed => match &self.analysis {
                Some(a) => format!(
                    "Detected {} intent(s){}",
                    a.intents.len(),
                    a.primary_entity
                        .as_deref()
                        .map(|e| format!(" for {}", e))
                        .unwrap_or_default()
                ),
                None => "Query analyzed".to_string(),
            },
            RunStatus::Planned => format!("Planned {} task(s)", self.tasks.len()),
            RunStatus::Executed => format!(
                "{} of {} worker(s) completed",
                self.results.iter().filter(|r| r.is_completed()).count(),
                self.results.len()
            ),
            RunStatus::Synthesized => format!("Synthesized {} section(s)", self.section_count()),
            RunStatus::ReportGenerated => match &self.report_path {
                Some(path) => format!("Report saved to {}", path),
                None => "Report generation failed".to_string(),
            },
            RunStatus::Completed => "Response ready".to_string(),
            RunStatus::Failed => self
                .error
                .clone()
                .unwrap_or_else(|| "Workflow failed".to_string()),
        }
    }

    pub fn into_output(self) -> WorkflowOutput {
        let execution_time_ms = self.started.elapsed().as_millis() as u64;
        let agent_count = self.agent_count();
        // A completed run with nothing to show is not a success
        let success = self.status == RunStatus::Completed && self.section_count() > 0;

        WorkflowOutput {
            run_id: self.id,
            success,
            query: self.query.text,
            response: self.response.unwrap_or_default(),
            report_path: self.report_path,
            status: self.status,
            error: self.error,
            execution_time_ms,
            agent_count,
            analysis: self.analysis,
            tasks: self.tasks,
            results: self.results,
            synthesis: self.synthesis,
        }
    }
}

/// Terminal result handed back to callers
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkflowOutput {
    pub run_id: String,
    pub success: bool,
    pub query: String,
    pub response: String,
    pub report_path: Option<String>,
    pub status: RunStatus,
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub agent_count: usize,
    pub analysis: Option<Analysis>,
    pub tasks: Vec<Task>,
    /// Raw per-task results, failed ones included
    pub results: Vec<WorkerResult>,
    pub synthesis: Option<SynthesizedResponse>,
}

impl From<WorkflowOutput> for QueryResponse {
    fn from(output: WorkflowOutput) -> Self {
        QueryResponse {
            success: output.success,
            query: output.query,
            response: output.response,
            report_path: output.report_path,
            status: output.status.as_str().to_string(),
            error: output.error,
            execution_time_ms: output.execution_time_ms,
            agent_count: output.agent_count,
        }
    }
}

/// Progress notification emitted by [`super::WorkflowEngine::run_stream`]
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum WorkflowEvent {
    /// One per transition
    Stage { stage: RunStatus, status: String },
    /// Plan as it enters execution; dispatched tasks are `in_progress`
    TasksStarted { tasks: Vec<Task> },
    /// Always the last event
    Finished(Box<WorkflowOutput>),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::QueryOptions;

    #[test]
    fn test_new_run_is_initialized() {
        let run = WorkflowRun::new(Query::new("q"));
        assert_eq!(run.status, RunStatus::Initialized);
        assert!(!run.status.is_terminal());
        assert!(!run.needs_report());
    }

    #[test]
    fn test_external_report_flag_is_merged() {
        let options = QueryOptions {
            generate_report: true,
            ..Default::default()
        };
        let run = WorkflowRun::new(Query::with_options("q", options));
        assert!(run.needs_report());
    }

    #[test]
    fn test_failed_snapshot_keeps_query() {
        let run = WorkflowRun::new(Query::new("Metformin trials"));
        let failed = run.failed("Workflow error: boom");
        assert_eq!(run.status, RunStatus::Initialized);

        let output = failed.into_output();
        assert!(!output.success);
        assert_eq!(output.status, RunStatus::Failed);
        assert_eq!(output.query, "Metformin trials");
        assert_eq!(output.error.as_deref(), Some("Workflow error: boom"));

        let response = QueryResponse::from(output);
        assert_eq!(response.status, "failed");
    }

    #[test]
    fn test_completed_without_sections_is_not_success() {
        let mut run = WorkflowRun::new(Query::new("q"));
        run.status = RunStatus::Completed;
        assert!(!run.into_output().success);
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(RunStatus::ReportGenerated.to_string(), "report_generated");
        assert_eq!(
            serde_json::to_value(RunStatus::ReportGenerated).unwrap(),
            "report_generated"
        );
    }
}
