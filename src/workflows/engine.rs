//! Workflow Engine
//!
//! Drives a [`WorkflowRun`] through
//! `initialized → analyzed → planned → executed → synthesized → [report_generated] → completed`.
//! Any error raised by a stage moves the run to `failed`; callers always get a
//! [`WorkflowOutput`] back.
//!
//! Blocking and streaming callers share one code path: [`WorkflowEngine::run`]
//! drains [`WorkflowEngine::run_stream`] and keeps its final event.

use crate::agents::{ReportRequest, WorkerRegistry};
use crate::llm::LLMClient;
use crate::research::planner::report_title;
use crate::research::synthesizer::render;
use crate::research::{
    DispatchConfig, QueryAnalyzer, ResponseSynthesizer, TaskPlanner, Vocabulary, WorkerDispatcher,
};
use crate::types::{AppError, Query, Result, Task};
use crate::utils::toml_config::AppConfig;
use crate::workflows::state::{RunStatus, WorkflowEvent, WorkflowOutput, WorkflowRun};
use futures::{Stream, StreamExt};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Sequences the research stages for each query
///
/// Cheap to clone; every stage is shared read-only between concurrent runs.
#[derive(Clone)]
pub struct WorkflowEngine {
    analyzer: Arc<QueryAnalyzer>,
    planner: Arc<TaskPlanner>,
    dispatcher: WorkerDispatcher,
    synthesizer: ResponseSynthesizer,
}

impl WorkflowEngine {
    pub fn new(
        analyzer: QueryAnalyzer,
        planner: TaskPlanner,
        dispatcher: WorkerDispatcher,
        synthesizer: ResponseSynthesizer,
    ) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
            planner: Arc::new(planner),
            dispatcher,
            synthesizer,
        }
    }

    /// Wire every stage from configuration
    pub fn from_config(
        config: &AppConfig,
        registry: Arc<WorkerRegistry>,
        llm: Option<Arc<dyn LLMClient>>,
    ) -> Result<Self> {
        let analyzer = QueryAnalyzer::new(Vocabulary::from_config(&config.vocabulary))?;
        let planner = TaskPlanner::from_config(&config.planner)?;
        let dispatcher = WorkerDispatcher::new(registry, DispatchConfig::from(&config.workflow));
        let synthesizer = ResponseSynthesizer::new(llm, config.workflow.summary_timeout());
        Ok(Self::new(analyzer, planner, dispatcher, synthesizer))
    }

    /// Run a query to completion
    pub async fn run(&self, query: Query) -> WorkflowOutput {
        self.run_with_cancel(query, CancellationToken::new()).await
    }

    /// Run a query; cancelling the token stops in-flight workers and
    /// synthesizes whatever already completed.
    pub async fn run_with_cancel(&self, query: Query, cancel: CancellationToken) -> WorkflowOutput {
        let fallback = WorkflowRun::new(query.clone());
        let stream = self.run_stream(query, cancel);
        futures::pin_mut!(stream);

        let mut output = None;
        while let Some(event) = stream.next().await {
            if let WorkflowEvent::Finished(finished) = event {
                output = Some(*finished);
            }
        }

        output.unwrap_or_else(|| {
            fallback
                .failed("Workflow ended without a result")
                .into_output()
        })
    }

    /// Run a query, yielding one event per transition and a final
    /// [`WorkflowEvent::Finished`]. A [`WorkflowEvent::TasksStarted`] precedes
    /// the `executed` transition.
    pub fn run_stream(
        &self,
        query: Query,
        cancel: CancellationToken,
    ) -> impl Stream<Item = WorkflowEvent> + Send + 'static {
        let engine = self.clone();

        async_stream::stream! {
            let mut run = WorkflowRun::new(query);
            info!(run_id = %run.id, query = %run.query.text, "Workflow started");

            while !run.status.is_terminal() {
                if run.status == RunStatus::Planned {
                    yield WorkflowEvent::TasksStarted {
                        tasks: engine.dispatcher.start(&run.tasks),
                    };
                }
                run = match engine.step(&run, &cancel).await {
                    Ok(next) => next,
                    Err(e) => {
                        error!(run_id = %run.id, stage = %run.status, error = %e, "Workflow failed");
                        run.failed(e.to_string())
                    }
                };
                yield WorkflowEvent::Stage {
                    stage: run.status,
                    status: run.stage_message(),
                };
            }

            let output = run.into_output();
            info!(
                run_id = %output.run_id,
                status = %output.status,
                success = output.success,
                duration_ms = output.execution_time_ms,
                "Workflow finished"
            );
            yield WorkflowEvent::Finished(Box::new(output));
        }
    }

    /// Perform the single transition out of `run.status`.
    pub async fn step(&self, run: &WorkflowRun, cancel: &CancellationToken) -> Result<WorkflowRun> {
        let next = match run.status {
            RunStatus::Initialized => self.analyze(run),
            RunStatus::Analyzed => self.plan(run)?,
            RunStatus::Planned => self.execute(run, cancel).await?,
            RunStatus::Executed => self.synthesize(run).await,
            RunStatus::Synthesized if run.needs_report() => self.report(run, cancel).await?,
            RunStatus::Synthesized | RunStatus::ReportGenerated => self.complete(run)?,
            RunStatus::Completed | RunStatus::Failed => {
                return Err(AppError::Workflow(format!(
                    "Run {} already finished ({})",
                    run.id, run.status
                )));
            }
        };
        debug!(run_id = %run.id, from = %run.status, to = %next.status, "Stage transition");
        Ok(next)
    }

    fn analyze(&self, run: &WorkflowRun) -> WorkflowRun {
        let mut analysis = self.analyzer.analyze(&run.query.text);
        analysis.needs_report |= run.query.options.generate_report;

        info!(
            run_id = %run.id,
            intents = ?analysis.intents,
            primary_entity = ?analysis.primary_entity,
            secondary_entity = ?analysis.secondary_entity,
            needs_report = analysis.needs_report,
            "Query analyzed"
        );

        WorkflowRun {
            analysis: Some(analysis),
            status: RunStatus::Analyzed,
            ..run.clone()
        }
    }

    fn plan(&self, run: &WorkflowRun) -> Result<WorkflowRun> {
        let analysis = run
            .analysis
            .as_ref()
            .ok_or_else(|| AppError::Workflow("Planning requires an analysis".into()))?;

        let tasks = self.planner.plan(analysis);
        check_plan(&tasks, analysis.needs_report)?;

        info!(
            run_id = %run.id,
            workers = ?tasks.iter().map(|t| t.worker.as_str()).collect::<Vec<_>>(),
            "Tasks planned"
        );

        Ok(WorkflowRun {
            tasks,
            status: RunStatus::Planned,
            ..run.clone()
        })
    }

    async fn execute(&self, run: &WorkflowRun, cancel: &CancellationToken) -> Result<WorkflowRun> {
        let outcome = self.dispatcher.execute(&run.tasks, cancel).await?;

        let failed = outcome.results.iter().filter(|r| !r.is_completed()).count();
        if failed > 0 {
            warn!(run_id = %run.id, failed, total = outcome.results.len(), "Some workers failed");
        }
        info!(run_id = %run.id, results = outcome.results.len(), "Tasks executed");

        Ok(WorkflowRun {
            tasks: outcome.tasks,
            results: outcome.results,
            status: RunStatus::Executed,
            ..run.clone()
        })
    }

    async fn synthesize(&self, run: &WorkflowRun) -> WorkflowRun {
        let synthesis = self.synthesizer.synthesize(&run.query.text, &run.results).await;
        info!(run_id = %run.id, sections = synthesis.sections.len(), "Results synthesized");

        WorkflowRun {
            synthesis: Some(synthesis),
            status: RunStatus::Synthesized,
            ..run.clone()
        }
    }

    async fn report(&self, run: &WorkflowRun, cancel: &CancellationToken) -> Result<WorkflowRun> {
        let index = run
            .tasks
            .iter()
            .position(|t| t.worker.is_report())
            .ok_or_else(|| AppError::Workflow("Report requested but no report task planned".into()))?;
        let synthesis = run
            .synthesis
            .clone()
            .ok_or_else(|| AppError::Workflow("Report requires a synthesized response".into()))?;

        let task = &run.tasks[index];
        let title = match (&task.parameters.title, &run.analysis) {
            (Some(title), _) => title.clone(),
            (None, Some(analysis)) => report_title(analysis),
            (None, None) => "Research Report".to_string(),
        };
        let request = ReportRequest {
            title,
            query: run.query.text.clone(),
            results: run.results.clone(),
            synthesis,
        };

        let (task, result) = self.dispatcher.execute_report(task, &request, cancel).await;
        let report_path = result
            .data
            .get("report_path")
            .and_then(|v| v.as_str())
            .map(str::to_string)
            .filter(|_| result.is_completed());

        match &report_path {
            Some(path) => info!(run_id = %run.id, path = %path, "Report generated"),
            None => warn!(run_id = %run.id, error = ?result.error, "Report generation failed"),
        }

        let mut tasks = run.tasks.clone();
        tasks[index] = task;
        let mut results = run.results.clone();
        results.push(result);

        Ok(WorkflowRun {
            tasks,
            results,
            report_path,
            status: RunStatus::ReportGenerated,
            ..run.clone()
        })
    }

    fn complete(&self, run: &WorkflowRun) -> Result<WorkflowRun> {
        let synthesis = run
            .synthesis
            .as_ref()
            .ok_or_else(|| AppError::Workflow("Completion requires a synthesized response".into()))?;

        let response = render(
            &run.query.text,
            synthesis,
            &run.query.options,
            run.report_path.as_deref(),
        );

        Ok(WorkflowRun {
            response: Some(response),
            status: RunStatus::Completed,
            ..run.clone()
        })
    }
}

/// A plan carries exactly one report task, last, iff a report is needed.
fn check_plan(tasks: &[Task], needs_report: bool) -> Result<()> {
    let reports = tasks.iter().filter(|t| t.worker.is_report()).count();
    let expected = usize::from(needs_report);
    if reports != expected {
        return Err(AppError::Workflow(format!(
            "Plan has {} report task(s), expected {}",
            reports, expected
        )));
    }
    if needs_report && !tasks.last().is_some_and(|t| t.worker.is_report()) {
        return Err(AppError::Workflow("Report task must run last".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{TaskParameters, TaskStatus, WorkerKind};

    fn engine() -> WorkflowEngine {
        let registry = Arc::new(WorkerRegistry::synthetic(&Default::default()));
        WorkflowEngine::from_config(&AppConfig::default(), registry, None).unwrap()
    }

    fn task(worker: WorkerKind) -> Task {
        Task {
            id: format!("task_{}", worker),
            worker,
            instruction: String::new(),
            parameters: TaskParameters::default(),
            priority: 1,
            status: TaskStatus::Pending,
        }
    }

    #[tokio::test]
    async fn test_steps_walk_the_state_machine() {
        let engine = engine();
        let cancel = CancellationToken::new();
        let mut run = WorkflowRun::new(Query::new("Clinical trial pipeline for Metformin"));

        let mut seen = Vec::new();
        while !run.status.is_terminal() {
            run = engine.step(&run, &cancel).await.unwrap();
            seen.push(run.status);
        }

        assert_eq!(
            seen,
            vec![
                RunStatus::Analyzed,
                RunStatus::Planned,
                RunStatus::Executed,
                RunStatus::Synthesized,
                RunStatus::Completed,
            ]
        );
        assert!(run.response.unwrap().contains("## Clinical Trials"));
    }

    #[tokio::test]
    async fn test_step_on_finished_run_is_an_error() {
        let mut run = WorkflowRun::new(Query::new("q"));
        run.status = RunStatus::Completed;
        let err = engine()
            .step(&run, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Workflow(_)));
    }

    #[tokio::test]
    async fn test_missing_analysis_fails_run() {
        let mut run = WorkflowRun::new(Query::new("q"));
        run.status = RunStatus::Analyzed;
        assert!(engine().step(&run, &CancellationToken::new()).await.is_err());
    }

    #[test]
    fn test_check_plan() {
        let data = task(WorkerKind::IqviaInsights);
        let report = task(WorkerKind::ReportGenerator);

        assert!(check_plan(&[data.clone()], false).is_ok());
        assert!(check_plan(&[data.clone(), report.clone()], true).is_ok());
        assert!(check_plan(&[data.clone()], true).is_err());
        assert!(check_plan(&[report.clone(), data.clone()], true).is_err());
        assert!(check_plan(&[data, report.clone(), report], true).is_err());
    }
}
