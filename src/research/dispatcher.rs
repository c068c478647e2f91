//! Worker dispatch
//!
//! Runs planned data tasks against the [`WorkerRegistry`]. Every task is
//! supervised on its own: an error, a panic, a timeout or a cancellation is
//! recorded as a failed [`WorkerResult`] and never stops the other tasks.
//!
//! With `parallel` enabled, tasks run through an order-preserving buffered
//! stream, so results always come back in plan order.

use crate::agents::{ReportRequest, WorkerRegistry};
use crate::types::{AppError, Result, Task, TaskStatus, WorkerOutput, WorkerResult};
use crate::utils::toml_config::WorkflowConfig;
use futures::stream::{self, StreamExt};
use futures::FutureExt;
use std::collections::HashSet;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Error recorded for tasks stopped by run cancellation
pub const CANCELLED: &str = "cancelled";

/// Dispatch settings
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Run tasks concurrently
    pub parallel: bool,
    /// Maximum in-flight tasks when parallel
    pub max_concurrency: usize,
    /// Upper bound on a single worker call
    pub worker_timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self::from(&WorkflowConfig::default())
    }
}

impl From<&WorkflowConfig> for DispatchConfig {
    fn from(config: &WorkflowConfig) -> Self {
        Self {
            parallel: config.parallel_workers,
            max_concurrency: config.max_concurrency.max(1),
            worker_timeout: config.worker_timeout(),
        }
    }
}

/// Tasks with their final status plus the results, both in plan order.
#[derive(Debug, Clone)]
pub struct DispatchOutcome {
    pub tasks: Vec<Task>,
    pub results: Vec<WorkerResult>,
}

/// Supervised executor for worker tasks
#[derive(Clone)]
pub struct WorkerDispatcher {
    registry: Arc<WorkerRegistry>,
    config: DispatchConfig,
}

impl WorkerDispatcher {
    pub fn new(registry: Arc<WorkerRegistry>, config: DispatchConfig) -> Self {
        Self { registry, config }
    }

    /// Copy of `tasks` with every task `execute` would run marked in progress.
    /// The report task and tasks without a registered worker stay pending.
    pub fn start(&self, tasks: &[Task]) -> Vec<Task> {
        tasks
            .iter()
            .map(|task| {
                let mut task = task.clone();
                if self.is_runnable(&task) {
                    task.status = TaskStatus::InProgress;
                }
                task
            })
            .collect()
    }

    fn is_runnable(&self, task: &Task) -> bool {
        !task.worker.is_report() && self.registry.has_worker(task.worker)
    }

    /// Run every data task. The report task is left untouched and pending.
    pub async fn execute(
        &self,
        tasks: &[Task],
        cancel: &CancellationToken,
    ) -> Result<DispatchOutcome> {
        let mut runnable = Vec::new();
        for (index, task) in tasks.iter().enumerate() {
            if task.worker.is_report() {
                continue;
            }
            match self.registry.get(task.worker) {
                Some(worker) => runnable.push((index, worker)),
                None => warn!(task_id = %task.id, worker = %task.worker, "No worker registered, skipping task"),
            }
        }

        debug!(
            tasks = runnable.len(),
            parallel = self.config.parallel,
            "Dispatching worker tasks"
        );

        let calls = runnable.iter().map(|(index, worker)| {
            let task = &tasks[*index];
            let worker = worker.clone();
            async move {
                let started = Instant::now();
                let outcome = self
                    .supervise(worker.execute(&task.instruction, &task.parameters), cancel)
                    .await;
                (*index, finish(task, outcome, started))
            }
        })
        .collect::<Vec<_>>();

        let finished: Vec<(usize, WorkerResult)> = if self.config.parallel {
            stream::iter(calls)
                .buffered(self.config.max_concurrency)
                .collect()
                .await
        } else {
            let mut finished = Vec::with_capacity(runnable.len());
            for call in calls {
                finished.push(call.await);
            }
            finished
        };

        let mut updated = tasks.to_vec();
        let mut results = Vec::with_capacity(finished.len());
        for (index, result) in finished {
            updated[index].status = if result.is_completed() {
                TaskStatus::Completed
            } else {
                TaskStatus::Failed
            };
            results.push(result);
        }

        check_correspondence(&updated, &results)?;
        Ok(DispatchOutcome {
            tasks: updated,
            results,
        })
    }

    /// Run the report task with the finished run as input.
    ///
    /// A missing or failing report writer yields a failed result, not an error.
    pub async fn execute_report(
        &self,
        task: &Task,
        request: &ReportRequest,
        cancel: &CancellationToken,
    ) -> (Task, WorkerResult) {
        let started = Instant::now();
        let outcome = match self.registry.reporter() {
            Some(reporter) => self.supervise(reporter.generate(request), cancel).await,
            None => Err("No report worker registered".to_string()),
        };
        let result = finish(task, outcome, started);

        let mut task = task.clone();
        task.status = if result.is_completed() {
            TaskStatus::Completed
        } else {
            TaskStatus::Failed
        };
        (task, result)
    }

    async fn supervise<F>(
        &self,
        call: F,
        cancel: &CancellationToken,
    ) -> std::result::Result<WorkerOutput, String>
    where
        F: Future<Output = Result<WorkerOutput>>,
    {
        let limit = self.config.worker_timeout;
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(CANCELLED.to_string()),
            outcome = tokio::time::timeout(limit, AssertUnwindSafe(call).catch_unwind()) => {
                match outcome {
                    Ok(Ok(Ok(output))) => Ok(output),
                    Ok(Ok(Err(e))) => Err(e.to_string()),
                    Ok(Err(_)) => Err("worker panicked".to_string()),
                    Err(_) => Err(format!("timed out after {:?}", limit)),
                }
            }
        }
    }
}

fn finish(
    task: &Task,
    outcome: std::result::Result<WorkerOutput, String>,
    started: Instant,
) -> WorkerResult {
    let duration_ms = started.elapsed().as_millis() as u64;
    match outcome {
        Ok(output) => {
            debug!(task_id = %task.id, worker = %task.worker, duration_ms, "Task completed");
            WorkerResult::completed(task, output, duration_ms)
        }
        Err(error) => {
            warn!(task_id = %task.id, worker = %task.worker, %error, "Task failed");
            WorkerResult::failed(task, error, duration_ms)
        }
    }
}

/// Every result must belong to exactly one task of the run.
fn check_correspondence(tasks: &[Task], results: &[WorkerResult]) -> Result<()> {
    let ids: HashSet<&str> = tasks.iter().map(|t| t.id.as_str()).collect();
    if ids.len() != tasks.len() {
        return Err(AppError::Workflow("Duplicate task id in plan".into()));
    }

    let mut seen = HashSet::new();
    for result in results {
        if !ids.contains(result.task_id.as_str()) {
            return Err(AppError::Workflow(format!(
                "Result for unknown task '{}'",
                result.task_id
            )));
        }
        if !seen.insert(result.task_id.as_str()) {
            return Err(AppError::Workflow(format!(
                "Task '{}' produced more than one result",
                result.task_id
            )));
        }
    }
    Ok(())
}
