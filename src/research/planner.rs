//! Task planning
//!
//! Maps intents to workers, writes a worker-specific instruction for each,
//! assigns priorities and appends the report task when one is needed.

use crate::types::{Analysis, Result, Task, TaskParameters, TaskStatus, WorkerKind};
use crate::utils::toml_config::PlannerConfig;
use std::collections::HashMap;
use uuid::Uuid;

/// Priority for workers without an explicit entry
pub const DEFAULT_PRIORITY: u8 = 3;

/// The report task always sorts after every data task
pub const REPORT_PRIORITY: u8 = 5;

/// Title used when the query names neither a drug nor a therapy area
const FALLBACK_TITLE: &str = "Drug Repurposing Analysis";

fn default_priorities() -> HashMap<WorkerKind, u8> {
    HashMap::from([
        (WorkerKind::IqviaInsights, 1),
        (WorkerKind::ClinicalTrials, 1),
        (WorkerKind::PatentLandscape, 2),
        (WorkerKind::EximTrends, 2),
        (WorkerKind::WebIntelligence, 3),
        (WorkerKind::InternalKnowledge, 3),
    ])
}

/// Builds ordered task lists from analyses
#[derive(Debug, Clone)]
pub struct TaskPlanner {
    priorities: HashMap<WorkerKind, u8>,
}

impl Default for TaskPlanner {
    fn default() -> Self {
        Self {
            priorities: default_priorities(),
        }
    }
}

impl TaskPlanner {
    /// Default priorities with configured overrides applied
    pub fn from_config(config: &PlannerConfig) -> Result<Self> {
        let mut priorities = default_priorities();
        priorities.extend(config.overrides()?);
        Ok(Self { priorities })
    }

    pub fn priority(&self, worker: WorkerKind) -> u8 {
        if worker.is_report() {
            return REPORT_PRIORITY;
        }
        self.priorities
            .get(&worker)
            .copied()
            .unwrap_or(DEFAULT_PRIORITY)
    }

    /// Plan tasks for an analysis, sorted by priority (stable on ties).
    pub fn plan(&self, analysis: &Analysis) -> Vec<Task> {
        let params = TaskParameters {
            query: analysis.query.clone(),
            primary_entity: analysis.primary_entity.clone(),
            secondary_entity: analysis.secondary_entity.clone(),
            title: None,
        };

        let mut workers: Vec<WorkerKind> = Vec::new();
        for intent in &analysis.intents {
            let worker = intent.worker();
            // The report task is driven by the flag, not by intent order
            if !worker.is_report() && !workers.contains(&worker) {
                workers.push(worker);
            }
        }

        let mut tasks: Vec<Task> = workers
            .into_iter()
            .map(|worker| Task {
                id: new_task_id(),
                worker,
                instruction: instruction_for(worker, analysis),
                parameters: params.clone(),
                priority: self.priority(worker),
                status: TaskStatus::Pending,
            })
            .collect();

        if analysis.needs_report {
            tasks.push(Task {
                id: new_task_id(),
                worker: WorkerKind::ReportGenerator,
                instruction: instruction_for(WorkerKind::ReportGenerator, analysis),
                parameters: TaskParameters {
                    title: Some(report_title(analysis)),
                    ..params
                },
                priority: REPORT_PRIORITY,
                status: TaskStatus::Pending,
            });
        }

        tasks.sort_by_key(|t| t.priority);
        tasks
    }
}

fn new_task_id() -> String {
    format!("task_{}", &Uuid::new_v4().simple().to_string()[..8])
}

pub fn report_title(analysis: &Analysis) -> String {
    let subject = analysis
        .primary_entity
        .as_deref()
        .or(analysis.secondary_entity.as_deref())
        .unwrap_or(FALLBACK_TITLE);
    format!("Research Report: {}", subject)
}

fn instruction_for(worker: WorkerKind, analysis: &Analysis) -> String {
    let drug = analysis.primary_entity.as_deref();
    let therapy = analysis.secondary_entity.as_deref();
    let query = &analysis.query;

    let for_drug = drug.map(|d| format!(" for {}", d)).unwrap_or_default();
    let in_therapy = therapy.map(|t| format!(" in {}", t)).unwrap_or_default();

    match worker {
        WorkerKind::IqviaInsights => format!(
            "Analyze market data and sales trends{}{}. {}",
            for_drug, in_therapy, query
        ),
        WorkerKind::EximTrends => format!(
            "Analyze export-import trade data{}{}. {}",
            for_drug, in_therapy, query
        ),
        WorkerKind::PatentLandscape => format!(
            "Analyze patent landscape and IP status{}{}. {}",
            for_drug, in_therapy, query
        ),
        WorkerKind::ClinicalTrials => format!(
            "Search clinical trials database{}{}. {}",
            for_drug, in_therapy, query
        ),
        WorkerKind::InternalKnowledge => format!(
            "Search internal knowledge base{}{}. {}",
            drug.map(|d| format!(" related to {}", d)).unwrap_or_default(),
            in_therapy,
            query
        ),
        WorkerKind::WebIntelligence => format!(
            "Search web for latest information{}{}. {}",
            drug.map(|d| format!(" on {}", d)).unwrap_or_default(),
            in_therapy,
            query
        ),
        WorkerKind::ReportGenerator => {
            "Generate comprehensive research report based on all gathered data.".to_string()
        }
    }
}
