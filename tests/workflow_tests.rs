//! End-to-end workflow tests
//!
//! Runs whole queries through the engine with synthetic and mock workers.

mod common;

use common::mocks::{
    FailingWorker, MockLLMClient, PanickingWorker, SlowWorker, StaticWorker, engine, registry,
};
use futures::StreamExt;
use repurpose::agents::{MarkdownReportWriter, WorkerRegistry};
use repurpose::types::{
    Intent, OutputFormat, QueryOptions, ResultStatus, TaskStatus, WorkerKind,
};
use repurpose::utils::toml_config::{ReportConfig, ReportFormat};
use repurpose::{Query, RunStatus, WorkflowEvent};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const TIMEOUT: Duration = Duration::from_secs(5);

fn synthetic() -> WorkerRegistry {
    WorkerRegistry::synthetic(&ReportConfig::default())
}

fn section_titles(output: &repurpose::WorkflowOutput) -> Vec<String> {
    output
        .synthesis
        .as_ref()
        .map(|s| s.sections.iter().map(|s| s.title.clone()).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn test_drugx_market_and_patent_scenario() {
    let output = engine(synthetic(), None, TIMEOUT)
        .run(Query::new("Analyze market and patent landscape for DrugX"))
        .await;

    let analysis = output.analysis.as_ref().unwrap();
    assert!(analysis.intents.contains(&Intent::MarketAnalysis));
    assert!(analysis.intents.contains(&Intent::PatentAnalysis));
    assert_eq!(analysis.primary_entity.as_deref(), Some("DrugX"));

    let workers: Vec<_> = output.tasks.iter().map(|t| t.worker).collect();
    assert_eq!(
        workers,
        vec![WorkerKind::IqviaInsights, WorkerKind::PatentLandscape]
    );

    assert_eq!(output.status, RunStatus::Completed);
    assert!(output.success);
    assert_eq!(section_titles(&output), vec!["Iqvia Insights", "Patent Landscape"]);
    assert!(output.response.contains("**Query:** Analyze market and patent landscape for DrugX"));
}

#[tokio::test]
async fn test_unrecognized_query_uses_default_workers() {
    let output = engine(synthetic(), None, TIMEOUT)
        .run(Query::new("Tell me something interesting"))
        .await;

    assert_eq!(output.status, RunStatus::Completed);
    assert!(output.analysis.as_ref().unwrap().primary_entity.is_none());
    assert_eq!(
        section_titles(&output),
        vec!["Iqvia Insights", "Clinical Trials", "Patent Landscape"]
    );
}

#[tokio::test]
async fn test_one_failing_worker_is_isolated() {
    let registry = registry(vec![
        Arc::new(StaticWorker::new(WorkerKind::IqviaInsights, "Market size $4.2B")),
        Arc::new(StaticWorker::new(WorkerKind::ClinicalTrials, "12 active trials")),
        Arc::new(FailingWorker(WorkerKind::PatentLandscape)),
    ])
    .build()
    .unwrap();

    let output = engine(registry, None, TIMEOUT)
        .run(Query::new("Tell me something interesting"))
        .await;

    let completed = output.results.iter().filter(|r| r.is_completed()).count();
    let failed: Vec<_> = output
        .results
        .iter()
        .filter(|r| r.status == ResultStatus::Failed)
        .collect();
    assert_eq!(completed, 2);
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].worker, WorkerKind::PatentLandscape);
    assert!(failed[0].error.as_deref().unwrap().contains("source unavailable"));

    assert_eq!(output.status, RunStatus::Completed);
    assert!(output.success);
    assert!(!output.response.contains("## Patent Landscape"));
}

#[tokio::test]
async fn test_panicking_worker_does_not_fail_run() {
    let registry = registry(vec![
        Arc::new(StaticWorker::new(WorkerKind::IqviaInsights, "Market size $4.2B")),
        Arc::new(PanickingWorker(WorkerKind::ClinicalTrials)),
        Arc::new(StaticWorker::new(WorkerKind::PatentLandscape, "No blocking patents")),
    ])
    .build()
    .unwrap();

    let output = engine(registry, None, TIMEOUT)
        .run(Query::new("Tell me something interesting"))
        .await;

    assert_eq!(output.status, RunStatus::Completed);
    assert_eq!(section_titles(&output), vec!["Iqvia Insights", "Patent Landscape"]);
}

#[tokio::test]
async fn test_all_workers_fail_but_report_is_still_written() {
    let dir = tempfile::tempdir().unwrap();
    let registry = registry(vec![
        Arc::new(FailingWorker(WorkerKind::IqviaInsights)),
        Arc::new(FailingWorker(WorkerKind::ClinicalTrials)),
        Arc::new(FailingWorker(WorkerKind::PatentLandscape)),
    ])
    .with_reporter(Arc::new(MarkdownReportWriter::new(
        dir.path(),
        ReportFormat::Markdown,
    )))
    .build()
    .unwrap();

    let options = QueryOptions {
        generate_report: true,
        ..Default::default()
    };
    let output = engine(registry, None, TIMEOUT)
        .run(Query::with_options("Tell me something interesting", options))
        .await;

    assert_eq!(output.status, RunStatus::Completed);
    assert!(!output.success);
    assert_eq!(output.agent_count, 4);

    let report = output.results.last().unwrap();
    assert_eq!(report.worker, WorkerKind::ReportGenerator);
    assert!(report.is_completed());

    let path = output.report_path.as_deref().unwrap();
    assert!(std::path::Path::new(path).exists());
    assert!(output.response.contains("No worker produced results"));
    assert!(output.response.contains(path));
}

#[tokio::test]
async fn test_report_keyword_adds_report_stage() {
    let dir = tempfile::tempdir().unwrap();
    let registry = WorkerRegistry::synthetic(&ReportConfig {
        output_dir: dir.path().to_path_buf(),
        format: ReportFormat::Markdown,
    });

    let events: Vec<_> = engine(registry, None, TIMEOUT)
        .run_stream(
            Query::new("Generate report on Metformin market size"),
            CancellationToken::new(),
        )
        .collect()
        .await;

    let stages: Vec<RunStatus> = events
        .iter()
        .filter_map(|e| match e {
            WorkflowEvent::Stage { stage, .. } => Some(*stage),
            _ => None,
        })
        .collect();
    assert_eq!(
        stages,
        vec![
            RunStatus::Analyzed,
            RunStatus::Planned,
            RunStatus::Executed,
            RunStatus::Synthesized,
            RunStatus::ReportGenerated,
            RunStatus::Completed,
        ]
    );

    match events.last().unwrap() {
        WorkflowEvent::Finished(output) => {
            assert!(output.report_path.as_deref().unwrap().ends_with(".md"));
            assert!(output.tasks.last().unwrap().worker.is_report());
        }
        other => panic!("expected final result, got {:?}", other),
    }
}

#[tokio::test]
async fn test_started_tasks_are_announced_before_execution() {
    let registry = registry(vec![
        Arc::new(StaticWorker::new(WorkerKind::IqviaInsights, "Market size $4.2B")),
        Arc::new(StaticWorker::new(WorkerKind::PatentLandscape, "No blocking patents")),
    ])
    .build()
    .unwrap();

    let events: Vec<_> = engine(registry, None, TIMEOUT)
        .run_stream(Query::new("Tell me something interesting"), CancellationToken::new())
        .collect()
        .await;

    let started = events
        .iter()
        .position(|e| matches!(e, WorkflowEvent::TasksStarted { .. }))
        .unwrap();
    assert!(matches!(
        events[started - 1],
        WorkflowEvent::Stage { stage: RunStatus::Planned, .. }
    ));
    assert!(matches!(
        events[started + 1],
        WorkflowEvent::Stage { stage: RunStatus::Executed, .. }
    ));

    let WorkflowEvent::TasksStarted { tasks } = &events[started] else {
        unreachable!()
    };
    let status_of = |kind: WorkerKind| tasks.iter().find(|t| t.worker == kind).unwrap().status;
    assert_eq!(status_of(WorkerKind::IqviaInsights), TaskStatus::InProgress);
    assert_eq!(status_of(WorkerKind::PatentLandscape), TaskStatus::InProgress);
    assert_eq!(status_of(WorkerKind::ClinicalTrials), TaskStatus::Pending);

    let WorkflowEvent::Finished(output) = events.last().unwrap() else {
        panic!("expected final result");
    };
    assert!(output.tasks.iter().all(|t| t.status != TaskStatus::InProgress));
}

#[tokio::test]
async fn test_stream_and_blocking_produce_identical_output() {
    let engine = engine(synthetic(), None, TIMEOUT);
    let query = Query::new("Clinical trials and API sourcing for Metformin in Oncology");

    let blocking = engine.run(query.clone()).await;

    let mut streamed = None;
    let mut stage_count = 0;
    let stream = engine.run_stream(query, CancellationToken::new());
    futures::pin_mut!(stream);
    while let Some(event) = stream.next().await {
        match event {
            WorkflowEvent::Stage { .. } => stage_count += 1,
            WorkflowEvent::TasksStarted { .. } => {}
            WorkflowEvent::Finished(output) => streamed = Some(*output),
        }
    }
    let streamed = streamed.unwrap();

    assert_eq!(stage_count, 5);
    assert_eq!(streamed.status, blocking.status);
    assert_eq!(streamed.response, blocking.response);
    assert_eq!(streamed.synthesis, blocking.synthesis);
}

#[tokio::test]
async fn test_timed_out_worker_counts_as_failed() {
    let registry = registry(vec![
        Arc::new(StaticWorker::new(WorkerKind::IqviaInsights, "Market size $4.2B")),
        Arc::new(SlowWorker(WorkerKind::PatentLandscape, Duration::from_secs(10))),
    ])
    .build()
    .unwrap();

    let output = engine(registry, None, Duration::from_millis(100))
        .run(Query::new("market share and patent expiry"))
        .await;

    assert_eq!(output.status, RunStatus::Completed);
    let patent = output
        .results
        .iter()
        .find(|r| r.worker == WorkerKind::PatentLandscape)
        .unwrap();
    assert!(patent.error.as_deref().unwrap().starts_with("timed out"));
}

#[tokio::test]
async fn test_cancellation_keeps_completed_results() {
    let registry = registry(vec![
        Arc::new(StaticWorker::new(WorkerKind::IqviaInsights, "Market size $4.2B")),
        Arc::new(SlowWorker(WorkerKind::ClinicalTrials, Duration::from_secs(10))),
        Arc::new(StaticWorker::new(WorkerKind::PatentLandscape, "No blocking patents")),
    ])
    .build()
    .unwrap();
    let engine = engine(registry, None, Duration::from_secs(30));

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let output = engine
        .run_with_cancel(Query::new("Tell me something interesting"), cancel)
        .await;

    assert_eq!(output.status, RunStatus::Completed);
    let clinical = output
        .results
        .iter()
        .find(|r| r.worker == WorkerKind::ClinicalTrials)
        .unwrap();
    assert_eq!(clinical.error.as_deref(), Some("cancelled"));
    assert_eq!(section_titles(&output), vec!["Iqvia Insights", "Patent Landscape"]);
}

#[tokio::test]
async fn test_shared_reference_appears_once() {
    let registry = registry(vec![
        Arc::new(
            StaticWorker::new(WorkerKind::IqviaInsights, "Imports drive volume")
                .with_references(&["UN Comtrade Database", "IQVIA MIDAS Database"]),
        ),
        Arc::new(
            StaticWorker::new(WorkerKind::EximTrends, "India leads API exports")
                .with_references(&["UN Comtrade Database"]),
        ),
    ])
    .build()
    .unwrap();

    let output = engine(registry, None, TIMEOUT)
        .run(Query::new("market size and trade flows"))
        .await;

    let references = &output.synthesis.as_ref().unwrap().references;
    assert_eq!(
        references
            .iter()
            .filter(|r| *r == "UN Comtrade Database")
            .count(),
        1
    );
    assert_eq!(output.response.matches("- UN Comtrade Database").count(), 1);
}

#[tokio::test]
async fn test_llm_summary_used_when_available() {
    let llm = MockLLMClient::new("- DrugX has a clear commercial runway");
    let output = engine(synthetic(), Some(Arc::new(llm.clone())), TIMEOUT)
        .run(Query::new("market size for DrugX"))
        .await;

    assert_eq!(llm.calls(), 1);
    assert!(output
        .response
        .contains("## Executive Summary\n\n- DrugX has a clear commercial runway"));
}

#[tokio::test]
async fn test_llm_failure_falls_back_to_insights() {
    let llm = MockLLMClient::failing();
    let output = engine(synthetic(), Some(Arc::new(llm)), TIMEOUT)
        .run(Query::new("market size for DrugX"))
        .await;

    assert!(output.success);
    assert!(output
        .response
        .contains("Key Insights from Multi-Agent Analysis:"));
}

#[tokio::test]
async fn test_json_output_mode() {
    let options = QueryOptions {
        output_format: OutputFormat::Json,
        include_tables: false,
        ..Default::default()
    };
    let output = engine(synthetic(), None, TIMEOUT)
        .run(Query::with_options("patent landscape for Celecoxib", options))
        .await;

    let value: serde_json::Value = serde_json::from_str(&output.response).unwrap();
    assert_eq!(value["query"], "patent landscape for Celecoxib");
    assert_eq!(value["sections"][0]["worker"], "patent_landscape");
    assert!(value.get("tables").is_none());
    assert!(value["charts"].is_array());
}
