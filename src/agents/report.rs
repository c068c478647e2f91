//! Report writer
//!
//! Compiles a finished run into a Markdown or JSON document under the
//! configured output directory. The directory is created on demand.

use crate::agents::{ReportRequest, ReportWorker};
use crate::types::{AppError, Chart, DataTable, Result, WorkerOutput};
use crate::utils::toml_config::ReportFormat;
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write as _;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Rows rendered per table in a stored report
const MAX_REPORT_ROWS: usize = 20;

#[derive(Debug, Serialize)]
struct ReportSection {
    title: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ReportDocument {
    report_id: String,
    title: String,
    query: String,
    generated_at: String,
    executive_summary: String,
    sections: Vec<ReportSection>,
    tables: Vec<DataTable>,
    charts: Vec<Chart>,
    references: Vec<String>,
}

impl ReportDocument {
    fn compile(request: &ReportRequest) -> Self {
        let completed: Vec<_> = request.results.iter().filter(|r| r.is_completed()).collect();

        let sections = if completed.is_empty() {
            vec![ReportSection {
                title: "Overview".to_string(),
                content: "No worker produced results for this query. Retry the request or \
                          broaden the query to include market, trial or patent terms."
                    .to_string(),
            }]
        } else {
            completed
                .iter()
                .map(|r| ReportSection {
                    title: format!("{} Analysis", r.worker.display_name()),
                    content: r.summary.clone(),
                })
                .collect()
        };

        Self {
            report_id: Uuid::new_v4().simple().to_string(),
            title: request.title.clone(),
            query: request.query.clone(),
            generated_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            executive_summary: request.synthesis.executive_summary.clone(),
            sections,
            tables: request.synthesis.tables.clone(),
            charts: request.synthesis.charts.clone(),
            references: request.synthesis.references.clone(),
        }
    }

    fn to_markdown(&self) -> String {
        let mut md = String::new();
        let _ = writeln!(md, "# {}\n", self.title);
        let _ = writeln!(md, "**Generated:** {}  ", self.generated_at);
        let _ = writeln!(md, "**Query:** {}\n", self.query);

        let _ = writeln!(md, "## Table of Contents\n");
        let _ = writeln!(md, "1. Executive Summary");
        for (i, section) in self.sections.iter().enumerate() {
            let _ = writeln!(md, "{}. {}", i + 2, section.title);
        }
        md.push('\n');

        let _ = writeln!(md, "## Executive Summary\n\n{}\n", self.executive_summary);
        for section in &self.sections {
            let _ = writeln!(md, "## {}\n\n{}\n", section.title, section.content);
        }

        if !self.tables.is_empty() {
            let _ = writeln!(md, "## Data Tables\n");
            for table in &self.tables {
                let _ = writeln!(md, "### {}\n", table.title);
                md.push_str(&markdown_table(table, MAX_REPORT_ROWS));
                md.push('\n');
            }
        }

        if !self.references.is_empty() {
            let _ = writeln!(md, "## References\n");
            for reference in &self.references {
                let _ = writeln!(md, "- {}", reference);
            }
        }

        md
    }
}

/// Render a table as pipe-delimited Markdown, truncated to `max_rows`.
pub fn markdown_table(table: &DataTable, max_rows: usize) -> String {
    let mut out = String::new();
    if table.headers.is_empty() {
        return out;
    }
    let _ = writeln!(out, "| {} |", table.headers.join(" | "));
    let _ = writeln!(
        out,
        "|{}",
        table.headers.iter().map(|_| " --- |").collect::<String>()
    );
    for row in table.rows.iter().take(max_rows) {
        let _ = writeln!(out, "| {} |", row.join(" | "));
    }
    out
}

/// File-backed report worker
pub struct MarkdownReportWriter {
    output_dir: PathBuf,
    format: ReportFormat,
}

impl MarkdownReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>, format: ReportFormat) -> Self {
        Self {
            output_dir: output_dir.into(),
            format,
        }
    }
}

#[async_trait]
impl ReportWorker for MarkdownReportWriter {
    async fn generate(&self, request: &ReportRequest) -> Result<WorkerOutput> {
        let document = ReportDocument::compile(request);

        let body = match self.format {
            ReportFormat::Markdown => document.to_markdown(),
            ReportFormat::Json => serde_json::to_string_pretty(&document)
                .map_err(|e| AppError::Internal(format!("Failed to encode report: {}", e)))?,
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let filename = format!(
            "report_{}.{}",
            &document.report_id[..8],
            self.format.extension()
        );
        let path = self.output_dir.join(filename);
        tokio::fs::write(&path, body).await?;

        let report_path = path.display().to_string();
        info!(path = %report_path, sections = document.sections.len(), "Report written");

        let contents = document
            .sections
            .iter()
            .map(|s| format!("- {}", s.title))
            .collect::<Vec<_>>()
            .join("\n");

        Ok(WorkerOutput {
            summary: format!(
                "## Report Generated\n\n\
                 **Title:** {}\n\
                 **Generated:** {}\n\
                 **Sections:** {}\n\
                 **Tables:** {}\n\
                 **Charts:** {}\n\n\
                 **Report Location:** `{}`\n\n\
                 **Contents:**\n{}",
                document.title,
                document.generated_at,
                document.sections.len(),
                document.tables.len(),
                document.charts.len(),
                report_path,
                contents,
            ),
            tables: Vec::new(),
            charts: Vec::new(),
            references: vec![format!("Report: {}", report_path)],
            data: json!({
                "report_id": document.report_id,
                "report_path": report_path,
                "format": self.format,
            }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{
        ResultStatus, Section, SynthesizedResponse, WorkerKind, WorkerResult,
    };

    fn synthesis() -> SynthesizedResponse {
        SynthesizedResponse {
            executive_summary: "Key Insights".to_string(),
            sections: vec![Section {
                title: "Patent Landscape".to_string(),
                worker: WorkerKind::PatentLandscape,
                content: "## Patents\nAll clear".to_string(),
            }],
            tables: vec![DataTable {
                title: "Patents".to_string(),
                headers: vec!["Number".to_string()],
                rows: (0..30).map(|i| vec![format!("US{}", i)]).collect(),
            }],
            charts: Vec::new(),
            references: vec!["WIPO".to_string()],
        }
    }

    fn result(status: ResultStatus) -> WorkerResult {
        WorkerResult {
            task_id: "task_1".to_string(),
            worker: WorkerKind::PatentLandscape,
            status,
            summary: "## Patents\nAll clear".to_string(),
            tables: Vec::new(),
            charts: Vec::new(),
            references: Vec::new(),
            data: serde_json::Value::Null,
            error: None,
            duration_ms: 1,
        }
    }

    fn request(results: Vec<WorkerResult>) -> ReportRequest {
        ReportRequest {
            title: "Research Report: Celecoxib".to_string(),
            query: "patents for Celecoxib".to_string(),
            results,
            synthesis: synthesis(),
        }
    }

    #[tokio::test]
    async fn test_markdown_report_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MarkdownReportWriter::new(dir.path().join("nested"), ReportFormat::Markdown);

        let out = writer
            .generate(&request(vec![result(ResultStatus::Completed)]))
            .await
            .unwrap();

        let path = out.data["report_path"].as_str().unwrap();
        assert!(path.ends_with(".md"));
        let body = std::fs::read_to_string(path).unwrap();
        assert!(body.starts_with("# Research Report: Celecoxib"));
        assert!(body.contains("## Patent Landscape Analysis"));
        assert!(body.contains("| US19 |"));
        assert!(!body.contains("| US20 |"));
        assert_eq!(out.references, vec![format!("Report: {}", path)]);
    }

    #[tokio::test]
    async fn test_empty_result_set_still_produces_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MarkdownReportWriter::new(dir.path(), ReportFormat::Markdown);

        let out = writer
            .generate(&request(vec![result(ResultStatus::Failed)]))
            .await
            .unwrap();

        let body = std::fs::read_to_string(out.data["report_path"].as_str().unwrap()).unwrap();
        assert!(body.contains("## Overview"));
    }

    #[tokio::test]
    async fn test_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let writer = MarkdownReportWriter::new(dir.path(), ReportFormat::Json);

        let out = writer.generate(&request(Vec::new())).await.unwrap();
        let path = out.data["report_path"].as_str().unwrap();
        assert!(path.ends_with(".json"));

        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(parsed["title"], "Research Report: Celecoxib");
    }

    #[test]
    fn test_markdown_table_truncates_rows() {
        let table = DataTable {
            title: "t".to_string(),
            headers: vec!["A".to_string(), "B".to_string()],
            rows: vec![
                vec!["1".to_string(), "2".to_string()],
                vec!["3".to_string(), "4".to_string()],
            ],
        };
        let md = markdown_table(&table, 1);
        assert_eq!(md, "| A | B |\n| --- | --- |\n| 1 | 2 |\n");
    }
}
