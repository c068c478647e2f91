//! Response synthesis
//!
//! Merges completed worker results into a [`SynthesizedResponse`] and renders
//! it for the requested output format. The executive summary comes from the
//! optional [`LLMClient`]; when that is absent, slow, failing or silent, a
//! deterministic bullet list is built from the worker summaries instead.

use crate::agents::report::markdown_table;
use crate::llm::LLMClient;
use crate::types::{OutputFormat, QueryOptions, Section, SynthesizedResponse, WorkerResult};
use serde_json::json;
use std::fmt::Write as _;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Most bullets in the fallback summary
const MAX_INSIGHTS: usize = 5;
/// Tables rendered inline in text mode
const MAX_INLINE_TABLES: usize = 5;
/// Rows per inline table
const MAX_INLINE_ROWS: usize = 10;
/// Characters of each section passed to the language model
const PROMPT_SECTION_CHARS: usize = 500;

const SUMMARY_SYSTEM_PROMPT: &str = "You are a pharmaceutical research analyst. Summarize findings \
                                     from market, trade, patent, clinical and literature sources \
                                     for an executive audience. Use only the evidence provided.";

const NO_INSIGHTS: &str = "Analysis complete. Specialized agents have gathered domain-specific \
                           data for your request. Please see the detailed sections below.";

const NO_RESULTS: &str = "No worker produced results for this query. The data sources may be \
                          unavailable; retry the request or broaden the query.";

#[derive(Clone)]
pub struct ResponseSynthesizer {
    llm: Option<Arc<dyn LLMClient>>,
    timeout: Duration,
}

impl Default for ResponseSynthesizer {
    fn default() -> Self {
        Self::new(None, Duration::from_secs(20))
    }
}

impl ResponseSynthesizer {
    pub fn new(llm: Option<Arc<dyn LLMClient>>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Merge the completed results, in the order given.
    pub async fn synthesize(&self, query: &str, results: &[WorkerResult]) -> SynthesizedResponse {
        let completed: Vec<&WorkerResult> = results.iter().filter(|r| r.is_completed()).collect();

        let sections: Vec<Section> = completed
            .iter()
            .map(|r| Section {
                title: r.worker.display_name().to_string(),
                worker: r.worker,
                content: r.summary.clone(),
            })
            .collect();

        let mut references: Vec<String> = Vec::new();
        for reference in completed.iter().flat_map(|r| r.references.iter()) {
            if !references.contains(reference) {
                references.push(reference.clone());
            }
        }

        let executive_summary = if completed.is_empty() {
            NO_RESULTS.to_string()
        } else {
            match self.generated_summary(query, &sections).await {
                Some(summary) => summary,
                None => fallback_summary(&completed),
            }
        };

        SynthesizedResponse {
            executive_summary,
            sections,
            tables: completed.iter().flat_map(|r| r.tables.clone()).collect(),
            charts: completed.iter().flat_map(|r| r.charts.clone()).collect(),
            references,
        }
    }

    async fn generated_summary(&self, query: &str, sections: &[Section]) -> Option<String> {
        let llm = self.llm.as_ref()?;

        let findings = sections
            .iter()
            .map(|s| {
                let excerpt: String = s.content.chars().take(PROMPT_SECTION_CHARS).collect();
                format!("### {}\n{}", s.title, excerpt)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = format!(
            "Based on the following analysis from multiple specialized agents, create a concise \
             executive summary (3-5 bullet points) answering the query.\n\n\
             Query: {}\n\n{}\n\nExecutive summary:",
            query, findings
        );

        let request = llm.generate_with_system(SUMMARY_SYSTEM_PROMPT, &prompt);
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(reply)) if !reply.trim().is_empty() => {
                debug!(model = llm.model_name(), "Executive summary generated");
                Some(reply.trim().to_string())
            }
            Ok(Ok(_)) => {
                warn!(model = llm.model_name(), "Empty executive summary, using fallback");
                None
            }
            Ok(Err(e)) => {
                warn!(model = llm.model_name(), error = %e, "Summary generation failed, using fallback");
                None
            }
            Err(_) => {
                warn!(model = llm.model_name(), timeout = ?self.timeout, "Summary generation timed out, using fallback");
                None
            }
        }
    }
}

/// First non-empty, non-heading line of each summary, labeled by worker.
fn fallback_summary(completed: &[&WorkerResult]) -> String {
    let insights: Vec<String> = completed
        .iter()
        .filter_map(|r| {
            r.summary
                .lines()
                .map(str::trim)
                .find(|line| !line.is_empty() && !line.starts_with('#'))
                .map(|line| format!("• **{}:** {}", r.worker.display_name(), line))
        })
        .take(MAX_INSIGHTS)
        .collect();

    if insights.is_empty() {
        NO_INSIGHTS.to_string()
    } else {
        format!(
            "Key Insights from Multi-Agent Analysis:\n\n{}",
            insights.join("\n")
        )
    }
}

/// Render the final document for the caller.
pub fn render(
    query: &str,
    response: &SynthesizedResponse,
    options: &QueryOptions,
    report_path: Option<&str>,
) -> String {
    match options.output_format {
        OutputFormat::Json => render_json(query, response, options, report_path),
        OutputFormat::Text => render_text(query, response, options, report_path),
    }
}

fn render_json(
    query: &str,
    response: &SynthesizedResponse,
    options: &QueryOptions,
    report_path: Option<&str>,
) -> String {
    let mut value = json!({
        "query": query,
        "executive_summary": response.executive_summary,
        "sections": response.sections,
        "references": response.references,
        "report_path": report_path,
    });
    if options.include_tables {
        value["tables"] = json!(response.tables);
    }
    if options.include_charts {
        value["charts"] = json!(response.charts);
    }
    serde_json::to_string_pretty(&value).unwrap_or_else(|_| value.to_string())
}

fn render_text(
    query: &str,
    response: &SynthesizedResponse,
    options: &QueryOptions,
    report_path: Option<&str>,
) -> String {
    let mut doc = String::new();
    let _ = writeln!(doc, "# Research Analysis\n");
    let _ = writeln!(doc, "**Query:** {}\n", query);
    let _ = writeln!(doc, "## Executive Summary\n\n{}\n", response.executive_summary);
    doc.push_str("---\n\n");

    for section in &response.sections {
        let _ = writeln!(doc, "## {}\n\n{}\n", section.title, section.content.trim_end());
        doc.push_str("---\n\n");
    }

    if options.include_tables && !response.tables.is_empty() {
        let _ = writeln!(doc, "## Data Tables\n");
        for table in response.tables.iter().take(MAX_INLINE_TABLES) {
            let _ = writeln!(doc, "### {}\n", table.title);
            doc.push_str(&markdown_table(table, MAX_INLINE_ROWS));
            doc.push('\n');
        }
    }

    if options.include_charts && !response.charts.is_empty() {
        let _ = writeln!(doc, "## Charts\n");
        for chart in &response.charts {
            let _ = writeln!(
                doc,
                "- {} ({:?}, {} series)",
                chart.title,
                chart.chart_type,
                chart.series.len()
            );
        }
        doc.push('\n');
    }

    if !response.references.is_empty() {
        let _ = writeln!(doc, "## References\n");
        for reference in &response.references {
            let _ = writeln!(doc, "- {}", reference);
        }
        doc.push('\n');
    }

    if let Some(path) = report_path {
        let _ = writeln!(doc, "**Report Generated:** `{}`", path);
    }

    doc.trim_end().to_string()
}
