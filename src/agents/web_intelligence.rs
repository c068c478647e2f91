//! Web intelligence worker: publications, news and treatment guidelines.

use crate::agents::data::{entity_or, pick, seeded_rng, table, THERAPY_AREAS};
use crate::agents::Worker;
use crate::types::{Result, TaskParameters, WorkerKind, WorkerOutput};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;

const SOURCES: &[(&str, &str)] = &[
    ("PubMed", "https://pubmed.ncbi.nlm.nih.gov"),
    ("FDA", "https://www.fda.gov"),
    ("EMA", "https://www.ema.europa.eu"),
    ("NEJM", "https://www.nejm.org"),
    ("Reuters Health", "https://www.reuters.com/business/healthcare-pharmaceuticals"),
];

const GUIDELINE_BODIES: &[&str] = &["WHO", "NCCN", "ESC", "AHA", "NICE"];

pub struct WebIntelligenceWorker;

impl WebIntelligenceWorker {
    fn search(rng: &mut StdRng, subject: &str, out: &mut WorkerOutput) {
        let count = rng.random_range(3..=5);
        let mut rows = Vec::new();
        let mut lines = Vec::new();

        for i in 0..count {
            let (source, base) = SOURCES[(i + rng.random_range(0..SOURCES.len())) % SOURCES.len()];
            let category = pick(rng, &["Publication", "News", "Regulatory", "Conference"]);
            let date = format!("2024-{:02}-{:02}", rng.random_range(1..=12), rng.random_range(1..=28));
            let relevance: u32 = rng.random_range(60..=99);
            let title = format!(
                "{} {} {}",
                subject,
                pick(rng, &["shows promise in", "evaluated for", "repositioned towards"]),
                pick(rng, THERAPY_AREAS)
            );

            lines.push(format!("- **{}** ({}, {}, relevance {}%)", title, source, date, relevance));
            rows.push(vec![title, source.to_string(), category.to_string(), date, format!("{}%", relevance)]);
            out.references.push(format!("{}: {}", source, base));
        }

        out.tables.push(table(
            format!("Search Results: {}", subject),
            &["Title", "Source", "Category", "Date", "Relevance"],
            rows,
        ));
        out.summary = format!(
            "## Web Search Results: {subject}\n\n\
             **Total Results Found:** {}\n\n\
             **Top Results:**\n{}",
            rng.random_range(120..5000),
            lines.join("\n"),
        );
        out.data = json!({ "query": subject, "results": count });
    }

    fn guidelines(rng: &mut StdRng, therapy: &str, out: &mut WorkerOutput) {
        let body = pick(rng, GUIDELINE_BODIES);
        let recommendations = [
            format!("First-line therapy selection in {} should follow risk stratification", therapy),
            "Off-label use requires documented benefit-risk assessment".to_string(),
            "Combination regimens recommended for refractory patients".to_string(),
        ];
        let evidence = pick(rng, &["Level A", "Level B", "Level C"]);

        out.tables.push(table(
            format!("{} Guidelines", body),
            &["Recommendation", "Evidence Level"],
            recommendations
                .iter()
                .map(|r| vec![r.clone(), evidence.to_string()])
                .collect(),
        ));
        out.references.push(format!("{} Clinical Practice Guidelines", body));
        out.summary = format!(
            "## Guideline Summary: {therapy}\n\n\
             **Issuing Body:** {body}\n\
             **Evidence Level:** {evidence}\n\n\
             **Key Recommendations:**\n{}",
            recommendations
                .iter()
                .map(|r| format!("- {}", r))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        out.data = json!({ "therapy_area": therapy, "organization": body });
    }
}

#[async_trait]
impl Worker for WebIntelligenceWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::WebIntelligence
    }

    async fn execute(&self, instruction: &str, params: &TaskParameters) -> Result<WorkerOutput> {
        let mut rng = seeded_rng(instruction);
        let query = params.query.to_lowercase();
        let mut out = WorkerOutput::default();

        if ["guideline", "recommendation", "standard"]
            .iter()
            .any(|t| query.contains(t))
        {
            let therapy = entity_or(params.secondary_entity.as_deref(), &mut rng, THERAPY_AREAS);
            Self::guidelines(&mut rng, &therapy, &mut out);
        } else {
            let subject = params
                .primary_entity
                .clone()
                .or_else(|| params.secondary_entity.clone())
                .unwrap_or_else(|| "Drug repurposing".to_string());
            Self::search(&mut rng, &subject, &mut out);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_results_become_references() {
        let params = TaskParameters {
            query: "latest news on Sildenafil".to_string(),
            primary_entity: Some("Sildenafil".to_string()),
            ..Default::default()
        };
        let out = WebIntelligenceWorker.execute("news", &params).await.unwrap();

        assert_eq!(out.references.len(), out.tables[0].rows.len());
        assert!(out.tables[0].rows.iter().all(|r| r[0].starts_with("Sildenafil")));
    }

    #[tokio::test]
    async fn test_guidelines_branch() {
        let params = TaskParameters {
            query: "treatment guidelines".to_string(),
            secondary_entity: Some("Cardiology".to_string()),
            ..Default::default()
        };
        let out = WebIntelligenceWorker.execute("guidelines", &params).await.unwrap();
        assert!(out.summary.contains("Guideline Summary: Cardiology"));
        assert_eq!(out.tables[0].headers, vec!["Recommendation", "Evidence Level"]);
    }
}
