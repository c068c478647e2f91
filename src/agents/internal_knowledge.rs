//! Internal knowledge worker: strategy documents and field intelligence.

use crate::agents::data::{chart, entity_or, pick, seeded_rng, table, THERAPY_AREAS};
use crate::agents::Worker;
use crate::types::{ChartType, Result, TaskParameters, WorkerKind, WorkerOutput};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;

const DOCUMENT_TYPES: &[&str] = &["Strategy Deck", "Meeting Minutes", "Market Assessment", "Brand Plan"];
const AUTHORS: &[&str] = &["Strategy Office", "Medical Affairs", "Commercial Excellence", "Portfolio Team"];

pub struct InternalKnowledgeWorker;

impl InternalKnowledgeWorker {
    fn document(rng: &mut StdRng, topic: &str, drug: Option<&str>, out: &mut WorkerOutput) {
        let doc_type = pick(rng, DOCUMENT_TYPES);
        let title = match drug {
            Some(drug) => format!("{} Repurposing Opportunity in {}", drug, topic),
            None => format!("{} Portfolio Review", topic),
        };
        let created = format!("2024-{:02}-{:02}", rng.random_range(1..=12), rng.random_range(1..=28));
        let author = pick(rng, AUTHORS);

        let takeaways = [
            format!("Unmet need in {} remains {}", topic, pick(rng, &["high", "significant", "moderate"])),
            format!(
                "Repurposing timelines estimated at {}-{} years versus de novo development",
                rng.random_range(3..=4),
                rng.random_range(5..=7)
            ),
            format!("{} partnership models preferred", pick(rng, &["Co-development", "Licensing", "Regional"])),
        ];

        out.tables.push(table(
            "Document Summary",
            &["Field", "Value"],
            vec![
                vec!["Title".to_string(), title.clone()],
                vec!["Type".to_string(), doc_type.to_string()],
                vec!["Created".to_string(), created.clone()],
                vec!["Author".to_string(), author.to_string()],
                vec!["Confidentiality".to_string(), "Internal".to_string()],
            ],
        ));
        out.summary = format!(
            "## Internal Document Summary\n\n\
             **{title}**\n\
             Type: {doc_type} | Date: {created} | Author: {author}\n\n\
             **Key Takeaways:**\n{}",
            takeaways
                .iter()
                .map(|t| format!("- {}", t))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        out.data = json!({ "document_title": title, "document_type": doc_type, "created_date": created });
    }

    fn field_insights(rng: &mut StdRng, topic: &str, out: &mut WorkerOutput) {
        let positive: f64 = rng.random_range(40.0..70.0);
        let negative: f64 = rng.random_range(5.0..20.0);
        let neutral = 100.0 - positive - negative;
        let interactions: u32 = rng.random_range(50..400);

        out.charts.push(chart(
            ChartType::Pie,
            format!("KOL Sentiment: {}", topic),
            None,
            vec!["Positive".to_string(), "Neutral".to_string(), "Negative".to_string()],
            "Sentiment (%)",
            vec![positive.round(), neutral.round(), negative.round()],
        ));
        out.summary = format!(
            "## Field Intelligence Summary: {topic}\n\n\
             **KOL Interactions Logged:** {interactions}\n\
             **Positive Sentiment:** {positive:.0}%\n\n\
             Field teams report {} interest in new indications.",
            if positive > 55.0 { "strong" } else { "cautious" },
        );
        out.data = json!({ "therapy_area": topic, "kol_interactions": interactions });
    }
}

#[async_trait]
impl Worker for InternalKnowledgeWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::InternalKnowledge
    }

    async fn execute(&self, instruction: &str, params: &TaskParameters) -> Result<WorkerOutput> {
        let mut rng = seeded_rng(instruction);
        let topic = entity_or(params.secondary_entity.as_deref(), &mut rng, THERAPY_AREAS);
        let query = params.query.to_lowercase();

        let mut out = WorkerOutput {
            references: vec![
                "Internal Knowledge Base".to_string(),
                "Strategy Documents".to_string(),
                "Field Reports".to_string(),
            ],
            ..Default::default()
        };

        if ["field", "insight", "kol"].iter().any(|t| query.contains(t)) {
            Self::field_insights(&mut rng, &topic, &mut out);
        } else {
            Self::document(&mut rng, &topic, params.primary_entity.as_deref(), &mut out);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_document_summary_mentions_drug() {
        let params = TaskParameters {
            query: "internal strategy deck".to_string(),
            primary_entity: Some("Metformin".to_string()),
            secondary_entity: Some("Oncology".to_string()),
            ..Default::default()
        };
        let out = InternalKnowledgeWorker.execute("docs", &params).await.unwrap();
        assert!(out.summary.contains("Metformin Repurposing Opportunity in Oncology"));
        assert_eq!(out.tables[0].rows.len(), 5);
    }

    #[tokio::test]
    async fn test_field_insights_chart() {
        let params = TaskParameters {
            query: "KOL feedback".to_string(),
            ..Default::default()
        };
        let out = InternalKnowledgeWorker.execute("kol", &params).await.unwrap();
        assert_eq!(out.charts[0].labels.len(), 3);
        assert!(out.tables.is_empty());
    }
}
