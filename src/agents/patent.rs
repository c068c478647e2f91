//! Patent landscape worker: portfolio status, FTO and filing trends.

use crate::agents::data::{chart, entity_or, pick, sample, seeded_rng, table, COMPANIES, DRUG_NAMES, THERAPY_AREAS};
use crate::agents::Worker;
use crate::types::{ChartType, Result, TaskParameters, WorkerKind, WorkerOutput};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;
use std::collections::BTreeMap;

/// Patent term in years from filing
const PATENT_TERM: i32 = 20;

pub struct PatentLandscapeWorker;

struct Patent {
    number: String,
    kind: &'static str,
    assignee: &'static str,
    filed: (i32, u32, u32),
    status: &'static str,
}

impl Patent {
    fn filing_date(&self) -> String {
        let (y, m, d) = self.filed;
        format!("{:04}-{:02}-{:02}", y, m, d)
    }

    fn expiry_date(&self) -> String {
        let (y, m, d) = self.filed;
        format!("{:04}-{:02}-{:02}", y + PATENT_TERM, m, d)
    }
}

impl PatentLandscapeWorker {
    fn portfolio(rng: &mut StdRng, drug: &str, out: &mut WorkerOutput) {
        let count = rng.random_range(3..=8);
        let patents: Vec<Patent> = (0..count)
            .map(|_| Patent {
                number: format!("US{}", rng.random_range(7_000_000..12_000_000)),
                kind: pick(rng, &["Compound", "Formulation", "Process", "Use"]),
                assignee: pick(rng, COMPANIES),
                filed: (
                    rng.random_range(2005..2024),
                    rng.random_range(1..=12),
                    rng.random_range(1..=28),
                ),
                status: pick(rng, &["Active", "Active", "Active", "Expired", "Pending"]),
            })
            .collect();

        let active = patents.iter().filter(|p| p.status == "Active").count();
        let earliest_expiry = patents
            .iter()
            .filter(|p| p.status == "Active")
            .map(Patent::expiry_date)
            .min()
            .unwrap_or_else(|| "n/a".to_string());
        let fto = pick(rng, &["Clear", "Potential Issues", "Blocked"]);

        let mut holders: Vec<&str> = Vec::new();
        for p in &patents {
            if holders.len() < 3 && !holders.contains(&p.assignee) {
                holders.push(p.assignee);
            }
        }

        let mut by_type: BTreeMap<&str, f64> = BTreeMap::new();
        for p in &patents {
            *by_type.entry(p.kind).or_default() += 1.0;
        }

        out.tables.push(table(
            format!("Patent Portfolio: {}", drug),
            &["Patent Number", "Type", "Assignee", "Filing Date", "Expiry Date", "Status"],
            patents
                .iter()
                .map(|p| {
                    vec![
                        p.number.clone(),
                        p.kind.to_string(),
                        p.assignee.to_string(),
                        p.filing_date(),
                        p.expiry_date(),
                        p.status.to_string(),
                    ]
                })
                .collect(),
        ));
        out.charts.push(chart(
            ChartType::Pie,
            format!("Patent Type Distribution: {}", drug),
            None,
            by_type.keys().map(|k| k.to_string()).collect(),
            "Patents",
            by_type.values().copied().collect(),
        ));

        let cliff = if earliest_expiry.as_str() < "2026-01-01" {
            "Patent cliff approaching; generic entry expected"
        } else {
            "Strong IP protection continues"
        };
        let licensing = if fto == "Clear" {
            "FTO pathway available"
        } else {
            "Consider licensing discussions"
        };

        out.summary = format!(
            "## Patent Landscape Analysis: {drug}\n\n\
             **Total Patents:** {count}\n\
             **Active Patents:** {active}\n\
             **Earliest Expiry:** {earliest_expiry}\n\
             **FTO Status:** {fto}\n\n\
             **Key Patent Holders:** {}\n\n\
             **Strategic Implications:**\n\
             - {cliff}\n\
             - {licensing}",
            holders.join(", "),
        );
        out.data = json!({
            "drug_name": drug,
            "total_patents": count,
            "active_patents": active,
            "earliest_expiry": earliest_expiry,
            "fto_status": fto,
        });
    }

    fn filing_trends(rng: &mut StdRng, therapy: &str, out: &mut WorkerOutput) {
        let companies = sample(rng, COMPANIES, 6);
        let years: Vec<i32> = (2019..2025).collect();
        let grid: Vec<Vec<u32>> = companies
            .iter()
            .map(|_| years.iter().map(|_| rng.random_range(5..=150)).collect())
            .collect();

        let totals: Vec<u32> = grid.iter().map(|row| row.iter().sum()).collect();
        let top_filer = companies
            .iter()
            .zip(&totals)
            .max_by_key(|(_, total)| **total)
            .map(|(c, _)| *c)
            .unwrap_or("n/a");
        let latest: u32 = grid.iter().filter_map(|row| row.last()).sum();

        let mut headers = vec!["Company".to_string()];
        headers.extend(years.iter().map(|y| y.to_string()));
        let mut filings = table(
            format!("Patent Filing Heatmap: {}", therapy),
            &[],
            companies
                .iter()
                .zip(&grid)
                .map(|(company, row)| {
                    std::iter::once(company.to_string())
                        .chain(row.iter().map(|n| n.to_string()))
                        .collect()
                })
                .collect(),
        );
        filings.headers = headers;
        out.tables.push(filings);

        out.charts.push(chart(
            ChartType::Bar,
            format!("Patent Filing Activity: {}", therapy),
            Some(("Company", "Filings 2019-2024")),
            companies.iter().map(|c| c.to_string()).collect(),
            "Filings",
            totals.iter().map(|t| f64::from(*t)).collect(),
        ));

        out.summary = format!(
            "## Patent Filing Trends: {therapy}\n\n\
             **Top Filer:** {top_filer}\n\
             **2024 Total Filings:** {latest}\n\n\
             Patent activity indicates {} R&D investment, with {top_filer} leading IP development.",
            if latest > 300 { "increasing" } else { "stable" },
        );
        out.data = json!({ "therapy_area": therapy, "top_filer": top_filer, "total_filings_2024": latest });
    }
}

#[async_trait]
impl Worker for PatentLandscapeWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::PatentLandscape
    }

    async fn execute(&self, instruction: &str, params: &TaskParameters) -> Result<WorkerOutput> {
        let mut rng = seeded_rng(instruction);
        let query = params.query.to_lowercase();

        let mut out = WorkerOutput {
            references: vec![
                "USPTO Patent Database".to_string(),
                "European Patent Office".to_string(),
                "WIPO".to_string(),
            ],
            ..Default::default()
        };

        let trends = ["heatmap", "filing", "competitive"]
            .iter()
            .any(|t| query.contains(t));
        if trends && params.primary_entity.is_none() {
            let therapy = entity_or(params.secondary_entity.as_deref(), &mut rng, THERAPY_AREAS);
            Self::filing_trends(&mut rng, &therapy, &mut out);
        } else {
            let drug = entity_or(params.primary_entity.as_deref(), &mut rng, DRUG_NAMES);
            Self::portfolio(&mut rng, &drug, &mut out);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_portfolio_for_named_drug() {
        let params = TaskParameters {
            query: "patent expiry for Celecoxib".to_string(),
            primary_entity: Some("Celecoxib".to_string()),
            ..Default::default()
        };
        let out = PatentLandscapeWorker.execute("patents", &params).await.unwrap();

        assert!(out.summary.contains("Patent Landscape Analysis: Celecoxib"));
        assert_eq!(out.tables[0].headers.len(), 6);
        assert_eq!(out.references.len(), 3);
        let patents = out.data["total_patents"].as_u64().unwrap();
        assert_eq!(out.tables[0].rows.len() as u64, patents);
    }

    #[tokio::test]
    async fn test_filing_trends_without_drug() {
        let params = TaskParameters {
            query: "competitive filing heatmap".to_string(),
            secondary_entity: Some("Oncology".to_string()),
            ..Default::default()
        };
        let out = PatentLandscapeWorker.execute("filings", &params).await.unwrap();

        assert!(out.summary.contains("Patent Filing Trends: Oncology"));
        assert_eq!(out.tables[0].headers[0], "Company");
        assert_eq!(out.tables[0].rows.len(), 6);
    }

    #[test]
    fn test_expiry_is_twenty_years_after_filing() {
        let patent = Patent {
            number: "US1".to_string(),
            kind: "Use",
            assignee: "Bayer",
            filed: (2010, 3, 9),
            status: "Active",
        };
        assert_eq!(patent.filing_date(), "2010-03-09");
        assert_eq!(patent.expiry_date(), "2030-03-09");
    }
}
