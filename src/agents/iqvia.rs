//! Market insights worker backed by synthetic IQVIA-style data.

use crate::agents::data::{
    chart, entity_or, pick, round2, sample, seeded_rng, shares, table, COMPANIES, COUNTRIES,
    DRUG_NAMES, THERAPY_AREAS,
};
use crate::agents::Worker;
use crate::types::{ChartType, Result, TaskParameters, WorkerKind, WorkerOutput};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;

pub struct IqviaInsightsWorker;

impl IqviaInsightsWorker {
    fn market_size(rng: &mut StdRng, drug: &str, therapy: &str, out: &mut WorkerOutput) {
        let mut size = rng.random_range(500.0..15_000.0) * 0.7;
        let mut rows = Vec::new();
        let mut years = Vec::new();
        let mut sizes = Vec::new();

        for year in 2019..2025 {
            let growth = rng.random_range(0.03..0.15);
            size *= 1.0 + growth;
            rows.push(vec![
                year.to_string(),
                format!("{:.2}", size),
                format!("{:.1}", growth * 100.0),
            ]);
            years.push(year.to_string());
            sizes.push(round2(size));
        }

        let first = sizes.first().copied().unwrap_or(1.0);
        let last = sizes.last().copied().unwrap_or(1.0);
        let cagr = ((last / first).powf(1.0 / 5.0) - 1.0) * 100.0;
        let forecast = last * (1.0 + cagr / 100.0).powi(4);
        let top_markets = sample(rng, &COUNTRIES[..6], 3);
        let leader = pick(rng, COMPANIES);

        out.tables.push(table(
            format!("Market Size Analysis: {}", drug),
            &["Year", "Market Size (USD M)", "Growth Rate (%)"],
            rows,
        ));
        out.charts.push(chart(
            ChartType::Line,
            format!("Market Size Trend: {}", drug),
            Some(("Year", "Market Size (USD Millions)")),
            years,
            "Market Size",
            sizes,
        ));
        out.summary = format!(
            "## Market Analysis for {drug}\n\n\
             **Current Market Size:** ${last:.2}M\n\
             **5-Year CAGR:** {cagr:.2}%\n\
             **2028 Forecast:** ${forecast:.2}M\n\n\
             **Top Markets:** {markets}\n\
             **Market Leader:** {leader}\n\n\
             The {therapy} segment shows {strength} growth trajectory.",
            markets = top_markets.join(", "),
            strength = if cagr > 8.0 { "strong" } else { "moderate" },
        );
        out.data = json!({
            "drug_name": drug,
            "therapy_area": therapy,
            "current_market_size": round2(last),
            "cagr_5yr": round2(cagr),
            "forecast_2028": round2(forecast),
        });
    }

    fn competition(rng: &mut StdRng, therapy: &str, out: &mut WorkerOutput) {
        let count = rng.random_range(4..=8);
        let competitors = sample(rng, COMPANIES, count);
        let market_shares = shares(rng, competitors.len());
        let total_bn = rng.random_range(20.0..180.0);
        let growth = rng.random_range(5.0..12.0);

        out.tables.push(table(
            format!("Competitive Landscape: {}", therapy),
            &["Company", "Market Share (%)"],
            competitors
                .iter()
                .zip(&market_shares)
                .map(|(c, s)| vec![c.to_string(), format!("{:.1}", s)])
                .collect(),
        ));
        out.charts.push(chart(
            ChartType::Pie,
            format!("Market Share Distribution: {}", therapy),
            None,
            competitors.iter().map(|c| c.to_string()).collect(),
            "Market Share",
            market_shares.clone(),
        ));
        out.summary = format!(
            "## Therapy Area Dynamics: {therapy}\n\n\
             **Total Market Size:** ${total_bn:.1}B\n\
             **Projected Growth:** {growth:.1}% CAGR through 2028\n\n\
             **Key Trends:**\n\
             - Shift towards {}\n\
             - Growing {} competition",
            pick(rng, &["biologics", "gene therapy", "personalized medicine"]),
            pick(rng, &["biosimilar", "generic", "novel mechanism"]),
        );
        out.data = json!({ "therapy_area": therapy, "total_market_size_bn": round2(total_bn) });
    }

    fn volume(rng: &mut StdRng, drug: &str, out: &mut WorkerOutput) {
        let quarters = ["Q1'23", "Q2'23", "Q3'23", "Q4'23", "Q1'24", "Q2'24", "Q3'24", "Q4'24"];
        let mut volume: f64 = rng.random_range(1_000_000.0..50_000_000.0);
        let mut rows = Vec::new();
        let mut values = Vec::new();

        for quarter in quarters {
            let change = rng.random_range(-0.05..0.10);
            volume *= 1.0 + change;
            rows.push(vec![
                quarter.to_string(),
                format!("{:.0}", volume),
                format!("{:.1}", change * 100.0),
            ]);
            values.push(volume.round());
        }

        let ytd: f64 = values.iter().rev().take(4).sum();
        out.tables.push(table(
            format!("Prescription Volume Trends: {}", drug),
            &["Quarter", "Prescriptions", "Change (%)"],
            rows,
        ));
        out.charts.push(chart(
            ChartType::Bar,
            format!("Quarterly Prescription Volume: {}", drug),
            Some(("Quarter", "Prescriptions")),
            quarters.iter().map(|q| q.to_string()).collect(),
            "Prescriptions",
            values,
        ));
        out.summary = format!(
            "## Volume Analysis for {drug}\n\n\
             **YTD Total Prescriptions:** {ytd:.0}\n\
             **Market Trend:** {}",
            pick(rng, &["Growing", "Stable", "Declining"]),
        );
        out.data = json!({ "drug_name": drug, "total_prescriptions_ytd": ytd });
    }
}

#[async_trait]
impl Worker for IqviaInsightsWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::IqviaInsights
    }

    async fn execute(&self, instruction: &str, params: &TaskParameters) -> Result<WorkerOutput> {
        let mut rng = seeded_rng(instruction);
        let drug = entity_or(params.primary_entity.as_deref(), &mut rng, DRUG_NAMES);
        let therapy = entity_or(params.secondary_entity.as_deref(), &mut rng, THERAPY_AREAS);
        let query = params.query.to_lowercase();

        let mut out = WorkerOutput {
            references: vec![
                "IQVIA MIDAS Database".to_string(),
                "IQVIA National Sales Perspectives".to_string(),
            ],
            ..Default::default()
        };

        if ["therapy", "dynamics", "competition"]
            .iter()
            .any(|t| query.contains(t))
        {
            Self::competition(&mut rng, &therapy, &mut out);
        } else if ["volume", "prescription"].iter().any(|t| query.contains(t)) {
            Self::volume(&mut rng, &drug, &mut out);
        } else {
            Self::market_size(&mut rng, &drug, &therapy, &mut out);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(query: &str) -> TaskParameters {
        TaskParameters {
            query: query.to_string(),
            primary_entity: Some("Metformin".to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_market_size_output() {
        let out = IqviaInsightsWorker
            .execute("Analyze market data for Metformin", &params("market size"))
            .await
            .unwrap();

        assert!(out.summary.contains("Market Analysis for Metformin"));
        assert_eq!(out.tables[0].rows.len(), 6);
        assert_eq!(out.charts[0].chart_type, ChartType::Line);
        assert_eq!(out.references.len(), 2);
    }

    #[tokio::test]
    async fn test_competition_branch() {
        let out = IqviaInsightsWorker
            .execute("x", &params("competition in the therapy area"))
            .await
            .unwrap();
        assert_eq!(out.charts[0].chart_type, ChartType::Pie);
        assert_eq!(out.tables[0].headers, vec!["Company", "Market Share (%)"]);
    }

    #[tokio::test]
    async fn test_same_instruction_same_data() {
        let a = IqviaInsightsWorker.execute("same", &params("sales")).await.unwrap();
        let b = IqviaInsightsWorker.execute("same", &params("sales")).await.unwrap();
        assert_eq!(a, b);
    }
}
