//! Export/import and API sourcing worker.

use crate::agents::data::{chart, entity_or, round2, sample, seeded_rng, shares, table, COUNTRIES, DRUG_NAMES};
use crate::agents::Worker;
use crate::types::{ChartSeries, ChartType, Result, TaskParameters, WorkerKind, WorkerOutput};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;

pub struct EximTrendsWorker;

impl EximTrendsWorker {
    fn trade(rng: &mut StdRng, product: &str, out: &mut WorkerOutput) {
        let mut rows = Vec::new();
        let mut years = Vec::new();
        let mut exports = Vec::new();
        let mut imports = Vec::new();

        for year in 2020..2025 {
            let export = rng.random_range(50.0..500.0);
            let import = rng.random_range(30.0..400.0);
            rows.push(vec![
                year.to_string(),
                format!("{:.2}", export),
                format!("{:.2}", import),
                format!("{:.2}", export - import),
                rng.random_range(1_000..50_000).to_string(),
            ]);
            years.push(year.to_string());
            exports.push(round2(export));
            imports.push(round2(import));
        }

        let destinations = sample(rng, COUNTRIES, 3);
        let sources = sample(rng, COUNTRIES, 3);
        let hs_code = format!("30{:02}.{}", rng.random_range(10..50), rng.random_range(10..100));
        let yoy = rng.random_range(-5.0..25.0);

        out.tables.push(table(
            format!("Trade Data: {}", product),
            &["Year", "Exports (USD M)", "Imports (USD M)", "Trade Balance", "Volume (MT)"],
            rows,
        ));

        let mut trend = chart(
            ChartType::Bar,
            format!("Trade Volume Trend: {}", product),
            Some(("Year", "Value (USD Millions)")),
            years,
            "Exports",
            exports,
        );
        trend.series.push(ChartSeries {
            name: "Imports".to_string(),
            values: imports,
        });
        out.charts.push(trend);

        out.summary = format!(
            "## Trade Analysis: {product}\n\n\
             **HS Code:** {hs_code}\n\
             **YoY Export Growth:** {yoy:.1}%\n\n\
             **Top Export Destinations:** {}\n\
             **Top Import Sources:** {}",
            destinations.join(", "),
            sources.join(", "),
        );
        out.data = json!({ "product": product, "hs_code": hs_code, "yoy_export_growth": round2(yoy) });
    }

    fn sourcing(rng: &mut StdRng, api: &str, out: &mut WorkerOutput) {
        let count = rng.random_range(3..=6);
        let countries = sample(rng, COUNTRIES, count);
        let split = shares(rng, countries.len());
        let risk: u8 = rng.random_range(1..=10);
        let production: u32 = rng.random_range(500..20_000);

        out.tables.push(table(
            format!("API Sourcing Breakdown: {}", api),
            &["Country", "Share (%)", "Key Manufacturers", "Avg Price (USD/kg)"],
            countries
                .iter()
                .zip(&split)
                .map(|(country, share)| {
                    vec![
                        country.to_string(),
                        format!("{:.1}", share),
                        rng.random_range(1..9).to_string(),
                        format!("{:.2}", rng.random_range(50.0..5_000.0)),
                    ]
                })
                .collect(),
        ));
        out.charts.push(chart(
            ChartType::Pie,
            format!("API Sourcing Distribution: {}", api),
            None,
            countries.iter().map(|c| c.to_string()).collect(),
            "Share",
            split,
        ));

        let level = match risk {
            0..=3 => "Low",
            4..=6 => "Medium",
            _ => "High",
        };
        let advice = if risk > 5 {
            "Diversify sourcing to reduce dependency"
        } else {
            "Current sourcing strategy is acceptable"
        };
        let secondary = countries.get(1).copied().unwrap_or("an alternative region");

        out.summary = format!(
            "## API Sourcing Analysis: {api}\n\n\
             **Global Production:** {production} MT\n\
             **Supply Risk Score:** {risk}/10 ({level})\n\n\
             **Sourcing Recommendations:**\n\
             - {advice}\n\
             - Consider {secondary} as secondary source"
        );
        out.data = json!({ "api_name": api, "supply_risk_score": risk, "global_production_mt": production });
    }
}

#[async_trait]
impl Worker for EximTrendsWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::EximTrends
    }

    async fn execute(&self, instruction: &str, params: &TaskParameters) -> Result<WorkerOutput> {
        let mut rng = seeded_rng(instruction);
        let product = entity_or(params.primary_entity.as_deref(), &mut rng, DRUG_NAMES);
        let query = params.query.to_lowercase();

        let mut out = WorkerOutput {
            references: vec![
                "UN Comtrade Database".to_string(),
                "National Trade Statistics".to_string(),
            ],
            ..Default::default()
        };

        if ["sourcing", "api", "supply", "dependency"]
            .iter()
            .any(|t| query.contains(t))
        {
            Self::sourcing(&mut rng, &product, &mut out);
        } else {
            Self::trade(&mut rng, &product, &mut out);
        }

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trade_branch_has_two_series() {
        let params = TaskParameters {
            query: "export trends for Aspirin".to_string(),
            primary_entity: Some("Aspirin".to_string()),
            ..Default::default()
        };
        let out = EximTrendsWorker.execute("trade", &params).await.unwrap();

        assert!(out.summary.contains("Trade Analysis: Aspirin"));
        assert_eq!(out.charts[0].series.len(), 2);
        assert_eq!(out.tables[0].rows.len(), 5);
        assert!(out.references.contains(&"UN Comtrade Database".to_string()));
    }

    #[tokio::test]
    async fn test_sourcing_branch() {
        let params = TaskParameters {
            query: "API supply chain risk".to_string(),
            ..Default::default()
        };
        let out = EximTrendsWorker.execute("sourcing", &params).await.unwrap();
        assert!(out.summary.contains("Supply Risk Score"));
        assert_eq!(out.charts[0].chart_type, ChartType::Pie);
    }
}
