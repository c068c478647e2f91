//! Clinical trials worker: trial registry search and competitor pipelines.

use crate::agents::data::{chart, entity_or, pick, sample, seeded_rng, table, COMPANIES, DRUG_NAMES, THERAPY_AREAS};
use crate::agents::Worker;
use crate::types::{ChartType, Result, TaskParameters, WorkerKind, WorkerOutput};
use async_trait::async_trait;
use rand::rngs::StdRng;
use rand::Rng;
use serde_json::json;

const PHASES: &[&str] = &["Phase 1", "Phase 1/2", "Phase 2", "Phase 2/3", "Phase 3", "Phase 4"];
const STATUSES: &[&str] = &[
    "Recruiting",
    "Active, not recruiting",
    "Completed",
    "Enrolling by invitation",
    "Not yet recruiting",
];

/// Rows shown in the trial table
const MAX_TRIAL_ROWS: usize = 10;

pub struct ClinicalTrialsWorker;

impl ClinicalTrialsWorker {
    fn trials(rng: &mut StdRng, drug: &str, indication: &str, out: &mut WorkerOutput) {
        let count = rng.random_range(5..=15);
        let trials: Vec<[String; 6]> = (0..count)
            .map(|_| {
                [
                    format!("NCT{}", rng.random_range(10_000_000..100_000_000)),
                    pick(rng, PHASES).to_string(),
                    pick(rng, STATUSES).to_string(),
                    pick(rng, COMPANIES).to_string(),
                    rng.random_range(20..=2000).to_string(),
                    format!(
                        "{}-{:02}-01",
                        rng.random_range(2020..2025),
                        rng.random_range(1..=12)
                    ),
                ]
            })
            .collect();

        let phase_counts: Vec<(&str, usize)> = PHASES
            .iter()
            .map(|phase| (*phase, trials.iter().filter(|t| t[1] == *phase).count()))
            .filter(|(_, n)| *n > 0)
            .collect();
        let active = trials
            .iter()
            .filter(|t| t[2] == "Recruiting" || t[2] == "Active, not recruiting")
            .count();
        let enrollment: u32 = trials.iter().filter_map(|t| t[4].parse::<u32>().ok()).sum();

        let mut sponsors: Vec<&str> = Vec::new();
        for t in &trials {
            if !sponsors.contains(&t[3].as_str()) {
                sponsors.push(&t[3]);
            }
        }
        let phase3 = phase_counts
            .iter()
            .find(|(p, _)| *p == "Phase 3")
            .map(|(_, n)| *n)
            .unwrap_or(0);

        out.tables.push(table(
            format!("Clinical Trials: {}", drug),
            &["NCT ID", "Phase", "Status", "Sponsor", "Enrollment", "Start Date"],
            trials
                .iter()
                .take(MAX_TRIAL_ROWS)
                .map(|t| t.to_vec())
                .collect(),
        ));
        out.charts.push(chart(
            ChartType::Bar,
            format!("Phase Distribution: {}", drug),
            Some(("Phase", "Number of Trials")),
            phase_counts.iter().map(|(p, _)| p.to_string()).collect(),
            "Trials",
            phase_counts.iter().map(|(_, n)| *n as f64).collect(),
        ));

        let phases = phase_counts
            .iter()
            .map(|(p, n)| format!("- {}: {} trials", p, n))
            .collect::<Vec<_>>()
            .join("\n");

        out.summary = format!(
            "## Clinical Trials Analysis: {drug}\n\n\
             **Total Trials:** {count}\n\
             **Active Trials:** {active}\n\
             **Total Enrollment:** {enrollment} patients\n\
             **Indication:** {indication}\n\n\
             **Phase Distribution:**\n{phases}\n\n\
             **Top Sponsors:** {}\n\n\
             **Development Status:** {}",
            sponsors.iter().take(3).copied().collect::<Vec<_>>().join(", "),
            if phase3 > 2 {
                "Strong late-stage pipeline"
            } else {
                "Early development stage"
            },
        );
        out.data = json!({
            "drug_name": drug,
            "indication": indication,
            "total_trials": count,
            "active_trials": active,
            "total_enrollment": enrollment,
        });
    }

    fn pipeline(rng: &mut StdRng, therapy: &str, out: &mut WorkerOutput) {
        let companies = sample(rng, COMPANIES, 5);
        let rows: Vec<Vec<String>> = companies
            .iter()
            .map(|company| {
                vec![
                    company.to_string(),
                    pick(rng, PHASES).to_string(),
                    rng.random_range(1..=6).to_string(),
                    format!("{} {}", therapy, pick(rng, &["Disease", "Disorder", "Syndrome"])),
                ]
            })
            .collect();
        let candidates: Vec<f64> = rows
            .iter()
            .filter_map(|r| r[2].parse::<f64>().ok())
            .collect();

        out.tables.push(table(
            format!("Competitor Pipeline: {}", therapy),
            &["Company", "Lead Phase", "Drug Candidates", "Lead Indication"],
            rows,
        ));
        out.charts.push(chart(
            ChartType::Bar,
            format!("Pipeline by Company: {}", therapy),
            Some(("Company", "Drug Candidates")),
            companies.iter().map(|c| c.to_string()).collect(),
            "Candidates",
            candidates.clone(),
        ));
        out.summary = format!(
            "## Competitor Pipeline: {therapy}\n\n\
             **Companies Tracked:** {}\n\
             **Total Candidates:** {}",
            companies.len(),
            candidates.iter().sum::<f64>(),
        );
        out.data = json!({ "therapy_area": therapy, "companies": companies });
    }
}

#[async_trait]
impl Worker for ClinicalTrialsWorker {
    fn kind(&self) -> WorkerKind {
        WorkerKind::ClinicalTrials
    }

    async fn execute(&self, instruction: &str, params: &TaskParameters) -> Result<WorkerOutput> {
        let mut rng = seeded_rng(instruction);
        let query = params.query.to_lowercase();
        let therapy = entity_or(params.secondary_entity.as_deref(), &mut rng, THERAPY_AREAS);

        let mut out = WorkerOutput {
            references: vec![
                "ClinicalTrials.gov".to_string(),
                "WHO ICTRP".to_string(),
                "EU Clinical Trials Register".to_string(),
            ],
            ..Default::default()
        };

        let pipeline = ["pipeline", "competitor", "landscape"]
            .iter()
            .any(|t| query.contains(t));
        if pipeline && params.primary_entity.is_none() {
            Self::pipeline(&mut rng, &therapy, &mut out);
        } else {
            let drug = entity_or(params.primary_entity.as_deref(), &mut rng, DRUG_NAMES);
            Self::trials(&mut rng, &drug, &therapy, &mut out);
        }

        Ok(out)
    }
}
