//! Reference vocabularies and helpers shared by the synthetic workers.

use crate::types::{Chart, ChartSeries, ChartType, DataTable};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub const DRUG_NAMES: &[&str] = &[
    "Remdesivir",
    "Metformin",
    "Aspirin",
    "Lisinopril",
    "Atorvastatin",
    "Omeprazole",
    "Amlodipine",
    "Gabapentin",
    "Sertraline",
    "Losartan",
    "Sildenafil",
    "Tadalafil",
    "Duloxetine",
    "Pregabalin",
    "Celecoxib",
    "Rituximab",
    "Pembrolizumab",
    "Nivolumab",
    "Adalimumab",
    "Infliximab",
];

pub const THERAPY_AREAS: &[&str] = &[
    "Oncology",
    "Cardiology",
    "Neurology",
    "Immunology",
    "Infectious Diseases",
    "Metabolic Disorders",
    "Respiratory",
    "Dermatology",
    "Ophthalmology",
    "Rare Diseases",
];

pub const COMPANIES: &[&str] = &[
    "Pfizer",
    "Johnson & Johnson",
    "Roche",
    "Novartis",
    "Merck",
    "AbbVie",
    "Bristol-Myers Squibb",
    "AstraZeneca",
    "GSK",
    "Sanofi",
    "Eli Lilly",
    "Gilead Sciences",
    "Amgen",
    "Novo Nordisk",
    "Bayer",
];

pub const COUNTRIES: &[&str] = &[
    "USA",
    "Germany",
    "China",
    "India",
    "Japan",
    "UK",
    "France",
    "Switzerland",
    "Canada",
    "South Korea",
    "Brazil",
    "Australia",
];

/// RNG keyed on the instruction, so the same instruction always yields the same data.
pub fn seeded_rng(instruction: &str) -> StdRng {
    let mut hasher = DefaultHasher::new();
    instruction.hash(&mut hasher);
    StdRng::seed_from_u64(hasher.finish())
}

pub fn pick<'a>(rng: &mut StdRng, items: &[&'a str]) -> &'a str {
    items.choose(rng).copied().unwrap_or_default()
}

pub fn sample<'a>(rng: &mut StdRng, items: &[&'a str], amount: usize) -> Vec<&'a str> {
    items.choose_multiple(rng, amount).copied().collect()
}

/// Caller-supplied entity, or a random stand-in from the vocabulary.
pub fn entity_or(value: Option<&str>, rng: &mut StdRng, vocabulary: &[&str]) -> String {
    match value {
        Some(v) => v.to_string(),
        None => pick(rng, vocabulary).to_string(),
    }
}

pub fn table(title: impl Into<String>, headers: &[&str], rows: Vec<Vec<String>>) -> DataTable {
    DataTable {
        title: title.into(),
        headers: headers.iter().map(|h| h.to_string()).collect(),
        rows,
    }
}

pub fn chart(
    chart_type: ChartType,
    title: impl Into<String>,
    axes: Option<(&str, &str)>,
    labels: Vec<String>,
    series_name: &str,
    values: Vec<f64>,
) -> Chart {
    Chart {
        chart_type,
        title: title.into(),
        x_label: axes.map(|(x, _)| x.to_string()),
        y_label: axes.map(|(_, y)| y.to_string()),
        labels,
        series: vec![ChartSeries {
            name: series_name.to_string(),
            values,
        }],
    }
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Splits 100% across `count` holders, largest first.
pub fn shares(rng: &mut StdRng, count: usize) -> Vec<f64> {
    use rand::Rng;

    if count == 0 {
        return Vec::new();
    }
    let weights: Vec<f64> = (0..count).map(|_| rng.random_range(1.0..10.0)).collect();
    let total: f64 = weights.iter().sum();
    let mut shares: Vec<f64> = weights
        .iter()
        .map(|w| (w / total * 1000.0).round() / 10.0)
        .collect();
    shares.sort_by(|a, b| b.total_cmp(a));
    shares
}
