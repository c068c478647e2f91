//! Intent and entity extraction
//!
//! Pure pattern matching over the query text. No I/O, and the same query
//! against the same vocabulary always yields the same [`Analysis`].

use crate::agents::data::{DRUG_NAMES, THERAPY_AREAS};
use crate::types::{AppError, Analysis, Intent, Result};
use crate::utils::toml_config::VocabularyConfig;
use regex::Regex;

/// Intent signatures, checked in table order. Matching is case-insensitive.
const INTENT_PATTERNS: &[(Intent, &[&str])] = &[
    (
        Intent::MarketAnalysis,
        &[
            r"market\s*(size|share|analysis|trend)",
            r"\bmarket\b",
            r"sales\s*(data|trend|volume)",
            r"iqvia",
            r"commercial\s*(opportunity|potential)",
        ],
    ),
    (
        Intent::TradeAnalysis,
        &[
            r"export|import|exim|trade",
            r"sourcing|supply\s*chain",
            r"api\s*(source|supply)",
        ],
    ),
    (
        Intent::PatentAnalysis,
        &[
            r"patent|ip\s*(analysis|landscape)",
            r"fto|freedom\s*to\s*operate",
            r"expir(y|ation)|generic\s*entry",
        ],
    ),
    (
        Intent::ClinicalTrials,
        &[
            r"clinical\s*trial|study|phase\s*[1-4]",
            r"pipeline|development\s*stage",
            r"enrollment|endpoint",
        ],
    ),
    (
        Intent::InternalKnowledge,
        &[
            r"internal|strategy\s*(document|deck)",
            r"field\s*insight|kol\s*feedback",
            r"competitive\s*intelligence",
        ],
    ),
    (
        Intent::WebIntelligence,
        &[
            r"guideline|publication|news",
            r"regulatory|fda|ema",
            r"latest|recent\s*update",
        ],
    ),
    (
        Intent::ReportGeneration,
        &[
            r"generate\s*report|create\s*pdf",
            r"export|download|summary\s*report",
        ],
    ),
];

/// Substrings that request a stored report on their own
const REPORT_KEYWORDS: &[&str] = &["report", "pdf", "document", "summary", "export", "download"];

/// Known entity names. Earlier entries win when several match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vocabulary {
    /// Drug-like names
    pub primary: Vec<String>,
    /// Therapy-area-like names
    pub secondary: Vec<String>,
}

impl Vocabulary {
    pub fn builtin() -> Self {
        Self {
            primary: DRUG_NAMES.iter().map(|s| s.to_string()).collect(),
            secondary: THERAPY_AREAS.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Built-in names followed by configured extras, without case-insensitive duplicates
    pub fn from_config(config: &VocabularyConfig) -> Self {
        let mut vocabulary = Self::builtin();
        extend_unique(&mut vocabulary.primary, &config.primary_entities);
        extend_unique(&mut vocabulary.secondary, &config.secondary_entities);
        vocabulary
    }
}

fn extend_unique(names: &mut Vec<String>, extra: &[String]) {
    for name in extra {
        let name = name.trim();
        if !names.iter().any(|n| n.eq_ignore_ascii_case(name)) {
            names.push(name.to_string());
        }
    }
}

#[derive(Debug)]
struct EntityPattern {
    name: String,
    regex: Regex,
}

impl EntityPattern {
    fn new(name: &str) -> Result<Self> {
        // Whole word, any surrounding punctuation, flexible inner whitespace
        let body = regex::escape(name).replace(' ', r"\s+");
        let regex = Regex::new(&format!(r"(?i)(?:^|\W){}(?:\W|$)", body))
            .map_err(|e| AppError::Configuration(format!("Bad entity '{}': {}", name, e)))?;
        Ok(Self {
            name: name.to_string(),
            regex,
        })
    }
}

/// Recognizes intents, entities and report need in a query
#[derive(Debug)]
pub struct QueryAnalyzer {
    intent_rules: Vec<(Intent, Vec<Regex>)>,
    primary: Vec<EntityPattern>,
    secondary: Vec<EntityPattern>,
}

impl QueryAnalyzer {
    pub fn new(vocabulary: Vocabulary) -> Result<Self> {
        let intent_rules = INTENT_PATTERNS
            .iter()
            .map(|(intent, patterns)| {
                let compiled = patterns
                    .iter()
                    .map(|p| {
                        Regex::new(&format!("(?i){}", p)).map_err(|e| {
                            AppError::Configuration(format!("Bad intent pattern '{}': {}", p, e))
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((*intent, compiled))
            })
            .collect::<Result<Vec<_>>>()?;

        let compile = |names: &[String]| -> Result<Vec<EntityPattern>> {
            names.iter().map(|n| EntityPattern::new(n)).collect()
        };

        Ok(Self {
            intent_rules,
            primary: compile(&vocabulary.primary)?,
            secondary: compile(&vocabulary.secondary)?,
        })
    }

    pub fn analyze(&self, query: &str) -> Analysis {
        let lower = query.to_lowercase();

        let mut intents: Vec<Intent> = self
            .intent_rules
            .iter()
            .filter(|(_, rules)| rules.iter().any(|r| r.is_match(&lower)))
            .map(|(intent, _)| *intent)
            .collect();

        // A bare report request still needs data to report on
        if !intents.iter().any(|i| *i != Intent::ReportGeneration) {
            for intent in Intent::DEFAULTS {
                if !intents.contains(&intent) {
                    intents.push(intent);
                }
            }
        }

        let needs_report = intents.contains(&Intent::ReportGeneration)
            || REPORT_KEYWORDS.iter().any(|k| lower.contains(k));

        Analysis {
            query: query.to_string(),
            intents,
            primary_entity: first_match(&self.primary, query),
            secondary_entity: first_match(&self.secondary, query),
            needs_report,
        }
    }
}

fn first_match(patterns: &[EntityPattern], query: &str) -> Option<String> {
    patterns
        .iter()
        .find(|p| p.regex.is_match(query))
        .map(|p| p.name.clone())
}
