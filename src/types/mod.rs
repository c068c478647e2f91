use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use utoipa::ToSchema;

// ============= Worker & Intent Types =============

/// The closed set of workers a plan may target.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum WorkerKind {
    IqviaInsights,
    EximTrends,
    PatentLandscape,
    ClinicalTrials,
    InternalKnowledge,
    WebIntelligence,
    ReportGenerator,
}

impl WorkerKind {
    /// Every worker, in declaration order.
    pub const ALL: [WorkerKind; 7] = [
        WorkerKind::IqviaInsights,
        WorkerKind::EximTrends,
        WorkerKind::PatentLandscape,
        WorkerKind::ClinicalTrials,
        WorkerKind::InternalKnowledge,
        WorkerKind::WebIntelligence,
        WorkerKind::ReportGenerator,
    ];

    /// Stable identifier used in config files, logs and the wire format.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerKind::IqviaInsights => "iqvia_insights",
            WorkerKind::EximTrends => "exim_trends",
            WorkerKind::PatentLandscape => "patent_landscape",
            WorkerKind::ClinicalTrials => "clinical_trials",
            WorkerKind::InternalKnowledge => "internal_knowledge",
            WorkerKind::WebIntelligence => "web_intelligence",
            WorkerKind::ReportGenerator => "report_generator",
        }
    }

    /// Human readable name, used as section title in synthesized output.
    pub fn display_name(&self) -> &'static str {
        match self {
            WorkerKind::IqviaInsights => "Iqvia Insights",
            WorkerKind::EximTrends => "Exim Trends",
            WorkerKind::PatentLandscape => "Patent Landscape",
            WorkerKind::ClinicalTrials => "Clinical Trials",
            WorkerKind::InternalKnowledge => "Internal Knowledge",
            WorkerKind::WebIntelligence => "Web Intelligence",
            WorkerKind::ReportGenerator => "Report Generator",
        }
    }

    pub fn is_report(&self) -> bool {
        matches!(self, WorkerKind::ReportGenerator)
    }

    pub fn description(&self) -> &'static str {
        match self {
            WorkerKind::IqviaInsights => {
                "Market size, sales trends, competitive share and commercial potential"
            }
            WorkerKind::EximTrends => "Export/import volumes, API sourcing and supply chain",
            WorkerKind::PatentLandscape => {
                "Patent status, expiry timelines, freedom-to-operate and generic entry"
            }
            WorkerKind::ClinicalTrials => "Active trials, development pipeline and endpoints",
            WorkerKind::InternalKnowledge => {
                "Internal strategy documents, field insights and KOL feedback"
            }
            WorkerKind::WebIntelligence => {
                "Guidelines, publications, regulatory news and recent updates"
            }
            WorkerKind::ReportGenerator => "Compiles all findings into a downloadable report",
        }
    }

    pub fn data_sources(&self) -> &'static [&'static str] {
        match self {
            WorkerKind::IqviaInsights => &["IQVIA MIDAS", "IQVIA National Sales Perspectives"],
            WorkerKind::EximTrends => &["UN Comtrade", "National customs records"],
            WorkerKind::PatentLandscape => &["USPTO", "EPO", "WIPO"],
            WorkerKind::ClinicalTrials => &["ClinicalTrials.gov", "WHO ICTRP"],
            WorkerKind::InternalKnowledge => &["Strategy repository", "Field medical insights"],
            WorkerKind::WebIntelligence => &["FDA", "EMA", "PubMed"],
            WorkerKind::ReportGenerator => &["Workflow results"],
        }
    }

    pub fn example_queries(&self) -> &'static [&'static str] {
        match self {
            WorkerKind::IqviaInsights => &["What is the market size for Metformin in Oncology?"],
            WorkerKind::EximTrends => &["Where is the API for Sildenafil sourced from?"],
            WorkerKind::PatentLandscape => &["When do the patents for Celecoxib expire?"],
            WorkerKind::ClinicalTrials => &["Which phase 2 trials are running for Aspirin?"],
            WorkerKind::InternalKnowledge => &["Summarize KOL feedback on Gabapentin"],
            WorkerKind::WebIntelligence => &["Latest FDA guidelines for Rare Diseases"],
            WorkerKind::ReportGenerator => &["Generate report on Metformin repurposing"],
        }
    }
}

impl fmt::Display for WorkerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        WorkerKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown worker '{}'", s)))
    }
}

/// Coarse category of requested analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    MarketAnalysis,
    TradeAnalysis,
    PatentAnalysis,
    ClinicalTrials,
    InternalKnowledge,
    WebIntelligence,
    ReportGeneration,
}

impl Intent {
    /// Intents used when nothing in the query matched.
    pub const DEFAULTS: [Intent; 3] = [
        Intent::MarketAnalysis,
        Intent::ClinicalTrials,
        Intent::PatentAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::MarketAnalysis => "market_analysis",
            Intent::TradeAnalysis => "trade_analysis",
            Intent::PatentAnalysis => "patent_analysis",
            Intent::ClinicalTrials => "clinical_trials",
            Intent::InternalKnowledge => "internal_knowledge",
            Intent::WebIntelligence => "web_intelligence",
            Intent::ReportGeneration => "report_generation",
        }
    }

    /// Fixed intent to worker table.
    pub fn worker(&self) -> WorkerKind {
        match self {
            Intent::MarketAnalysis => WorkerKind::IqviaInsights,
            Intent::TradeAnalysis => WorkerKind::EximTrends,
            Intent::PatentAnalysis => WorkerKind::PatentLandscape,
            Intent::ClinicalTrials => WorkerKind::ClinicalTrials,
            Intent::InternalKnowledge => WorkerKind::InternalKnowledge,
            Intent::WebIntelligence => WorkerKind::WebIntelligence,
            Intent::ReportGeneration => WorkerKind::ReportGenerator,
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============= Query & Analysis =============

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Caller supplied options for a single query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryOptions {
    pub output_format: OutputFormat,
    pub include_charts: bool,
    pub include_tables: bool,
    pub generate_report: bool,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            output_format: OutputFormat::Text,
            include_charts: true,
            include_tables: true,
            generate_report: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    pub text: String,
    pub options: QueryOptions,
}

impl Query {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            options: QueryOptions::default(),
        }
    }

    pub fn with_options(text: impl Into<String>, options: QueryOptions) -> Self {
        Self {
            text: text.into(),
            options,
        }
    }
}

/// What the extractor recognized in a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Analysis {
    pub query: String,
    /// Never empty. Discovery order, no duplicates.
    pub intents: Vec<Intent>,
    pub primary_entity: Option<String>,
    pub secondary_entity: Option<String>,
    pub needs_report: bool,
}

// ============= Tasks =============

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

/// Parameter bag handed to a worker alongside its instruction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TaskParameters {
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_entity: Option<String>,
    /// Report title, set only on the report task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Task {
    pub id: String,
    pub worker: WorkerKind,
    pub instruction: String,
    pub parameters: TaskParameters,
    /// Lower runs first.
    pub priority: u8,
    pub status: TaskStatus,
}

// ============= Worker Output =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DataTable {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    Bar,
    Line,
    Pie,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChartSeries {
    pub name: String,
    pub values: Vec<f64>,
}

/// Chart descriptor. Rendering is left to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Chart {
    pub chart_type: ChartType,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_label: Option<String>,
    pub labels: Vec<String>,
    pub series: Vec<ChartSeries>,
}

/// What a worker hands back on success.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkerOutput {
    pub summary: String,
    pub tables: Vec<DataTable>,
    pub charts: Vec<Chart>,
    pub references: Vec<String>,
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Completed,
    Failed,
}

/// Outcome of one task. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct WorkerResult {
    pub task_id: String,
    pub worker: WorkerKind,
    pub status: ResultStatus,
    pub summary: String,
    pub tables: Vec<DataTable>,
    pub charts: Vec<Chart>,
    pub references: Vec<String>,
    #[schema(value_type = Object)]
    pub data: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub duration_ms: u64,
}

impl WorkerResult {
    pub fn completed(task: &Task, output: WorkerOutput, duration_ms: u64) -> Self {
        Self {
            task_id: task.id.clone(),
            worker: task.worker,
            status: ResultStatus::Completed,
            summary: output.summary,
            tables: output.tables,
            charts: output.charts,
            references: output.references,
            data: output.data,
            error: None,
            duration_ms,
        }
    }

    pub fn failed(task: &Task, error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            task_id: task.id.clone(),
            worker: task.worker,
            status: ResultStatus::Failed,
            summary: String::new(),
            tables: Vec::new(),
            charts: Vec::new(),
            references: Vec::new(),
            data: serde_json::Value::Null,
            error: Some(error.into()),
            duration_ms,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.status == ResultStatus::Completed
    }
}

// ============= Synthesis =============

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Section {
    pub title: String,
    pub worker: WorkerKind,
    pub content: String,
}

/// Aggregate over every completed result of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SynthesizedResponse {
    pub executive_summary: String,
    pub sections: Vec<Section>,
    pub tables: Vec<DataTable>,
    pub charts: Vec<Chart>,
    pub references: Vec<String>,
}

// ============= API Request/Response Types =============

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub output_format: OutputFormat,
    #[serde(default = "default_true")]
    pub include_charts: bool,
    #[serde(default = "default_true")]
    pub include_tables: bool,
    #[serde(default)]
    pub generate_report: bool,
}

fn default_true() -> bool {
    true
}

impl QueryRequest {
    pub fn into_query(self) -> Query {
        Query::with_options(
            self.query,
            QueryOptions {
                output_format: self.output_format,
                include_charts: self.include_charts,
                include_tables: self.include_tables,
                generate_report: self.generate_report,
            },
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QueryResponse {
    pub success: bool,
    pub query: String,
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report_path: Option<String>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub execution_time_ms: u64,
    pub agent_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct WorkerInfo {
    pub id: WorkerKind,
    pub name: String,
    pub description: String,
    pub data_sources: Vec<String>,
    pub example_queries: Vec<String>,
}

impl From<WorkerKind> for WorkerInfo {
    fn from(kind: WorkerKind) -> Self {
        Self {
            id: kind,
            name: kind.display_name().to_string(),
            description: kind.description().to_string(),
            data_sources: kind.data_sources().iter().map(|s| s.to_string()).collect(),
            example_queries: kind.example_queries().iter().map(|s| s.to_string()).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Outcome of a configuration reload
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReloadResponse {
    pub status: String,
    pub timestamp: String,
}

// ============= Error Types =============

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Worker error: {0}")]
    Worker(String),

    #[error("LLM error: {0}")]
    LLM(String),

    #[error("Workflow error: {0}")]
    Workflow(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<crate::utils::toml_config::ConfigError> for AppError {
    fn from(err: crate::utils::toml_config::ConfigError) -> Self {
        AppError::Configuration(err.to_string())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        use axum::http::StatusCode;

        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({
            "error": self.to_string()
        });

        (status, axum::Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_worker_kind_round_trips_through_identifier() {
        for kind in WorkerKind::ALL {
            assert_eq!(kind.as_str().parse::<WorkerKind>().unwrap(), kind);
        }
        assert!("pricing_oracle".parse::<WorkerKind>().is_err());
    }

    #[test]
    fn test_worker_kind_serializes_as_snake_case() {
        let json = serde_json::to_string(&WorkerKind::IqviaInsights).unwrap();
        assert_eq!(json, "\"iqvia_insights\"");
    }

    #[test]
    fn test_every_intent_maps_to_a_known_worker() {
        assert_eq!(Intent::MarketAnalysis.worker(), WorkerKind::IqviaInsights);
        assert_eq!(Intent::TradeAnalysis.worker(), WorkerKind::EximTrends);
        assert!(Intent::ReportGeneration.worker().is_report());
    }

    #[test]
    fn test_every_worker_describes_itself() {
        for kind in WorkerKind::ALL {
            assert!(!kind.description().is_empty());
            assert!(!kind.data_sources().is_empty());
            assert!(!kind.example_queries().is_empty());
        }
    }

    #[test]
    fn test_query_request_defaults() {
        let req: QueryRequest = serde_json::from_str(r#"{"query": "Metformin"}"#).unwrap();
        let query = req.into_query();
        assert_eq!(query.options, QueryOptions::default());
    }

    #[test]
    fn test_failed_result_carries_error() {
        let task = Task {
            id: "task_1".to_string(),
            worker: WorkerKind::EximTrends,
            instruction: String::new(),
            parameters: TaskParameters::default(),
            priority: 2,
            status: TaskStatus::InProgress,
        };
        let result = WorkerResult::failed(&task, "boom", 3);
        assert!(!result.is_completed());
        assert_eq!(result.error.as_deref(), Some("boom"));
        assert_eq!(result.worker, WorkerKind::EximTrends);
    }
}
