//! Research Orchestration Core
//!
//! The four stages a query passes through before the workflow engine formats
//! the final answer:
//!
//! - [`analyzer::QueryAnalyzer`] - recognizes intents and entities in free text
//! - [`planner::TaskPlanner`] - turns an analysis into an ordered task list
//! - [`dispatcher::WorkerDispatcher`] - runs tasks against the worker registry
//! - [`synthesizer::ResponseSynthesizer`] - merges worker output into one answer
//!
//! # Usage
//!
//! ```ignore
//! use repurpose::research::{QueryAnalyzer, TaskPlanner, Vocabulary};
//!
//! let analyzer = QueryAnalyzer::new(Vocabulary::builtin())?;
//! let analysis = analyzer.analyze("Patent expiry for Celecoxib in Oncology");
//! let tasks = TaskPlanner::default().plan(&analysis);
//! ```
//!
//! Every stage is read-only after construction and shared across concurrent runs.

/// Intent and entity extraction.
pub mod analyzer;
/// Worker dispatch with timeouts and failure isolation.
pub mod dispatcher;
/// Task planning and prioritization.
pub mod planner;
/// Result synthesis and rendering.
pub mod synthesizer;

pub use analyzer::{QueryAnalyzer, Vocabulary};
pub use dispatcher::{DispatchConfig, DispatchOutcome, WorkerDispatcher};
pub use planner::TaskPlanner;
pub use synthesizer::ResponseSynthesizer;
