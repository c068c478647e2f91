//! Workflow Controller
//!
//! Sequences analysis, planning, dispatch, synthesis and the optional report
//! step for each query. Stage tuning lives in `repurpose.toml`:
//!
//! ```toml
//! [workflow]
//! parallel_workers = true
//! max_concurrency = 4
//! worker_timeout_secs = 30
//! summary_timeout_secs = 20
//! ```
//!
//! # Usage
//!
//! ```ignore
//! let engine = WorkflowEngine::from_config(&config, registry, None)?;
//! let output = engine.run(Query::new("Patent expiry for Sildenafil")).await;
//! println!("{} ({})", output.response, output.status);
//! ```

pub mod engine;
pub mod state;

pub use engine::WorkflowEngine;
pub use state::{RunStatus, WorkflowEvent, WorkflowOutput, WorkflowRun};
