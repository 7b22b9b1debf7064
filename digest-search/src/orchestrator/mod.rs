//! Orchestrator: bounded fan-out, dedup, ranking, report assembly.
//!
//! [`pool`] runs one task per source with a per-task timeout,
//! [`dedup`] drops repeated URLs keeping the first, [`ranking`] applies
//! the pipeline's comparator, and [`report`] assembles the output.
//! [`pipeline`] wires them together for each source family.

pub mod dedup;
pub mod pipeline;
pub mod pool;
pub mod ranking;
pub mod report;

pub use pipeline::{run_feeds, run_issues, run_pipeline, run_search};
pub use pool::WorkerPool;
pub use ranking::Ranking;
pub use report::{assemble, AggregateReport, SourceSummary};
