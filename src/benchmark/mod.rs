//! Evaluation infrastructure
//!
//! Scores the six encoding strategies against link-derived reference vectors.
//!
//! ## Usage
//!
//! ```bash
//! entity-embedding-eval ./data/abstracts.json --seed 42
//! ```
//!
//! ## Modules
//!
//! - `metrics` - distance, cosine similarity, normalization, bootstrap CI
//! - `evaluate` - per-entity scoring and the accumulation loop
//! - `report` - the fixed summary tables and run statistics

pub mod evaluate;
pub mod metrics;
pub mod report;


pub use evaluate::{
    Accumulators, EntityOutcome, EntityScores, EvaluationResult, Evaluator, Progress,
    ScoreSamples, SkipReason, StrategyScore,
};
pub use metrics::{
    bootstrap_confidence_interval, cosine_similarity, euclidean_distance, l2_norm, normalize,
    ConfidenceInterval,
};
pub use report::{normalize_accumulator, print_summary, StrategyStats, Summary};
