//! Run summary
//!
//! The two fixed tables normalize each accumulator array by its own L2
//! magnitude. The statistics table reports raw per-entity scores instead.

use std::fmt::Write as _;

use super::evaluate::{EvaluationResult, ScoreSamples};
use super::metrics::{bootstrap_confidence_interval, mean, std_dev, ConfidenceInterval};
use crate::embedders::{StrategyKind, STRATEGY_COUNT};

const TABLE_RULE_WIDTH: usize = 40;
const BOOTSTRAP_ROUNDS: usize = 1000;
const CONFIDENCE_LEVEL: f64 = 0.95;

/// Divide by the L2 magnitude; an all-zero array stays all zero
pub fn normalize_accumulator(values: &[f64; STRATEGY_COUNT]) -> [f64; STRATEGY_COUNT] {
    let magnitude = values.iter().map(|v| v * v).sum::<f64>().sqrt();
    if magnitude == 0.0 || !magnitude.is_finite() {
        return [0.0; STRATEGY_COUNT];
    }
    values.map(|v| v / magnitude)
}

/// Normalized accumulators, in `StrategyKind::ALL` order
#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub distance: [f64; STRATEGY_COUNT],
    pub similarity: [f64; STRATEGY_COUNT],
}

impl Summary {
    pub fn from_result(result: &EvaluationResult) -> Self {
        Self {
            distance: normalize_accumulator(&result.accumulators.distance),
            similarity: normalize_accumulator(&result.accumulators.similarity),
        }
    }

    /// The distance table followed by the similarity table
    pub fn format_tables(&self) -> String {
        let mut out = String::new();
        write_table(&mut out, "Distance", &self.distance);
        write_table(&mut out, "Similarity", &self.similarity);
        out
    }
}

fn write_table(out: &mut String, title: &str, values: &[f64; STRATEGY_COUNT]) {
    let _ = writeln!(out, "\nINFO : {}", title);
    let _ = writeln!(out, "{}", "=".repeat(TABLE_RULE_WIDTH));
    for kind in StrategyKind::ALL {
        let label = kind.label();
        let pad = if label.len() < 16 { "\t\t" } else { "\t" };
        let _ = writeln!(out, "{}{}|\t{:.3}", label, pad, values[kind.index()]);
    }
}

/// Raw score statistics for one strategy
#[derive(Debug, Clone)]
pub struct StrategyStats {
    pub kind: StrategyKind,
    pub mean_distance: f64,
    pub std_distance: f64,
    pub mean_similarity: f64,
    pub std_similarity: f64,
    pub similarity_ci: ConfidenceInterval,
}

impl StrategyStats {
    pub fn from_samples(samples: &ScoreSamples) -> Vec<Self> {
        StrategyKind::ALL
            .iter()
            .map(|&kind| {
                let distance = &samples.distance[kind.index()];
                let similarity = &samples.similarity[kind.index()];
                Self {
                    kind,
                    mean_distance: mean(distance),
                    std_distance: std_dev(distance),
                    mean_similarity: mean(similarity),
                    std_similarity: std_dev(similarity),
                    similarity_ci: bootstrap_confidence_interval(similarity, CONFIDENCE_LEVEL, BOOTSTRAP_ROUNDS),
                }
            })
            .collect()
    }
}

pub fn format_statistics(stats: &[StrategyStats]) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n┌─ PER-ENTITY SCORES ──────────────────────────────────────────────────────┐");
    let _ = writeln!(
        out,
        "{:22} {:>18} {:>18} {:>20}",
        "Strategy", "Distance", "Similarity", "Similarity 95% CI"
    );
    let _ = writeln!(out, "{}", "─".repeat(81));
    for s in stats {
        let _ = writeln!(
            out,
            "{:22} {:>10.3} ±{:>6.3} {:>10.3} ±{:>6.3} [{:>7.3}, {:>7.3}]",
            s.kind.label(),
            s.mean_distance,
            s.std_distance,
            s.mean_similarity,
            s.std_similarity,
            s.similarity_ci.lower,
            s.similarity_ci.upper,
        );
    }
    out
}

/// Final accounting line plus skip and substitution breakdowns
pub fn format_accounting(result: &EvaluationResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\nEvaluated {} of {} entities ({} skipped)",
        result.scored, result.corpus_size, result.skipped
    );
    if result.visited < result.corpus_size {
        let _ = writeln!(out, "  Stopped after {} entities (max_entities)", result.visited);
    }
    for (reason, count) in &result.skip_reasons {
        let _ = writeln!(out, "  skipped {:>8}  {}", count, reason);
    }
    for kind in StrategyKind::ALL {
        let count = result.substitutions[kind.index()];
        if count > 0 {
            let _ = writeln!(out, "  ⚠ {} random substitutions for {}", count, kind.label());
        }
    }
    out
}

/// Print every section of the run summary to stdout
pub fn print_summary(result: &EvaluationResult) {
    print!("{}", Summary::from_result(result).format_tables());
    if result.scored > 0 {
        print!("{}", format_statistics(&StrategyStats::from_samples(&result.samples)));
    }
    print!("{}", format_accounting(result));
}
