//! Evaluation driver
//!
//! For every entity: extract the reference vector from the abstract's links,
//! encode with all six strategies, score each candidate against the
//! reference, and add the scores to the running totals.
//!
//! An entity either contributes to all twelve accumulator slots or to none.
//! Every candidate is built and checked before anything is accumulated.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use thiserror::Error;

use super::metrics::{cosine_similarity, euclidean_distance, has_nan, mean_rows, normalize};
use crate::config::{EvalConfig, FailurePolicy, StrategyPolicies};
use crate::corpus::{link_targets, Entity};
use crate::embedders::{random_vector, EncodeError, EncodingContext, StrategyKind, STRATEGY_COUNT};

/// Why an entity contributed nothing to the accumulators
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("abstract has no resource/ links")]
    NoLinks,

    #[error("link marker {position} is not followed by a token")]
    MalformedLink { position: usize },

    #[error("reference lookup failed: {0}")]
    Reference(EncodeError),

    #[error("reference vector contains NaN")]
    ReferenceNotANumber,

    #[error("reference vector has {actual} dimensions, expected {expected}")]
    ReferenceDimensions { expected: usize, actual: usize },

    #[error("{strategy:?} encoder failed: {error}")]
    EncoderFailed {
        strategy: StrategyKind,
        error: EncodeError,
    },

    #[error("{strategy:?} vector has {actual} dimensions, expected {expected}")]
    WrongDimensions {
        strategy: StrategyKind,
        expected: usize,
        actual: usize,
    },

    #[error("{0:?} vector contains NaN")]
    NotANumber(StrategyKind),

    #[error("{0:?} vector has zero magnitude")]
    ZeroMagnitude(StrategyKind),

    #[error("{0:?} score is not finite")]
    NonFiniteScore(StrategyKind),
}

impl SkipReason {
    /// Stable key for the skip histogram
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NoLinks => "no_links",
            Self::MalformedLink { .. } => "malformed_link",
            Self::Reference(EncodeError::UnknownWord(_)) => "reference_unknown_word",
            Self::Reference(_) => "reference_lookup",
            Self::ReferenceNotANumber => "reference_nan",
            Self::ReferenceDimensions { .. } => "reference_dimensions",
            Self::EncoderFailed { error, .. } => match error {
                EncodeError::UnknownWord(_) => "encoder_unknown_word",
                EncodeError::EmptySequence => "encoder_empty_sequence",
                EncodeError::MissingEntry(_) => "encoder_missing_entry",
                EncodeError::EncoderRuntimeFault(_) => "encoder_runtime_fault",
                EncodeError::DimensionMismatch { .. } => "encoder_dimension_mismatch",
            },
            Self::WrongDimensions { .. } => "wrong_dimensions",
            Self::NotANumber(_) => "candidate_nan",
            Self::ZeroMagnitude(_) => "zero_magnitude",
            Self::NonFiniteScore(_) => "non_finite_score",
        }
    }
}

/// Distance and similarity of one candidate against the reference
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StrategyScore {
    pub distance: f64,
    pub similarity: f64,
}

/// All six scores for one entity, in `StrategyKind::ALL` order
#[derive(Debug, Clone, PartialEq)]
pub struct EntityScores {
    pub scores: [StrategyScore; STRATEGY_COUNT],
    /// Strategies whose failure was replaced by a random vector
    pub substituted: Vec<StrategyKind>,
}

impl EntityScores {
    pub fn get(&self, kind: StrategyKind) -> StrategyScore {
        self.scores[kind.index()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityOutcome {
    Scored(EntityScores),
    Skipped(SkipReason),
}

/// Running sums across scored entities, one slot per strategy
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Accumulators {
    pub distance: [f64; STRATEGY_COUNT],
    pub similarity: [f64; STRATEGY_COUNT],
}

impl Accumulators {
    pub fn add(&mut self, scores: &EntityScores) {
        for (i, score) in scores.scores.iter().enumerate() {
            self.distance[i] += score.distance;
            self.similarity[i] += score.similarity;
        }
    }

    pub fn is_zero(&self) -> bool {
        self.distance.iter().chain(self.similarity.iter()).all(|&v| v == 0.0)
    }
}

/// Per-entity score samples kept for the statistics table
#[derive(Debug, Clone, Default)]
pub struct ScoreSamples {
    pub distance: [Vec<f64>; STRATEGY_COUNT],
    pub similarity: [Vec<f64>; STRATEGY_COUNT],
}

impl ScoreSamples {
    fn push(&mut self, scores: &EntityScores) {
        for (i, score) in scores.scores.iter().enumerate() {
            self.distance[i].push(score.distance);
            self.similarity[i].push(score.similarity);
        }
    }
}

/// Progress snapshot passed to the caller after each scored entity
#[derive(Debug, Clone, Copy)]
pub struct Progress {
    pub scored: usize,
    pub skipped: usize,
    pub total: usize,
}

impl Progress {
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.scored + self.skipped) as f64 / self.total as f64 * 100.0
    }
}

/// Outcome of a full run
#[derive(Debug, Clone)]
pub struct EvaluationResult {
    pub accumulators: Accumulators,
    pub samples: ScoreSamples,
    /// Entities in the corpus
    pub corpus_size: usize,
    /// Entities visited (corpus size capped by the entity limit)
    pub visited: usize,
    pub scored: usize,
    pub skipped: usize,
    pub skip_reasons: BTreeMap<&'static str, usize>,
    /// Random substitutions per strategy slot
    pub substitutions: [usize; STRATEGY_COUNT],
    pub duration: Duration,
}

/// Scores every entity of the corpus held by an `EncodingContext`
pub struct Evaluator<'a> {
    ctx: EncodingContext<'a>,
    policies: StrategyPolicies,
    rng: ChaCha8Rng,
    limit: usize,
}

impl<'a> Evaluator<'a> {
    /// Seeded from `config.seed`, or from entropy when unset
    pub fn new(ctx: EncodingContext<'a>, config: &EvalConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        Self {
            ctx,
            policies: config.policies,
            rng,
            limit: config.entity_limit(),
        }
    }

    pub fn with_policies(mut self, policies: StrategyPolicies) -> Self {
        self.policies = policies;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Mean of the vectors of every linked entity in the abstract
    pub fn reference_vector(&self, abstract_text: &str) -> Result<Vec<f32>, SkipReason> {
        let targets = link_targets(abstract_text)
            .map_err(|m| SkipReason::MalformedLink { position: m.position })?;

        let rows = self
            .ctx
            .vectors
            .lookup_all(&targets)
            .map_err(SkipReason::Reference)?;

        let reference = mean_rows(&rows).ok_or(SkipReason::NoLinks)?;
        if has_nan(&reference) {
            return Err(SkipReason::ReferenceNotANumber);
        }
        if reference.len() != self.ctx.dimensions() {
            return Err(SkipReason::ReferenceDimensions {
                expected: self.ctx.dimensions(),
                actual: reference.len(),
            });
        }
        Ok(reference)
    }

    /// Candidate vector for one strategy, after its failure policy and checks
    fn candidate(
        &mut self,
        kind: StrategyKind,
        entity: &Entity,
        substituted: &mut Vec<StrategyKind>,
    ) -> Result<Vec<f32>, SkipReason> {
        let dims = self.ctx.dimensions();

        let raw = match kind.encode(&self.ctx, entity, &mut self.rng) {
            Ok(v) => v,
            Err(error) => match self.policies.policy_for(kind) {
                FailurePolicy::SkipOnFailure => {
                    return Err(SkipReason::EncoderFailed { strategy: kind, error })
                }
                FailurePolicy::SubstituteRandomOnFailure => {
                    tracing::trace!("Substituting random {} vector for {}: {}", kind.name(), entity.label, error);
                    substituted.push(kind);
                    random_vector(dims, &mut self.rng)
                }
            },
        };

        if raw.len() != dims {
            return Err(SkipReason::WrongDimensions {
                strategy: kind,
                expected: dims,
                actual: raw.len(),
            });
        }
        if has_nan(&raw) {
            return Err(SkipReason::NotANumber(kind));
        }
        if kind.normalizes_output() {
            normalize(&raw).ok_or(SkipReason::ZeroMagnitude(kind))
        } else {
            Ok(raw)
        }
    }

    /// Score one entity without touching any accumulator
    pub fn evaluate_entity(&mut self, entity: &Entity) -> EntityOutcome {
        match self.score_entity(entity) {
            Ok(scores) => EntityOutcome::Scored(scores),
            Err(reason) => EntityOutcome::Skipped(reason),
        }
    }

    fn score_entity(&mut self, entity: &Entity) -> Result<EntityScores, SkipReason> {
        let reference = self.reference_vector(&entity.abstract_text)?;

        let mut substituted = Vec::new();
        let mut scores = [StrategyScore::default(); STRATEGY_COUNT];

        for kind in StrategyKind::ALL {
            let candidate = self.candidate(kind, entity, &mut substituted)?;

            let distance = euclidean_distance(&reference, &candidate) as f64;
            let similarity = cosine_similarity(&reference, &candidate) as f64;
            if !distance.is_finite() || !similarity.is_finite() {
                return Err(SkipReason::NonFiniteScore(kind));
            }
            scores[kind.index()] = StrategyScore { distance, similarity };
        }

        Ok(EntityScores { scores, substituted })
    }

    /// Evaluate the corpus, calling `on_progress` after every scored entity
    pub fn run<F>(&mut self, mut on_progress: F) -> EvaluationResult
    where
        F: FnMut(&Progress),
    {
        let start = Instant::now();
        let corpus = self.ctx.corpus;
        let total = corpus.len().min(self.limit);

        tracing::info!("Running evaluation for {} samples", total);

        let mut accumulators = Accumulators::default();
        let mut samples = ScoreSamples::default();
        let mut skip_reasons: BTreeMap<&'static str, usize> = BTreeMap::new();
        let mut substitutions = [0usize; STRATEGY_COUNT];
        let mut scored = 0;
        let mut skipped = 0;

        for entity in corpus.iter().take(total) {
            match self.evaluate_entity(entity) {
                EntityOutcome::Scored(scores) => {
                    accumulators.add(&scores);
                    samples.push(&scores);
                    for kind in &scores.substituted {
                        substitutions[kind.index()] += 1;
                    }
                    scored += 1;
                    on_progress(&Progress { scored, skipped, total });
                }
                EntityOutcome::Skipped(reason) => {
                    tracing::debug!("Skipping {}: {}", entity.label, reason);
                    *skip_reasons.entry(reason.kind()).or_insert(0) += 1;
                    skipped += 1;
                }
            }
        }

        EvaluationResult {
            accumulators,
            samples,
            corpus_size: corpus.len(),
            visited: total,
            scored,
            skipped,
            skip_reasons,
            substitutions,
            duration: start.elapsed(),
        }
    }
}
