//! Configuration for the evaluation harness
//!
//! Defines the eval.toml schema, failure policies and link handling.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::embedders::StrategyKind;

/// What the driver does when an encoding strategy fails for an entity
///
/// - `SkipOnFailure`: the entity is dropped from every accumulator
/// - `SubstituteRandomOnFailure`: a freshly sampled random vector stands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailurePolicy {
    #[serde(rename = "skip")]
    SkipOnFailure,
    #[serde(rename = "substitute_random")]
    SubstituteRandomOnFailure,
}

impl FailurePolicy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SkipOnFailure => "skip",
            Self::SubstituteRandomOnFailure => "substitute_random",
        }
    }
}

/// How description encoders treat `resource/<entity>` tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkHandling {
    /// Remove link tokens before lookup
    #[default]
    Drop,

    /// Look link tokens up verbatim (`resource/b` must be in the vocabulary)
    Literal,
}

impl LinkHandling {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Drop => "drop",
            Self::Literal => "literal",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Drop => "link tokens removed from descriptions",
            Self::Literal => "link tokens looked up verbatim",
        }
    }
}

/// Per-strategy failure policies for the learned encoders
///
/// Baselines never fail, so they have no entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrategyPolicies {
    #[serde(default = "default_skip")]
    pub mean: FailurePolicy,

    #[serde(default = "default_skip")]
    pub distance: FailurePolicy,

    #[serde(default = "default_skip")]
    pub title: FailurePolicy,

    #[serde(default = "default_substitute")]
    pub sequential: FailurePolicy,
}

impl Default for StrategyPolicies {
    fn default() -> Self {
        Self {
            mean: FailurePolicy::SkipOnFailure,
            distance: FailurePolicy::SkipOnFailure,
            title: FailurePolicy::SkipOnFailure,
            sequential: FailurePolicy::SubstituteRandomOnFailure,
        }
    }
}

impl StrategyPolicies {
    /// Policy for a strategy; baselines cannot fail and report `SkipOnFailure`
    pub fn policy_for(&self, kind: StrategyKind) -> FailurePolicy {
        match kind {
            StrategyKind::Mean => self.mean,
            StrategyKind::Distance => self.distance,
            StrategyKind::Title => self.title,
            StrategyKind::Sequential => self.sequential,
            StrategyKind::Random | StrategyKind::Zero => FailurePolicy::SkipOnFailure,
        }
    }
}

fn default_skip() -> FailurePolicy { FailurePolicy::SkipOnFailure }
fn default_substitute() -> FailurePolicy { FailurePolicy::SubstituteRandomOnFailure }

/// Evaluation configuration loaded from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvalConfig {
    /// Word-vector table (word2vec text format)
    #[serde(default = "default_vectors_path")]
    pub vectors_path: PathBuf,

    /// Recurrent description encoder weights (JSON)
    #[serde(default = "default_encoder_path")]
    pub encoder_path: PathBuf,

    /// Dimensionality shared by every compared vector
    #[serde(default = "default_dimensions")]
    pub dimensions: usize,

    /// Seed for the random baseline and substitution vectors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    #[serde(default)]
    pub link_handling: LinkHandling,

    /// Maximum entities to visit (0 = unlimited)
    #[serde(default)]
    pub max_entities: usize,

    /// Print the progress counter every N scored entities
    #[serde(default = "default_progress_interval")]
    pub progress_interval: usize,

    #[serde(default)]
    pub policies: StrategyPolicies,
}

fn default_vectors_path() -> PathBuf { PathBuf::from("model/entity_fasttext_n100.txt") }
fn default_encoder_path() -> PathBuf { PathBuf::from("model/description_encoder.json") }
fn default_dimensions() -> usize { 100 }
fn default_progress_interval() -> usize { 1 }

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            vectors_path: default_vectors_path(),
            encoder_path: default_encoder_path(),
            dimensions: default_dimensions(),
            seed: None,
            link_handling: LinkHandling::default(),
            max_entities: 0,
            progress_interval: default_progress_interval(),
            policies: StrategyPolicies::default(),
        }
    }
}

impl EvalConfig {
    /// Load config from TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read eval config: {:?}", path))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse eval config: {:?}", path))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from default location (./eval.toml) or return defaults
    pub fn load_default() -> Result<Self> {
        let local_path = Path::new("eval.toml");
        if local_path.exists() {
            return Self::load(local_path);
        }
        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.dimensions == 0 {
            anyhow::bail!("dimensions must be greater than zero");
        }
        if self.progress_interval == 0 {
            anyhow::bail!("progress_interval must be greater than zero");
        }
        Ok(())
    }

    /// Effective entity limit, treating 0 as unlimited
    pub fn entity_limit(&self) -> usize {
        if self.max_entities == 0 {
            usize::MAX
        } else {
            self.max_entities
        }
    }
}
