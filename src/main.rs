//! Entity Embedding Evaluation CLI
//!
//! Scores six ways of building an entity vector (description mean, distance
//! weighted mean, title mean, recurrent encoder, random and zero baselines)
//! against a reference vector derived from the entities each abstract links to.
//!
//! ## Quick Start
//!
//! ```bash
//! # Evaluate with ./eval.toml (or built-in defaults)
//! ./entity-embedding-eval ./data/abstracts.json
//!
//! # Reproducible baselines, first 1000 entities
//! ./entity-embedding-eval ./data/abstracts.json --seed 42 --max-entities 1000
//!
//! # Custom config and model files
//! ./entity-embedding-eval ./data/abstracts.json \
//!     --config ./my-eval.toml \
//!     --vectors ./model/vectors.txt \
//!     --encoder ./model/encoder.json
//! ```
//!
//! See `eval.toml` for the configuration schema.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};

use entity_embedding_eval::benchmark::{print_summary, Evaluator, Progress};
use entity_embedding_eval::config::{EvalConfig, LinkHandling};
use entity_embedding_eval::corpus::load_corpus;
use entity_embedding_eval::embedders::{
    load_recurrent_encoder, load_word_vectors, measure_sync, EncodingContext, SequenceModel,
};
use entity_embedding_eval::resource_monitor::ResourceMonitor;

/// Link token handling for CLI
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LinkHandlingArg {
    /// Remove `resource/...` tokens before lookup
    Drop,
    /// Look `resource/...` tokens up verbatim
    Literal,
}

impl From<LinkHandlingArg> for LinkHandling {
    fn from(arg: LinkHandlingArg) -> Self {
        match arg {
            LinkHandlingArg::Drop => LinkHandling::Drop,
            LinkHandlingArg::Literal => LinkHandling::Literal,
        }
    }
}

#[derive(Parser)]
#[command(name = "entity-embedding-eval")]
#[command(about = "Evaluate entity embedding strategies against link-derived references")]
#[command(version)]
struct Cli {
    /// Newline-delimited JSON file of entity -> abstract mappings
    corpus: PathBuf,

    /// Path to eval config file (TOML); defaults to ./eval.toml when present
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Word-vector table (word2vec text format)
    #[arg(long)]
    vectors: Option<PathBuf>,

    /// Recurrent encoder weights (JSON)
    #[arg(long)]
    encoder: Option<PathBuf>,

    /// Seed for the random baseline and substituted vectors
    #[arg(short, long)]
    seed: Option<u64>,

    /// Maximum entities to evaluate (0 = unlimited)
    #[arg(long)]
    max_entities: Option<usize>,

    /// How description encoders treat link tokens
    #[arg(long, value_enum)]
    link_handling: Option<LinkHandlingArg>,
}

impl Cli {
    /// Load the config file, then let explicit flags win
    fn resolve_config(&self) -> Result<EvalConfig> {
        let mut config = match &self.config {
            Some(path) => EvalConfig::load(path)?,
            None => EvalConfig::load_default()?,
        };

        if let Some(vectors) = &self.vectors {
            config.vectors_path = vectors.clone();
        }
        if let Some(encoder) = &self.encoder {
            config.encoder_path = encoder.clone();
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(max) = self.max_entities {
            config.max_entities = max;
        }
        if let Some(links) = self.link_handling {
            config.link_handling = links.into();
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config()?;

    run_evaluation(&cli.corpus, &config)
}

fn run_evaluation(corpus_path: &Path, config: &EvalConfig) -> Result<()> {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              ENTITY EMBEDDING EVALUATION                     ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let corpus = load_corpus(corpus_path)?;
    let stats = corpus.stats();
    println!(
        "Loaded {} entities ({} with links, {} links total)",
        stats.entity_count, stats.linked_entity_count, stats.total_links
    );
    println!(
        "  Link handling: {} - {}",
        config.link_handling.name(),
        config.link_handling.description()
    );

    let mut monitor = ResourceMonitor::new();
    monitor.snapshot_baseline();

    let (models, load_time) = measure_sync(|| -> Result<_> {
        let vectors = load_word_vectors(&config.vectors_path, config.dimensions)?;
        let encoder = load_recurrent_encoder(&config.encoder_path)?;
        Ok((vectors, encoder))
    });
    let (vectors, encoder) = models.context("Failed to load models")?;
    monitor.record_models_loaded(load_time);

    if encoder.input_size() != config.dimensions || encoder.output_size() != config.dimensions {
        anyhow::bail!(
            "Encoder maps {} -> {} dims but the word vectors have {}",
            encoder.input_size(),
            encoder.output_size(),
            config.dimensions
        );
    }

    let ctx = EncodingContext::new(&corpus, &vectors, &encoder, config.link_handling);
    let mut evaluator = Evaluator::new(ctx, config);

    let interval = config.progress_interval;
    let result = evaluator.run(|progress: &Progress| {
        if progress.scored % interval == 0 {
            print!("{} ({:.1}%)\r", progress.scored, progress.percent());
            let _ = std::io::stdout().flush();
            monitor.sample();
        }
    });
    println!();

    tracing::info!(
        "Evaluation finished in {:.1}s ({} scored, {} skipped)",
        result.duration.as_secs_f64(),
        result.scored,
        result.skipped
    );

    print_summary(&result);

    let resources = monitor.finalize(result.duration, result.scored);
    println!("\n  Resources: {}", resources.format_summary());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &tempfile::TempDir) -> PathBuf {
        let path = dir.path().join("eval.toml");
        std::fs::write(
            &path,
            r#"
vectors_path = "file-vectors.txt"
encoder_path = "file-encoder.json"
dimensions = 8
seed = 1
link_handling = "drop"
max_entities = 10
"#,
        )
        .unwrap();
        path
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(&dir);

        let cli = Cli::try_parse_from([
            "entity-embedding-eval",
            "corpus.json",
            "--config",
            config_path.to_str().unwrap(),
            "--seed",
            "42",
            "--max-entities",
            "5",
            "--link-handling",
            "literal",
            "--vectors",
            "cli-vectors.txt",
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(config.seed, Some(42));
        assert_eq!(config.max_entities, 5);
        assert_eq!(config.link_handling, LinkHandling::Literal);
        assert_eq!(config.vectors_path, PathBuf::from("cli-vectors.txt"));
        // not overridden
        assert_eq!(config.encoder_path, PathBuf::from("file-encoder.json"));
        assert_eq!(config.dimensions, 8);
    }

    #[test]
    fn test_unset_flags_keep_config_file_values() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = write_config(&dir);

        let cli = Cli::try_parse_from([
            "entity-embedding-eval",
            "corpus.json",
            "--config",
            config_path.to_str().unwrap(),
        ])
        .unwrap();
        let config = cli.resolve_config().unwrap();

        assert_eq!(cli.corpus, PathBuf::from("corpus.json"));
        assert_eq!(config.seed, Some(1));
        assert_eq!(config.max_entities, 10);
        assert_eq!(config.link_handling, LinkHandling::Drop);
        assert_eq!(config.vectors_path, PathBuf::from("file-vectors.txt"));
    }

    #[test]
    fn test_rejects_unknown_link_handling() {
        assert!(Cli::try_parse_from(["entity-embedding-eval", "c.json", "--link-handling", "keep"]).is_err());
    }
}
