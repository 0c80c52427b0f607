//! Encoding strategies
//!
//! Six ways of turning an entity into a vector, all with the same shape:
//! entity in, `Result<Vec<f32>, EncodeError>` out.
//!
//! | Strategy   | Input    | Method                                   |
//! |------------|----------|------------------------------------------|
//! | Mean       | abstract | unweighted mean of word vectors          |
//! | Distance   | abstract | mean of word vectors scaled by 1/(i+1)   |
//! | Title      | label    | unweighted mean of label word vectors    |
//! | Sequential | label    | recurrent encoder over the abstract      |
//! | Random     | -        | standard normal sample                   |
//! | Zero       | -        | all zeros                                |

use rand::Rng;
use rand_distr::StandardNormal;

use super::traits::{EncodeError, SequenceModel, WordVectors};
use crate::benchmark::metrics::mean_rows;
use crate::config::LinkHandling;
use crate::corpus::{description_tokens, sequence_tokens, title_tokens, Corpus, Entity};

/// Number of strategies scored per entity
pub const STRATEGY_COUNT: usize = 6;

/// Encoding strategy, in report order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Mean,
    Distance,
    Title,
    Sequential,
    Random,
    Zero,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; STRATEGY_COUNT] = [
        Self::Mean,
        Self::Distance,
        Self::Title,
        Self::Sequential,
        Self::Random,
        Self::Zero,
    ];

    /// Accumulator slot
    pub fn index(&self) -> usize {
        match self {
            Self::Mean => 0,
            Self::Distance => 1,
            Self::Title => 2,
            Self::Sequential => 3,
            Self::Random => 4,
            Self::Zero => 5,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Distance => "distance",
            Self::Title => "title",
            Self::Sequential => "sequential",
            Self::Random => "random",
            Self::Zero => "zero",
        }
    }

    /// Row label in the summary tables
    pub fn label(&self) -> &'static str {
        match self {
            Self::Mean => "Mean vector",
            Self::Distance => "Mean distance vector",
            Self::Title => "Mean title vector",
            Self::Sequential => "Encoded vector",
            Self::Random => "Random vector",
            Self::Zero => "Zero vector",
        }
    }

    pub fn is_baseline(&self) -> bool {
        matches!(self, Self::Random | Self::Zero)
    }

    /// Learned outputs are compared at unit length; baselines are compared raw
    pub fn normalizes_output(&self) -> bool {
        !self.is_baseline()
    }

    /// Produce this strategy's vector for an entity
    pub fn encode<R: Rng + ?Sized>(
        &self,
        ctx: &EncodingContext<'_>,
        entity: &Entity,
        rng: &mut R,
    ) -> Result<Vec<f32>, EncodeError> {
        match self {
            Self::Mean => mean_encoder(ctx, &entity.abstract_text),
            Self::Distance => distance_encoder(ctx, &entity.abstract_text),
            Self::Title => title_encoder(ctx, &entity.label),
            Self::Sequential => sequential_encoder(ctx, &entity.label),
            Self::Random => Ok(random_vector(ctx.dimensions(), rng)),
            Self::Zero => Ok(zero_vector(ctx.dimensions())),
        }
    }
}

/// Read-only inputs shared by every strategy call
#[derive(Clone, Copy)]
pub struct EncodingContext<'a> {
    pub corpus: &'a Corpus,
    pub vectors: &'a dyn WordVectors,
    pub sequence_model: &'a dyn SequenceModel,
    pub link_handling: LinkHandling,
}

impl<'a> EncodingContext<'a> {
    pub fn new(
        corpus: &'a Corpus,
        vectors: &'a dyn WordVectors,
        sequence_model: &'a dyn SequenceModel,
        link_handling: LinkHandling,
    ) -> Self {
        Self {
            corpus,
            vectors,
            sequence_model,
            link_handling,
        }
    }

    pub fn dimensions(&self) -> usize {
        self.vectors.dimensions()
    }
}

/// Unweighted mean of the vectors for `tokens`
pub fn average_tokens(vectors: &dyn WordVectors, tokens: &[String]) -> Result<Vec<f32>, EncodeError> {
    let rows = vectors.lookup_all(tokens)?;
    mean_rows(&rows).ok_or(EncodeError::EmptySequence)
}

/// Mean of the word vectors of a description
pub fn mean_encoder(ctx: &EncodingContext<'_>, description: &str) -> Result<Vec<f32>, EncodeError> {
    let tokens = description_tokens(description, ctx.link_handling);
    average_tokens(ctx.vectors, &tokens)
}

/// Mean of the word vectors of a description, word `i` scaled by `1 / (i + 1)`
pub fn distance_encoder(ctx: &EncodingContext<'_>, description: &str) -> Result<Vec<f32>, EncodeError> {
    let tokens = description_tokens(description, ctx.link_handling);
    let rows = ctx.vectors.lookup_all(&tokens)?;
    if rows.is_empty() {
        return Err(EncodeError::EmptySequence);
    }

    let mut sum = vec![0.0f32; ctx.dimensions()];
    for (i, row) in rows.iter().enumerate() {
        let weight = 1.0 / (i as f32 + 1.0);
        for (s, x) in sum.iter_mut().zip(row.iter()) {
            *s += x * weight;
        }
    }
    let n = rows.len() as f32;
    Ok(sum.into_iter().map(|s| s / n).collect())
}

/// Mean of the word vectors of an entity label
pub fn title_encoder(ctx: &EncodingContext<'_>, label: &str) -> Result<Vec<f32>, EncodeError> {
    average_tokens(ctx.vectors, &title_tokens(label))
}

/// Final output of the recurrent encoder over the entity's abstract
///
/// Link markers are stripped so linked names read as plain words. A fresh
/// hidden state is used for every call.
pub fn sequential_encoder(ctx: &EncodingContext<'_>, label: &str) -> Result<Vec<f32>, EncodeError> {
    let abstract_text = ctx
        .corpus
        .get(label)
        .ok_or_else(|| EncodeError::MissingEntry(label.to_string()))?;

    let tokens = sequence_tokens(abstract_text);
    let rows = ctx.vectors.lookup_all(&tokens)?;
    let output = ctx.sequence_model.encode_sequence(&rows)?;

    if output.len() != ctx.dimensions() {
        return Err(EncodeError::DimensionMismatch {
            expected: ctx.dimensions(),
            actual: output.len(),
        });
    }
    Ok(output)
}

/// Standard normal sample
pub fn random_vector<R: Rng + ?Sized>(dimensions: usize, rng: &mut R) -> Vec<f32> {
    (0..dimensions).map(|_| rng.sample::<f32, _>(StandardNormal)).collect()
}

pub fn zero_vector(dimensions: usize) -> Vec<f32> {
    vec![0.0; dimensions]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedders::traits::HiddenState;
    use crate::embedders::word_vectors::WordVectorTable;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    /// Echoes the last input; ignores state
    struct LastInput {
        dims: usize,
    }

    impl SequenceModel for LastInput {
        fn input_size(&self) -> usize { self.dims }
        fn output_size(&self) -> usize { self.dims }
        fn init_hidden(&self) -> HiddenState { HiddenState::zeros(1) }

        fn step(&self, input: &[f32], hidden: &HiddenState) -> Result<(Vec<f32>, HiddenState), EncodeError> {
            Ok((input.to_vec(), hidden.clone()))
        }
    }

    fn table() -> WordVectorTable {
        WordVectorTable::from_entries(
            2,
            [
                ("hello", vec![1.0, 0.0]),
                ("world", vec![0.0, 1.0]),
                ("foo", vec![2.0, 2.0]),
                ("new", vec![1.0, 1.0]),
                ("york", vec![3.0, -1.0]),
            ],
        )
        .unwrap()
    }

    fn assert_close(a: &[f32], b: &[f32]) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b) {
            assert!((x - y).abs() < 1e-6, "{:?} != {:?}", a, b);
        }
    }

    #[test]
    fn test_strategy_order_and_labels() {
        for (i, kind) in StrategyKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
        assert_eq!(StrategyKind::Sequential.label(), "Encoded vector");
        assert!(StrategyKind::Zero.is_baseline());
        assert!(StrategyKind::Title.normalizes_output());
        assert!(!StrategyKind::Random.normalizes_output());
    }

    #[test]
    fn test_mean_encoder() {
        let corpus = Corpus::default();
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

        let out = mean_encoder(&ctx, "Hello, world! resource/Foo").unwrap();
        assert_close(&out, &[0.5, 0.5]);
    }

    #[test]
    fn test_mean_encoder_failures() {
        let corpus = Corpus::default();
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

        assert_eq!(
            mean_encoder(&ctx, "hello moon"),
            Err(EncodeError::UnknownWord("moon".to_string()))
        );
        assert_eq!(mean_encoder(&ctx, "...!"), Err(EncodeError::EmptySequence));
    }

    #[test]
    fn test_literal_link_handling_looks_up_marker_tokens() {
        let corpus = Corpus::default();
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Literal);

        assert_eq!(
            mean_encoder(&ctx, "hello resource/Foo"),
            Err(EncodeError::UnknownWord("resource/foo".to_string()))
        );
    }

    #[test]
    fn test_distance_encoder_decays_by_position() {
        let corpus = Corpus::default();
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

        // (hello / 1 + world / 2) / 2
        let out = distance_encoder(&ctx, "hello world").unwrap();
        assert_close(&out, &[0.5, 0.25]);
        assert_eq!(distance_encoder(&ctx, ""), Err(EncodeError::EmptySequence));
    }

    #[test]
    fn test_distance_equals_mean_for_single_token() {
        let corpus = Corpus::default();
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

        for word in ["hello", "world", "foo", "york"] {
            assert_eq!(
                distance_encoder(&ctx, word).unwrap(),
                mean_encoder(&ctx, word).unwrap()
            );
        }
    }

    #[test]
    fn test_title_encoder_decodes_underscores() {
        let corpus = Corpus::default();
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

        let out = title_encoder(&ctx, "New_York").unwrap();
        assert_close(&out, &[2.0, 0.0]);
    }

    #[test]
    fn test_sequential_encoder_strips_markers() {
        let corpus = Corpus::from_pairs([("A", "hello resource/Foo")]);
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Literal);

        // "foo" is the last token once the marker is stripped
        assert_eq!(sequential_encoder(&ctx, "A").unwrap(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_sequential_encoder_strips_uppercase_markers() {
        let corpus = Corpus::from_pairs([("A", "hello Resource/Foo")]);
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

        // Both description paths see the lowercased marker
        assert_eq!(mean_encoder(&ctx, "hello Resource/Foo").unwrap(), vec![1.0, 0.0]);
        assert_eq!(sequential_encoder(&ctx, "A").unwrap(), vec![2.0, 2.0]);
    }

    #[test]
    fn test_sequential_encoder_failures() {
        let corpus = Corpus::from_pairs([("A", "hello moon"), ("B", "")]);
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

        assert_eq!(
            sequential_encoder(&ctx, "Missing"),
            Err(EncodeError::MissingEntry("Missing".to_string()))
        );
        assert_eq!(
            sequential_encoder(&ctx, "A"),
            Err(EncodeError::UnknownWord("moon".to_string()))
        );
        assert_eq!(sequential_encoder(&ctx, "B"), Err(EncodeError::EmptySequence));
    }

    #[test]
    fn test_sequential_encoder_checks_output_dimensions() {
        let corpus = Corpus::from_pairs([("A", "hello")]);
        let vectors = table();
        let model = WidenOutput;
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

        assert_eq!(
            sequential_encoder(&ctx, "A"),
            Err(EncodeError::DimensionMismatch { expected: 2, actual: 3 })
        );
    }

    struct WidenOutput;

    impl SequenceModel for WidenOutput {
        fn input_size(&self) -> usize { 2 }
        fn output_size(&self) -> usize { 3 }
        fn init_hidden(&self) -> HiddenState { HiddenState::zeros(1) }

        fn step(&self, _input: &[f32], hidden: &HiddenState) -> Result<(Vec<f32>, HiddenState), EncodeError> {
            Ok((vec![0.0; 3], hidden.clone()))
        }
    }

    #[test]
    fn test_baselines() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let a = random_vector(100, &mut rng);
        let b = random_vector(100, &mut rng);
        assert_eq!(a.len(), 100);
        assert_ne!(a, b);

        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(random_vector(100, &mut rng), a);

        assert!(zero_vector(100).iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_encode_dispatch_has_configured_dimensions() {
        let corpus = Corpus::from_pairs([("New_York", "hello world foo")]);
        let vectors = table();
        let model = LastInput { dims: 2 };
        let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);
        let entity = corpus.iter().next().unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        for kind in StrategyKind::ALL {
            let out = kind.encode(&ctx, entity, &mut rng).unwrap();
            assert_eq!(out.len(), 2, "{}", kind.name());
        }
    }

    proptest! {
        #[test]
        fn prop_mean_and_title_agree_on_same_tokens(
            rows in prop::collection::vec(prop::collection::vec(-10.0f32..10.0, 3), 1..6),
            picks in prop::collection::vec(0usize..6, 1..8),
        ) {
            let words: Vec<String> = (0..rows.len()).map(|i| format!("w{}", i)).collect();
            let vectors = WordVectorTable::from_entries(
                3,
                words.iter().cloned().zip(rows.iter().cloned()),
            ).unwrap();
            let corpus = Corpus::default();
            let model = LastInput { dims: 3 };
            let ctx = EncodingContext::new(&corpus, &vectors, &model, LinkHandling::Drop);

            let chosen: Vec<&str> = picks.iter().map(|p| words[p % words.len()].as_str()).collect();
            let description = chosen.join(" ");
            let label = chosen.join("_");

            prop_assert_eq!(
                mean_encoder(&ctx, &description).unwrap(),
                title_encoder(&ctx, &label).unwrap()
            );
        }
    }
}
