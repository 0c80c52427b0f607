//! Encoder trait abstraction
//!
//! Defines the capabilities every encoding strategy depends on: a word-vector
//! lookup and a recurrent sequence model. Both are consumed as black boxes.

use std::time::Duration;
use thiserror::Error;

/// Why a strategy could not produce a vector for an entity
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Token not present in the word-vector table
    #[error("unknown word: {0:?}")]
    UnknownWord(String),

    /// Nothing left to average or feed after tokenization
    #[error("empty token sequence")]
    EmptySequence,

    /// Label absent from the corpus
    #[error("no abstract for entity {0:?}")]
    MissingEntry(String),

    /// Failure inside the recurrent pass
    #[error("encoder runtime fault: {0}")]
    EncoderRuntimeFault(String),

    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Word → vector lookup
pub trait WordVectors {
    /// Length of every vector in the table
    fn dimensions(&self) -> usize;

    /// Vector for a normalized word
    fn lookup(&self, word: &str) -> Result<&[f32], EncodeError>;

    /// Vectors for a token sequence, failing on the first unknown word
    fn lookup_all(&self, tokens: &[String]) -> Result<Vec<&[f32]>, EncodeError> {
        tokens.iter().map(|t| self.lookup(t)).collect()
    }
}

/// Recurrent hidden state threaded between steps
///
/// Each step consumes one state and returns a new one; nothing is mutated in
/// place, so a fresh state per entity is all the isolation needed.
#[derive(Debug, Clone, PartialEq)]
pub struct HiddenState(pub Vec<f32>);

impl HiddenState {
    pub fn zeros(size: usize) -> Self {
        Self(vec![0.0; size])
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }
}

/// Pre-trained sequence model stepped one word vector at a time
pub trait SequenceModel {
    /// Length of each input vector
    fn input_size(&self) -> usize;

    /// Length of each output vector
    fn output_size(&self) -> usize;

    /// State before the first step
    fn init_hidden(&self) -> HiddenState;

    /// Advance one step
    fn step(&self, input: &[f32], hidden: &HiddenState) -> Result<(Vec<f32>, HiddenState), EncodeError>;

    /// Fold the whole sequence from a fresh state and return the last output
    fn encode_sequence(&self, inputs: &[&[f32]]) -> Result<Vec<f32>, EncodeError> {
        let (output, _) = inputs.iter().try_fold(
            (None, self.init_hidden()),
            |(_, hidden), input| {
                let (output, next) = self.step(input, &hidden)?;
                Ok::<_, EncodeError>((Some(output), next))
            },
        )?;
        output.ok_or(EncodeError::EmptySequence)
    }
}

/// Helper to measure duration of a sync operation
pub fn measure_sync<F, T>(f: F) -> (T, Duration)
where
    F: FnOnce() -> T,
{
    let start = std::time::Instant::now();
    let result = f();
    let duration = start.elapsed();
    (result, duration)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Sums inputs into the state and echoes the running total
    struct Accumulating;

    impl SequenceModel for Accumulating {
        fn input_size(&self) -> usize { 2 }
        fn output_size(&self) -> usize { 2 }
        fn init_hidden(&self) -> HiddenState { HiddenState::zeros(2) }

        fn step(&self, input: &[f32], hidden: &HiddenState) -> Result<(Vec<f32>, HiddenState), EncodeError> {
            if input.len() != 2 {
                return Err(EncodeError::DimensionMismatch { expected: 2, actual: input.len() });
            }
            let next: Vec<f32> = hidden.0.iter().zip(input).map(|(h, x)| h + x).collect();
            Ok((next.clone(), HiddenState(next)))
        }
    }

    #[test]
    fn test_encode_sequence_returns_last_output() {
        let a: &[f32] = &[1.0, 2.0];
        let b: &[f32] = &[3.0, 4.0];
        let out = Accumulating.encode_sequence(&[a, b]).unwrap();
        assert_eq!(out, vec![4.0, 6.0]);
    }

    #[test]
    fn test_encode_sequence_resets_state_per_call() {
        let a: &[f32] = &[1.0, 1.0];
        let first = Accumulating.encode_sequence(&[a]).unwrap();
        let second = Accumulating.encode_sequence(&[a]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_encode_sequence_empty() {
        assert_eq!(Accumulating.encode_sequence(&[]), Err(EncodeError::EmptySequence));
    }

    #[test]
    fn test_encode_sequence_propagates_step_error() {
        let bad: &[f32] = &[1.0];
        assert!(matches!(
            Accumulating.encode_sequence(&[bad]),
            Err(EncodeError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_encode_error_display() {
        assert_eq!(EncodeError::UnknownWord("foo".into()).to_string(), "unknown word: \"foo\"");
    }
}
