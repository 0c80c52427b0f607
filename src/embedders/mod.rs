//! Encoders and the capabilities they depend on
//!
//! - `traits` - word-vector lookup and sequence model interfaces
//! - `word_vectors` - word2vec text table
//! - `recurrent` - Elman/GRU description encoder
//! - `strategies` - the six encoding strategies scored per entity

pub mod recurrent;
pub mod strategies;
pub mod traits;
pub mod word_vectors;

pub use recurrent::{load_recurrent_encoder, CellKind, RecurrentEncoder, RecurrentWeights};
pub use strategies::{
    distance_encoder, mean_encoder, random_vector, sequential_encoder, title_encoder, zero_vector,
    EncodingContext, StrategyKind, STRATEGY_COUNT,
};
pub use traits::{measure_sync, EncodeError, HiddenState, SequenceModel, WordVectors};
pub use word_vectors::{load_word_vectors, WordVectorTable};
