//! Corpus loading and text normalization
//!
//! Loads entity abstracts for the evaluation and provides the tokenizer that
//! every encoding strategy shares.
//!
//! ```rust,ignore
//! use corpus::{load_corpus, text};
//!
//! let corpus = load_corpus(&path)?;
//! for entity in corpus.iter() {
//!     let links = text::link_targets(&entity.abstract_text);
//! }
//! ```

pub mod loader;
pub mod text;

pub use loader::{load_corpus, Corpus, CorpusStats, Entity};
pub use text::{
    description_tokens, link_targets, normalize, sequence_tokens, title_tokens, tokenize,
    MalformedLink, LINK_MARKER, PUNCTUATION,
};
