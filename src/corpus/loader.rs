//! Corpus loader for entity abstracts
//!
//! Reads newline-delimited JSON where every line is an object mapping entity
//! identifiers to abstracts, and merges all lines into one in-memory corpus.
//!
//! ```text
//! {"New_York_City": "resource/United_States city in resource/New_York ..."}
//! {"Apollo_11": "Apollo 11 was the resource/Spaceflight that ..."}
//! ```

use anyhow::{Context, Result};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

/// An entity and its abstract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entity {
    /// Identifier, doubling as the title label (`New_York_City`)
    pub label: String,
    /// Abstract text with embedded `resource/` link markers
    pub abstract_text: String,
}

/// Immutable mapping from entity label to abstract
///
/// Iteration follows the order in which labels first appeared. A later line
/// that repeats a label replaces the abstract in place.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
    /// Hex SHA-256 of the source bytes (empty for in-memory corpora)
    fingerprint: String,
}

impl Corpus {
    /// Build a corpus from `(label, abstract)` pairs, later pairs overwriting earlier ones
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut corpus = Self::default();
        for (label, abstract_text) in pairs {
            corpus.insert(label.into(), abstract_text.into());
        }
        corpus
    }

    /// Parse newline-delimited JSON fragments
    pub fn from_reader<R: BufRead>(reader: R) -> Result<Self> {
        let mut corpus = Self::default();

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read corpus line {}", line_no + 1))?;
            if line.trim().is_empty() {
                continue;
            }
            // Map keeps document order (serde_json `preserve_order`)
            let fragment: Map<String, Value> = serde_json::from_str(&line)
                .with_context(|| format!("Malformed corpus line {}", line_no + 1))?;
            for (label, value) in fragment {
                let Value::String(abstract_text) = value else {
                    anyhow::bail!("Corpus line {}: abstract for {:?} is not a string", line_no + 1, label);
                };
                corpus.insert(label, abstract_text);
            }
        }

        Ok(corpus)
    }

    fn insert(&mut self, label: String, abstract_text: String) {
        match self.index.get(&label) {
            Some(&i) => self.entities[i].abstract_text = abstract_text,
            None => {
                self.index.insert(label.clone(), self.entities.len());
                self.entities.push(Entity { label, abstract_text });
            }
        }
    }

    /// Abstract for a label, if present
    pub fn get(&self, label: &str) -> Option<&str> {
        self.index
            .get(label)
            .map(|&i| self.entities[i].abstract_text.as_str())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.index.contains_key(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Summary figures for logging
    pub fn stats(&self) -> CorpusStats {
        let linked = self
            .entities
            .iter()
            .filter(|e| e.abstract_text.contains(super::text::LINK_MARKER))
            .count();
        let total_links = self
            .entities
            .iter()
            .map(|e| e.abstract_text.matches(super::text::LINK_MARKER).count())
            .sum();
        CorpusStats {
            entity_count: self.entities.len(),
            linked_entity_count: linked,
            total_links,
        }
    }
}

/// Basic statistics about a loaded corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorpusStats {
    pub entity_count: usize,
    /// Entities whose abstract holds at least one link marker
    pub linked_entity_count: usize,
    pub total_links: usize,
}

/// Load and merge a newline-delimited JSON corpus file
pub fn load_corpus(path: &Path) -> Result<Corpus> {
    tracing::info!("Loading saved abstracts from {:?}", path);

    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read corpus: {:?}", path))?;

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    let fingerprint = format!("{:x}", hasher.finalize());

    let mut corpus = Corpus::from_reader(bytes.as_slice())
        .with_context(|| format!("Failed to parse corpus: {:?}", path))?;
    corpus.fingerprint = fingerprint;

    tracing::debug!("Corpus fingerprint: {}", corpus.fingerprint);
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_corpus_merges_lines_and_overwrites() {
        let data = r#"{"A": "first", "B": "bee"}
{"C": "sea"}

{"A": "second"}
"#;
        let corpus = Corpus::from_reader(data.as_bytes()).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.get("A"), Some("second"));
        assert_eq!(corpus.get("C"), Some("sea"));
        assert!(!corpus.contains("D"));

        // A keeps its original position after being overwritten
        let labels: Vec<_> = corpus.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_corpus_keeps_document_order_within_line() {
        let data = "{\"Zeta\": \"z\", \"Alpha\": \"a\"}\n{\"Mid\": \"m\", \"Zeta\": \"zz\"}\n";
        let corpus = Corpus::from_reader(data.as_bytes()).unwrap();
        let labels: Vec<_> = corpus.iter().map(|e| e.label.as_str()).collect();
        assert_eq!(labels, vec!["Zeta", "Alpha", "Mid"]);
        assert_eq!(corpus.get("Zeta"), Some("zz"));
    }

    #[test]
    fn test_corpus_rejects_malformed_line() {
        let data = "{\"A\": \"ok\"}\nnot json\n";
        let err = Corpus::from_reader(data.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_corpus_rejects_non_string_values() {
        let data = "{\"A\": \"ok\"}\n{\"B\": 3}\n";
        let err = Corpus::from_reader(data.as_bytes()).unwrap_err();
        assert!(format!("{:#}", err).contains("line 2"));
    }

    #[test]
    fn test_corpus_stats() {
        let corpus = Corpus::from_pairs([
            ("A", "resource/B x resource/C"),
            ("D", "plain"),
        ]);
        let stats = corpus.stats();
        assert_eq!(stats.entity_count, 2);
        assert_eq!(stats.linked_entity_count, 1);
        assert_eq!(stats.total_links, 2);
    }

    #[test]
    fn test_load_corpus_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"Apollo_11": "resource/Spaceflight to the moon"}}"#).unwrap();
        let corpus = load_corpus(file.path()).unwrap();
        assert_eq!(corpus.len(), 1);
        assert_eq!(corpus.fingerprint().len(), 64);
    }

    #[test]
    fn test_load_corpus_missing_file() {
        assert!(load_corpus(Path::new("/nonexistent/corpus.json")).is_err());
    }
}
