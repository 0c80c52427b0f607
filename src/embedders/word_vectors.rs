//! Pre-trained word-vector table
//!
//! Reads the word2vec text format: an optional `<count> <dims>` header, then
//! one `<word> <v1> ... <vD>` row per line. Vectors are stored in one flat
//! buffer and handed out as slices.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::io::BufRead;
use std::path::Path;

use super::traits::{EncodeError, WordVectors};

/// In-memory vocabulary with fixed dimensionality
#[derive(Debug, Clone)]
pub struct WordVectorTable {
    dimensions: usize,
    index: HashMap<String, usize>,
    data: Vec<f32>,
}

impl WordVectorTable {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            index: HashMap::new(),
            data: Vec::new(),
        }
    }

    /// Build from `(word, vector)` pairs, rejecting vectors of the wrong length
    pub fn from_entries<I, W>(dimensions: usize, entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (W, Vec<f32>)>,
        W: Into<String>,
    {
        let mut table = Self::new(dimensions);
        for (word, vector) in entries {
            table.insert(word.into(), &vector)?;
        }
        Ok(table)
    }

    /// Add or replace a word
    pub fn insert(&mut self, word: String, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dimensions {
            anyhow::bail!(
                "Vector for {:?} has {} dimensions, expected {}",
                word,
                vector.len(),
                self.dimensions
            );
        }
        match self.index.get(&word) {
            Some(&row) => {
                let start = row * self.dimensions;
                self.data[start..start + self.dimensions].copy_from_slice(vector);
            }
            None => {
                self.index.insert(word, self.index.len());
                self.data.extend_from_slice(vector);
            }
        }
        Ok(())
    }

    /// Parse word2vec text format
    pub fn from_reader<R: BufRead>(reader: R, dimensions: usize) -> Result<Self> {
        let mut table = Self::new(dimensions);
        let mut values = Vec::with_capacity(dimensions);

        for (line_no, line) in reader.lines().enumerate() {
            let line = line.with_context(|| format!("Failed to read vectors line {}", line_no + 1))?;
            let mut fields = line.split_whitespace();
            let Some(word) = fields.next() else {
                continue;
            };

            values.clear();
            for field in fields {
                let value: f32 = field.parse().with_context(|| {
                    format!("Invalid value {:?} on vectors line {}", field, line_no + 1)
                })?;
                values.push(value);
            }

            // `<count> <dims>` header
            if line_no == 0 && values.len() == 1 && word.parse::<usize>().is_ok() {
                let declared = values[0] as usize;
                if declared != dimensions {
                    anyhow::bail!(
                        "Vector table declares {} dimensions, expected {}",
                        declared,
                        dimensions
                    );
                }
                continue;
            }

            table
                .insert(word.to_string(), &values)
                .with_context(|| format!("Bad row on vectors line {}", line_no + 1))?;
        }

        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.index.contains_key(word)
    }
}

impl WordVectors for WordVectorTable {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn lookup(&self, word: &str) -> Result<&[f32], EncodeError> {
        let row = *self
            .index
            .get(word)
            .ok_or_else(|| EncodeError::UnknownWord(word.to_string()))?;
        let start = row * self.dimensions;
        Ok(&self.data[start..start + self.dimensions])
    }
}

/// Load a word2vec text file
pub fn load_word_vectors(path: &Path, dimensions: usize) -> Result<WordVectorTable> {
    tracing::info!("Loading word vectors from {:?}", path);
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open word vectors: {:?}", path))?;
    let table = WordVectorTable::from_reader(std::io::BufReader::new(file), dimensions)
        .with_context(|| format!("Failed to parse word vectors: {:?}", path))?;
    tracing::info!("Loaded {} word vectors ({} dims)", table.len(), dimensions);
    Ok(table)
}
