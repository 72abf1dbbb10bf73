//! Exhaustive L2 nearest-neighbour index.

use pcore::{Error, ErrorKind, Result};
use serde::{Deserialize, Serialize};

/// One indexed text with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    /// Embedding of `text`.
    pub vector: Vec<f32>,
    /// The original text.
    pub text: String,
}

/// Flat index searched by brute force.
///
/// The dimension is fixed by the first vector added. Serialized as JSON
/// for the per-channel index artifacts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FlatIndex {
    dimension: usize,
    entries: Vec<Entry>,
}

impl FlatIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Vector dimension, or 0 while empty.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the index has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Append a vector and its text.
    pub fn add(&mut self, vector: Vec<f32>, text: impl Into<String>) -> Result<()> {
        if vector.is_empty() {
            return Err(Error::new(ErrorKind::Embedding, "empty embedding"));
        }
        if self.entries.is_empty() {
            self.dimension = vector.len();
        }
        self.check(&vector)?;
        self.entries.push(Entry {
            vector,
            text: text.into(),
        });
        Ok(())
    }

    /// Append a batch; if any vector is rejected nothing is added.
    pub fn extend<T: Into<String>>(&mut self, batch: Vec<(Vec<f32>, T)>) -> Result<()> {
        let Some((first, _)) = batch.first() else {
            return Ok(());
        };
        let dimension = if self.entries.is_empty() {
            first.len()
        } else {
            self.dimension
        };
        for (vector, _) in &batch {
            if vector.is_empty() {
                return Err(Error::new(ErrorKind::Embedding, "empty embedding"));
            }
            check_dimension(vector, dimension)?;
        }

        for (vector, text) in batch {
            self.add(vector, text)?;
        }
        Ok(())
    }

    /// Texts of the `k` nearest entries, closest first.
    ///
    /// Ties keep insertion order.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<&str>> {
        if self.entries.is_empty() {
            return Ok(Vec::new());
        }
        self.check(query)?;

        let mut scored = self
            .entries
            .iter()
            .map(|entry| (l2_distance(&entry.vector, query), entry.text.as_str()))
            .collect::<Vec<_>>();
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));
        Ok(scored.into_iter().take(k).map(|(_, text)| text).collect())
    }

    fn check(&self, vector: &[f32]) -> Result<()> {
        check_dimension(vector, self.dimension)
    }
}

fn check_dimension(vector: &[f32], dimension: usize) -> Result<()> {
    if vector.len() != dimension {
        return Err(Error::new(
            ErrorKind::Embedding,
            format!(
                "embedding has dimension {}, index expects {dimension}",
                vector.len()
            ),
        ));
    }
    Ok(())
}

/// Squared Euclidean distance.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}
