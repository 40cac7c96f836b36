//! Sentiment lexicon: token → mean valence on the `[-4, 4]` rating scale.
//!
//! Uses the tab-separated layout of the VADER lexicon (`token<TAB>mean[<TAB>...]`),
//! so a full VADER lexicon file can be loaded as-is; trailing columns are ignored.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;
use tracing::debug;

/// Bundled retail-review lexicon.
const BUILTIN_SOURCE: &str = include_str!("../data/lexicon.tsv");

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("lexicon line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("io error reading lexicon: {0}")]
    Io(#[from] std::io::Error),
}

/// Case-insensitive token → valence map.
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    valences: HashMap<String, f64>,
}

impl Lexicon {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the bundled lexicon.
    pub fn builtin() -> Result<Self, LexiconError> {
        Self::parse(BUILTIN_SOURCE)
    }

    /// Parse a tab-separated lexicon. Blank lines are skipped.
    pub fn parse(source: &str) -> Result<Self, LexiconError> {
        let mut lexicon = Self::new();

        for (idx, line) in source.lines().enumerate() {
            let line_no = idx + 1;
            if line.trim().is_empty() {
                continue;
            }

            let mut parts = line.split('\t');
            let token = parts.next().unwrap_or_default().trim();
            if token.is_empty() {
                return Err(LexiconError::Parse {
                    line: line_no,
                    reason: "empty token".into(),
                });
            }
            let raw = parts.next().ok_or_else(|| LexiconError::Parse {
                line: line_no,
                reason: format!("missing valence for {token:?}"),
            })?;
            let valence: f64 = raw.trim().parse().map_err(|_| LexiconError::Parse {
                line: line_no,
                reason: format!("invalid valence {:?} for {token:?}", raw.trim()),
            })?;
            if !valence.is_finite() {
                return Err(LexiconError::Parse {
                    line: line_no,
                    reason: format!("non-finite valence for {token:?}"),
                });
            }

            lexicon.insert(token, valence);
        }

        debug!(entries = lexicon.len(), "parsed sentiment lexicon");
        Ok(lexicon)
    }

    /// Read and parse a lexicon file.
    pub fn from_path(path: &Path) -> Result<Self, LexiconError> {
        let source = std::fs::read_to_string(path)?;
        Self::parse(&source)
    }

    /// Add or replace a token's valence.
    pub fn insert(&mut self, token: &str, valence: f64) {
        self.valences.insert(token.to_lowercase(), valence);
    }

    /// Valence of an already-lowercased token.
    pub fn get(&self, token: &str) -> Option<f64> {
        self.valences.get(token).copied()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.valences.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.valences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.valences.is_empty()
    }

    /// Merge another lexicon into this one; `other` wins on conflicts.
    pub fn merge(&mut self, other: &Lexicon) {
        for (token, valence) in &other.valences {
            self.valences.insert(token.clone(), *valence);
        }
    }
}
