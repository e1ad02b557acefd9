//! Token vocabulary saved alongside the training run.
//!
//! One surface string per line; the token id is the line number. Unknown
//! ids always resolve to the `<unk>` placeholder, never an error.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::RunConfig;

/// Token id reserved for out-of-vocabulary strings.
pub const UNK_ID: i64 = 0;

/// Display placeholder for out-of-vocabulary ids.
pub const UNK_TOKEN: &str = "<unk>";

/// Bidirectional id <-> surface-string table, read-only after load.
#[derive(Debug, Clone)]
pub struct Vocab {
    tokens: Vec<String>,
    ids: HashMap<String, i64>,
}

impl Vocab {
    pub fn from_tokens(tokens: Vec<String>) -> Self {
        let mut ids = HashMap::with_capacity(tokens.len());
        for (id, token) in tokens.iter().enumerate() {
            // First occurrence wins for duplicated surface strings.
            ids.entry(token.clone()).or_insert(id as i64);
        }
        Self { tokens, ids }
    }

    /// Load from a one-token-per-line file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading vocab file {}", path.display()))?;
        Ok(Self::from_tokens(text.lines().map(str::to_string).collect()))
    }

    /// Load the vocabulary the run was trained with.
    pub fn load_from_config(config: &RunConfig) -> Result<Self> {
        Self::load(&config.vocab_path)
    }

    /// Surface string for a token id; `<unk>` for anything out of range.
    pub fn token_for(&self, id: i64) -> &str {
        if id < 0 {
            return UNK_TOKEN;
        }
        self.tokens
            .get(id as usize)
            .map_or(UNK_TOKEN, String::as_str)
    }

    pub fn id_for(&self, token: &str) -> Option<i64> {
        self.ids.get(token).copied()
    }

    /// Display string for a knowledge-graph node row (column 0 identity).
    pub fn node_label(&self, row: &[i64]) -> String {
        row.first()
            .map_or(UNK_TOKEN, |&id| self.token_for(id))
            .to_string()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}
