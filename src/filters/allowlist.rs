//! Token allowlist
//!
//! Loaded once per run from the chain's `allowlist.json` (a JSON array of
//! token ids). Lookups are case-insensitive; the original spelling of each
//! entry is kept because asset directories are named by checksummed address.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Immutable, case-insensitive set of allowed token ids.
#[derive(Debug, Clone, Default)]
pub struct TokenAllowlist {
    /// lowercase id → id as written in the allowlist
    by_lower: HashMap<String, String>,
    /// Entries in file order
    entries: Vec<String>,
}

impl TokenAllowlist {
    /// Load from a JSON file. Missing or unparseable files are errors; the
    /// run has nothing to screen against without one.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read allowlist file: {}", path.display()))?;

        let entries: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse allowlist JSON: {}", path.display()))?;

        let allowlist = Self::from_entries(entries);
        info!(
            "Allowlist loaded: {} tokens from {}",
            allowlist.len(),
            path.display()
        );
        Ok(allowlist)
    }

    pub fn from_entries<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries: Vec<String> = entries.into_iter().map(Into::into).collect();
        let mut by_lower = HashMap::with_capacity(entries.len());
        for entry in &entries {
            let trimmed = entry.trim();
            // First spelling wins on duplicate ids
            by_lower
                .entry(trimmed.to_lowercase())
                .or_insert_with(|| trimmed.to_string());
        }
        Self { by_lower, entries }
    }

    /// Case-insensitive membership
    pub fn contains(&self, token_id: &str) -> bool {
        self.by_lower.contains_key(&token_id.trim().to_lowercase())
    }

    /// The allowlist's own spelling of `token_id`, if present
    pub fn canonical(&self, token_id: &str) -> Option<&str> {
        self.by_lower
            .get(&token_id.trim().to_lowercase())
            .map(String::as_str)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    /// Number of distinct ids
    pub fn len(&self) -> usize {
        self.by_lower.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_lower.is_empty()
    }
}
