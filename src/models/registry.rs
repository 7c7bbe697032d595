use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;
use tracing::warn;

use crate::error::{ProcessingError, Result};

/// One row of a service listing: a numeric code and the human-readable value
/// it represents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeEntry {
    #[serde(deserialize_with = "deserialize_code")]
    pub code: u32,
    pub value_represented: String,
}

impl CodeEntry {
    pub fn new(code: u32, value_represented: &str) -> Self {
        Self {
            code,
            value_represented: value_represented.to_string(),
        }
    }
}

/// Listing codes come back as JSON strings ("44201"); accept numbers too.
fn deserialize_code<'de, D>(deserializer: D) -> std::result::Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawCode {
        Number(u32),
        Text(String),
    }

    match RawCode::deserialize(deserializer)? {
        RawCode::Number(n) => Ok(n),
        RawCode::Text(s) => s.trim().parse::<u32>().map_err(serde::de::Error::custom),
    }
}

/// Immutable bidirectional parameter code <-> variable name lookup, built once
/// from the full parameter listing and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct CodeRegistry {
    by_name: HashMap<String, u32>,
    by_code: HashMap<u32, String>,
}

impl CodeRegistry {
    /// Build from a listing. When a name is listed under several codes the
    /// first listed code wins, matching a first-match search of the listing.
    pub fn from_entries(entries: Vec<CodeEntry>) -> Self {
        let mut by_name = HashMap::with_capacity(entries.len());
        let mut by_code = HashMap::with_capacity(entries.len());

        for entry in entries {
            by_code
                .entry(entry.code)
                .or_insert_with(|| entry.value_represented.clone());
            by_name.entry(entry.value_represented).or_insert(entry.code);
        }

        Self { by_name, by_code }
    }

    pub fn code_for(&self, name: &str) -> Result<u32> {
        self.by_name
            .get(name)
            .copied()
            .ok_or_else(|| ProcessingError::CodeLookup {
                name: name.to_string(),
            })
    }

    pub fn name_for(&self, code: u32) -> Option<&str> {
        self.by_code.get(&code).map(String::as_str)
    }

    /// Resolve a batch of names, in order. A miss is logged and reported for
    /// that name only.
    pub fn resolve(&self, names: &[String]) -> Vec<(String, Result<u32>)> {
        names
            .iter()
            .map(|name| {
                let result = self.code_for(name);
                if let Err(ref e) = result {
                    warn!(variable = %name, "{}", e);
                }
                (name.clone(), result)
            })
            .collect()
    }

    /// Only the names that resolved, as (name, code) pairs.
    pub fn resolve_known(&self, names: &[String]) -> Vec<(String, u32)> {
        self.resolve(names)
            .into_iter()
            .filter_map(|(name, result)| result.ok().map(|code| (name, code)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_code.is_empty()
    }
}
