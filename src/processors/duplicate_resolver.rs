use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

use crate::error::{ProcessingError, Result};
use crate::models::{NormalizedSeries, Observation};

/// What to do when a series repeats an instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Cut the series at the first repeated instant; everything from there on
    /// is discarded, including later periods that do not repeat.
    #[default]
    Truncate,
    /// Point-wise: the last reported value for an instant wins.
    KeepLast,
    /// Refuse series with repeated instants.
    Error,
}

impl FromStr for DuplicatePolicy {
    type Err = ProcessingError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "truncate" => Ok(DuplicatePolicy::Truncate),
            "keep-last" | "keep_last" => Ok(DuplicatePolicy::KeepLast),
            "error" => Ok(DuplicatePolicy::Error),
            _ => Err(ProcessingError::Config(format!(
                "Unknown duplicate policy: {}",
                s
            ))),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DuplicatePolicy::Truncate => "truncate",
            DuplicatePolicy::KeepLast => "keep-last",
            DuplicatePolicy::Error => "error",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DuplicateResolver {
    policy: DuplicatePolicy,
}

impl DuplicateResolver {
    pub fn new(policy: DuplicatePolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> DuplicatePolicy {
        self.policy
    }

    /// Position of the first observation whose instant already appeared
    /// earlier in the series.
    pub fn first_duplicate_position(series: &NormalizedSeries) -> Option<usize> {
        let mut seen = HashSet::with_capacity(series.len());
        series.instants().position(|instant| !seen.insert(instant))
    }

    /// Return a series with a strictly increasing, unique index.
    pub fn resolve(&self, mut series: NormalizedSeries) -> Result<NormalizedSeries> {
        let duplicate_at = Self::first_duplicate_position(&series);

        match (self.policy, duplicate_at) {
            (_, None) => {}
            (DuplicatePolicy::Truncate, Some(position)) => {
                warn!(
                    variable = series.variable(),
                    kept = position,
                    discarded = series.len() - position,
                    "Duplicate instant found, truncating series"
                );
                series.truncate(position);
            }
            (DuplicatePolicy::KeepLast, Some(_)) => {
                let total = series.len();
                let variable = series.variable().to_string();

                let mut latest: BTreeMap<_, Observation> = BTreeMap::new();
                for observation in series.into_observations() {
                    latest.insert(observation.instant, observation);
                }

                warn!(
                    variable = %variable,
                    replaced = total - latest.len(),
                    "Duplicate instants found, keeping last reported values"
                );
                return Ok(NormalizedSeries::new(&variable, latest.into_values().collect()));
            }
            (DuplicatePolicy::Error, Some(position)) => {
                return Err(ProcessingError::DuplicateInstant {
                    variable: series.variable().to_string(),
                    instant: series.observations()[position].instant,
                });
            }
        }

        // Unique from here on; a stable sort makes the index increasing
        if !series.is_strictly_increasing() {
            series.observations_mut().sort_by_key(|o| o.instant);
        }

        Ok(series)
    }
}
