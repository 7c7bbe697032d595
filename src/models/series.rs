use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub instant: NaiveDateTime,
    pub value: Option<f64>,
    pub coordinates: Option<Coordinates>,
}

impl Observation {
    pub fn new(instant: NaiveDateTime, value: Option<f64>) -> Self {
        Self {
            instant,
            value,
            coordinates: None,
        }
    }

    pub fn with_coordinates(mut self, coordinates: Coordinates) -> Self {
        self.coordinates = Some(coordinates);
        self
    }
}

/// A single variable's time series at one site, kept in source order.
///
/// Instants may repeat until the series has passed through the
/// `DuplicateResolver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedSeries {
    variable: String,
    observations: Vec<Observation>,
}

impl NormalizedSeries {
    pub fn new(variable: &str, observations: Vec<Observation>) -> Self {
        Self {
            variable: variable.to_string(),
            observations,
        }
    }

    pub fn variable(&self) -> &str {
        &self.variable
    }

    pub fn observations(&self) -> &[Observation] {
        &self.observations
    }

    pub fn into_observations(self) -> Vec<Observation> {
        self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn instants(&self) -> impl Iterator<Item = NaiveDateTime> + '_ {
        self.observations.iter().map(|o| o.instant)
    }

    pub fn first_instant(&self) -> Option<NaiveDateTime> {
        self.observations.first().map(|o| o.instant)
    }

    pub fn last_instant(&self) -> Option<NaiveDateTime> {
        self.observations.last().map(|o| o.instant)
    }

    /// Value at an exact instant (first match in source order).
    pub fn value_at(&self, instant: NaiveDateTime) -> Option<f64> {
        self.observations
            .iter()
            .find(|o| o.instant == instant)
            .and_then(|o| o.value)
    }

    pub fn has_coordinates(&self) -> bool {
        self.observations.iter().any(|o| o.coordinates.is_some())
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.observations
            .windows(2)
            .all(|w| w[0].instant < w[1].instant)
    }

    /// Append another chunk of the same variable, keeping request order.
    pub fn extend(&mut self, other: NormalizedSeries) {
        self.observations.extend(other.observations);
    }

    pub fn truncate(&mut self, len: usize) {
        self.observations.truncate(len);
    }

    pub(crate) fn observations_mut(&mut self) -> &mut Vec<Observation> {
        &mut self.observations
    }
}
