use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{ProcessingError, Result};

/// One observation row as served by the AQS `sampleData` endpoints.
///
/// Only the local date/time, the measurement, the coordinates and the method
/// code are used downstream; the GMT and change-tracking fields are carried so
/// a response deserializes without loss.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RawRecord {
    pub date_local: String,
    pub time_local: String,

    /// `null` when the monitor reported no value for the slot.
    pub sample_measurement: Option<f64>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,

    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,

    #[serde(default)]
    pub method_code: Option<String>,

    #[serde(default)]
    pub date_gmt: Option<String>,
    #[serde(default)]
    pub time_gmt: Option<String>,
    #[serde(default)]
    pub date_of_last_change: Option<String>,
}

impl RawRecord {
    pub fn new(
        date_local: &str,
        time_local: &str,
        sample_measurement: Option<f64>,
        latitude: f64,
        longitude: f64,
        method_code: Option<&str>,
    ) -> Self {
        Self {
            date_local: date_local.to_string(),
            time_local: time_local.to_string(),
            sample_measurement,
            latitude,
            longitude,
            method_code: method_code.map(str::to_string),
            date_gmt: None,
            time_gmt: None,
            date_of_last_change: None,
        }
    }

    /// Combine the local calendar date and time-of-day into one instant.
    pub fn local_instant(&self) -> Result<NaiveDateTime> {
        let date = NaiveDate::parse_from_str(self.date_local.trim(), "%Y-%m-%d")?;
        let time = parse_time_of_day(self.time_local.trim())?;
        Ok(date.and_time(time))
    }

    pub fn method(&self) -> Option<&str> {
        self.method_code.as_deref()
    }
}

/// AQS reports `HH:MM`; some archived extracts carry seconds as well.
fn parse_time_of_day(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(ProcessingError::from)
}
