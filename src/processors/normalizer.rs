use tracing::debug;
use validator::Validate;

use crate::error::Result;
use crate::models::{Coordinates, NormalizedSeries, Observation, RawRecord};

/// Turns one raw response (one variable, one site, one time range) into a
/// single-variable series indexed by local instant.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordNormalizer {
    select_single_method: bool,
    drop_spatial_columns: bool,
}

impl RecordNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only rows reported with the first method code seen.
    pub fn with_select_single_method(mut self, select_single_method: bool) -> Self {
        self.select_single_method = select_single_method;
        self
    }

    pub fn with_drop_spatial_columns(mut self, drop_spatial_columns: bool) -> Self {
        self.drop_spatial_columns = drop_spatial_columns;
        self
    }

    /// Normalize a response. `Ok(None)` means the response held no rows,
    /// which callers treat as "no data", not as a failure. A date or time
    /// that does not parse fails the whole series, as does a kept coordinate
    /// outside the valid latitude/longitude range.
    pub fn normalize(&self, records: &[RawRecord], variable: &str) -> Result<Option<NormalizedSeries>> {
        if records.is_empty() {
            return Ok(None);
        }

        let first_method = records[0].method();
        let mut observations = Vec::with_capacity(records.len());

        for record in records {
            if self.select_single_method && record.method() != first_method {
                continue;
            }

            let mut observation = Observation::new(record.local_instant()?, record.sample_measurement);
            if !self.drop_spatial_columns {
                record.validate()?;
                observation = observation.with_coordinates(Coordinates::new(record.latitude, record.longitude));
            }
            observations.push(observation);
        }

        if observations.len() < records.len() {
            debug!(
                variable,
                method = first_method.unwrap_or("unknown"),
                dropped = records.len() - observations.len(),
                "Dropped rows reported by other methods"
            );
        }

        Ok(Some(NormalizedSeries::new(variable, observations)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProcessingError;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn hourly_day(method: &str) -> Vec<RawRecord> {
        (0..24)
            .map(|h| {
                RawRecord::new(
                    "2018-01-01",
                    &format!("{:02}:00", h),
                    Some(h as f64),
                    34.06659,
                    -118.22688,
                    Some(method),
                )
            })
            .collect()
    }

    #[test]
    fn test_hourly_day_normalizes_to_24_rows() -> Result<()> {
        let series = RecordNormalizer::new()
            .normalize(&hourly_day("087"), "Ozone")?
            .expect("series");

        assert_eq!(series.variable(), "Ozone");
        assert_eq!(series.len(), 24);
        assert_eq!(series.first_instant(), Some(at(0)));
        assert_eq!(series.last_instant(), Some(at(23)));
        assert_eq!(series.value_at(at(10)), Some(10.0));
        assert!(series.has_coordinates());
        Ok(())
    }

    #[test]
    fn test_empty_response_is_not_an_error() -> Result<()> {
        assert!(RecordNormalizer::new().normalize(&[], "Ozone")?.is_none());
        Ok(())
    }

    #[test]
    fn test_select_single_method_keeps_first_seen() -> Result<()> {
        let mut records = hourly_day("087");
        records.insert(1, RawRecord::new("2018-01-01", "00:00", Some(9.9), 34.0, -118.0, Some("047")));
        records.push(RawRecord::new("2018-01-02", "00:00", Some(9.9), 34.0, -118.0, Some("047")));

        let mixed = RecordNormalizer::new().normalize(&records, "Ozone")?.expect("series");
        assert_eq!(mixed.len(), 26);

        let single = RecordNormalizer::new()
            .with_select_single_method(true)
            .normalize(&records, "Ozone")?
            .expect("series");
        assert_eq!(single.len(), 24);
        assert!(single.observations().iter().all(|o| o.value != Some(9.9)));
        Ok(())
    }

    #[test]
    fn test_drop_spatial_columns() -> Result<()> {
        let series = RecordNormalizer::new()
            .with_drop_spatial_columns(true)
            .normalize(&hourly_day("087"), "Benzene")?
            .expect("series");
        assert!(!series.has_coordinates());
        Ok(())
    }

    #[test]
    fn test_unparseable_time_fails_series() {
        let mut records = hourly_day("087");
        records[5].time_local = "25:00".to_string();
        assert!(RecordNormalizer::new().normalize(&records, "Ozone").is_err());
    }

    #[test]
    fn test_out_of_range_coordinates_fail_series() -> Result<()> {
        let mut records = hourly_day("087");
        records[3].latitude = 95.0;

        let result = RecordNormalizer::new().normalize(&records, "Ozone");
        assert!(matches!(result, Err(ProcessingError::Validation(_))));

        // Not checked when the coordinates are dropped anyway
        let series = RecordNormalizer::new()
            .with_drop_spatial_columns(true)
            .normalize(&records, "Benzene")?;
        assert_eq!(series.map(|s| s.len()), Some(24));
        Ok(())
    }
}
