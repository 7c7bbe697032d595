use chrono::Duration;
use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{NormalizedSeries, Observation};

/// Forward-fills a series onto an hourly grid anchored at its first instant.
///
/// Original observations are all kept; a filled observation is added for each
/// grid instant up to the last observation that the source did not report.
/// Nothing is ever filled before the first observation.
#[derive(Debug, Clone, Copy)]
pub struct FrequencyRegularizer {
    step: Duration,
}

impl FrequencyRegularizer {
    pub fn hourly() -> Self {
        Self {
            step: Duration::hours(1),
        }
    }

    pub fn regularize(&self, series: NormalizedSeries) -> Result<NormalizedSeries> {
        if !series.is_strictly_increasing() {
            return Err(ProcessingError::InvalidFormat(format!(
                "Series '{}' must have a unique increasing index before regularizing",
                series.variable()
            )));
        }

        let (first, last) = match (series.first_instant(), series.last_instant()) {
            (Some(first), Some(last)) => (first, last),
            _ => return Ok(series),
        };

        let variable = series.variable().to_string();
        let observations = series.into_observations();
        let original_len = observations.len();

        let mut filled: Vec<Observation> = Vec::with_capacity(original_len);
        let mut pending = observations.into_iter().peekable();
        let mut slot = first;

        while slot <= last {
            while let Some(observation) = pending.next_if(|o| o.instant < slot) {
                filled.push(observation);
            }

            let reported = pending.peek().is_some_and(|o| o.instant == slot);
            if !reported {
                if let Some(prior) = filled.last() {
                    filled.push(Observation {
                        instant: slot,
                        value: prior.value,
                        coordinates: prior.coordinates,
                    });
                }
            }

            slot += self.step;
        }
        filled.extend(pending);

        if filled.len() > original_len {
            debug!(
                variable = %variable,
                filled = filled.len() - original_len,
                "Forward-filled hourly slots"
            );
        }

        Ok(NormalizedSeries::new(&variable, filled))
    }
}

impl Default for FrequencyRegularizer {
    fn default() -> Self {
        Self::hourly()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32, minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 1, day)
            .unwrap()
            .and_hms_opt(hour, minute, 0)
            .unwrap()
    }

    #[test]
    fn test_hourly_series_is_unchanged() -> Result<()> {
        let input = NormalizedSeries::new(
            "Ozone",
            (0..24).map(|h| Observation::new(at(1, h, 0), Some(h as f64))).collect(),
        );
        let output = FrequencyRegularizer::hourly().regularize(input.clone())?;
        assert_eq!(output, input);
        Ok(())
    }

    #[test]
    fn test_three_hourly_forward_filled() -> Result<()> {
        let input = NormalizedSeries::new(
            "Outdoor Temperature",
            (0..8).map(|i| Observation::new(at(1, i * 3, 0), Some(50.0 + i as f64))).collect(),
        );
        let output = FrequencyRegularizer::hourly().regularize(input)?;

        // 00:00 through 21:00
        assert_eq!(output.len(), 22);
        assert!(output.is_strictly_increasing());
        assert_eq!(output.value_at(at(1, 1, 0)), Some(50.0));
        assert_eq!(output.value_at(at(1, 2, 0)), Some(50.0));
        assert_eq!(output.value_at(at(1, 3, 0)), Some(51.0));
        assert_eq!(output.value_at(at(1, 20, 0)), Some(56.0));
        assert_eq!(output.last_instant(), Some(at(1, 21, 0)));
        Ok(())
    }

    #[test]
    fn test_daily_series_filled_between_days() -> Result<()> {
        let input = NormalizedSeries::new(
            "Mixing Height",
            vec![
                Observation::new(at(1, 0, 0), Some(300.0)),
                Observation::new(at(2, 0, 0), Some(450.0)),
            ],
        );
        let output = FrequencyRegularizer::hourly().regularize(input)?;
        assert_eq!(output.len(), 25);
        assert_eq!(output.value_at(at(1, 23, 0)), Some(300.0));
        assert_eq!(output.value_at(at(2, 0, 0)), Some(450.0));
        Ok(())
    }

    #[test]
    fn test_never_fills_backward() -> Result<()> {
        let input = NormalizedSeries::new(
            "Ozone",
            vec![
                Observation::new(at(1, 5, 0), Some(1.0)),
                Observation::new(at(1, 7, 0), Some(2.0)),
            ],
        );
        let output = FrequencyRegularizer::hourly().regularize(input)?;
        assert_eq!(output.first_instant(), Some(at(1, 5, 0)));
        assert_eq!(output.len(), 3);
        Ok(())
    }

    #[test]
    fn test_off_grid_observations_kept() -> Result<()> {
        let input = NormalizedSeries::new(
            "Ozone",
            vec![
                Observation::new(at(1, 0, 0), Some(1.0)),
                Observation::new(at(1, 0, 30), Some(2.0)),
                Observation::new(at(1, 2, 0), Some(3.0)),
            ],
        );
        let output = FrequencyRegularizer::hourly().regularize(input)?;

        assert_eq!(output.len(), 4);
        assert_eq!(output.value_at(at(1, 0, 30)), Some(2.0));
        // Most recent prior value, the off-grid one
        assert_eq!(output.value_at(at(1, 1, 0)), Some(2.0));
        Ok(())
    }

    #[test]
    fn test_requires_unique_index() {
        let input = NormalizedSeries::new(
            "Ozone",
            vec![
                Observation::new(at(1, 1, 0), Some(1.0)),
                Observation::new(at(1, 1, 0), Some(2.0)),
            ],
        );
        assert!(FrequencyRegularizer::hourly().regularize(input).is_err());
    }
}
