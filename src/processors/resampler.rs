use chrono::{Duration, NaiveDateTime, Timelike};

use crate::error::{ProcessingError, Result};
use crate::models::MergedTable;

/// Collapses a merged table onto a strict one-row-per-hour grid.
///
/// Rows are grouped by the hour they fall in and each column is replaced by
/// the mean of its present values. Every hour between the first and last
/// group gets a row; hours with nothing reported are all-missing rows.
#[derive(Debug, Default, Clone, Copy)]
pub struct Resampler;

impl Resampler {
    pub fn new() -> Self {
        Self
    }

    pub fn resample(&self, table: &MergedTable) -> Result<MergedTable> {
        let width = table.columns().len();
        let mut output = MergedTable::new(table.columns().to_vec())?;

        let mut rows = table.rows().peekable();
        let Some((first, _)) = rows.peek() else {
            return Ok(output);
        };

        let mut hour = floor_to_hour(*first)?;
        let mut sums: Vec<Option<(f64, usize)>> = vec![None; width];

        for (instant, values) in rows {
            let bucket = floor_to_hour(instant)?;

            while bucket > hour {
                output.push_row(hour, means(&sums))?;
                sums.iter_mut().for_each(|s| *s = None);
                hour += Duration::hours(1);
            }

            for (acc, value) in sums.iter_mut().zip(values) {
                if let Some(v) = value {
                    *acc = Some(match acc.take() {
                        Some((sum, count)) => (sum + v, count + 1),
                        None => (*v, 1),
                    });
                }
            }
        }
        output.push_row(hour, means(&sums))?;

        Ok(output)
    }
}

fn means(sums: &[Option<(f64, usize)>]) -> Vec<Option<f64>> {
    sums.iter()
        .map(|s| s.map(|(sum, count)| if count == 1 { sum } else { sum / count as f64 }))
        .collect()
}

fn floor_to_hour(instant: NaiveDateTime) -> Result<NaiveDateTime> {
    instant
        .date()
        .and_hms_opt(instant.hour(), 0, 0)
        .ok_or_else(|| ProcessingError::InvalidFormat(format!("Cannot floor {} to the hour", instant)))
}
