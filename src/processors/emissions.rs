use tracing::info;

use crate::error::{ProcessingError, Result};
use crate::models::{GriddedDataset, MergedTable};
use crate::processors::SectorAggregator;

/// Pulls point time series out of a gridded emissions inventory.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmissionsExtractor;

impl EmissionsExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the grid cell at exactly (`latitude`, `longitude`).
    ///
    /// Only variables named `<compound>_<sector>` (or `<compound>`) for a
    /// compound in `keep` are returned. The table is indexed by the
    /// dataset's time axis; non-finite cells become missing values.
    pub fn extract(
        &self,
        dataset: &GriddedDataset,
        latitude: f64,
        longitude: f64,
        keep: &[String],
    ) -> Result<MergedTable> {
        let lat_idx = dataset.latitude_index(latitude).ok_or_else(|| {
            ProcessingError::SchemaMismatch(format!("Latitude {} is not on the emissions grid", latitude))
        })?;
        let lon_idx = dataset.longitude_index(longitude).ok_or_else(|| {
            ProcessingError::SchemaMismatch(format!("Longitude {} is not on the emissions grid", longitude))
        })?;

        let names: Vec<String> = dataset
            .variables
            .keys()
            .filter(|name| keep.iter().any(|compound| belongs_to(name, compound)))
            .cloned()
            .collect();

        let mut series = Vec::with_capacity(names.len());
        for name in &names {
            let values = dataset.point_series(name, lat_idx, lon_idx).ok_or_else(|| {
                ProcessingError::SchemaMismatch(format!("Variable '{}' cannot be indexed", name))
            })?;
            series.push(values);
        }

        let mut table = MergedTable::new(names)?;
        for (t, instant) in dataset.times.iter().enumerate() {
            let row = series
                .iter()
                .map(|values| Some(values[t]).filter(|v| v.is_finite()))
                .collect();
            table.push_row(*instant, row)?;
        }

        Ok(table)
    }

    /// Extract the grid cell and collapse its sector columns into one total
    /// per compound in `keep`.
    pub fn extract_totals(
        &self,
        dataset: &GriddedDataset,
        latitude: f64,
        longitude: f64,
        keep: &[String],
    ) -> Result<MergedTable> {
        let table = self.extract(dataset, latitude, longitude, keep)?;
        let totals = SectorAggregator::for_dataset(dataset).aggregate(&table, keep)?;

        info!(
            latitude,
            longitude,
            compounds = keep.len(),
            rows = totals.len(),
            "Extracted emission totals"
        );
        Ok(totals)
    }
}

fn belongs_to(name: &str, compound: &str) -> bool {
    name == compound
        || name
            .strip_prefix(compound)
            .is_some_and(|rest| rest.starts_with('_'))
}
