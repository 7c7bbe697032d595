use chrono::NaiveDateTime;
use std::collections::BTreeMap;

use crate::error::{ProcessingError, Result};

/// An emissions inventory slice as handed over by the gridded-data reader.
///
/// Every variable is a dense `[time][latitude][longitude]` field stored
/// row-major. Sector-split variables are named `<compound>_<sector>`.
#[derive(Debug, Clone, PartialEq)]
pub struct GriddedDataset {
    pub times: Vec<NaiveDateTime>,
    pub latitudes: Vec<f64>,
    pub longitudes: Vec<f64>,
    /// Size of the sector dimension, when the source schema declares one.
    pub sector_count: Option<usize>,
    pub variables: BTreeMap<String, Vec<f64>>,
}

impl GriddedDataset {
    pub fn new(times: Vec<NaiveDateTime>, latitudes: Vec<f64>, longitudes: Vec<f64>) -> Self {
        Self {
            times,
            latitudes,
            longitudes,
            sector_count: None,
            variables: BTreeMap::new(),
        }
    }

    pub fn with_sector_count(mut self, sector_count: usize) -> Self {
        self.sector_count = Some(sector_count);
        self
    }

    fn cells(&self) -> usize {
        self.times.len() * self.latitudes.len() * self.longitudes.len()
    }

    pub fn insert_variable(&mut self, name: &str, values: Vec<f64>) -> Result<()> {
        if values.len() != self.cells() {
            return Err(ProcessingError::SchemaMismatch(format!(
                "Variable '{}' has {} values, grid has {} cells",
                name,
                values.len(),
                self.cells()
            )));
        }
        self.variables.insert(name.to_string(), values);
        Ok(())
    }

    /// Index of an exact coordinate match on one axis.
    pub fn latitude_index(&self, latitude: f64) -> Option<usize> {
        self.latitudes.iter().position(|l| *l == latitude)
    }

    pub fn longitude_index(&self, longitude: f64) -> Option<usize> {
        self.longitudes.iter().position(|l| *l == longitude)
    }

    /// Time series of one variable at one grid point.
    pub fn point_series(&self, name: &str, lat_idx: usize, lon_idx: usize) -> Option<Vec<f64>> {
        let values = self.variables.get(name)?;
        let (n_lat, n_lon) = (self.latitudes.len(), self.longitudes.len());
        if lat_idx >= n_lat || lon_idx >= n_lon || values.len() != self.cells() {
            return None;
        }

        Some(
            (0..self.times.len())
                .map(|t| values[t * n_lat * n_lon + lat_idx * n_lon + lon_idx])
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_point_series_layout() -> Result<()> {
        let times = vec![
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            NaiveDate::from_ymd_opt(2018, 2, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
        ];
        let mut dataset = GriddedDataset::new(times, vec![34.0, 34.5], vec![-118.5, -118.0, -117.5]);
        // value = t*100 + lat*10 + lon
        let values: Vec<f64> = (0..2)
            .flat_map(|t| (0..2).flat_map(move |la| (0..3).map(move |lo| (t * 100 + la * 10 + lo) as f64)))
            .collect();
        dataset.insert_variable("VOC13_0", values)?;

        assert_eq!(dataset.latitude_index(34.5), Some(1));
        assert_eq!(dataset.longitude_index(-118.0), Some(1));
        assert_eq!(dataset.longitude_index(-118.1), None);
        assert_eq!(dataset.point_series("VOC13_0", 1, 2), Some(vec![12.0, 112.0]));
        assert_eq!(dataset.point_series("VOC13_0", 2, 0), None);
        Ok(())
    }

    #[test]
    fn test_point_series_rejects_short_field() {
        let times = vec![
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap(),
            NaiveDate::from_ymd_opt(2018, 1, 1).unwrap().and_hms_opt(1, 0, 0).unwrap(),
        ];
        let mut dataset = GriddedDataset::new(times, vec![34.0], vec![-118.0]);
        dataset.variables.insert("VOC02_0".to_string(), vec![1.0]);

        assert_eq!(dataset.point_series("VOC02_0", 0, 0), None);
    }

    #[test]
    fn test_wrong_variable_size() {
        let mut dataset = GriddedDataset::new(Vec::new(), vec![34.0], vec![-118.0]);
        assert!(dataset.insert_variable("VOC13_0", vec![1.0]).is_err());
    }
}
