use tracing::debug;

use crate::error::{ProcessingError, Result};
use crate::models::{GriddedDataset, MergedTable};
use crate::utils::constants::DEFAULT_SECTOR_COUNT;

/// Collapses per-sector emission columns (`<compound>_<sector>`) into one
/// total column per compound.
#[derive(Debug, Clone, Copy)]
pub struct SectorAggregator {
    expected_sectors: usize,
}

impl SectorAggregator {
    pub fn new() -> Self {
        Self {
            expected_sectors: DEFAULT_SECTOR_COUNT,
        }
    }

    pub fn with_expected_sectors(mut self, expected_sectors: usize) -> Self {
        self.expected_sectors = expected_sectors;
        self
    }

    /// Use the sector dimension declared by the dataset, if it declares one.
    pub fn for_dataset(dataset: &GriddedDataset) -> Self {
        Self::new().with_expected_sectors(dataset.sector_count.unwrap_or(DEFAULT_SECTOR_COUNT))
    }

    pub fn expected_sectors(&self) -> usize {
        self.expected_sectors
    }

    /// Sum each compound's sector columns row-wise into a column named after
    /// the compound and drop the sector columns.
    ///
    /// Every compound must match exactly the expected number of columns;
    /// otherwise nothing is produced and the call fails with
    /// [`ProcessingError::SchemaMismatch`].
    pub fn aggregate(&self, table: &MergedTable, compounds: &[String]) -> Result<MergedTable> {
        let mut groups: Vec<(&str, Vec<usize>)> = Vec::with_capacity(compounds.len());

        for compound in compounds {
            let prefix = format!("{}_", compound);
            let positions: Vec<usize> = table
                .columns()
                .iter()
                .enumerate()
                .filter(|(_, name)| name.starts_with(&prefix))
                .map(|(i, _)| i)
                .collect();

            if positions.len() != self.expected_sectors {
                return Err(ProcessingError::SchemaMismatch(format!(
                    "Compound '{}' has {} sector columns, expected {}",
                    compound,
                    positions.len(),
                    self.expected_sectors
                )));
            }
            groups.push((compound.as_str(), positions));
        }

        let consumed: Vec<bool> = (0..table.columns().len())
            .map(|i| groups.iter().any(|(_, positions)| positions.contains(&i)))
            .collect();

        let mut columns: Vec<String> = table
            .columns()
            .iter()
            .zip(&consumed)
            .filter(|(_, used)| !**used)
            .map(|(name, _)| name.clone())
            .collect();
        columns.extend(groups.iter().map(|(compound, _)| compound.to_string()));

        let mut output = MergedTable::new(columns)?;
        for (instant, values) in table.rows() {
            let mut row: Vec<Option<f64>> = values
                .iter()
                .zip(&consumed)
                .filter(|(_, used)| !**used)
                .map(|(value, _)| *value)
                .collect();

            for (_, positions) in &groups {
                row.push(positions.iter().filter_map(|&p| values[p]).fold(None, |total, v| {
                    Some(total.unwrap_or(0.0) + v)
                }));
            }
            output.push_row(instant, row)?;
        }

        debug!(
            compounds = groups.len(),
            sectors = self.expected_sectors,
            "Aggregated sector columns"
        );

        Ok(output)
    }
}

impl Default for SectorAggregator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveDateTime};
    use pretty_assertions::assert_eq;

    fn at(hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 1, 1)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn sector_table(compound: &str, sectors: usize) -> MergedTable {
        let columns: Vec<String> = (0..sectors).map(|s| format!("{}_{}", compound, s)).collect();
        let mut table = MergedTable::new(columns).unwrap();
        table
            .push_row(at(0), (0..sectors).map(|s| Some(s as f64 + 1.0)).collect())
            .unwrap();
        table
            .push_row(at(1), (0..sectors).map(|s| Some(0.5 * s as f64)).collect())
            .unwrap();
        table
    }

    #[test]
    fn test_eight_sectors_summed_and_dropped() -> Result<()> {
        let table = sector_table("VOC02", 8);
        let output = SectorAggregator::new().aggregate(&table, &["VOC02".to_string()])?;

        assert_eq!(output.columns(), &["VOC02".to_string()][..]);
        // 1 + 2 + ... + 8
        assert_eq!(output.get(at(0), "VOC02"), Some(36.0));
        // 0.5 * (0 + 1 + ... + 7)
        assert_eq!(output.get(at(1), "VOC02"), Some(14.0));
        assert!(!output.columns().iter().any(|c| c.starts_with("VOC02_")));
        Ok(())
    }

    #[test]
    fn test_seven_or_nine_sectors_rejected() {
        for sectors in [7, 9] {
            let table = sector_table("VOC02", sectors);
            let result = SectorAggregator::new().aggregate(&table, &["VOC02".to_string()]);
            assert!(matches!(result, Err(ProcessingError::SchemaMismatch(_))));
        }
    }

    #[test]
    fn test_one_bad_compound_rejects_whole_table() {
        let mut table = sector_table("VOC02", 8);
        table.add_column("VOC13_0", vec![Some(1.0), Some(1.0)]).unwrap();

        let result = SectorAggregator::new()
            .aggregate(&table, &["VOC02".to_string(), "VOC13".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_other_columns_pass_through() -> Result<()> {
        let mut table = sector_table("VOC02", 8);
        table.add_column("Benzene", vec![Some(0.3), None])?;

        let output = SectorAggregator::new().aggregate(&table, &["VOC02".to_string()])?;

        assert_eq!(output.columns(), &["Benzene".to_string(), "VOC02".to_string()][..]);
        assert_eq!(output.get(at(0), "Benzene"), Some(0.3));
        assert_eq!(output.get(at(1), "Benzene"), None);
        Ok(())
    }

    #[test]
    fn test_missing_sectors_skipped_in_sum() -> Result<()> {
        let columns: Vec<String> = (0..8).map(|s| format!("VOC05_{}", s)).collect();
        let mut table = MergedTable::new(columns)?;
        let mut partial = vec![None; 8];
        partial[2] = Some(4.0);
        partial[6] = Some(1.5);
        table.push_row(at(0), partial)?;
        table.push_row(at(1), vec![None; 8])?;

        let output = SectorAggregator::new().aggregate(&table, &["VOC05".to_string()])?;
        assert_eq!(output.get(at(0), "VOC05"), Some(5.5));
        assert_eq!(output.get(at(1), "VOC05"), None);
        Ok(())
    }

    #[test]
    fn test_expected_count_from_dataset_schema() -> Result<()> {
        let dataset = GriddedDataset::new(vec![at(0)], vec![34.0], vec![-118.0]).with_sector_count(7);
        let aggregator = SectorAggregator::for_dataset(&dataset);
        assert_eq!(aggregator.expected_sectors(), 7);

        let output = aggregator.aggregate(&sector_table("VOC02", 7), &["VOC02".to_string()])?;
        assert_eq!(output.get(at(0), "VOC02"), Some(28.0));

        let undeclared = GriddedDataset::new(vec![at(0)], vec![34.0], vec![-118.0]);
        assert_eq!(SectorAggregator::for_dataset(&undeclared).expected_sectors(), 8);
        Ok(())
    }
}
