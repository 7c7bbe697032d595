use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

use crate::error::Result;
use crate::models::{MergedTable, NormalizedSeries, Observation};
use crate::utils::constants::{LATITUDE_COLUMN, LONGITUDE_COLUMN};

/// A column of the joined table before projection, namespaced by the input
/// series it came from so same-named fields never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceField {
    Value,
    Latitude,
    Longitude,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SourceColumn {
    source: usize,
    field: SourceField,
}

/// Outer-joins per-variable series on their instant index.
#[derive(Debug, Default, Clone, Copy)]
pub struct SeriesAligner;

impl SeriesAligner {
    pub fn new() -> Self {
        Self
    }

    /// Join `series` into one table over the union of their instants.
    ///
    /// Columns are the distinct variable names in input order; when two inputs
    /// share a name the earlier one's value wins and the later one only fills
    /// its gaps. One latitude/longitude pair is kept, taken from the first
    /// input that carries coordinates.
    pub fn align(&self, series: &[NormalizedSeries]) -> Result<MergedTable> {
        let lookups: Vec<HashMap<NaiveDateTime, &Observation>> = series
            .iter()
            .map(|s| s.observations().iter().map(|o| (o.instant, o)).collect())
            .collect();

        let instants: BTreeSet<NaiveDateTime> = series.iter().flat_map(|s| s.instants()).collect();

        let namespaced = Self::namespaced_columns(series);
        let (names, projection) = Self::project(series, &namespaced);

        let mut table = MergedTable::new(names)?;
        for instant in instants {
            let row = projection
                .iter()
                .map(|sources| {
                    sources.iter().find_map(|column| {
                        let observation = lookups[column.source].get(&instant)?;
                        match column.field {
                            SourceField::Value => observation.value,
                            SourceField::Latitude => observation.coordinates.map(|c| c.latitude),
                            SourceField::Longitude => observation.coordinates.map(|c| c.longitude),
                        }
                    })
                })
                .collect();
            table.push_row(instant, row)?;
        }

        Ok(table)
    }

    fn namespaced_columns(series: &[NormalizedSeries]) -> Vec<SourceColumn> {
        let mut columns = Vec::new();
        for (source, s) in series.iter().enumerate() {
            columns.push(SourceColumn {
                source,
                field: SourceField::Value,
            });
            if s.has_coordinates() {
                columns.push(SourceColumn {
                    source,
                    field: SourceField::Latitude,
                });
                columns.push(SourceColumn {
                    source,
                    field: SourceField::Longitude,
                });
            }
        }
        columns
    }

    /// Map the namespaced columns down to output columns. Each output column
    /// lists its candidate source columns in priority order.
    fn project(
        series: &[NormalizedSeries],
        namespaced: &[SourceColumn],
    ) -> (Vec<String>, Vec<Vec<SourceColumn>>) {
        let mut names: Vec<String> = Vec::new();
        let mut projection: Vec<Vec<SourceColumn>> = Vec::new();

        for column in namespaced.iter().filter(|c| c.field == SourceField::Value) {
            let variable = series[column.source].variable();
            match names.iter().position(|n| n == variable) {
                Some(existing) => projection[existing].push(*column),
                None => {
                    names.push(variable.to_string());
                    projection.push(vec![*column]);
                }
            }
        }

        let canonical = namespaced
            .iter()
            .find(|c| c.field == SourceField::Latitude)
            .map(|c| c.source);

        if let Some(source) = canonical {
            for (name, field) in [
                (LATITUDE_COLUMN, SourceField::Latitude),
                (LONGITUDE_COLUMN, SourceField::Longitude),
            ] {
                names.push(name.to_string());
                projection.push(vec![SourceColumn { source, field }]);
            }
        }

        (names, projection)
    }
}
