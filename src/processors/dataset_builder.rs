use rayon::prelude::*;
use tracing::{debug, info};

use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{CodeRegistry, MergedTable, NormalizedSeries, RawRecord, SiteId};
use crate::processors::{
    DuplicatePolicy, DuplicateResolver, FrequencyRegularizer, RecordNormalizer, Resampler, SeriesAligner,
};
use crate::readers::{RecordQuery, RecordSource};
use crate::utils::constants::PARAM_CLASS_ALL;
use crate::utils::progress::ProgressReporter;
use crate::utils::DateRange;

/// What happened to each requested variable during a build.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildReport {
    pub requested: Vec<String>,
    pub fetched: Vec<String>,
    pub empty: Vec<String>,
    pub unresolved: Vec<String>,
    pub requests: usize,
    pub rows: usize,
}

impl BuildReport {
    pub fn generate_summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("=== Dataset Build Report ===\n");
        summary.push_str(&format!("Variables requested: {}\n", self.requested.len()));
        summary.push_str(&format!("Variables with data: {}\n", self.fetched.len()));
        summary.push_str(&format!("Requests issued: {}\n", self.requests));
        summary.push_str(&format!("Hourly rows: {}\n", self.rows));

        if !self.empty.is_empty() {
            summary.push_str(&format!("No data: {}\n", self.empty.join(", ")));
        }
        if !self.unresolved.is_empty() {
            summary.push_str(&format!("Unknown variables: {}\n", self.unresolved.join(", ")));
        }

        summary
    }
}

/// Builds the canonical hourly table for one site: fetch every variable,
/// normalize, de-duplicate, regularize, align and resample.
pub struct DatasetBuilder {
    max_workers: usize,
    normalizer: RecordNormalizer,
    duplicate_policy: DuplicatePolicy,
    regularize: bool,
}

impl DatasetBuilder {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
            normalizer: RecordNormalizer::new(),
            duplicate_policy: DuplicatePolicy::default(),
            regularize: true,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::default().with_duplicate_policy(settings.duplicate_policy)
    }

    pub fn with_duplicate_policy(mut self, duplicate_policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = duplicate_policy;
        self
    }

    pub fn with_select_single_method(mut self, select_single_method: bool) -> Self {
        self.normalizer = self.normalizer.with_select_single_method(select_single_method);
        self
    }

    pub fn with_drop_spatial_columns(mut self, drop_spatial_columns: bool) -> Self {
        self.normalizer = self.normalizer.with_drop_spatial_columns(drop_spatial_columns);
        self
    }

    /// Forward-fill each series onto an hourly grid before the join.
    pub fn with_regularize(mut self, regularize: bool) -> Self {
        self.regularize = regularize;
        self
    }

    /// Build the dataset for `variables` at `site` over `range`.
    ///
    /// Unknown variable names and variables with no data are skipped and
    /// listed in the report. A transport failure on any request fails the
    /// whole build; no partial dataset is returned.
    pub async fn build_dataset(
        &self,
        source: &dyn RecordSource,
        registry: &CodeRegistry,
        site: &SiteId,
        range: DateRange,
        variables: &[String],
        progress: Option<&ProgressReporter>,
    ) -> Result<(MergedTable, BuildReport)> {
        let mut report = BuildReport {
            requested: variables.to_vec(),
            ..BuildReport::default()
        };

        let mut codes = Vec::with_capacity(variables.len());
        for (name, result) in registry.resolve(variables) {
            match result {
                Ok(code) => codes.push((name, code)),
                Err(_) => report.unresolved.push(name),
            }
        }

        let chunks = range.split_by_year();
        let mut series: Vec<NormalizedSeries> = Vec::with_capacity(codes.len());

        for (name, code) in &codes {
            if let Some(p) = progress {
                p.set_message(&format!("Fetching {} ({})...", name, code));
            }

            let mut records: Vec<RawRecord> = Vec::new();
            for chunk in &chunks {
                let query = RecordQuery::by_site(site, *code, *chunk);
                debug!(query = %query, "Fetching records");
                records.extend(source.fetch_records(&query).await?);
                report.requests += 1;
            }

            if let Some(p) = progress {
                p.increment(1);
            }

            match self.normalizer.normalize(&records, name)? {
                Some(s) => {
                    debug!(variable = %name, observations = s.len(), "Normalized series");
                    report.fetched.push(name.clone());
                    series.push(s);
                }
                None => {
                    info!(variable = %name, site = %site, "No data for variable, skipping");
                    report.empty.push(name.clone());
                }
            }
        }

        if series.is_empty() {
            return Err(ProcessingError::MissingData(format!(
                "No data for any requested variable at site {} in {}",
                site, range
            )));
        }

        if let Some(p) = progress {
            p.set_message("Aligning series...");
        }

        let series = self.prepare_series(series)?;
        let merged = SeriesAligner::new().align(&series)?;
        let table = Resampler::new().resample(&merged)?;
        report.rows = table.len();

        info!(
            site = %site,
            variables = report.fetched.len(),
            rows = table.len(),
            "Built hourly dataset"
        );

        if let Some(p) = progress {
            p.finish_with_message(&format!("Built {} hourly rows", table.len()));
        }

        Ok((table, report))
    }

    /// The VOC variant: single measurement method per compound, no
    /// coordinates.
    pub async fn build_voc_dataset(
        &self,
        source: &dyn RecordSource,
        registry: &CodeRegistry,
        site: &SiteId,
        range: DateRange,
        compounds: &[String],
        progress: Option<&ProgressReporter>,
    ) -> Result<(MergedTable, BuildReport)> {
        let builder = Self {
            max_workers: self.max_workers,
            normalizer: self
                .normalizer
                .with_select_single_method(true)
                .with_drop_spatial_columns(true),
            duplicate_policy: self.duplicate_policy,
            regularize: self.regularize,
        };

        builder
            .build_dataset(source, registry, site, range, compounds, progress)
            .await
    }

    /// De-duplicate and regularize every series in parallel, keeping input
    /// order.
    fn prepare_series(&self, series: Vec<NormalizedSeries>) -> Result<Vec<NormalizedSeries>> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.max_workers)
            .build()
            .map_err(|e| ProcessingError::Config(e.to_string()))?;

        let resolver = DuplicateResolver::new(self.duplicate_policy);
        let regularizer = FrequencyRegularizer::hourly();
        let regularize = self.regularize;

        pool.install(|| {
            series
                .into_par_iter()
                .map(|s| {
                    let resolved = resolver.resolve(s)?;
                    if regularize {
                        regularizer.regularize(resolved)
                    } else {
                        Ok(resolved)
                    }
                })
                .collect()
        })
    }
}

impl Default for DatasetBuilder {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

/// Fetch the full parameter listing once and build the lookup from it.
pub async fn fetch_registry(source: &dyn RecordSource) -> Result<CodeRegistry> {
    let entries = source.fetch_code_registry(PARAM_CLASS_ALL).await?;
    if entries.is_empty() {
        return Err(ProcessingError::MissingData(
            "Parameter listing came back empty".to_string(),
        ));
    }

    let registry = CodeRegistry::from_entries(entries);
    info!(codes = registry.len(), "Loaded parameter registry");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CodeEntry;
    use crate::readers::InMemorySource;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2018, 1, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn site() -> SiteId {
        SiteId::new("06", "037", "1103")
    }

    fn registry() -> CodeRegistry {
        CodeRegistry::from_entries(vec![
            CodeEntry::new(44201, "Ozone"),
            CodeEntry::new(62101, "Outdoor Temperature"),
            CodeEntry::new(42101, "Carbon monoxide"),
        ])
    }

    fn hourly(date: &str, hours: impl Iterator<Item = u32>, value: f64) -> Vec<RawRecord> {
        hours
            .map(|h| RawRecord::new(date, &format!("{:02}:00", h), Some(value), 34.06659, -118.22688, Some("087")))
            .collect()
    }

    #[tokio::test]
    async fn test_build_skips_empty_and_unknown_variables() -> Result<()> {
        let source = InMemorySource::new().with_records(&site(), 44201, hourly("2018-01-01", 0..24, 0.03));
        let range = DateRange::from_yyyymmdd("20180101", "20180101")?;
        let variables: Vec<String> = ["Ozone", "Carbon monoxide", "Sulfur dioxide"]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let (table, report) = DatasetBuilder::new(2)
            .build_dataset(&source, &registry(), &site(), range, &variables, None)
            .await?;

        assert_eq!(table.len(), 24);
        assert_eq!(report.fetched, vec!["Ozone".to_string()]);
        assert_eq!(report.empty, vec!["Carbon monoxide".to_string()]);
        assert_eq!(report.unresolved, vec!["Sulfur dioxide".to_string()]);
        assert_eq!(report.requests, 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_transport_failure_aborts_build() -> Result<()> {
        let source = InMemorySource::new()
            .with_records(&site(), 44201, hourly("2018-01-01", 0..24, 0.03))
            .with_failure(62101);
        let range = DateRange::from_yyyymmdd("20180101", "20180101")?;
        let variables = vec!["Ozone".to_string(), "Outdoor Temperature".to_string()];

        let result = DatasetBuilder::new(2)
            .build_dataset(&source, &registry(), &site(), range, &variables, None)
            .await;
        assert!(matches!(result, Err(ProcessingError::Transport(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_nothing_fetched_is_missing_data() -> Result<()> {
        let source = InMemorySource::new();
        let range = DateRange::from_yyyymmdd("20180101", "20180101")?;

        let result = DatasetBuilder::new(1)
            .build_dataset(&source, &registry(), &site(), range, &["Ozone".to_string()], None)
            .await;
        assert!(matches!(result, Err(ProcessingError::MissingData(_))));
        Ok(())
    }

    #[tokio::test]
    async fn test_year_chunks_concatenated_in_request_order() -> Result<()> {
        let mut records = hourly("2017-12-31", 22..24, 1.0);
        records.extend(hourly("2018-01-01", 0..3, 2.0));
        let source = InMemorySource::new().with_records(&site(), 44201, records);
        let range = DateRange::from_yyyymmdd("20171231", "20180101")?;

        let (table, report) = DatasetBuilder::new(1)
            .build_dataset(&source, &registry(), &site(), range, &["Ozone".to_string()], None)
            .await?;

        assert_eq!(report.requests, 2);
        assert_eq!(table.len(), 5);
        assert_eq!(table.get(at(1, 0), "Ozone"), Some(2.0));
        Ok(())
    }

    #[tokio::test]
    async fn test_voc_dataset_has_no_coordinates() -> Result<()> {
        let registry = CodeRegistry::from_entries(vec![CodeEntry::new(45201, "Benzene")]);
        let mut records = hourly("2018-01-01", 0..3, 0.2);
        records.push(RawRecord::new("2018-01-01", "01:00", Some(9.0), 34.0, -118.0, Some("128")));
        let source = InMemorySource::new().with_records(&site(), 45201, records);
        let range = DateRange::from_yyyymmdd("20180101", "20180101")?;

        let (table, _) = DatasetBuilder::new(1)
            .build_voc_dataset(&source, &registry, &site(), range, &["Benzene".to_string()], None)
            .await?;

        assert!(!table.has_spatial_columns());
        assert_eq!(table.get(at(1, 1), "Benzene"), Some(0.2));
        Ok(())
    }

    #[tokio::test]
    async fn test_fetch_registry() -> Result<()> {
        let source = InMemorySource::new().with_registry(PARAM_CLASS_ALL, vec![CodeEntry::new(44201, "Ozone")]);
        let registry = fetch_registry(&source).await?;
        assert_eq!(registry.code_for("Ozone")?, 44201);

        assert!(fetch_registry(&InMemorySource::new()).await.is_err());
        Ok(())
    }
}
