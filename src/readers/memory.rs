use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{ProcessingError, Result};
use crate::models::{CodeEntry, GriddedDataset, RawRecord, SiteId};
use crate::readers::{GriddedSource, RecordQuery, RecordSource};

/// A [`RecordSource`] serving canned responses from memory.
///
/// Records are stored per (parameter code, site) and filtered by the query's
/// date range, so year-chunked requests behave like the live service.
/// Failures and slow responses can be injected per parameter code.
#[derive(Debug, Default)]
pub struct InMemorySource {
    records: HashMap<(u32, SiteId), Vec<RawRecord>>,
    registry: HashMap<String, Vec<CodeEntry>>,
    sites: HashMap<(String, String), Vec<CodeEntry>>,
    gridded: HashMap<String, GriddedDataset>,
    failing: HashSet<u32>,
    delays: HashMap<u32, Duration>,
    calls: AtomicUsize,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(mut self, site: &SiteId, parameter_code: u32, records: Vec<RawRecord>) -> Self {
        self.records
            .entry((parameter_code, site.clone()))
            .or_default()
            .extend(records);
        self
    }

    pub fn with_registry(mut self, class_filter: &str, entries: Vec<CodeEntry>) -> Self {
        self.registry.insert(class_filter.to_string(), entries);
        self
    }

    pub fn with_sites(mut self, state: &str, county: &str, sites: Vec<CodeEntry>) -> Self {
        self.sites.insert((state.to_string(), county.to_string()), sites);
        self
    }

    pub fn with_gridded(mut self, source_url: &str, dataset: GriddedDataset) -> Self {
        self.gridded.insert(source_url.to_string(), dataset);
        self
    }

    /// Every request for `parameter_code` fails with a transport error.
    pub fn with_failure(mut self, parameter_code: u32) -> Self {
        self.failing.insert(parameter_code);
        self
    }

    /// Every request for `parameter_code` takes `delay` to answer.
    pub fn with_delay(mut self, parameter_code: u32, delay: Duration) -> Self {
        self.delays.insert(parameter_code, delay);
        self
    }

    /// Number of record requests served so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn record_date(record: &RawRecord) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(record.date_local.trim(), "%Y-%m-%d").ok()
}

#[async_trait]
impl RecordSource for InMemorySource {
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(delay) = self.delays.get(&query.parameter_code) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing.contains(&query.parameter_code) {
            return Err(ProcessingError::Transport(format!(
                "Injected failure for {}",
                query
            )));
        }

        let records = self
            .records
            .get(&(query.parameter_code, query.site.clone()))
            .map(|records| {
                records
                    .iter()
                    .filter(|r| {
                        record_date(r).is_some_and(|d| d >= query.range.begin && d <= query.range.end)
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(records)
    }

    async fn fetch_code_registry(&self, class_filter: &str) -> Result<Vec<CodeEntry>> {
        Ok(self.registry.get(class_filter).cloned().unwrap_or_default())
    }

    async fn fetch_sites(&self, state: &str, county: &str) -> Result<Vec<CodeEntry>> {
        Ok(self
            .sites
            .get(&(state.to_string(), county.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[async_trait]
impl GriddedSource for InMemorySource {
    async fn fetch_gridded(&self, source_url: &str) -> Result<GriddedDataset> {
        self.gridded
            .get(source_url)
            .cloned()
            .ok_or_else(|| ProcessingError::Transport(format!("No gridded dataset at {}", source_url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::DateRange;

    #[tokio::test]
    async fn test_records_filtered_by_range() -> Result<()> {
        let site = SiteId::new("06", "037", "1103");
        let source = InMemorySource::new().with_records(
            &site,
            44201,
            vec![
                RawRecord::new("2017-12-31", "23:00", Some(0.01), 34.0, -118.0, None),
                RawRecord::new("2018-01-01", "00:00", Some(0.02), 34.0, -118.0, None),
            ],
        );

        let range = DateRange::from_yyyymmdd("20180101", "20181231")?;
        let records = source
            .fetch_records(&RecordQuery::by_site(&site, 44201, range))
            .await?;

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].date_local, "2018-01-01");
        assert_eq!(source.calls(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_injected_failure() -> Result<()> {
        let site = SiteId::new("06", "037", "1103");
        let source = InMemorySource::new().with_failure(42101);
        let range = DateRange::from_yyyymmdd("20180101", "20180102")?;

        let result = source.fetch_records(&RecordQuery::by_site(&site, 42101, range)).await;
        assert!(matches!(result, Err(ProcessingError::Transport(_))));
        Ok(())
    }
}
