use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Settings;
use crate::error::Result;
use crate::models::{Availability, AvailabilityMatrix, AvailabilityMatrixBuilder, NamedSite};
use crate::processors::RecordNormalizer;
use crate::readers::{RecordQuery, RecordSource};
use crate::utils::constants::{DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT_SECS};
use crate::utils::progress::ProgressReporter;
use crate::utils::DateRange;

/// Sweeps (site, variable, window) triples and records whether each has any
/// data, with a bounded number of requests in flight.
pub struct AvailabilityProbe {
    max_concurrent: usize,
    timeout: Duration,
    normalizer: RecordNormalizer,
}

impl AvailabilityProbe {
    pub fn new(max_concurrent: usize, timeout: Duration) -> Self {
        Self {
            max_concurrent: max_concurrent.max(1),
            timeout,
            normalizer: RecordNormalizer::new(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.max_concurrent_requests, settings.request_timeout())
    }

    /// Probe every triple. A failed or timed-out request marks its own cell
    /// as [`Availability::Failed`] and the sweep carries on; the matrix is
    /// laid out by input position, not completion order.
    pub async fn probe(
        &self,
        source: Arc<dyn RecordSource>,
        sites: &[NamedSite],
        variables: &[(String, u32)],
        windows: &[DateRange],
        progress: Option<&ProgressReporter>,
    ) -> Result<AvailabilityMatrix> {
        let mut builder = AvailabilityMatrixBuilder::new(
            row_labels(sites),
            variables.iter().map(|(name, _)| name.clone()).collect(),
            windows.to_vec(),
        )?;

        let total = sites.len() * variables.len() * windows.len();
        info!(
            sites = sites.len(),
            variables = variables.len(),
            windows = windows.len(),
            max_concurrent = self.max_concurrent,
            "Starting availability sweep"
        );

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent));
        let mut tasks = JoinSet::new();

        for (site_idx, site) in sites.iter().enumerate() {
            for (var_idx, (variable, code)) in variables.iter().enumerate() {
                for (win_idx, window) in windows.iter().enumerate() {
                    let query = RecordQuery::by_site(&site.id, *code, *window);
                    let source = Arc::clone(&source);
                    let semaphore = Arc::clone(&semaphore);
                    let normalizer = self.normalizer;
                    let timeout = self.timeout;
                    let variable = variable.clone();

                    tasks.spawn(async move {
                        let outcome = match semaphore.acquire_owned().await {
                            Ok(_permit) => {
                                probe_one(source.as_ref(), &query, &variable, normalizer, timeout).await
                            }
                            Err(_) => Availability::Failed,
                        };
                        (site_idx, var_idx, win_idx, outcome)
                    });
                }
            }
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((site_idx, var_idx, win_idx, outcome)) => {
                    builder.record(site_idx, var_idx, win_idx, outcome)?;
                }
                // Left unrecorded, which the builder counts as a failure
                Err(e) => warn!(error = %e, "Probe task did not complete"),
            }
            if let Some(p) = progress {
                p.increment(1);
            }
        }

        let matrix = builder.build();
        if let Some(p) = progress {
            p.finish_with_message(&format!("Probed {} combinations", total));
        }

        Ok(matrix)
    }
}

impl Default for AvailabilityProbe {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_CONCURRENT_REQUESTS,
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        )
    }
}

/// Matrix row labels: the site name, qualified by its id when another listed
/// site shares the name.
fn row_labels(sites: &[NamedSite]) -> Vec<String> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for site in sites {
        *counts.entry(site.name.as_str()).or_default() += 1;
    }

    sites
        .iter()
        .map(|site| match counts.get(site.name.as_str()) {
            Some(&n) if n > 1 => format!("{} ({})", site.name, site.id),
            _ => site.name.clone(),
        })
        .collect()
}

async fn probe_one(
    source: &dyn RecordSource,
    query: &RecordQuery,
    variable: &str,
    normalizer: RecordNormalizer,
    timeout: Duration,
) -> Availability {
    let records = match tokio::time::timeout(timeout, source.fetch_records(query)).await {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => {
            warn!(query = %query, error = %e, "Probe fetch failed");
            return Availability::Failed;
        }
        Err(_) => {
            warn!(query = %query, timeout_secs = timeout.as_secs(), "Probe fetch timed out");
            return Availability::Failed;
        }
    };

    match normalizer.normalize(&records, variable) {
        Ok(Some(series)) if !series.is_empty() => {
            debug!(query = %query, observations = series.len(), "Data present");
            Availability::Present
        }
        Ok(_) => Availability::Empty,
        Err(e) => {
            warn!(query = %query, error = %e, "Probe response could not be normalized");
            Availability::Failed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RawRecord, SiteId};
    use crate::readers::InMemorySource;

    fn sites() -> Vec<NamedSite> {
        vec![
            NamedSite::new(SiteId::new("06", "037", "1103"), "Los Angeles-North Main Street"),
            NamedSite::new(SiteId::new("06", "037", "4002"), "Long Beach"),
        ]
    }

    fn variables() -> Vec<(String, u32)> {
        vec![
            ("Ozone".to_string(), 44201),
            ("Carbon monoxide".to_string(), 42101),
            ("Outdoor Temperature".to_string(), 62101),
        ]
    }

    fn windows() -> Vec<DateRange> {
        DateRange::from_yyyymmdd("20180101", "20180630")
            .and_then(|r| r.sampling_windows(3, 1))
            .unwrap()
    }

    fn record(date: &str) -> RawRecord {
        RawRecord::new(date, "00:00", Some(1.0), 34.0, -118.0, Some("087"))
    }

    #[tokio::test]
    async fn test_matrix_marks_present_empty_and_failed() -> Result<()> {
        let sites = sites();
        let source = InMemorySource::new()
            .with_records(&sites[0].id, 44201, vec![record("2018-01-01"), record("2018-04-01")])
            .with_records(&sites[1].id, 44201, vec![record("2018-04-01")])
            .with_failure(62101);

        let matrix = AvailabilityProbe::new(3, Duration::from_secs(5))
            .probe(Arc::new(source), &sites, &variables(), &windows(), None)
            .await?;

        let north_main = "Los Angeles-North Main Street";
        assert_eq!(matrix.cell(north_main, 0, 0), Some(Availability::Present));
        assert_eq!(matrix.cell(north_main, 0, 1), Some(Availability::Present));
        assert_eq!(matrix.cell(north_main, 1, 0), Some(Availability::Empty));
        assert_eq!(matrix.cell(north_main, 2, 1), Some(Availability::Failed));
        assert_eq!(matrix.cell("Long Beach", 0, 0), Some(Availability::Empty));
        assert_eq!(matrix.cell("Long Beach", 0, 1), Some(Availability::Present));

        assert_eq!(matrix.score(north_main), 2);
        assert_eq!(matrix.failures(north_main), 2);
        assert_eq!(matrix.ranking()[0].0, north_main);
        Ok(())
    }

    #[tokio::test]
    async fn test_timeout_recorded_as_failure() -> Result<()> {
        let sites = sites();
        let source = InMemorySource::new()
            .with_records(&sites[0].id, 44201, vec![record("2018-01-01")])
            .with_delay(44201, Duration::from_millis(500));

        let matrix = AvailabilityProbe::new(4, Duration::from_millis(20))
            .probe(Arc::new(source), &sites[..1], &variables()[..1], &windows()[..1], None)
            .await?;

        assert_eq!(
            matrix.cell("Los Angeles-North Main Street", 0, 0),
            Some(Availability::Failed)
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_sweep_is_deterministic() -> Result<()> {
        let sites = sites();
        let build = || {
            InMemorySource::new()
                .with_records(&sites[1].id, 42101, vec![record("2018-01-01")])
                .with_failure(62101)
        };

        let one = AvailabilityProbe::new(1, Duration::from_secs(5))
            .probe(Arc::new(build()), &sites, &variables(), &windows(), None)
            .await?;
        let many = AvailabilityProbe::new(8, Duration::from_secs(5))
            .probe(Arc::new(build()), &sites, &variables(), &windows(), None)
            .await?;

        for site in ["Los Angeles-North Main Street", "Long Beach"] {
            assert_eq!(one.row(site), many.row(site));
        }
        Ok(())
    }

    #[tokio::test]
    async fn test_shared_site_names_get_separate_rows() -> Result<()> {
        let sites = vec![
            NamedSite::new(SiteId::new("06", "037", "1103"), "Los Angeles"),
            NamedSite::new(SiteId::new("06", "037", "4002"), "Los Angeles"),
        ];
        let source = InMemorySource::new().with_records(&sites[1].id, 44201, vec![record("2018-01-01")]);

        let matrix = AvailabilityProbe::new(2, Duration::from_secs(5))
            .probe(Arc::new(source), &sites, &variables()[..1], &windows()[..1], None)
            .await?;

        assert_eq!(matrix.cell("Los Angeles (06-037-1103)", 0, 0), Some(Availability::Empty));
        assert_eq!(matrix.cell("Los Angeles (06-037-4002)", 0, 0), Some(Availability::Present));
        assert_eq!(matrix.ranking().len(), 2);
        assert_eq!(matrix.ranking()[0], ("Los Angeles (06-037-4002)".to_string(), 1));
        Ok(())
    }
}
