use async_trait::async_trait;
use std::fmt;

use crate::error::Result;
use crate::models::{CodeEntry, GriddedDataset, RawRecord, SiteId};
use crate::utils::constants::{SAMPLE_DATA_BY_COUNTY, SAMPLE_DATA_BY_SITE, SAMPLE_DATA_BY_STATE};
use crate::utils::DateRange;

/// Sample-data endpoint granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endpoint {
    BySite,
    ByCounty,
    ByState,
}

impl Endpoint {
    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::BySite => SAMPLE_DATA_BY_SITE,
            Endpoint::ByCounty => SAMPLE_DATA_BY_COUNTY,
            Endpoint::ByState => SAMPLE_DATA_BY_STATE,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// One sample-data request: a parameter code over an inclusive date range at
/// a site (or the site's county/state, depending on the endpoint).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordQuery {
    pub endpoint: Endpoint,
    pub parameter_code: u32,
    pub range: DateRange,
    pub site: SiteId,
}

impl RecordQuery {
    pub fn by_site(site: &SiteId, parameter_code: u32, range: DateRange) -> Self {
        Self {
            endpoint: Endpoint::BySite,
            parameter_code,
            range,
            site: site.clone(),
        }
    }

    /// Site filters as sent to the service, narrowed to the endpoint.
    pub fn site_filters(&self) -> Vec<(&'static str, &str)> {
        let mut filters = vec![("state", self.site.state.as_str())];
        if matches!(self.endpoint, Endpoint::ByCounty | Endpoint::BySite) {
            filters.push(("county", self.site.county.as_str()));
        }
        if self.endpoint == Endpoint::BySite {
            filters.push(("site", self.site.site.as_str()));
        }
        filters
    }
}

impl fmt::Display for RecordQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} param={} {} site={}",
            self.endpoint, self.parameter_code, self.range, self.site
        )
    }
}

/// Where raw sample records and code listings come from.
///
/// An empty `Vec` from [`RecordSource::fetch_records`] is the "no data"
/// answer, not an error.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawRecord>>;

    /// Parameter listing for a class (`ALL`, `PAMS_VOC`, ...).
    async fn fetch_code_registry(&self, class_filter: &str) -> Result<Vec<CodeEntry>>;

    /// Sites listed for a county; `code` is the site code.
    async fn fetch_sites(&self, state: &str, county: &str) -> Result<Vec<CodeEntry>>;
}

/// Where gridded emissions inventories come from.
#[async_trait]
pub trait GriddedSource: Send + Sync {
    async fn fetch_gridded(&self, source_url: &str) -> Result<GriddedDataset>;
}
