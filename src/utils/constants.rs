/// AQS Data Mart base URL
pub const AQS_BASE_URL: &str = "https://aqs.epa.gov/data/api/";

/// Sample data endpoints
pub const SAMPLE_DATA_BY_SITE: &str = "sampleData/bySite";
pub const SAMPLE_DATA_BY_COUNTY: &str = "sampleData/byCounty";
pub const SAMPLE_DATA_BY_STATE: &str = "sampleData/byState";

/// Listing endpoints
pub const LIST_SITES_BY_COUNTY: &str = "list/sitesByCounty";
pub const LIST_PARAM_IN_CLASS: &str = "list/parametersByClass";

/// Parameter classes
pub const PARAM_CLASS_ALL: &str = "ALL";
pub const PARAM_CLASS_PAMS_VOC: &str = "PAMS_VOC";

/// Response header statuses
pub const STATUS_SUCCESS: &str = "Success";
pub const STATUS_NO_DATA: &str = "No data matched your selection";

/// Criteria pollutants fetched for the core dataset
pub const CRITERIA_POLLUTANTS: &[&str] = &[
    "Carbon monoxide",
    "Nitrogen dioxide (NO2)",
    "Ozone",
    "PM2.5 - Local Conditions",
];

/// Meteorological variables fetched for the core dataset.
/// "Relative Humidity " carries a trailing space in the registry.
pub const MET_VARS: &[&str] = &[
    "Wind Direction - Resultant",
    "Mixing Height",
    "Outdoor Temperature",
    "Relative Humidity ",
    "Solar radiation",
    "Ultraviolet radiation",
    "Barometric pressure",
    "Rain/melt precipitation",
];

/// Canonical spatial column names
pub const LATITUDE_COLUMN: &str = "latitude";
pub const LONGITUDE_COLUMN: &str = "longitude";
pub const DATETIME_COLUMN: &str = "datetime";

/// Sector columns per compound in the CEDS speciated-VOC release
pub const DEFAULT_SECTOR_COUNT: usize = 8;

/// Processing defaults
pub const DEFAULT_MAX_CONCURRENT_REQUESTS: usize = 4;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_RETRY_ATTEMPTS: u32 = 2;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 500;
pub const DEFAULT_ROW_GROUP_SIZE: usize = 10000;
pub const DEFAULT_PROBE_STEP_MONTHS: u32 = 3;
pub const DEFAULT_PROBE_SPAN_DAYS: u32 = 1;

/// Parquet compression options
pub const COMPRESSION_SNAPPY: &str = "snappy";
pub const COMPRESSION_GZIP: &str = "gzip";
pub const COMPRESSION_LZ4: &str = "lz4";
pub const COMPRESSION_ZSTD: &str = "zstd";
pub const COMPRESSION_NONE: &str = "none";
