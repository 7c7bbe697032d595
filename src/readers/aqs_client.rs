use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::config::Settings;
use crate::error::{ProcessingError, Result};
use crate::models::{CodeEntry, RawRecord};
use crate::readers::{RecordQuery, RecordSource, RetryPolicy};
use crate::utils::constants::{LIST_PARAM_IN_CLASS, LIST_SITES_BY_COUNTY, STATUS_NO_DATA, STATUS_SUCCESS};

const USER_AGENT: &str = concat!("aqs-pipeline/", env!("CARGO_PKG_VERSION"));

/// Every AQS Data Mart response wraps its rows in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(rename = "Header")]
    header: Vec<Header>,
    #[serde(rename = "Data", default = "Vec::new")]
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Header {
    status: String,
    #[serde(default)]
    error: Option<Vec<String>>,
}

/// Site listings carry rows without a name; those are not real sites.
#[derive(Debug, Deserialize)]
struct SiteRow {
    code: String,
    value_represented: Option<String>,
}

/// HTTP client for the AQS Data Mart API.
pub struct AqsClient {
    http_client: reqwest::Client,
    base_url: String,
    email: String,
    key: String,
    timeout: Duration,
    retry: RetryPolicy,
}

impl AqsClient {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(settings.request_timeout())
            .build()?;

        let mut base_url = settings.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            http_client,
            base_url,
            email: settings.email.clone(),
            key: settings.key.clone(),
            timeout: settings.request_timeout(),
            retry: settings.retry_policy(),
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<T>> {
        self.retry
            .run(path, || self.get_once::<T>(path, params))
            .await
    }

    async fn get_once<T: DeserializeOwned>(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<T>> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "Querying AQS API");

        let response = self
            .http_client
            .get(&url)
            .query(&[("email", self.email.as_str()), ("key", self.key.as_str())])
            .query(params)
            .send()
            .await
            .map_err(|e| self.transport_error(e, path))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProcessingError::Transport(format!(
                "{} returned HTTP {}: {}",
                path,
                status.as_u16(),
                body
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| self.transport_error(e, path))?;

        parse_envelope(&body)
    }

    fn transport_error(&self, err: reqwest::Error, path: &str) -> ProcessingError {
        if err.is_timeout() {
            ProcessingError::Timeout {
                seconds: self.timeout.as_secs(),
                context: path.to_string(),
            }
        } else {
            ProcessingError::from(err)
        }
    }
}

/// Decode an envelope: rows on success, nothing on the "no data" status,
/// a transport error for any other status.
fn parse_envelope<T: DeserializeOwned>(body: &str) -> Result<Vec<T>> {
    let envelope: Envelope<T> = serde_json::from_str(body)
        .map_err(|e| ProcessingError::SchemaMismatch(format!("Unexpected response shape: {}", e)))?;

    let header = envelope
        .header
        .first()
        .ok_or_else(|| ProcessingError::SchemaMismatch("Response has an empty Header".to_string()))?;

    match header.status.as_str() {
        STATUS_SUCCESS => Ok(envelope.data),
        STATUS_NO_DATA => Ok(Vec::new()),
        other => Err(ProcessingError::Transport(format!(
            "Service reported '{}': {}",
            other,
            header.error.as_deref().unwrap_or_default().join("; ")
        ))),
    }
}

#[async_trait]
impl RecordSource for AqsClient {
    async fn fetch_records(&self, query: &RecordQuery) -> Result<Vec<RawRecord>> {
        let mut params = vec![
            ("param", query.parameter_code.to_string()),
            ("bdate", query.range.begin_yyyymmdd()),
            ("edate", query.range.end_yyyymmdd()),
        ];
        params.extend(
            query
                .site_filters()
                .into_iter()
                .map(|(name, value)| (name, value.to_string())),
        );

        self.get(query.endpoint.path(), &params).await
    }

    async fn fetch_code_registry(&self, class_filter: &str) -> Result<Vec<CodeEntry>> {
        self.get(LIST_PARAM_IN_CLASS, &[("pc", class_filter.to_string())])
            .await
    }

    async fn fetch_sites(&self, state: &str, county: &str) -> Result<Vec<CodeEntry>> {
        let rows: Vec<SiteRow> = self
            .get(
                LIST_SITES_BY_COUNTY,
                &[("state", state.to_string()), ("county", county.to_string())],
            )
            .await?;

        rows.into_iter()
            .filter_map(|row| match row.value_represented {
                Some(name) if !name.trim().is_empty() => Some((row.code, name)),
                _ => None,
            })
            .map(|(code, name)| {
                let code = code.trim().parse::<u32>().map_err(|_| {
                    ProcessingError::SchemaMismatch(format!("Site code '{}' is not numeric", code))
                })?;
                Ok(CodeEntry::new(code, &name))
            })
            .collect()
    }
}
