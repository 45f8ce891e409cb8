//! NBN Atlas species search client
//!
//! Pages through `searchResults.results` using a row offset (`start`), not a
//! page number. The feed ends with the first empty page.

use super::{FieldMapping, RecordSource, RecordStream};
use crate::error::{Result, SyncError};
use crate::retry::{network_error, retry_transient, Backoff};
use async_stream::try_stream;
use futures::Stream;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;
use tracing::{debug, info};
use ukbol_common::config::NbnConfig;
use ukbol_common::fields::RawRecord;

const USER_AGENT: &str = concat!("ukbol-sync/", env!("CARGO_PKG_VERSION"));

/// Restricts the search index to taxon documents
const TAXON_FILTER: &str = "idxtype:TAXON";

/// Progress is logged each time this many records have been received
const PROGRESS_INTERVAL: u64 = 10_000;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "searchResults")]
    search_results: SearchResults,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResults {
    #[serde(default)]
    total_records: u64,
    #[serde(default)]
    results: Vec<Map<String, Value>>,
}

/// Paged NBN species search feed
pub struct NbnSource {
    http_client: reqwest::Client,
    config: NbnConfig,
    backoff: Backoff,
}

impl NbnSource {
    pub fn new(config: &NbnConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(network_error)?;

        Ok(Self {
            http_client,
            config: config.clone(),
            backoff: Backoff::from_config(config),
        })
    }

    /// Fetch one page starting at row `start` (single attempt)
    async fn fetch_page(&self, start: u64) -> Result<SearchResults> {
        debug!(url = %self.config.url, start, "Requesting NBN page");

        let response = self
            .http_client
            .get(&self.config.url)
            .query(&[
                ("fq", TAXON_FILTER.to_string()),
                ("pageSize", self.config.page_size.to_string()),
                ("start", start.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Http {
                status: status.as_u16(),
                url: self.config.url.clone(),
            });
        }

        let body = response.text().await?;
        parse_page(&body)
    }

    fn pages(&self) -> impl Stream<Item = Result<RawRecord>> + '_ {
        try_stream! {
            info!(url = %self.config.url, "Downloading taxonomy data from NBN");
            let mut start: u64 = 0;

            loop {
                let operation = format!("nbn page at {}", start);
                let page = retry_transient(&operation, &self.backoff, || self.fetch_page(start)).await?;
                if page.results.is_empty() {
                    break;
                }

                let received = page.results.len() as u64;
                for result in page.results {
                    yield to_raw_record(result);
                }

                let before = start;
                start += received;
                if start / PROGRESS_INTERVAL > before / PROGRESS_INTERVAL {
                    info!(received = start, total = page.total_records, "NBN download progress");
                }
            }

            info!(count = start, "Downloaded records from NBN");
        }
    }
}

impl RecordSource for NbnSource {
    fn describe(&self) -> String {
        format!("NBN feed {}", self.config.url)
    }

    fn mapping(&self) -> FieldMapping {
        FieldMapping::nbn()
    }

    fn records(&self) -> RecordStream<'_> {
        Box::pin(self.pages())
    }
}

fn parse_page(body: &str) -> Result<SearchResults> {
    let response: SearchResponse =
        serde_json::from_str(body).map_err(|e| SyncError::Parse(e.to_string()))?;
    Ok(response.search_results)
}

/// Flatten one JSON result into a raw record
///
/// Scalars become strings; nulls, arrays and objects are dropped.
fn to_raw_record(result: Map<String, Value>) -> RawRecord {
    result
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(s) => Some((key, s)),
            Value::Number(n) => Some((key, n.to_string())),
            Value::Bool(b) => Some((key, b.to_string())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let body = r#"{
            "searchResults": {
                "totalRecords": 2,
                "results": [
                    {
                        "guid": "NBNSYS0000160364",
                        "scientificName": "Abrothallus cetrariae",
                        "rank": "species",
                        "parentGuid": null,
                        "rankID": 7000,
                        "isExcluded": false,
                        "commonNameSingle": ["x"]
                    }
                ]
            }
        }"#;

        let page = parse_page(body).unwrap();
        assert_eq!(page.total_records, 2);
        assert_eq!(page.results.len(), 1);

        let record = to_raw_record(page.results.into_iter().next().unwrap());
        assert_eq!(record.get("guid").map(String::as_str), Some("NBNSYS0000160364"));
        assert_eq!(record.get("rankID").map(String::as_str), Some("7000"));
        assert_eq!(record.get("isExcluded").map(String::as_str), Some("false"));
        assert!(!record.contains_key("parentGuid"));
        assert!(!record.contains_key("commonNameSingle"));
    }

    #[test]
    fn test_parse_empty_page() {
        let page = parse_page(r#"{"searchResults": {"totalRecords": 0, "results": []}}"#).unwrap();
        assert!(page.results.is_empty());
    }

    #[test]
    fn test_parse_error_is_permanent() {
        let err = parse_page("<html>maintenance</html>").unwrap_err();
        assert!(matches!(err, SyncError::Parse(_)));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_source_mapping() {
        let source = NbnSource::new(&NbnConfig::default()).unwrap();
        assert_eq!(source.mapping(), FieldMapping::nbn());
        assert!(source.describe().contains("species-ws.nbnatlas.org"));
    }
}
