//! HTTP client for the search store
//!
//! Speaks the Elasticsearch REST API: `_bulk` for writes, plus the handful of index
//! administration calls the server needs (create with mapping, delete, health).

use async_trait::async_trait;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info, warn};
use weblog_common::LogRecord;

use super::config::{ElasticAuth, ElasticConfig};
use super::error::SearchError;
use super::mapping::index_mapping;
use super::sink::{BulkSink, BulkSummary, Refresh};

/// Content type required by the `_bulk` endpoint
const NDJSON: &str = "application/x-ndjson";

/// Subset of `_cluster/health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterHealth {
    pub cluster_name: String,
    /// green, yellow or red
    pub status: String,
    pub number_of_nodes: u32,
}

#[derive(Debug, Deserialize)]
struct BulkResponse {
    #[serde(default)]
    errors: bool,
    #[serde(default)]
    items: Vec<HashMap<String, BulkItem>>,
}

#[derive(Debug, Deserialize)]
struct BulkItem {
    status: u16,
    #[serde(default)]
    error: Option<Value>,
}

/// Search store client bound to one index
#[derive(Debug, Clone)]
pub struct ElasticClient {
    http: Client,
    config: ElasticConfig,
}

impl ElasticClient {
    /// Build a client from configuration
    pub fn new(config: ElasticConfig) -> Result<Self, SearchError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self { http, config })
    }

    /// Target index name
    pub fn index(&self) -> &str {
        &self.config.index
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}/{}", self.config.base_url(), path);
        let builder = self.http.request(method, url);

        match &self.config.auth {
            ElasticAuth::None => builder,
            ElasticAuth::Basic { username, password } => {
                builder.basic_auth(username, Some(password))
            },
            ElasticAuth::ApiKey { key } => {
                builder.header(header::AUTHORIZATION, format!("ApiKey {}", key))
            },
        }
    }

    /// Whether the target index exists
    pub async fn index_exists(&self) -> Result<bool, SearchError> {
        let response = self.request(Method::HEAD, &self.config.index).send().await?;

        match response.status() {
            StatusCode::NOT_FOUND => Ok(false),
            status if status.is_success() => Ok(true),
            status => Err(SearchError::Status {
                status: status.as_u16(),
                body: String::new(),
            }),
        }
    }

    /// Create the target index with the access-log mapping unless it exists
    ///
    /// Returns `true` when this call created the index.
    pub async fn ensure_index(&self) -> Result<bool, SearchError> {
        if self.index_exists().await? {
            debug!(index = %self.config.index, "Index already exists");
            return Ok(false);
        }

        let response = self
            .request(Method::PUT, &self.config.index)
            .json(&index_mapping())
            .send()
            .await?;

        match check(response).await {
            Ok(_) => {
                info!(index = %self.config.index, "Created index");
                Ok(true)
            },
            // Lost a creation race with another writer
            Err(SearchError::Status { status: 400, body })
                if body.contains("resource_already_exists_exception") =>
            {
                Ok(false)
            },
            Err(e) => Err(e),
        }
    }

    /// Delete the target index
    ///
    /// Returns `false` when there was no index to delete.
    pub async fn delete_index(&self) -> Result<bool, SearchError> {
        let response = self.request(Method::DELETE, &self.config.index).send().await?;

        match check(response).await {
            Ok(_) => {
                info!(index = %self.config.index, "Deleted index");
                Ok(true)
            },
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Cluster health summary
    pub async fn cluster_health(&self) -> Result<ClusterHealth, SearchError> {
        let response = self.request(Method::GET, "_cluster/health").send().await?;
        let response = check(response).await?;

        response
            .json::<ClusterHealth>()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))
    }

    /// NDJSON body: an action line then the document, for every record
    fn bulk_body(&self, records: &[LogRecord]) -> Result<String, SearchError> {
        let action = serde_json::to_string(&json!({ "index": { "_index": self.config.index } }))?;
        let mut body = String::new();

        for record in records {
            body.push_str(&action);
            body.push('\n');
            body.push_str(&serde_json::to_string(record)?);
            body.push('\n');
        }

        Ok(body)
    }
}

#[async_trait]
impl BulkSink for ElasticClient {
    async fn prepare(&self) -> Result<(), SearchError> {
        self.ensure_index().await.map(|_| ())
    }

    async fn bulk(
        &self,
        records: &[LogRecord],
        refresh: Refresh,
    ) -> Result<BulkSummary, SearchError> {
        let body = self.bulk_body(records)?;

        let response = self
            .request(Method::POST, "_bulk")
            .query(&[("refresh", refresh.as_str())])
            .header(header::CONTENT_TYPE, NDJSON)
            .body(body)
            .send()
            .await?;
        let response = check(response).await?;

        let parsed: BulkResponse = response
            .json()
            .await
            .map_err(|e| SearchError::InvalidResponse(e.to_string()))?;

        let rejected = if parsed.errors {
            parsed
                .items
                .iter()
                .flat_map(|item| item.values())
                .filter(|item| item.error.is_some() || item.status >= 300)
                .count()
        } else {
            0
        };

        if rejected > 0 {
            warn!(
                index = %self.config.index,
                rejected,
                items = records.len(),
                "Search store rejected documents in bulk request"
            );
        }

        Ok(BulkSummary {
            items: records.len(),
            rejected,
        })
    }
}

/// Turn a non-success response into [`SearchError::Status`]
async fn check(response: Response) -> Result<Response, SearchError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(SearchError::Status {
        status: status.as_u16(),
        body,
    })
}
