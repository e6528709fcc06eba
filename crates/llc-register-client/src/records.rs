//! Typed client for the register store record API.
//!
//! ## Backend Paths
//!
//! | Method | Path | Operation |
//! |--------|------|-----------|
//! | GET    | `/{register}/records` | List records |
//! | GET    | `/{register}/record/{id}` | Get by id |
//! | POST   | `/{register}/records` | Create record |
//! | PUT    | `/{register}/record/{id}` | Update record |
//! | POST   | `/{register}/records/geometry/{function}` | Geometry search |
//!
//! Every call accepts an optional `resolve` value that is passed through as
//! the `?resolve=` query parameter.

use std::future::Future;

use llc_core::{RecordSource, SourceError};
use serde_json::Value;
use url::Url;

use crate::config::ConfigError;
use crate::error::RegisterApiError;

/// A successful (2xx) register store response.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendReply {
    pub status: u16,
    pub body: Value,
}

/// Client for the register store.
#[derive(Debug, Clone)]
pub struct RegisterClient {
    http: reqwest::Client,
    base_url: Url,
    max_retries: u32,
}

impl RegisterClient {
    pub(crate) fn new(http: reqwest::Client, base_url: Url, max_retries: u32) -> Self {
        Self {
            http,
            base_url,
            max_retries,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// List all records of a register.
    ///
    /// Calls `GET {base_url}/{register}/records`.
    pub async fn list_records(
        &self,
        register: &str,
        resolve: Option<&str>,
    ) -> Result<BackendReply, RegisterApiError> {
        let endpoint = format!("GET /{register}/records");
        let url = self.url(&[register, "records"])?;
        let resp = crate::retry::retry_send(self.max_retries, || {
            with_resolve(self.http.get(url.clone()), resolve).send()
        })
        .await
        .map_err(|e| RegisterApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        read_reply(endpoint, resp).await
    }

    /// Get one record.
    ///
    /// Calls `GET {base_url}/{register}/record/{id}`. A 404 is an
    /// [`RegisterApiError::ApiError`] like any other non-2xx status.
    pub async fn get_record(
        &self,
        register: &str,
        id: &str,
        resolve: Option<&str>,
    ) -> Result<BackendReply, RegisterApiError> {
        let endpoint = format!("GET /{register}/record/{id}");
        let url = self.url(&[register, "record", id])?;
        let resp = crate::retry::retry_send(self.max_retries, || {
            with_resolve(self.http.get(url.clone()), resolve).send()
        })
        .await
        .map_err(|e| RegisterApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        read_reply(endpoint, resp).await
    }

    /// Create a record.
    ///
    /// Calls `POST {base_url}/{register}/records`. Not retried.
    pub async fn create_record(
        &self,
        register: &str,
        record: &Value,
        resolve: Option<&str>,
    ) -> Result<BackendReply, RegisterApiError> {
        let endpoint = format!("POST /{register}/records");
        let url = self.url(&[register, "records"])?;
        let request = with_resolve(self.http.post(url), resolve).json(record);
        self.send_once(endpoint, request.send()).await
    }

    /// Replace a record.
    ///
    /// Calls `PUT {base_url}/{register}/record/{id}`. Not retried.
    pub async fn update_record(
        &self,
        register: &str,
        id: &str,
        record: &Value,
        resolve: Option<&str>,
    ) -> Result<BackendReply, RegisterApiError> {
        let endpoint = format!("PUT /{register}/record/{id}");
        let url = self.url(&[register, "record", id])?;
        let request = with_resolve(self.http.put(url), resolve).json(record);
        self.send_once(endpoint, request.send()).await
    }

    /// Run a geometry search.
    ///
    /// Calls `POST {base_url}/{register}/records/geometry/{function}`.
    pub async fn geometry_search(
        &self,
        register: &str,
        function: &str,
        criteria: &Value,
    ) -> Result<BackendReply, RegisterApiError> {
        let endpoint = format!("POST /{register}/records/geometry/{function}");
        let url = self.url(&[register, "records", "geometry", function])?;
        let request = self.http.post(url).json(criteria);
        self.send_once(endpoint, request.send()).await
    }

    async fn send_once(
        &self,
        endpoint: String,
        send: impl Future<Output = Result<reqwest::Response, reqwest::Error>>,
    ) -> Result<BackendReply, RegisterApiError> {
        let resp = send.await.map_err(|e| RegisterApiError::Http {
            endpoint: endpoint.clone(),
            source: e,
        })?;
        read_reply(endpoint, resp).await
    }

    /// Append percent-encoded path segments to the base URL.
    fn url(&self, segments: &[&str]) -> Result<Url, RegisterApiError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                ConfigError::InvalidUrl(
                    self.base_url.to_string(),
                    "URL cannot be used as a base".to_string(),
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }
}

fn with_resolve(builder: reqwest::RequestBuilder, resolve: Option<&str>) -> reqwest::RequestBuilder {
    match resolve {
        Some(value) => builder.query(&[("resolve", value)]),
        None => builder,
    }
}

async fn read_reply(
    endpoint: String,
    resp: reqwest::Response,
) -> Result<BackendReply, RegisterApiError> {
    let status = resp.status().as_u16();
    if !resp.status().is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(RegisterApiError::ApiError {
            endpoint,
            status,
            body,
        });
    }

    let body = resp
        .json()
        .await
        .map_err(|e| RegisterApiError::Deserialization {
            endpoint,
            source: e,
        })?;
    Ok(BackendReply { status, body })
}

impl RecordSource for RegisterClient {
    async fn fetch_record(&self, register: &str, id: &str) -> Result<Option<Value>, SourceError> {
        match self.get_record(register, id, None).await {
            Ok(reply) => Ok(Some(reply.body)),
            Err(RegisterApiError::ApiError { status: 404, .. }) => Ok(None),
            Err(RegisterApiError::ApiError { status, body, .. }) => {
                Err(SourceError::Backend { status, body })
            }
            Err(other) => Err(SourceError::Unavailable(other.to_string())),
        }
    }
}
