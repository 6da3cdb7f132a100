// Copyright (c) 2025 - Cowboy AI, Inc.

//! NetBox REST Client
//!
//! Implements [`TargetClient`] against the NetBox REST API.
//!
//! # Endpoints
//!
//! ```text
//! Site       → /api/dcim/sites/
//! DeviceType → /api/dcim/device-types/
//! Device     → /api/dcim/devices/
//! Interface  → /api/dcim/interfaces/
//! IpAddress  → /api/ipam/ip-addresses/
//! ```
//!
//! Lookups are `GET <endpoint>?<filters>` and expect NetBox's paginated list
//! shape `{"count": n, "results": [{"id": ..}, ..]}`. Creates are `POST`,
//! updates are `PATCH <endpoint><id>/`.
//!
//! # Example
//!
//! ```rust,no_run
//! use cim_netbox_reconciler::config::NetBoxConfig;
//! use cim_netbox_reconciler::target::{NetBoxClient, TargetClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = NetBoxConfig {
//!         endpoint: "http://netbox.local:8000".to_string(),
//!         api_token: "your-token-here".to_string(),
//!         timeout_secs: 30,
//!     };
//!
//!     let client = NetBoxClient::new(&config)?;
//!     client.health_check().await?;
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::{ClientError, Filters, TargetClient};
use crate::config::NetBoxConfig;
use crate::domain::{EntityKind, RemoteId};

/// REST path for an entity kind, relative to the NetBox base URL
pub fn endpoint_path(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Site => "/api/dcim/sites/",
        EntityKind::DeviceType => "/api/dcim/device-types/",
        EntityKind::Device => "/api/dcim/devices/",
        EntityKind::Interface => "/api/dcim/interfaces/",
        EntityKind::IpAddress => "/api/ipam/ip-addresses/",
    }
}

/// Encode lookup filters as a query string
pub fn query_string(filters: &Filters) -> String {
    filters
        .iter()
        .map(|(field, value)| format!("{}={}", field, urlencoding::encode(value)))
        .collect::<Vec<_>>()
        .join("&")
}

#[derive(Debug, Deserialize)]
struct ObjectRef {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    count: u64,
    results: Vec<ObjectRef>,
}

/// NetBox client over `reqwest`
#[derive(Debug, Clone)]
pub struct NetBoxClient {
    base_url: String,
    client: Client,
}

impl NetBoxClient {
    pub fn new(config: &NetBoxConfig) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Token {}", config.api_token))
                .map_err(|e| ClientError::Configuration(format!("Invalid API token: {}", e)))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| {
                ClientError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, kind: EntityKind) -> String {
        format!("{}{}", self.base_url, endpoint_path(kind))
    }

    fn object_url(&self, kind: EntityKind, id: RemoteId) -> String {
        format!("{}{}/", self.url(kind), id)
    }

    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}

fn transport(err: reqwest::Error) -> ClientError {
    ClientError::Transport(err.to_string())
}

fn decode(err: reqwest::Error) -> ClientError {
    ClientError::Decode(err.to_string())
}

#[async_trait]
impl TargetClient for NetBoxClient {
    async fn find_by_key(
        &self,
        kind: EntityKind,
        filters: &Filters,
    ) -> Result<Option<RemoteId>, ClientError> {
        let url = format!("{}?{}", self.url(kind), query_string(filters));
        debug!(kind = %kind, url = %url, "NetBox lookup");

        let response = self.client.get(&url).send().await.map_err(transport)?;
        let list: ListResponse = Self::check(response)
            .await?
            .json()
            .await
            .map_err(decode)?;

        match list.count {
            0 => Ok(None),
            1 => list
                .results
                .first()
                .map(|object| Some(RemoteId(object.id)))
                .ok_or_else(|| ClientError::Decode("count 1 with empty results".to_string())),
            count => Err(ClientError::Ambiguous { kind, count }),
        }
    }

    async fn create(&self, kind: EntityKind, payload: &Value) -> Result<RemoteId, ClientError> {
        let response = self
            .client
            .post(self.url(kind))
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        let created: ObjectRef = Self::check(response)
            .await?
            .json()
            .await
            .map_err(decode)?;

        debug!(kind = %kind, id = created.id, "NetBox object created");
        Ok(RemoteId(created.id))
    }

    async fn update(
        &self,
        kind: EntityKind,
        id: RemoteId,
        payload: &Value,
    ) -> Result<(), ClientError> {
        let response = self
            .client
            .patch(self.object_url(kind, id))
            .json(payload)
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await?;

        debug!(kind = %kind, id = %id, "NetBox object updated");
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ClientError> {
        let url = format!("{}/api/status/", self.base_url);
        let response = self.client.get(&url).send().await.map_err(transport)?;
        Self::check(response).await?;
        debug!("NetBox health check passed");
        Ok(())
    }

    fn name(&self) -> &str {
        "netbox"
    }
}
