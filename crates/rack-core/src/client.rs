//! ---
//! rack_section: "01-core-functionality"
//! rack_subsection: "module"
//! rack_type: "source"
//! rack_scope: "code"
//! rack_description: "Rollout, convergence, and local lifecycle engine."
//! rack_version: "v0.0.0-prealpha"
//! rack_owner: "tbd"
//! ---
//! HTTP implementation of [`RackApi`] against a rack's management endpoint.

use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use rack_common::RackCredentials;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;
use url::Url;

use crate::api::RackApi;
use crate::error::{RackError, Result};
use crate::logs::LogOptions;
use crate::params::ParameterSet;
use crate::scale::ScaleRequest;
use crate::system::{SystemProcess, SystemRelease, SystemState};

const AUTH_USER: &str = "rack";

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Management API client authenticated with the rack password.
#[derive(Debug, Clone)]
pub struct HttpRackClient {
    client: Client,
    // No total timeout; followed log streams stay open.
    streaming: Client,
    base: Url,
    password: Option<String>,
    rack: Option<String>,
    client_version: String,
}

impl HttpRackClient {
    /// Client for the rack at `credentials.host`; `client_version` goes in the `Version` header.
    pub fn new(
        credentials: &RackCredentials,
        timeout: Duration,
        client_version: impl Into<String>,
    ) -> Result<Self> {
        let base = credentials
            .base_url()
            .map_err(|err| RackError::Config(format!("{err:#}")))?;
        let client = Client::builder().timeout(timeout).build()?;
        let streaming = Client::builder().connect_timeout(timeout).build()?;
        Ok(Self {
            client,
            streaming,
            base,
            password: credentials.password.clone(),
            rack: credentials.rack.clone(),
            client_version: client_version.into(),
        })
    }

    /// Management API root.
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| RackError::Config(format!("rack host {} cannot carry a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn request(&self, method: Method, segments: &[&str]) -> Result<RequestBuilder> {
        self.request_with(&self.client, method, segments)
    }

    fn request_with(
        &self,
        client: &Client,
        method: Method,
        segments: &[&str],
    ) -> Result<RequestBuilder> {
        let url = self.endpoint(segments)?;
        debug!(%method, %url, "rack api request");
        let mut builder = client
            .request(method, url)
            .header("Version", &self.client_version);
        if let Some(password) = &self.password {
            builder = builder.basic_auth(AUTH_USER, Some(password));
        }
        if let Some(rack) = &self.rack {
            builder = builder.header("Rack", rack);
        }
        Ok(builder)
    }

    async fn send(builder: RequestBuilder) -> Result<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(parsed) => parsed.error,
            Err(_) if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_owned(),
            Err(_) => body.trim().to_owned(),
        };
        Err(RackError::Api {
            status: status.as_u16(),
            message,
        })
    }

    async fn json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T> {
        Ok(Self::send(builder).await?.json().await?)
    }
}

#[async_trait]
impl RackApi for HttpRackClient {
    async fn get_system(&self) -> Result<SystemState> {
        Self::json(self.request(Method::GET, &["system"])?).await
    }

    async fn update_system(&self, version: &str) -> Result<SystemState> {
        let builder = self
            .request(Method::PUT, &["system"])?
            .form(&[("version", version)]);
        Self::json(builder).await
    }

    async fn list_parameters(&self, system: &str) -> Result<IndexMap<String, String>> {
        Self::json(self.request(Method::GET, &["apps", system, "parameters"])?).await
    }

    async fn set_parameters(&self, system: &str, params: &ParameterSet) -> Result<()> {
        let builder = self
            .request(Method::POST, &["apps", system, "parameters"])?
            .form(params);
        Self::send(builder).await?;
        Ok(())
    }

    async fn scale_system(&self, request: &ScaleRequest) -> Result<SystemState> {
        let builder = self
            .request(Method::PUT, &["system"])?
            .form(&request.form_fields());
        Self::json(builder).await
    }

    async fn list_releases(&self) -> Result<Vec<SystemRelease>> {
        Self::json(self.request(Method::GET, &["system", "releases"])?).await
    }

    async fn list_processes(&self, all: bool) -> Result<Vec<SystemProcess>> {
        let mut builder = self.request(Method::GET, &["system", "processes"])?;
        if all {
            builder = builder.header("All", "true");
        }
        Self::json(builder).await
    }

    async fn stream_logs(
        &self,
        options: &LogOptions,
        sink: &mut (dyn AsyncWrite + Unpin + Send),
    ) -> Result<u64> {
        let mut builder = self.request_with(&self.streaming, Method::GET, &["system", "logs"])?;
        for (name, value) in options.headers() {
            builder = builder.header(name, value);
        }
        let mut response = Self::send(builder).await?;
        let mut written = 0u64;
        while let Some(chunk) = response.chunk().await? {
            sink.write_all(&chunk).await?;
            sink.flush().await?;
            written += chunk.len() as u64;
        }
        Ok(written)
    }
}
