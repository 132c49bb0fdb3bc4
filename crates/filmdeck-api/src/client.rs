// Backend HTTP client
//
// Wraps `reqwest::Client` with resource URL construction, status
// checking and JSON decoding. Typed resource endpoints live in
// `resources.rs` as inherent methods so this module stays focused on
// transport mechanics.

use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;

/// Raw HTTP client for the scanner backend.
///
/// Every resource lives directly below `base_url`, e.g. with a base of
/// `http://scanner.local/backend/` the light resource is
/// `http://scanner.local/backend/light`. Cheap to clone: the inner
/// `reqwest::Client` is reference counted.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: Url,
    request_timeout: Option<Duration>,
}

impl BackendClient {
    /// Create a new client from a `TransportConfig`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url),
            request_timeout: transport.request_timeout,
        })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Url::parse(base_url)?;
        Ok(Self {
            http,
            base_url: normalize_base(base_url),
            request_timeout: None,
        })
    }

    /// The backend root every resource is resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The underlying HTTP client (the stream manager shares it).
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    // ── URL builders ─────────────────────────────────────────────────

    /// Resolve a resource name (`light`, `dashboard-sse`, ...) to a full URL.
    pub fn resource_url(&self, resource: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(resource.trim_start_matches('/'))?)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// `GET <resource>` and decode the JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, resource: &str) -> Result<T, Error> {
        let url = self.resource_url(resource)?;
        debug!("GET {}", url);

        let resp = self.with_timeout(self.http.get(url)).send().await?;
        let body = check_status(resp).await?.text().await?;

        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: format!("{resource}: {e}"),
            body,
        })
    }

    /// `POST <resource>` with an empty body.
    pub async fn post_trigger(&self, resource: &str) -> Result<(), Error> {
        let url = self.resource_url(resource)?;
        debug!("POST {}", url);

        let resp = self.with_timeout(self.http.post(url)).send().await?;
        check_status(resp).await?;
        Ok(())
    }

    /// `POST <resource>` with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        resource: &str,
        body: &B,
    ) -> Result<(), Error> {
        let url = self.resource_url(resource)?;
        debug!("POST {} (json)", url);

        let resp = self
            .with_timeout(self.http.post(url).json(body))
            .send()
            .await?;
        check_status(resp).await?;
        Ok(())
    }

    fn with_timeout(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.request_timeout {
            Some(timeout) => request.timeout(timeout),
            None => request,
        }
    }
}

/// Ensure the base path ends with `/` so `Url::join` appends instead of
/// replacing the last segment.
fn normalize_base(mut url: Url) -> Url {
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url
}

/// Turn non-2xx responses into [`Error::Status`], keeping the body.
pub(crate) async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, Error> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let url = resp.url().to_string();
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status {
        status: status.as_u16(),
        url,
        body,
    })
}
