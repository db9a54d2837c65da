// Provisioner API HTTP client
//
// Wraps `reqwest::Client` with base-URL joining, failure classification
// and JSON decoding. Endpoint URLs are resolved by the caller (from the
// server's URL directory) and handed in fully formed.

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{ActionResponse, DeviceRecord};
use crate::transport::TransportConfig;

/// Raw HTTP client for the provisioner API.
///
/// Request failures are classified so that callers can tell a server that
/// was never reached ([`Error::Unreachable`]) from one that answered with an
/// error status ([`Error::Http`]).
#[derive(Debug, Clone)]
pub struct ProvisionerClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ProvisionerClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the provisioner root (e.g. `http://10.0.0.2:8080`).
    /// Relative and scheme-relative endpoint URLs are resolved against it.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The provisioner base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an endpoint reference against the base URL.
    ///
    /// Accepts absolute URLs, scheme-relative references (`//host:port/path`,
    /// as served by the URL directory) and absolute paths.
    pub fn endpoint(&self, reference: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(reference)?)
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the URL directory: endpoint name -> URL template.
    ///
    /// `GET {base}{path}` (the server exposes it at `/api`).
    pub async fn fetch_directory(&self, path: &str) -> Result<HashMap<String, String>, Error> {
        let url = self.endpoint(path)?;
        debug!("fetching URL directory");
        self.get(url).await
    }

    /// List all known devices.
    pub async fn list_devices(&self, url: Url) -> Result<Vec<DeviceRecord>, Error> {
        self.get(url).await
    }

    /// Fetch a single device.
    pub async fn get_device(&self, url: Url) -> Result<DeviceRecord, Error> {
        self.get(url).await
    }

    /// Trigger a device action. The request carries no body.
    pub async fn post_action(&self, url: Url) -> Result<ActionResponse, Error> {
        debug!("POST {}", url);
        let resp = Self::send(self.http.post(url.clone()), &url).await?;
        Self::parse_json(resp).await
    }

    // ── Request helpers ──────────────────────────────────────────────

    async fn get<T: DeserializeOwned>(&self, url: Url) -> Result<T, Error> {
        debug!("GET {}", url);
        let resp = Self::send(self.http.get(url.clone()), &url).await?;
        Self::parse_json(resp).await
    }

    /// Send a request, classifying connection-level failures and non-2xx
    /// responses.
    async fn send(request: reqwest::RequestBuilder, url: &Url) -> Result<reqwest::Response, Error> {
        let resp = request.send().await.map_err(|e| classify(e, url))?;
        let status = resp.status();

        if status.is_success() {
            return Ok(resp);
        }

        let body = resp.text().await.unwrap_or_default();
        debug!(status = status.as_u16(), "request failed");
        Err(Error::Http {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_owned(),
            body: serde_json::from_str::<ActionResponse>(&body).ok(),
        })
    }

    async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let body = resp.text().await.map_err(Error::Transport)?;
        serde_json::from_str(&body).map_err(|e| Error::Deserialization {
            message: e.to_string(),
            body,
        })
    }
}

/// Map a reqwest send failure onto the error taxonomy.
///
/// A send failure means no response head arrived: refused or reset
/// connections and sockets closed mid-request all count as unreachable.
fn classify(err: reqwest::Error, url: &Url) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            url: url.to_string(),
        }
    } else if err.status().is_none() {
        Error::Unreachable {
            url: url.to_string(),
            reason: err.to_string(),
        }
    } else {
        Error::Transport(err)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client(base: &str) -> ProvisionerClient {
        ProvisionerClient::with_client(reqwest::Client::new(), Url::parse(base).unwrap())
    }

    #[test]
    fn endpoint_resolves_scheme_relative_reference() {
        let c = client("http://10.0.0.2:8080/");
        let url = c.endpoint("//10.0.0.2:8080/api/devices").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:8080/api/devices");
    }

    #[test]
    fn endpoint_resolves_absolute_path() {
        let c = client("http://10.0.0.2:8080/ui/");
        let url = c.endpoint("/api/devices/AA:BB/reboot").unwrap();
        assert_eq!(url.as_str(), "http://10.0.0.2:8080/api/devices/AA:BB/reboot");
    }

    #[test]
    fn endpoint_keeps_absolute_url() {
        let c = client("http://10.0.0.2:8080/");
        let url = c.endpoint("https://other.example/api").unwrap();
        assert_eq!(url.as_str(), "https://other.example/api");
    }
}
