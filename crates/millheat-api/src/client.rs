// Mill API HTTP client
//
// Wraps `reqwest::Client` with Mill-specific URL construction and
// envelope unwrapping. Endpoint groups (auth, inventory, control) are
// implemented as inherent methods in separate files to keep this module
// focused on transport mechanics.

use reqwest::RequestBuilder;
use reqwest::header::ACCEPT;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::MillResponse;
use crate::transport::TransportConfig;

/// Production API root.
pub const DEFAULT_BASE_URL: &str = "https://api.millheat.com/";

/// Header carrying the access token on every `uds/*` call.
pub(crate) const ACCESS_TOKEN_HEADER: &str = "Access_token";

/// Raw HTTP client for the Mill open API.
///
/// Stateless apart from the pooled connection: the access token is passed
/// into every call, so one client can be shared between the poll loop and
/// concurrent control requests without synchronisation.
#[derive(Debug, Clone)]
pub struct MillClient {
    http: reqwest::Client,
    base_url: Url,
}

impl MillClient {
    /// Create a client for the given API root using a `TransportConfig`.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The API root all endpoint paths are joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ensure a trailing slash so relative joins append instead of replace.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        if !url.path().ends_with('/') {
            let path = format!("{}/", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    // ── Request helpers ──────────────────────────────────────────────

    /// Start a `POST` to an endpoint path such as `"uds/selectHomeList"`.
    pub(crate) fn post(&self, path: &str) -> Result<RequestBuilder, Error> {
        let url = self.base_url.join(path)?;
        debug!("POST {}", url);
        Ok(self.http.post(url).header(ACCEPT, "*/*"))
    }

    /// Start an authenticated `POST` carrying the `Access_token` header.
    pub(crate) fn post_authed(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<RequestBuilder, Error> {
        Ok(self.post(path)?.header(ACCESS_TOKEN_HEADER, access_token))
    }

    /// Send a request and return the `data` payload, failing if it is absent.
    pub(crate) async fn send_required<T: DeserializeOwned>(
        builder: RequestBuilder,
        endpoint: &'static str,
    ) -> Result<T, Error> {
        Self::send(builder)
            .await?
            .data
            .ok_or(Error::MissingData { endpoint })
    }

    /// Send a request and return the `data` payload, defaulting when absent.
    pub(crate) async fn send_or_default<T: DeserializeOwned + Default>(
        builder: RequestBuilder,
    ) -> Result<T, Error> {
        Ok(Self::send(builder).await?.data.unwrap_or_default())
    }

    /// Send a request and parse the `{errorCode, message, ..., data}` envelope.
    pub(crate) async fn send<T: DeserializeOwned>(
        builder: RequestBuilder,
    ) -> Result<MillResponse<T>, Error> {
        let resp = builder.send().await?;
        Self::parse_envelope(resp).await
    }

    /// Parse the envelope, returning it on success or an error if the
    /// HTTP status is not 200, the body does not decode, or `errorCode != 0`.
    async fn parse_envelope<T: DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<MillResponse<T>, Error> {
        let status = resp.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::Authentication {
                message: "access token expired or invalid credentials".into(),
            });
        }

        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Http {
                status: status.as_u16(),
                body: preview(&body).to_owned(),
            });
        }

        let body = resp.text().await?;
        trace!(len = body.len(), "response body received");

        let envelope: MillResponse<T> = serde_json::from_str(&body).map_err(|e| {
            Error::Deserialization {
                message: format!("{e} (body preview: {:?})", preview(&body)),
                body: body.clone(),
            }
        })?;

        if envelope.error_code != 0 {
            return Err(Error::Api {
                code: envelope.error_code,
                message: envelope
                    .message
                    .unwrap_or_else(|| format!("errorCode={}", envelope.error_code)),
            });
        }

        Ok(envelope)
    }
}

/// First 200 bytes of a body, cut on a char boundary.
fn preview(body: &str) -> &str {
    let mut end = body.len().min(200);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}
