use std::fmt;
use std::time::Duration;

use arcyelp_core::RawBusinessRecord;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::FusionError;
use crate::params::SearchParams;

/// Root of the Yelp Fusion v3 API.
pub const DEFAULT_BASE_URL: &str = "https://api.yelp.com/v3";

/// Connection settings for [`FusionClient`].
#[derive(Clone)]
pub struct FusionConfig {
    pub api_key: String,
    pub base_url: String,
    /// Whole-request timeout; `None` leaves it to the transport.
    pub timeout: Option<Duration>,
}

impl FusionConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

impl fmt::Debug for FusionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FusionConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    businesses: Option<Vec<RawBusinessRecord>>,
}

/// Authenticated client for the business search and details endpoints.
///
/// Cheap to clone; clones share one connection pool and may be used from
/// many tasks at once.
#[derive(Clone, Debug)]
pub struct FusionClient {
    client: reqwest::Client,
    base_url: Url,
}

impl FusionClient {
    /// Build a client that sends `Authorization: Bearer <api_key>` on every request.
    pub fn new(config: FusionConfig) -> Result<Self, FusionError> {
        let api_key = config.api_key.trim();
        if api_key.is_empty() {
            return Err(FusionError::Config("an API key is required".into()));
        }

        let base_url = Url::parse(&config.base_url)
            .map_err(|e| FusionError::Config(format!("invalid base URL {:?}: {e}", config.base_url)))?;
        if base_url.cannot_be_a_base() {
            return Err(FusionError::Config(format!(
                "base URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|_| FusionError::Config("API key is not a valid header value".into()))?;
        auth.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(AUTHORIZATION, auth);

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url,
        })
    }

    /// Search for businesses around a point.
    ///
    /// `sort_by` is checked before anything goes over the wire. A response
    /// without a `businesses` array yields an empty list.
    pub async fn search(&self, params: &SearchParams) -> Result<Vec<RawBusinessRecord>, FusionError> {
        let query = params.to_query()?;
        let url = self.endpoint(&["businesses", "search"]);

        info!(
            url = %url,
            longitude = params.longitude,
            latitude = params.latitude,
            term = %params.term,
            "searching businesses"
        );
        let resp = self.client.get(url).query(&query).send().await?;
        let body = read_success(resp).await?;

        let parsed: SearchResponse = serde_json::from_str(&body)?;
        let businesses = parsed.businesses.unwrap_or_default();
        info!(count = businesses.len(), "search returned businesses");
        Ok(businesses)
    }

    /// Fetch one business by id.
    pub async fn details(&self, id: &str) -> Result<RawBusinessRecord, FusionError> {
        let url = self.endpoint(&["businesses", id]);

        info!(url = %url, "fetching business details");
        let resp = self.client.get(url).send().await?;
        let body = read_success(resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

/// Body of a 200 response, or the matching error for anything else.
async fn read_success(resp: reqwest::Response) -> Result<String, FusionError> {
    let status = resp.status();
    let body = resp.text().await?;
    match status {
        StatusCode::OK => Ok(body),
        StatusCode::BAD_REQUEST => {
            let message = upstream_message(&body);
            warn!(%message, "Yelp rejected the request");
            Err(FusionError::BadRequest(message))
        }
        _ => {
            warn!(status = status.as_u16(), "Yelp returned an error");
            Err(FusionError::Upstream {
                status: status.as_u16(),
                body,
            })
        }
    }
}

/// `error.description` from a Yelp error body, falling back to the whole
/// `error` value and then to the raw body.
fn upstream_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.to_string();
    };
    match value.get("error") {
        Some(error) => match error.get("description").and_then(Value::as_str) {
            Some(description) => description.to_string(),
            None => match error.as_str() {
                Some(s) => s.to_string(),
                None => error.to_string(),
            },
        },
        None => body.to_string(),
    }
}
