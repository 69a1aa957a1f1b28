use bytes::Bytes;
use formats::{GridSnapshot, HEADER_LEN, decode_or_empty};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::ClientConfig;
use crate::error::{FetchError, TransportError};

/// HTTP client for grid snapshot endpoints.
///
/// Nothing is retried. Every failure goes back to the caller.
#[derive(Debug, Clone)]
pub struct GridClient {
    http: Client,
    config: ClientConfig,
}

impl GridClient {
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(TransportError::Client)?;
        Ok(Self { http, config })
    }

    pub fn with_http(http: Client, config: ClientConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// GET `url` and decode the body.
    ///
    /// A body shorter than the header means "no data" and yields an empty
    /// snapshot.
    pub async fn fetch_via_get(&self, url: &str) -> Result<GridSnapshot, FetchError> {
        let body = self.send(self.http.get(url), url).await?;
        decode_body(url, &body)
    }

    /// POST `payload` as JSON to `url` and decode the body.
    ///
    /// Failures are logged here and still returned.
    pub async fn fetch_via_post<T>(&self, url: &str, payload: &T) -> Result<GridSnapshot, FetchError>
    where
        T: Serialize + ?Sized,
    {
        let result = self.post_json(url, payload).await;
        if let Err(err) = &result {
            error!(%url, "failed to fetch grid snapshot: {err}");
        }
        result
    }

    async fn post_json<T>(&self, url: &str, payload: &T) -> Result<GridSnapshot, FetchError>
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_vec(payload).map_err(TransportError::Encode)?;
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/json")
            .body(json);
        let body = self.send(request, url).await?;
        decode_body(url, &body)
    }

    pub(crate) async fn get_bytes(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> Result<Bytes, TransportError> {
        self.send(self.http.get(url).query(query), url).await
    }

    pub(crate) async fn get_json<R: DeserializeOwned>(&self, url: &str) -> Result<R, TransportError> {
        let resp = self.checked(self.http.get(url), url).await?;
        resp.json().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })
    }

    pub(crate) async fn post_octets(&self, url: &str, body: Vec<u8>) -> Result<Bytes, TransportError> {
        let request = self
            .http
            .post(url)
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(body);
        self.send(request, url).await
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Bytes, TransportError> {
        let resp = self.checked(request, url).await?;
        resp.bytes().await.map_err(|source| TransportError::Request {
            url: url.to_string(),
            source,
        })
    }

    async fn checked(
        &self,
        request: RequestBuilder,
        url: &str,
    ) -> Result<reqwest::Response, TransportError> {
        let resp = request
            .send()
            .await
            .map_err(|source| TransportError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp)
    }
}

pub(crate) fn decode_body(url: &str, body: &[u8]) -> Result<GridSnapshot, FetchError> {
    if body.len() < HEADER_LEN {
        debug!(%url, len = body.len(), "short grid body, treating as empty");
    }
    Ok(decode_or_empty(body)?)
}
