//! HTTP transport shared by the API resources.

use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// Upper bound for any single backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    api_version: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_key()))
            .map_err(|_| Error::Configuration("API key contains invalid characters".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, auth);
        headers.insert(header::ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.resolved_base_url().to_string(),
            api_version: config.api_version.clone(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay,
        })
    }

    /// `{base}/{version}/{path}`; a path that already carries the version is left alone.
    pub fn url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        let version_prefix = format!("{}/", self.api_version);
        if path.starts_with(&version_prefix) {
            format!("{}/{path}", self.base_url)
        } else {
            format!("{}/{}/{path}", self.base_url, self.api_version)
        }
    }

    pub async fn get<R: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<R> {
        self.request(Method::GET, path, query, None::<&()>).await
    }

    pub async fn post<B: Serialize + ?Sized, R: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
    ) -> Result<R> {
        self.request(Method::POST, path, &[], body).await
    }

    pub async fn put<B: Serialize + ?Sized, R: DeserializeOwned>(&self, path: &str, body: &B) -> Result<R> {
        self.request(Method::PUT, path, &[], Some(body)).await
    }

    pub async fn delete<R: DeserializeOwned>(&self, path: &str) -> Result<R> {
        self.request(Method::DELETE, path, &[], None::<&()>).await
    }

    #[instrument(skip(self, query, body))]
    async fn request<B, R>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> Result<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let mut delay = self.retry_delay;
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;
            debug!(attempt, url = %url, "sending API request");

            let mut builder: RequestBuilder = self.client.request(method.clone(), &url);
            if !query.is_empty() {
                builder = builder.query(query);
            }
            if let Some(body) = body {
                builder = builder.json(body);
            }

            let outcome = match builder.send().await {
                Ok(response) => handle_response(response).await,
                Err(e) => Err(Error::Http(e)),
            };

            match outcome {
                Ok(data) => return Ok(data),
                Err(e) if e.is_retryable() && attempt <= self.max_retries => {
                    let wait = e.retry_after().unwrap_or(delay).min(MAX_BACKOFF);
                    warn!(
                        attempt,
                        delay_ms = wait.as_millis() as u64,
                        error = %e,
                        "retrying API request"
                    );
                    tokio::time::sleep(wait).await;
                    delay = next_delay(delay);
                }
                Err(e) => return Err(e),
            }
        }
    }
}

async fn handle_response<R: DeserializeOwned>(response: Response) -> Result<R> {
    let status = response.status();
    let retry_after = retry_after(&response);
    let bytes = response.bytes().await?;

    if !status.is_success() {
        return Err(Error::from_response(status, &bytes, retry_after));
    }

    let body: Value = if bytes.is_empty() || status == StatusCode::NO_CONTENT {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok(serde_json::from_value(extract_data(body))?)
}

/// Double the backoff, capped at [`MAX_BACKOFF`].
fn next_delay(delay: Duration) -> Duration {
    delay.saturating_mul(2).min(MAX_BACKOFF)
}

/// Unwrap the `{success, data, meta}` envelope when present.
fn extract_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => map.remove("data").unwrap_or(Value::Null),
        other => other,
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client(base: &str) -> HttpClient {
        let config = ClientConfig::new("jml_test_key").unwrap().with_base_url(base);
        HttpClient::new(&config).unwrap()
    }

    #[test]
    fn url_adds_version_prefix_once() {
        let http = client("https://api.example.test/");
        assert_eq!(http.url("/webhooks"), "https://api.example.test/v1/webhooks");
        assert_eq!(http.url("webhooks/wh_1"), "https://api.example.test/v1/webhooks/wh_1");
        assert_eq!(http.url("/v1/ping"), "https://api.example.test/v1/ping");
    }

    #[test]
    fn backoff_doubles_and_saturates_at_cap() {
        assert_eq!(next_delay(Duration::from_millis(250)), Duration::from_millis(500));
        assert_eq!(next_delay(Duration::from_secs(45)), MAX_BACKOFF);
        assert_eq!(next_delay(Duration::MAX), MAX_BACKOFF);
    }

    #[test]
    fn extract_data_unwraps_envelope() {
        let wrapped = json!({"success": true, "data": {"id": "wh_1"}, "meta": {}});
        assert_eq!(extract_data(wrapped), json!({"id": "wh_1"}));

        let bare = json!({"id": "wh_1"});
        assert_eq!(extract_data(bare.clone()), bare);

        assert_eq!(extract_data(json!(["a", "b"])), json!(["a", "b"]));
    }
}
