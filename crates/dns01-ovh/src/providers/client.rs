//! Signed HTTP client for the OVH API
//!
//! Every authenticated call carries the application key, the consumer key,
//! a timestamp and a signature:
//!
//! ```text
//! "$1$" + hex(sha1(secret + "+" + consumer + "+" + METHOD + "+" + url + "+" + body + "+" + timestamp))
//! ```
//!
//! The timestamp must match the API server clock, so the client fetches
//! `/auth/time` once and applies the offset to every later request.

use chrono::Utc;
use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

use super::credentials::OvhCredentials;
use crate::errors::{ApiError, DnsError};

/// Known endpoint aliases and their API base URLs
const ENDPOINTS: &[(&str, &str)] = &[
    ("ovh-eu", "https://eu.api.ovh.com/1.0"),
    ("ovh-ca", "https://ca.api.ovh.com/1.0"),
    ("ovh-us", "https://api.us.ovhcloud.com/1.0"),
    ("kimsufi-eu", "https://eu.api.kimsufi.com/1.0"),
    ("kimsufi-ca", "https://ca.api.kimsufi.com/1.0"),
    ("soyoustart-eu", "https://eu.api.soyoustart.com/1.0"),
    ("soyoustart-ca", "https://ca.api.soyoustart.com/1.0"),
];

/// Map an endpoint alias or explicit URL to an API base URL
pub fn resolve_endpoint(endpoint: &str) -> Option<String> {
    if let Some((_, url)) = ENDPOINTS.iter().find(|(alias, _)| *alias == endpoint) {
        return Some(url.to_string());
    }

    if endpoint.starts_with("https://") || endpoint.starts_with("http://") {
        return Some(endpoint.trim_end_matches('/').to_string());
    }

    None
}

#[derive(Debug, Deserialize)]
struct OvhErrorResponse {
    message: String,
}

/// Authenticated OVH API client
pub struct OvhClient {
    http: Client,
    base_url: String,
    application_key: String,
    application_secret: String,
    consumer_key: String,
    time_delta: OnceCell<i64>,
}

impl std::fmt::Debug for OvhClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OvhClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl OvhClient {
    /// Build a client; no network call is made
    pub fn new(credentials: &OvhCredentials, timeout: Duration) -> Result<Self, DnsError> {
        credentials.validate()?;

        let base_url = resolve_endpoint(&credentials.endpoint).ok_or_else(|| {
            DnsError::Configuration(format!("unknown OVH endpoint '{}'", credentials.endpoint))
        })?;

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DnsError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            application_key: credentials.application_key.clone(),
            application_secret: credentials.application_secret.clone(),
            consumer_key: credentials.consumer_key.clone(),
            time_delta: OnceCell::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and decode the JSON response
    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = serde_json::to_string(body)?;
        let response = self.call(Method::POST, path, Some(body)).await?;
        decode(&response)
    }

    /// POST without a request body, discarding the response
    pub async fn post_empty(&self, path: &str) -> Result<(), ApiError> {
        self.call(Method::POST, path, None).await?;
        Ok(())
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.call(Method::DELETE, path, None).await?;
        Ok(())
    }

    /// Offset between the API server clock and ours, in seconds
    async fn time_delta(&self) -> Result<i64, ApiError> {
        self.time_delta
            .get_or_try_init(|| async {
                let url = format!("{}/auth/time", self.base_url);
                let response = self.http.get(&url).send().await?;
                let text = check_status(response).await?;
                let server_time: i64 = serde_json::from_str(text.trim())?;
                let delta = server_time - Utc::now().timestamp();

                debug!(delta, "OVH API clock offset");
                Ok::<_, ApiError>(delta)
            })
            .await
            .copied()
    }

    async fn call(&self, method: Method, path: &str, body: Option<String>) -> Result<String, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let timestamp = (Utc::now().timestamp() + self.time_delta().await?).to_string();
        let body = body.unwrap_or_default();

        debug!("OVH API request: {} {}", method, path);

        let signature = sign(
            &self.application_secret,
            &self.consumer_key,
            method.as_str(),
            &url,
            &body,
            &timestamp,
        );

        let mut request = self
            .http
            .request(method, &url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json;charset=utf-8")
            .header("X-Ovh-Application", &self.application_key)
            .header("X-Ovh-Consumer", &self.consumer_key)
            .header("X-Ovh-Timestamp", &timestamp)
            .header("X-Ovh-Signature", signature);

        if !body.is_empty() {
            request = request.body(body);
        }

        let response = request.send().await?;
        check_status(response).await
    }
}

/// Compute the `X-Ovh-Signature` header value
pub fn sign(
    application_secret: &str,
    consumer_key: &str,
    method: &str,
    url: &str,
    body: &str,
    timestamp: &str,
) -> String {
    let payload = format!(
        "{}+{}+{}+{}+{}+{}",
        application_secret, consumer_key, method, url, body, timestamp
    );
    format!("$1${}", hex::encode(Sha1::digest(payload.as_bytes())))
}

/// Return the response body, or an error for non-2xx statuses
async fn check_status(response: reqwest::Response) -> Result<String, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    if status.is_success() {
        return Ok(text);
    }

    let message = serde_json::from_str::<OvhErrorResponse>(&text)
        .map(|e| e.message)
        .unwrap_or(text);

    Err(ApiError::Status {
        status: status.as_u16(),
        message,
    })
}

fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    if text.trim().is_empty() {
        return Ok(serde_json::from_str("null")?);
    }
    Ok(serde_json::from_str(text)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_endpoint() {
        assert_eq!(
            resolve_endpoint("ovh-eu").as_deref(),
            Some("https://eu.api.ovh.com/1.0")
        );
        assert_eq!(
            resolve_endpoint("ovh-ca").as_deref(),
            Some("https://ca.api.ovh.com/1.0")
        );
        assert_eq!(
            resolve_endpoint("https://eu.api.ovh.com/1.0/").as_deref(),
            Some("https://eu.api.ovh.com/1.0")
        );
        assert_eq!(resolve_endpoint("ovh-mars"), None);
        assert_eq!(resolve_endpoint(""), None);
    }

    #[test]
    fn test_sign() {
        let signature = sign(
            "secret",
            "consumer",
            "GET",
            "https://eu.api.ovh.com/1.0/domain/zone",
            "",
            "1457018097",
        );

        let expected = format!(
            "$1${}",
            hex::encode(Sha1::digest(
                b"secret+consumer+GET+https://eu.api.ovh.com/1.0/domain/zone++1457018097"
            ))
        );
        assert_eq!(signature, expected);
        assert!(signature.starts_with("$1$"));
        assert_eq!(signature.len(), 3 + 40);
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let timeout = Duration::from_secs(5);

        let err = OvhClient::new(&OvhCredentials::new("ovh-eu", "ak", "", "ck"), timeout)
            .unwrap_err();
        assert!(matches!(err, DnsError::Configuration(_)));

        let err = OvhClient::new(&OvhCredentials::new("ovh-mars", "ak", "as", "ck"), timeout)
            .unwrap_err();
        assert!(err.to_string().contains("ovh-mars"));

        let client =
            OvhClient::new(&OvhCredentials::new("ovh-eu", "ak", "as", "ck"), timeout).unwrap();
        assert_eq!(client.base_url(), "https://eu.api.ovh.com/1.0");
    }

    #[test]
    fn test_decode_empty_body() {
        let value: serde_json::Value = decode("").unwrap();
        assert!(value.is_null());

        let value: Option<i64> = decode("null").unwrap();
        assert_eq!(value, None);
    }
}
