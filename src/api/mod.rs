//! Typed client for the practice's REST API.
//!
//! One file per resource, each adding `impl ApiClient` blocks. Every call goes
//! through [`ApiClient::execute`], which turns transport errors, non-2xx
//! statuses and undecodable bodies into [`ApiError`] values; nothing here panics.

use std::time::Duration;

use reqwest::{Method, RequestBuilder, StatusCode};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::error::{ApiError, ApiResult};

pub mod appointment_endpoints;
pub mod auth_endpoints;
pub mod availability_endpoints;
pub mod blocked_slot_endpoints;
pub mod email_template_endpoints;

pub const AVAILABLE_SLOTS: &str = "/available-slots/";
pub const APPOINTMENTS: &str = "/appointments/";
pub const APPOINTMENT_STATS: &str = "/appointments/stats/";
pub const ADMIN_APPOINTMENT_ACTION: &str = "/admin/appointments/";
pub const AVAILABILITY: &str = "/availability/";
pub const BLOCKED_SLOTS: &str = "/blocked-slots/";
pub const BLOCKED_SLOTS_SUMMARY: &str = "/blocked-slots/summary/";
pub const EMAIL_TEMPLATES: &str = "/email-templates/";

#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> ApiResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(format!("http client init: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn builder(&self, method: Method, endpoint: &str, bearer: Option<&str>) -> RequestBuilder {
        let mut req = self
            .http
            .request(method, self.url(endpoint))
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json");
        if let Some(token) = bearer {
            req = req.bearer_auth(token);
        }
        req
    }

    pub(crate) async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        bearer: Option<&str>,
    ) -> ApiResult<T> {
        self.execute(Method::GET, endpoint, self.builder(Method::GET, endpoint, bearer))
            .await
    }

    /// GET with URL-encoded query parameters.
    pub(crate) async fn get_query<Q, T>(
        &self,
        endpoint: &str,
        query: &Q,
        bearer: Option<&str>,
    ) -> ApiResult<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.builder(Method::GET, endpoint, bearer).query(query);
        self.execute(Method::GET, endpoint, req).await
    }

    pub(crate) async fn send<B, T>(
        &self,
        method: Method,
        endpoint: &str,
        bearer: Option<&str>,
        body: &B,
    ) -> ApiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let req = self.builder(method.clone(), endpoint, bearer).json(body);
        self.execute(method, endpoint, req).await
    }

    /// Body-less request judged on status alone. Any 2xx body, JSON or not,
    /// is dropped (DELETE, the HTML confirm/cancel pages).
    pub(crate) async fn call(
        &self,
        method: Method,
        endpoint: &str,
        bearer: Option<&str>,
    ) -> ApiResult<()> {
        let req = self.builder(method.clone(), endpoint, bearer);
        self.dispatch(&method, endpoint, req).await?;
        Ok(())
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        req: RequestBuilder,
    ) -> ApiResult<T> {
        let text = self.dispatch(&method, endpoint, req).await?;
        let body: Value = if text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&text)
                .map_err(|_| ApiError::Decode(format!("{endpoint}: body is not JSON")))?
        };
        serde_json::from_value(body).map_err(|e| ApiError::Decode(format!("{endpoint}: {e}")))
    }

    /// Sends the request and returns the raw body of a 2xx response. Transport
    /// failures and non-2xx statuses become [`ApiError`]s here.
    async fn dispatch(&self, method: &Method, endpoint: &str, req: RequestBuilder) -> ApiResult<String> {
        tracing::debug!(%method, url = %self.url(endpoint), "api request");

        let resp = req.send().await.map_err(|e| {
            tracing::warn!(%method, endpoint, error = %e, "api transport failure");
            ApiError::Network(e.to_string())
        })?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("reading response body: {e}")))?;
        tracing::debug!(%method, endpoint, status = status.as_u16(), "api response");

        if status.is_success() {
            return Ok(text);
        }

        let message = serde_json::from_str::<Value>(&text)
            .ok()
            .as_ref()
            .and_then(server_error_message)
            .unwrap_or_else(|| synthesized_message(status));
        tracing::warn!(%method, endpoint, status = status.as_u16(), %message, "api request failed");
        Err(ApiError::Http {
            status: status.as_u16(),
            message,
        })
    }
}

/// The `error` field as the server phrased it. Field-keyed validation errors
/// (`{"error": {"phone": ["..."]}}`) yield the first message in the order the
/// server wrote the fields.
fn server_error_message(body: &Value) -> Option<String> {
    match body.get("error")? {
        Value::String(s) => Some(s.clone()),
        other => first_string(other),
    }
}

fn first_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.iter().find_map(first_string),
        Value::Object(map) => map.values().find_map(first_string),
        _ => None,
    }
}

fn synthesized_message(status: StatusCode) -> String {
    format!(
        "HTTP {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn error_field_string_wins() {
        let body = json!({"error": "Invalid username or password"});
        assert_eq!(
            server_error_message(&body).as_deref(),
            Some("Invalid username or password")
        );
    }

    #[test]
    fn field_keyed_errors_yield_first_message() {
        let body = json!({"error": {"patient_phone": ["Enter a valid phone number."]}});
        assert_eq!(
            server_error_message(&body).as_deref(),
            Some("Enter a valid phone number.")
        );
    }

    #[test]
    fn field_keyed_errors_keep_server_order() {
        let body: Value = serde_json::from_str(
            r#"{"error": {"time": ["Time is in the past"], "date": ["Date is closed"]}}"#,
        )
        .unwrap();
        assert_eq!(server_error_message(&body).as_deref(), Some("Time is in the past"));
    }

    #[test]
    fn missing_error_field_synthesizes_from_status() {
        assert_eq!(server_error_message(&json!({"detail": "nope"})), None);
        assert_eq!(synthesized_message(StatusCode::FORBIDDEN), "HTTP 403: Forbidden");
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = ApiClient::new("http://localhost:8000/api/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.url(APPOINTMENTS), "http://localhost:8000/api/appointments/");
    }
}
