use axum::http::{Method, StatusCode, header};
use serde::Serialize;
use tracing::debug;

use crate::error::WebError;

/// Thin HTTP client for the backend API.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

/// A backend answer, kept raw so it can be relayed to the browser.
#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Credential re-issued by the backend, if any.
    pub renewed: Option<String>,
    pub body: serde_json::Value,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Sends `body` as JSON to `path`, presenting `credential` when given.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        credential: Option<&str>,
        body: Option<&B>,
    ) -> Result<ApiResponse, WebError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(%method, %url, "Backend request");

        let mut request = self.http.request(method, &url);
        if let Some(credential) = credential {
            request = request.header(header::AUTHORIZATION, credential);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let renewed = response
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                serde_json::Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        Ok(ApiResponse {
            status,
            renewed,
            body,
        })
    }
}
