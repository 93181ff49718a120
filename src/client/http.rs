//! reqwest-backed transport

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use log::debug;
use reqwest::{Client as HttpClient, StatusCode};

use super::rate_limit::{HostPacer, host_of};
use super::{HttpRequest, HttpResponse, Platform, Transport};
use crate::error::{ApiError, ApiResult};

/// Transport over two reqwest clients, one verifying certificates and one
/// accepting the self-signed certificates controllers ship with.
pub struct HttpTransport {
    verified: HttpClient,
    unverified: HttpClient,
    pacer: HostPacer,
    requests_sent: AtomicU64,
}

impl HttpTransport {
    /// Create a new transport
    pub fn new() -> ApiResult<Self> {
        // Sessions travel as explicit Cookie headers; no shared cookie jar
        let verified = HttpClient::builder()
            .user_agent(concat!("gatehouse/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let unverified = HttpClient::builder()
            .user_agent(concat!("gatehouse/", env!("CARGO_PKG_VERSION")))
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(Self {
            verified,
            unverified,
            pacer: HostPacer::default(),
            requests_sent: AtomicU64::new(0),
        })
    }

    /// Number of requests that actually went out on the wire
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let host = host_of(&request.url).to_string();
        self.pacer.wait_for(&host).await;

        let client = if request.verify_tls {
            &self.verified
        } else {
            &self.unverified
        };

        let mut builder = client
            .request(request.method.clone(), &request.url)
            .timeout(request.timeout)
            .header("Accept", "application/json");
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }

        debug!("{} {}", request.method, request.url);
        self.requests_sent.fetch_add(1, Ordering::Relaxed);
        let response = builder.send().await.map_err(ApiError::from)?;

        // Login 429s are handled by the backoff tracker, not by pacing
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS && !Platform::is_login_path(request.path()) {
            self.pacer.activate(&host).await;
        }

        let headers = response.headers().clone();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to read response: {}", e)))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_transport_creation() {
        assert!(HttpTransport::new().is_ok());
    }

    #[tokio::test]
    async fn test_send_passes_headers_and_returns_raw_status() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/self/sites")
            .match_header("cookie", "unifises=abc")
            .with_status(401)
            .with_header("x-csrf-token", "t-2")
            .with_body(r#"{"meta":{"rc":"error","msg":"api.err.LoginRequired"}}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let request = HttpRequest::get(format!("{}/api/self/sites", server.url()))
            .header("Cookie", "unifises=abc")
            .verify_tls(false);
        let response = transport.send(request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert_eq!(response.header("x-csrf-token"), Some("t-2"));
        assert!(response.body.contains("LoginRequired"));
        assert_eq!(transport.requests_sent(), 1);
    }

    #[tokio::test]
    async fn test_send_posts_json_body() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/api/login")
            .match_body(mockito::Matcher::PartialJsonString(
                r#"{"username":"admin","remember":true}"#.to_string(),
            ))
            .with_status(200)
            .with_header("set-cookie", "unifises=s1; Path=/")
            .with_body(r#"{"meta":{"rc":"ok"},"data":[]}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new().unwrap();
        let request = HttpRequest::post(format!("{}/api/login", server.url()))
            .json(&serde_json::json!({"username": "admin", "password": "pw", "remember": true}))
            .unwrap();
        let response = transport.send(request).await.unwrap();

        mock.assert_async().await;
        assert_eq!(response.cookies(), vec!["unifises=s1"]);
    }

    #[tokio::test]
    async fn test_only_data_429_activates_pacing() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/api/login")
            .with_status(429)
            .create_async()
            .await;
        server
            .mock("GET", "/api/s/default/stat/device")
            .with_status(429)
            .create_async()
            .await;
        let host = host_of(&server.url()).to_string();
        let transport = HttpTransport::new().unwrap();

        let login = HttpRequest::post(format!("{}/api/login", server.url()));
        transport.send(login).await.unwrap();
        assert!(!transport.pacer.is_active(&host).await);

        let data = HttpRequest::get(format!("{}/api/s/default/stat/device", server.url()));
        transport.send(data).await.unwrap();
        assert!(transport.pacer.is_active(&host).await);
    }

    #[tokio::test]
    async fn test_connection_refused_is_network_error() {
        let transport = HttpTransport::new().unwrap();
        let request =
            HttpRequest::get("http://127.0.0.1:9/").timeout(Duration::from_secs(2));
        let result = transport.send(request).await;
        assert!(matches!(
            result,
            Err(ApiError::Network(_)) | Err(ApiError::Timeout)
        ));
    }
}
