//! Mock transport for testing
//!
//! Scripted responses per method and path, with captured requests for
//! assertions. Responses queued for a route are served in order; the last one
//! repeats. Unscripted routes answer 404.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};

use super::{HttpRequest, HttpResponse, Transport};
use crate::error::{ApiError, ApiResult};

#[derive(Clone)]
enum Scripted {
    Response(HttpResponse),
    Error(ApiError),
}

/// Mock transport for unit tests.
///
/// # Example
/// ```ignore
/// let mock = MockTransport::new();
/// mock.on_post("/api/login", 200, r#"{"meta":{"rc":"ok"}}"#);
/// let response = mock.send(HttpRequest::post("https://h/api/login")).await?;
/// assert_eq!(mock.count(Method::POST, "/api/login"), 1);
/// ```
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<(Method, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Mutex<Option<Duration>>,
}

/// Build a response with headers, for routes that need more than a body.
pub fn response(status: u16, body: &str, headers: &[(&str, &str)]) -> HttpResponse {
    let mut response = HttpResponse::new(
        StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
        body,
    );
    for (name, value) in headers {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            response.headers.append(name, value);
        }
    }
    response
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Delay every response, to hold operations in flight.
    pub fn with_delay(self, delay: Duration) -> Self {
        *self.delay.lock().unwrap() = Some(delay);
        self
    }

    fn push(&self, method: Method, path: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(scripted);
    }

    pub fn on_response(&self, method: Method, path: &str, response: HttpResponse) {
        self.push(method, path, Scripted::Response(response));
    }

    pub fn on_get(&self, path: &str, status: u16, body: &str) {
        self.on_response(Method::GET, path, response(status, body, &[]));
    }

    pub fn on_post(&self, path: &str, status: u16, body: &str) {
        self.on_response(Method::POST, path, response(status, body, &[]));
    }

    pub fn on_error(&self, method: Method, path: &str, error: ApiError) {
        self.push(method, path, Scripted::Error(error));
    }

    /// Drop every scripted response for a route.
    pub fn reset_route(&self, method: Method, path: &str) {
        self.routes
            .lock()
            .unwrap()
            .remove(&(method, path.to_string()));
    }

    /// All requests received so far
    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of requests received for a method and path
    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path() == path)
            .count()
    }

    pub fn total(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    fn next(&self, method: &Method, path: &str) -> Option<Scripted> {
        let mut routes = self.routes.lock().unwrap();
        let queue = routes.get_mut(&(method.clone(), path.to_string()))?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let path = request.path().to_string();
        let method = request.method.clone();
        self.requests.lock().unwrap().push(request);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match self.next(&method, &path) {
            Some(Scripted::Response(response)) => Ok(response),
            Some(Scripted::Error(error)) => Err(error),
            None => Ok(HttpResponse::new(StatusCode::NOT_FOUND, "")),
        }
    }
}
