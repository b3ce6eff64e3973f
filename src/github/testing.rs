//! Recording in-memory `Transport` for tests.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Mutex;

use super::{ApiError, Transport};

/// Serves canned responses by request path and records every request.
/// Paths without a registered response answer 404.
#[derive(Default)]
pub struct FakeTransport {
    responses: HashMap<String, Result<Value, u16>>,
    requests: Mutex<Vec<String>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_json(mut self, path: &str, body: Value) -> Self {
        self.responses.insert(path.to_string(), Ok(body));
        self
    }

    pub fn with_status(mut self, path: &str, status: u16) -> Self {
        self.responses.insert(path.to_string(), Err(status));
        self
    }

    /// All requested paths, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.as_str() == path)
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        self.requests.lock().unwrap().push(path.to_string());
        match self.responses.get(path) {
            Some(Ok(body)) => Ok(body.clone()),
            Some(Err(status)) => Err(ApiError::Status {
                status: *status,
                url: path.to_string(),
            }),
            None => Err(ApiError::Status {
                status: 404,
                url: path.to_string(),
            }),
        }
    }
}
