use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use crate::transport::{BackendTransport, JsonResponse, Method, TransportError};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Scripted in-memory transport. Tests queue responses in order and assert
/// on the recorded requests afterwards; an unscripted request is a test bug
/// and surfaces as a transport error.
#[derive(Default)]
pub struct FakeTransport {
    json_responses: Mutex<VecDeque<JsonResponse>>,
    byte_responses: Mutex<VecDeque<(u16, Vec<u8>)>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl FakeTransport {
    pub fn push_json(&self, status: u16, body: Value) {
        self.json_responses
            .lock()
            .expect("fake transport lock")
            .push_back(JsonResponse { status, body });
    }

    pub fn push_bytes(&self, status: u16, bytes: Vec<u8>) {
        self.byte_responses.lock().expect("fake transport lock").push_back((status, bytes));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().expect("fake transport lock").clone()
    }

    fn record(&self, method: Method, path: &str, body: Option<Value>) {
        self.requests
            .lock()
            .expect("fake transport lock")
            .push(RecordedRequest { method, path: path.to_owned(), body });
    }
}

#[async_trait]
impl BackendTransport for FakeTransport {
    async fn request_json(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<JsonResponse, TransportError> {
        self.record(method, path, body);
        self.json_responses
            .lock()
            .expect("fake transport lock")
            .pop_front()
            .ok_or_else(|| TransportError::Request(format!("unscripted request to {path}")))
    }

    async fn request_bytes(&self, path: &str) -> Result<(u16, Vec<u8>), TransportError> {
        self.record(Method::Get, path, None);
        self.byte_responses
            .lock()
            .expect("fake transport lock")
            .pop_front()
            .ok_or_else(|| TransportError::Request(format!("unscripted request to {path}")))
    }
}
