//! Shared test utilities for the `llm` module.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use crate::generation::error::GenerateError;
use crate::generation::request::ChatRequest;
use crate::llm::{ClientMetadata, CompletionClient};

/// Mock completion client with a pre-programmed queue of responses.
///
/// Responses are returned in FIFO order. When the queue is exhausted,
/// subsequent calls return an upstream error. Every request is recorded so
/// tests can assert whether (and with what) the upstream was called.
pub(crate) struct ConfigurableMockClient {
    responses: Arc<Mutex<VecDeque<Result<String, GenerateError>>>>,
    recorded: Arc<Mutex<Vec<ChatRequest>>>,
}

impl ConfigurableMockClient {
    /// Creates a new mock client that will return the given responses in order.
    pub(crate) fn new(responses: Vec<Result<String, GenerateError>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::from(responses))),
            recorded: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Returns a handle for inspecting recorded requests after the client
    /// has been moved into a service.
    pub(crate) fn request_handle(&self) -> RequestRecordHandle {
        RequestRecordHandle {
            recorded: self.recorded.clone(),
        }
    }
}

/// Shared handle to a mock client's recorded requests.
pub(crate) struct RequestRecordHandle {
    recorded: Arc<Mutex<Vec<ChatRequest>>>,
}

impl RequestRecordHandle {
    /// Returns all recorded requests.
    pub(crate) fn requests(&self) -> Vec<ChatRequest> {
        self.recorded.lock().unwrap().clone()
    }

    /// Returns the number of upstream calls made.
    pub(crate) fn request_count(&self) -> usize {
        self.recorded.lock().unwrap().len()
    }
}

impl CompletionClient for ConfigurableMockClient {
    fn complete<'a>(
        &'a self,
        request: &'a ChatRequest,
    ) -> Pin<Box<dyn Future<Output = Result<String, GenerateError>> + Send + 'a>> {
        let responses = self.responses.clone();
        let recorded = self.recorded.clone();
        let request = request.clone();
        Box::pin(async move {
            recorded.lock().unwrap().push(request);
            responses.lock().unwrap().pop_front().unwrap_or_else(|| {
                Err(GenerateError::Upstream {
                    status: None,
                    body: "no more mock responses".to_string(),
                })
            })
        })
    }

    fn get_metadata(&self) -> ClientMetadata {
        ClientMetadata {
            provider: "Mock".to_string(),
            model: "mock-model".to_string(),
        }
    }
}
