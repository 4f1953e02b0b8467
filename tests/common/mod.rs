//! Shared test doubles for integration tests

use async_trait::async_trait;
use goshawk_search::transport::{ApiExecutor, ApiRequest};
use goshawk_search::{ApiError, SearchClient};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Organization id used across integration tests
#[allow(dead_code)]
pub const TEST_OID: &str = "0f6b9b90-55a2-4ad8-95ae-5e312941b817";

/// Executor double that replays a scripted sequence of responses and
/// records every request it receives.
///
/// Responses are consumed in order; running past the end of the script
/// panics, which turns an unexpected extra request into a test failure.
#[allow(dead_code)]
pub struct ScriptedExecutor {
    responses: Mutex<VecDeque<Result<Value, ApiError>>>,
    calls: Mutex<Vec<ApiRequest>>,
}

#[allow(dead_code)]
impl ScriptedExecutor {
    pub fn new(responses: Vec<Result<Value, ApiError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        })
    }

    /// Requests seen so far, in order
    pub fn calls(&self) -> Vec<ApiRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ApiExecutor for ScriptedExecutor {
    async fn call(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let next = self.responses.lock().unwrap().pop_front();
        let label = format!("{:?} {}", request.method, request.path);
        self.calls.lock().unwrap().push(request);
        next.unwrap_or_else(|| panic!("no scripted response left for {label}"))
    }
}

/// Client wired to a scripted executor
#[allow(dead_code)]
pub fn scripted_client(executor: Arc<ScriptedExecutor>) -> SearchClient {
    init_tracing();
    SearchClient::new(executor, TEST_OID)
}

/// Route library logs to the test output; `RUST_LOG=debug` shows them
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
