//! Scripted model and search doubles for tests

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};
use crate::search::{Engine, SearchError, SearchParams, SearchProvider};

/// Mock model client returning scripted replies in order
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<CompletionResponse, LlmError>>>,
    requests: Mutex<Vec<CompletionRequest>>,
    call_count: AtomicUsize,
}

impl MockLlmClient {
    /// Replies with each text in turn
    pub fn new<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let responses: VecDeque<_> = replies
            .into_iter()
            .map(|r| Ok(CompletionResponse::text(r)))
            .collect();
        debug!(response_count = %responses.len(), "MockLlmClient::new: called");
        Self {
            responses: Mutex::new(responses),
            requests: Mutex::new(Vec::new()),
            call_count: AtomicUsize::new(0),
        }
    }

    /// Queue an error after the scripted replies
    pub fn then_error(self, error: LlmError) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            responses.push_back(Err(error));
        }
        self
    }

    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        debug!(%idx, "MockLlmClient::complete: called");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        self.responses
            .lock()
            .ok()
            .and_then(|mut r| r.pop_front())
            .unwrap_or_else(|| Err(LlmError::InvalidResponse("No more mock responses".to_string())))
    }
}

/// Mock search provider with per-engine scripted payloads
///
/// Each search pops the next scripted reply for its engine; an engine with
/// nothing left answers `{}`.
#[derive(Default)]
pub struct MockSearchProvider {
    scripted: Mutex<HashMap<Engine, VecDeque<Result<Value, SearchError>>>>,
    requests: Mutex<Vec<SearchParams>>,
}

impl MockSearchProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a payload for an engine
    pub fn with_response(self, engine: Engine, payload: Value) -> Self {
        self.push(engine, Ok(payload));
        self
    }

    /// Queue an error for an engine
    pub fn with_error(self, engine: Engine, error: SearchError) -> Self {
        self.push(engine, Err(error));
        self
    }

    fn push(&self, engine: Engine, reply: Result<Value, SearchError>) {
        if let Ok(mut scripted) = self.scripted.lock() {
            scripted.entry(engine).or_default().push_back(reply);
        }
    }

    /// Every search made, in order
    pub fn requests(&self) -> Vec<SearchParams> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of searches made against one engine
    pub fn calls_for(&self, engine: Engine) -> usize {
        self.requests().iter().filter(|p| p.engine == engine).count()
    }
}

#[async_trait]
impl SearchProvider for MockSearchProvider {
    async fn search(&self, params: &SearchParams) -> Result<Value, SearchError> {
        debug!(engine = %params.engine, "MockSearchProvider::search: called");
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(params.clone());
        }
        self.scripted
            .lock()
            .ok()
            .and_then(|mut s| s.get_mut(&params.engine).and_then(VecDeque::pop_front))
            .unwrap_or_else(|| Ok(Value::Object(Default::default())))
    }
}
