//! In-memory `ChatApi` used by unit tests.

use crate::api::{ChatApi, DeltaStream};
use anyhow::Result;
use async_trait::async_trait;
use futures::stream;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub body: Option<Value>,
}

/// Replays canned responses per `(method, path)` in the order they were
/// queued and records every request. Unqueued requests fail.
#[derive(Default)]
pub struct MockApi {
    responses: Mutex<HashMap<(&'static str, String), VecDeque<Result<Value, String>>>>,
    fragments: Mutex<Vec<Result<String, String>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, method: &'static str, path: &str, value: Value) -> &Self {
        self.queue(method, path, Ok(value))
    }

    pub fn fail(&self, method: &'static str, path: &str, message: &str) -> &Self {
        self.queue(method, path, Err(message.to_string()))
    }

    pub fn stream(&self, fragments: Vec<Result<String, String>>) -> &Self {
        *self.fragments.lock().unwrap() = fragments;
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn queue(&self, method: &'static str, path: &str, response: Result<Value, String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(response);
        self
    }

    fn record(&self, method: &'static str, path: &str, body: Option<Value>) {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            body,
        });
    }

    fn next(&self, method: &'static str, path: &str) -> Result<Value> {
        let response = self
            .responses
            .lock()
            .unwrap()
            .get_mut(&(method, path.to_string()))
            .and_then(|queue| queue.pop_front());
        match response {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(anyhow::anyhow!(message)),
            None => Err(anyhow::anyhow!("no response queued for {} {}", method, path)),
        }
    }
}

#[async_trait]
impl ChatApi for MockApi {
    async fn get(&self, path: &str) -> Result<Value> {
        self.record("GET", path, None);
        self.next("GET", path)
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<Value> {
        self.record("POST", path, body);
        self.next("POST", path)
    }

    async fn post_stream(&self, path: &str, body: Option<Value>) -> Result<DeltaStream> {
        self.record("POST", path, body);
        let fragments: Vec<Result<String>> = std::mem::take(&mut *self.fragments.lock().unwrap())
            .into_iter()
            .map(|f| f.map_err(|message| anyhow::anyhow!(message)))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}
