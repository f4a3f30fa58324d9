//! Scripted HTTP port for unit tests.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::time::Instant;

use crate::app::ports::{HttpClientPort, HttpGetResult, HttpRequest};

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedHttp {
    responses: Mutex<VecDeque<Result<HttpGetResult, String>>>,
    seen: Mutex<Vec<(HttpRequest, Instant)>>,
}

impl ScriptedHttp {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_status(&self, status: u16, body: &str) -> &Self {
        self.responses.lock().unwrap().push_back(Ok(HttpGetResult {
            status,
            bytes: body.as_bytes().to_vec(),
        }));
        self
    }

    pub fn push_json(&self, body: serde_json::Value) -> &Self {
        self.push_status(200, &body.to_string())
    }

    pub fn push_transport_error(&self, message: &str) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(message.to_string()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().iter().map(|(r, _)| r.clone()).collect()
    }

    pub fn request_times(&self) -> Vec<Instant> {
        self.seen.lock().unwrap().iter().map(|(_, t)| *t).collect()
    }
}

#[async_trait]
impl HttpClientPort for ScriptedHttp {
    async fn get(&self, request: &HttpRequest) -> Result<HttpGetResult, String> {
        self.seen
            .lock()
            .unwrap()
            .push((request.clone(), Instant::now()));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(format!("no scripted response for {}", request.url)))
    }
}

/// A page of `n` countries named after their index, starting at `offset`.
pub fn country_page(offset: usize, n: usize) -> serde_json::Value {
    let results: Vec<serde_json::Value> = (offset..offset + n)
        .map(|i| serde_json::json!({ "code": format!("C{}", i), "name": format!("Country {}", i) }))
        .collect();
    serde_json::json!({ "meta": { "found": n }, "results": results })
}
