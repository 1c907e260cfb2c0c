//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use refyne_client::header::{HeaderMap, HeaderName, HeaderValue};
use refyne_client::{
    Bytes, HttpRequest, HttpResponse, LogFields, Logger, StatusCode, Transport, TransportError,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// A single log line captured by [`RecordingLogger`].
#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: &'static str,
    pub message: String,
    pub fields: LogFields,
}

/// Logger that keeps every message for later assertions.
#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<LogLine>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<LogLine> {
        self.lines.lock().unwrap().clone()
    }

    pub fn warnings(&self) -> Vec<LogLine> {
        self.lines()
            .into_iter()
            .filter(|l| l.level == "warn")
            .collect()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.lines()
            .iter()
            .filter(|l| l.message.contains(needle))
            .count()
    }

    fn push(&self, level: &'static str, msg: &str, fields: Option<&LogFields>) {
        self.lines.lock().unwrap().push(LogLine {
            level,
            message: msg.to_string(),
            fields: fields.cloned().unwrap_or_default(),
        });
    }
}

impl Logger for RecordingLogger {
    fn debug(&self, msg: &str, fields: Option<&LogFields>) {
        self.push("debug", msg, fields);
    }
    fn info(&self, msg: &str, fields: Option<&LogFields>) {
        self.push("info", msg, fields);
    }
    fn warn(&self, msg: &str, fields: Option<&LogFields>) {
        self.push("warn", msg, fields);
    }
    fn error(&self, msg: &str, fields: Option<&LogFields>) {
        self.push("error", msg, fields);
    }
}

/// What the scripted transport does on one attempt.
pub enum Step {
    Respond(HttpResponse),
    Fail(&'static str),
    /// Wait before carrying out the inner step.
    Delay(Duration, Box<Step>),
}

/// Transport that plays back a fixed list of steps, one per attempt.
#[derive(Default)]
pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    calls: AtomicUsize,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request);

        let mut step = self
            .steps
            .lock()
            .unwrap()
            .pop_front()
            .expect("transport called more times than scripted");

        loop {
            match step {
                Step::Respond(response) => return Ok(response),
                Step::Fail(msg) => return Err(TransportError::other(msg)),
                Step::Delay(wait, inner) => {
                    tokio::time::sleep(wait).await;
                    step = *inner;
                }
            }
        }
    }
}

/// Build a JSON response with optional extra headers.
pub fn json_response(status: u16, body: Value, headers: &[(&str, &str)]) -> HttpResponse {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        map.insert(
            HeaderName::from_bytes(name.as_bytes()).unwrap(),
            HeaderValue::from_str(value).unwrap(),
        );
    }
    HttpResponse {
        status: StatusCode::from_u16(status).unwrap(),
        headers: map,
        body: Bytes::from(serde_json::to_vec(&body).unwrap()),
    }
}

pub fn respond(status: u16, body: Value, headers: &[(&str, &str)]) -> Step {
    Step::Respond(json_response(status, body, headers))
}

/// Assert that roughly `expected` has passed on the (paused) tokio clock.
pub fn assert_elapsed(started: tokio::time::Instant, expected: Duration) {
    let elapsed = started.elapsed();
    assert!(
        elapsed >= expected && elapsed < expected + Duration::from_millis(50),
        "expected ~{expected:?}, got {elapsed:?}"
    );
}
