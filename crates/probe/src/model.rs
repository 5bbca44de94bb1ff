//! Probe cases, suites and their classification.

use serde::Serialize;
use serde_json::Value;

/// Status codes a probe accepts unless it declares its own set.
pub const DEFAULT_EXPECTED: &[u16] = &[200, 201];

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProbeStatus {
    /// The response status was in the expected set.
    Passed,
    /// Unexpected status, or the request itself failed.
    Failed,
    /// A prerequisite probe returned no data to build this request from.
    Skipped,
    /// A credential was required but none was held.
    Blocked,
}

impl ProbeStatus {
    pub const ALL: &'static [ProbeStatus] = &[Self::Passed, Self::Failed, Self::Skipped, Self::Blocked];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Passed => "PASSED",
            Self::Failed => "FAILED",
            Self::Skipped => "SKIPPED",
            Self::Blocked => "BLOCKED",
        }
    }

    /// Classify an HTTP status against the expected set.
    pub fn classify(status: u16, expected: &[u16]) -> Self {
        if expected.contains(&status) {
            Self::Passed
        } else {
            Self::Failed
        }
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// Which credential a probe sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeAuth {
    /// The session token obtained at login; blocked without one.
    Session,
    /// No `Authorization` header at all.
    Anonymous,
    /// A fixed bearer token, e.g. a deliberately invalid one.
    Token(String),
}

/// One declared HTTP request and the status codes it accepts.
#[derive(Debug, Clone)]
pub struct Probe {
    pub name: String,
    pub method: reqwest::Method,
    pub path: String,
    pub body: Option<Value>,
    pub auth: ProbeAuth,
    pub expected: &'static [u16],
}

impl Probe {
    pub fn get(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: reqwest::Method::GET,
            path: path.into(),
            body: None,
            auth: ProbeAuth::Session,
            expected: DEFAULT_EXPECTED,
        }
    }

    pub fn post(path: impl Into<String>, name: impl Into<String>, body: Value) -> Self {
        Self {
            method: reqwest::Method::POST,
            body: Some(body),
            ..Self::get(path, name)
        }
    }

    pub fn anonymous(mut self) -> Self {
        self.auth = ProbeAuth::Anonymous;
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.auth = ProbeAuth::Token(token.into());
        self
    }

    pub fn expecting(mut self, expected: &'static [u16]) -> Self {
        self.expected = expected;
        self
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// Outcome of one probe.
#[derive(Debug, Clone, Serialize)]
pub struct ProbeCase {
    pub name: String,
    pub status: ProbeStatus,
    pub http_code: Option<u16>,
    /// Seconds from send to full response body.
    pub response_time: f64,
    pub error_message: String,
    pub request_url: String,
    /// Parsed body, or `{"raw": <text>}` when it is not JSON.
    #[serde(skip)]
    pub response: Option<Value>,
}

impl ProbeCase {
    pub fn new(name: impl Into<String>, status: ProbeStatus, request_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            http_code: None,
            response_time: 0.0,
            error_message: String::new(),
            request_url: request_url.into(),
            response: None,
        }
    }

    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.error_message = message.into();
        self
    }

    pub fn passed(&self) -> bool {
        self.status == ProbeStatus::Passed
    }

    /// Identifier of the first entry of a passed paged list response
    /// (`data.items[0].id`), rendered for use in a path.
    pub fn first_item_id(&self) -> Option<String> {
        if !self.passed() {
            return None;
        }
        let id = self.response.as_ref()?.pointer("/data/items/0/id")?;
        match id {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

/// Ordered group of probes reported together.
#[derive(Debug, Clone)]
pub struct ProbeSuite {
    pub name: &'static str,
    pub cases: Vec<ProbeCase>,
}

impl ProbeSuite {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            cases: Vec::new(),
        }
    }

    pub fn total(&self) -> usize {
        self.cases.len()
    }

    pub fn count(&self, status: ProbeStatus) -> usize {
        self.cases.iter().filter(|c| c.status == status).count()
    }

    /// Percentage of executed cases that passed; skipped cases are not
    /// executed and do not count against the suite.
    pub fn pass_rate(&self) -> f64 {
        pass_rate(self.count(ProbeStatus::Passed), self.total() - self.count(ProbeStatus::Skipped))
    }
}

pub(crate) fn pass_rate(passed: usize, executed: usize) -> f64 {
    if executed == 0 {
        0.0
    } else {
        passed as f64 / executed as f64 * 100.0
    }
}
