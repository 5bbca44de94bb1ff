//! HTTP transport for probes.

use std::time::{Duration, Instant};

use serde_json::{json, Value};

use crate::error::ProbeError;
use crate::model::{Probe, ProbeAuth, ProbeCase, ProbeStatus};

/// Per-request timeout; a probe that exceeds it fails.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Sends one probe at a time against a single server.
pub struct ProbeClient {
    client: reqwest::Client,
    base_url: String,
}

impl ProbeClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Execute `probe`, attaching `session` when the probe asks for it.
    ///
    /// Transport failures and timeouts become [`ProbeStatus::Failed`] cases.
    pub async fn send(&self, probe: &Probe, session: Option<&str>) -> ProbeCase {
        let url = format!("{}{}", self.base_url, probe.path);

        let bearer = match &probe.auth {
            ProbeAuth::Anonymous => None,
            ProbeAuth::Token(token) => Some(token.as_str()),
            ProbeAuth::Session => match session {
                Some(token) => Some(token),
                None => {
                    return ProbeCase::new(&probe.name, ProbeStatus::Blocked, url)
                        .with_error("no session token");
                }
            },
        };

        let mut request = self.client.request(probe.method.clone(), &url);
        if let Some(body) = &probe.body {
            request = request.json(body);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }

        let started = Instant::now();
        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                return ProbeCase::new(&probe.name, ProbeStatus::Failed, url).with_error(e.to_string());
            }
        };
        let http_code = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                let mut case = ProbeCase::new(&probe.name, ProbeStatus::Failed, url).with_error(e.to_string());
                case.http_code = Some(http_code);
                return case;
            }
        };
        let elapsed = started.elapsed().as_secs_f64();

        let status = ProbeStatus::classify(http_code, probe.expected);
        let mut case = ProbeCase::new(&probe.name, status, url);
        case.http_code = Some(http_code);
        case.response_time = elapsed;
        case.response = Some(serde_json::from_str(&text).unwrap_or_else(|_| json!({ "raw": text })));
        if status == ProbeStatus::Failed {
            case.error_message = format!("expected status {:?}, got {http_code}", probe.expected);
        }
        case
    }
}

/// Session token from a login response, trying the known response shapes in
/// order.
pub fn extract_token(body: &Value) -> Option<String> {
    const POINTERS: [&str; 5] = [
        "/data/session_token",
        "/data/token",
        "/token",
        "/session_token",
        "/access_token",
    ];
    POINTERS
        .iter()
        .filter_map(|p| body.pointer(p).and_then(Value::as_str))
        .find(|token| !token.is_empty())
        .map(str::to_string)
}
