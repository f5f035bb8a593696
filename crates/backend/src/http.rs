//! Blocking HTTP transport with retry, backoff, and status classification.

use std::thread;
use std::time::Duration;

use log::{debug, warn};

use crate::error::BackendError;

const USER_AGENT: &str = concat!("smartspread/", env!("CARGO_PKG_VERSION"));

/// Transport tuning. Defaults: 60s timeout, 3 retries, 1s initial backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClientOptions {
    pub timeout: Duration,
    pub max_retries: u32,
    /// First wait between attempts; doubles after every retry.
    pub backoff: Duration,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 3,
            backoff: Duration::from_secs(1),
        }
    }
}

#[derive(Clone)]
pub(crate) struct HttpClient {
    http: reqwest::blocking::Client,
    token: String,
    opts: ClientOptions,
}

impl HttpClient {
    pub(crate) fn new(token: &str, opts: ClientOptions) -> Result<Self, BackendError> {
        let http = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(opts.timeout)
            .build()
            .map_err(|e| BackendError::Network(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            token: token.to_string(),
            opts,
        })
    }

    /// Send a request and parse the JSON body, retrying 429/5xx and
    /// network failures.
    ///
    /// `build_request` is called once per attempt and returns a fully
    /// configured request minus the bearer token. `what` names the target
    /// in `NotFound` errors.
    pub(crate) fn send_json(
        &self,
        what: &str,
        build_request: impl Fn(&reqwest::blocking::Client) -> reqwest::blocking::RequestBuilder,
    ) -> Result<serde_json::Value, BackendError> {
        let max = self.opts.max_retries;
        let mut backoff = self.opts.backoff;
        let mut attempt = 0u32;

        loop {
            let result = build_request(&self.http).bearer_auth(&self.token).send();

            let wait = match result {
                Ok(resp) => {
                    let status = resp.status().as_u16();

                    if resp.status().is_success() {
                        let text = resp
                            .text()
                            .map_err(|e| BackendError::Network(format!("failed to read response body: {}", e)))?;
                        if text.trim().is_empty() {
                            return Ok(serde_json::Value::Null);
                        }
                        return serde_json::from_str(&text).map_err(|e| {
                            BackendError::Parse(format!("invalid JSON response: {}", e))
                        });
                    }

                    let retry_after = resp
                        .headers()
                        .get("retry-after")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.trim().parse::<u64>().ok());
                    let body = resp.text().unwrap_or_default();
                    let msg = error_message(&body);

                    match status {
                        401 => {
                            debug!("HTTP 401 for {}: {}", what, msg);
                            return Err(BackendError::NotAuthenticated);
                        }
                        404 => return Err(BackendError::NotFound(format!("{} ({})", what, msg))),
                        400 | 422 => return Err(BackendError::Validation(msg)),
                        429 | 500..=599 => {
                            if attempt == max {
                                return Err(BackendError::Http(
                                    status,
                                    format!("{} (after {} attempts)", msg, attempt + 1),
                                ));
                            }
                            // Respect Retry-After for 429
                            let wait = match (status, retry_after) {
                                (429, Some(secs)) => Duration::from_secs(secs),
                                _ => backoff,
                            };
                            warn!(
                                "retry {}/{} in {:?} (HTTP {} for {})",
                                attempt + 1,
                                max,
                                wait,
                                status,
                                what
                            );
                            wait
                        }
                        _ => return Err(BackendError::Http(status, msg)),
                    }
                }
                Err(e) => {
                    if attempt == max {
                        return Err(BackendError::Network(format!(
                            "{} after {} attempts",
                            e,
                            attempt + 1
                        )));
                    }
                    warn!("retry {}/{} in {:?} ({})", attempt + 1, max, backoff, e);
                    backoff
                }
            };

            thread::sleep(wait);
            backoff *= 2;
            attempt += 1;
        }
    }
}

/// Pull `error.message` out of a Google API error body, falling back to
/// the raw text (first 200 chars).
pub(crate) fn error_message(body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(msg) = json["error"]["message"].as_str() {
            return msg.to_string();
        }
        if let Some(msg) = json["error"].as_str() {
            return msg.to_string();
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return "no response body".to_string();
    }
    trimmed.chars().take(200).collect()
}
