use crate::logw;
use anyhow::{Context, Result};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

const USER_AGENT: &str = concat!("niche-shorts/", env!("CARGO_PKG_VERSION"));
const MAX_BODY_SNIPPET: usize = 800;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("gave up after {attempts} attempts (last failure: {last})")]
    Exhausted { attempts: u32, last: String },
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),
    #[error("response body was empty")]
    EmptyBody,
}

impl TransportError {
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(1u32 << retry.min(16))
    }
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Shared HTTP client used for every outbound call.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    policy: RetryPolicy,
}

impl Transport {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(Duration::from_secs(15))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self::with_client(client, RetryPolicy::default()))
    }

    pub fn with_client(client: Client, policy: RetryPolicy) -> Self {
        Self { client, policy }
    }

    /// Sends the request produced by `build`, rebuilding it for every attempt.
    ///
    /// 429 and 5xx responses as well as connect and timeout failures are retried with
    /// exponential backoff. Any other non-success status is returned immediately with its body.
    pub async fn send<F>(&self, label: &str, build: F) -> Result<Response, TransportError>
    where
        F: Fn(&Client) -> RequestBuilder,
    {
        let mut retry = 0;
        loop {
            let last = match build(&self.client).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if status.is_success() {
                        return Ok(resp);
                    }
                    if !is_retryable_status(status) {
                        let body = resp.text().await.unwrap_or_default();
                        let body = body.chars().take(MAX_BODY_SNIPPET).collect::<String>();
                        return Err(TransportError::Status {
                            status: status.as_u16(),
                            body,
                        });
                    }
                    format!("HTTP {}", status.as_u16())
                }
                Err(err) if err.is_connect() || err.is_timeout() => err.to_string(),
                Err(err) => return Err(TransportError::Request(err)),
            };

            if retry >= self.policy.max_retries {
                return Err(TransportError::Exhausted {
                    attempts: retry + 1,
                    last,
                });
            }

            let delay = self.policy.delay_for(retry);
            logw(format!(
                "{} attempt {} failed ({}); retrying in {:.1}s",
                label,
                retry + 1,
                last,
                delay.as_secs_f64()
            ));
            sleep(delay).await;
            retry += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_transport() -> Transport {
        Transport::with_client(
            Client::new(),
            RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(5),
            },
        )
    }

    #[test]
    fn backoff_doubles_from_base() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(2), Duration::from_secs(4));
    }

    #[test]
    fn retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(is_retryable_status(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!is_retryable_status(StatusCode::UNAUTHORIZED));
        assert!(!is_retryable_status(StatusCode::BAD_REQUEST));
    }

    #[tokio::test]
    async fn retries_server_errors_then_succeeds() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let url = format!("{}/flaky", server.uri());
        let resp = fast_transport()
            .send("test", |c| c.get(&url))
            .await
            .unwrap();
        assert_eq!(resp.text().await.unwrap(), "ok");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn rate_limit_exhausts_budget() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(429))
            .mount(&server)
            .await;

        let url = format!("{}/limited", server.uri());
        let err = fast_transport()
            .send("test", |c| c.get(&url))
            .await
            .unwrap_err();
        match err {
            TransportError::Exhausted { attempts, last } => {
                assert_eq!(attempts, 4);
                assert_eq!(last, "HTTP 429");
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(server.received_requests().await.unwrap().len(), 4);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let url = format!("{}/secure", server.uri());
        let err = fast_transport()
            .send("test", |c| c.post(&url))
            .await
            .unwrap_err();
        assert_eq!(err.status(), Some(401));
        assert!(err.to_string().contains("bad key"));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn redirect_failures_are_not_retried() {
        let server = MockServer::start().await;
        let url = format!("{}/loop", server.uri());
        Mock::given(method("GET"))
            .and(path("/loop"))
            .respond_with(ResponseTemplate::new(302).insert_header("location", url.as_str()))
            .mount(&server)
            .await;

        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(0))
            .build()
            .unwrap();
        let transport = Transport::with_client(
            client,
            RetryPolicy {
                max_retries: 3,
                base_delay: Duration::from_millis(5),
            },
        );
        let err = transport.send("test", |c| c.get(&url)).await.unwrap_err();
        assert!(matches!(err, TransportError::Request(ref e) if e.is_redirect()));
        assert_eq!(server.received_requests().await.unwrap().len(), 1);
    }
}
