//! Bounded polling for job completion
//!
//! A fixed-interval loop with a hard attempt ceiling. There is deliberately
//! no exponential growth and no jitter: the report job is a low-frequency
//! batch operation, and a constant cadence keeps its worst-case runtime
//! predictable (`max_attempts * interval`).

use crate::client::ApiClient;
use crate::config::PollConfig;
use crate::error::JobError;
use crate::response::{JobId, PollStatus};

/// Poll until the job completes or the attempt ceiling is reached
///
/// Each attempt issues one status probe. A `Complete` probe returns
/// immediately with no further waiting. `NotFound` and `Pending` probes log
/// a warning and wait one `interval` before the next attempt; no wait
/// follows the final attempt. Exhausting the ceiling returns
/// [`JobError::Exhausted`].
pub async fn poll_for_completion(
    client: &ApiClient,
    job: &JobId,
    config: &PollConfig,
) -> Result<(), JobError> {
    for attempt in 1..=config.max_attempts {
        match client.poll_status(job).await {
            PollStatus::Complete => {
                tracing::info!(job = %job, attempts = attempt, "job completed");
                return Ok(());
            }
            PollStatus::NotFound => {
                tracing::warn!(
                    job = %job,
                    attempt,
                    max_attempts = config.max_attempts,
                    "job not found, waiting before retry"
                );
            }
            PollStatus::Pending => {
                tracing::warn!(
                    job = %job,
                    attempt,
                    max_attempts = config.max_attempts,
                    "unexpected response, waiting before retry"
                );
            }
        }

        if attempt < config.max_attempts {
            tokio::time::sleep(config.interval).await;
        }
    }

    tracing::error!(
        job = %job,
        attempts = config.max_attempts,
        "max attempts reached without job completion"
    );
    Err(JobError::Exhausted {
        attempts: config.max_attempts,
    })
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiKey;
    use std::time::Duration;
    use url::Url;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const COMPLETE: &str = r#"<response status="success"><result>FIN</result></response>"#;
    const NOT_FOUND: &str =
        r#"<response status="error"><msg><line>job 9 not found</line></msg></response>"#;
    const PENDING: &str = r#"<response status="error"><msg>pending</msg></response>"#;

    fn client_for(server: &MockServer) -> ApiClient {
        let base = Url::parse(&format!("{}/api/", server.uri())).unwrap();
        ApiClient::new(base, ApiKey::new("testkey"), Duration::from_secs(5)).unwrap()
    }

    fn poll_config(interval: Duration, max_attempts: u32) -> PollConfig {
        PollConfig {
            interval,
            max_attempts,
        }
    }

    #[tokio::test]
    async fn first_attempt_success_never_waits() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .and(query_param("action", "get"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        // An hour-long interval: the test only finishes promptly because a
        // successful probe skips the wait entirely.
        let config = poll_config(Duration::from_secs(3600), 30);

        poll_for_completion(&client, &JobId::new("9"), &config)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn recovers_after_not_found_probes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(NOT_FOUND))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let config = poll_config(Duration::from_millis(10), 30);

        poll_for_completion(&client, &JobId::new("9"), &config)
            .await
            .unwrap();

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 3, "two not-found probes, then success");
    }

    #[tokio::test]
    async fn exhaustion_performs_exactly_max_attempts_probes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PENDING))
            .expect(3)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let config = poll_config(Duration::from_millis(5), 3);

        let err = poll_for_completion(&client, &JobId::new("9"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Exhausted { attempts: 3 }));

        let received = server.received_requests().await.unwrap();
        assert_eq!(received.len(), 3);
    }

    #[tokio::test]
    async fn waits_one_interval_between_attempts() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PENDING))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let config = poll_config(Duration::from_millis(50), 3);

        let start = std::time::Instant::now();
        let _ = poll_for_completion(&client, &JobId::new("9"), &config).await;
        let elapsed = start.elapsed();

        // Three attempts, two intervals between them: at least 100ms. The
        // upper bound is generous to tolerate CI overhead.
        assert!(
            elapsed >= Duration::from_millis(100),
            "should wait two intervals, waited {:?}",
            elapsed
        );
        assert!(
            elapsed < Duration::from_secs(2),
            "should not wait after the final attempt, waited {:?}",
            elapsed
        );
    }

    #[tokio::test]
    async fn transport_failures_consume_attempts() {
        // Nothing listens on the reserved port 1
        let base = Url::parse("http://127.0.0.1:1/api/").unwrap();
        let client = ApiClient::new(base, ApiKey::new("k"), Duration::from_secs(1)).unwrap();
        let config = poll_config(Duration::from_millis(5), 2);

        let err = poll_for_completion(&client, &JobId::new("9"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Exhausted { attempts: 2 }));
    }

    #[tokio::test]
    async fn zero_max_attempts_exhausts_without_probing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/"))
            .respond_with(ResponseTemplate::new(200).set_body_string(COMPLETE))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(&server);
        let config = poll_config(Duration::from_millis(5), 0);

        let err = poll_for_completion(&client, &JobId::new("9"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, JobError::Exhausted { attempts: 0 }));
    }
}
