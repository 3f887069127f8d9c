//! HTTP client for the appliance management API
//!
//! All requests target the single `/api/` endpoint on the configured host,
//! differentiated by query-string parameters. Report job requests carry the
//! credential as the `key` query parameter; op commands carry it as the
//! `X-PAN-KEY` header instead, matching the two authentication styles the
//! appliance accepts.

use std::time::Duration;
use url::Url;

use crate::config::{ApiKey, QueryConfig};
use crate::error::{Error, JobError, Result};
use crate::response::{self, GpUser, JobId, PollStatus};

/// Header carrying the credential for op commands
const PAN_KEY_HEADER: &str = "X-PAN-KEY";

/// Op command listing currently connected Global Protect users
const GP_USERS_CMD: &str =
    "<show><global-protect-gateway><current-user/></global-protect-gateway></show>";

/// Client for one appliance
pub struct ApiClient {
    http: reqwest::Client,
    base: Url,
    key: ApiKey,
}

impl ApiClient {
    /// Create a client for an explicit endpoint URL
    ///
    /// `base` must point at the API endpoint itself (e.g.
    /// `https://host/api/`). Used directly by tests against mock servers;
    /// production callers go through [`ApiClient::for_hostname`].
    pub fn new(base: Url, key: ApiKey, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { http, base, key })
    }

    /// Create a client for `https://{hostname}/api/`
    pub fn for_hostname(hostname: &str, key: ApiKey, timeout: Duration) -> Result<Self> {
        let base = Url::parse(&format!("https://{hostname}/api/")).map_err(|e| Error::Config {
            message: format!("invalid hostname {hostname:?}: {e}"),
            key: Some("hostname".to_string()),
        })?;
        Self::new(base, key, timeout)
    }

    /// The endpoint this client talks to
    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Initiate a report job for log records at or after the query's start date
    ///
    /// One GET, no retries: a failure here is terminal for the run. Every
    /// failure cause is logged and returned as a distinct [`JobError`]
    /// variant so callers can branch without reading the log.
    pub async fn initiate_job(&self, query: &QueryConfig) -> Result<JobId, JobError> {
        let filter = format!("(receive_time geq '{}')", query.start_date);
        let response = self
            .http
            .get(self.base.clone())
            .query(&[
                ("type", "log"),
                ("log-type", query.log_type.as_str()),
                ("query", filter.as_str()),
                ("key", self.key.expose()),
            ])
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "network error while initiating job");
                JobError::Transport(e)
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::error!(status = status.as_u16(), "failed to initiate job");
            return Err(JobError::HttpStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(|e| {
            tracing::error!(error = %e, "failed to read initiation response");
            JobError::Transport(e)
        })?;

        response::job_id(&body).map_err(|e| {
            tracing::error!(error = %e, "no job identifier in initiation response");
            e
        })
    }

    /// Probe the status of a running job
    ///
    /// Never fails: transport errors and unreadable bodies classify as
    /// [`PollStatus::Pending`], consuming one attempt of the caller's
    /// bounded loop.
    pub async fn poll_status(&self, job: &JobId) -> PollStatus {
        let response = self
            .http
            .get(self.base.clone())
            .query(&[
                ("type", "log"),
                ("action", "get"),
                ("job-id", job.as_str()),
                ("key", self.key.expose()),
            ])
            .send()
            .await;

        match response {
            Ok(response) => match response.text().await {
                Ok(body) => {
                    tracing::debug!(job = %job, body = %body, "poll response");
                    response::poll_status(&body)
                }
                Err(e) => {
                    tracing::warn!(job = %job, error = %e, "failed to read poll response");
                    PollStatus::Pending
                }
            },
            Err(e) => {
                tracing::warn!(job = %job, error = %e, "poll request failed");
                PollStatus::Pending
            }
        }
    }

    /// Fetch the raw result payload of a completed job
    ///
    /// Pure pass-through: the body is returned unmodified and unvalidated,
    /// and transport errors propagate to the caller. The URL is assembled by
    /// hand rather than through the query builder: the appliance serves
    /// this retrieval as a separately constructed request from the status
    /// probe, and the two are kept distinct.
    pub async fn fetch_results(&self, job: &JobId) -> Result<String> {
        let url = format!(
            "{}?type=log&action=get&job-id={}&key={}",
            self.base,
            urlencoding::encode(job.as_str()),
            urlencoding::encode(self.key.expose()),
        );
        let response = self.http.get(&url).send().await?;
        Ok(response.text().await?)
    }

    /// List currently connected Global Protect users
    pub async fn current_gp_users(&self) -> Result<Vec<GpUser>> {
        let response = self
            .http
            .get(self.base.clone())
            .query(&[("type", "op"), ("cmd", GP_USERS_CMD)])
            .header(PAN_KEY_HEADER, self.key.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                "failed to retrieve Global Protect users"
            );
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Ok(response::gp_users(&body)?)
    }

    /// Fetch the host posture report for one connected user
    pub async fn hip_report(&self, user: &GpUser) -> Result<String> {
        let cmd = format!(
            "<show><user><hip-report><user>{}</user><ip>{}</ip><computer>{}</computer></hip-report></user></show>",
            user.username, user.ip, user.computer,
        );
        let response = self
            .http
            .get(self.base.clone())
            .query(&[("type", "op"), ("cmd", cmd.as_str())])
            .header(PAN_KEY_HEADER, self.key.expose())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(
                user = %user.username,
                status = status.as_u16(),
                "failed to retrieve HIP report"
            );
            return Err(Error::UnexpectedStatus {
                status: status.as_u16(),
            });
        }

        Ok(response.text().await?)
    }
}
