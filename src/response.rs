//! Typed views over the appliance's XML response documents
//!
//! The management API answers every request with an XML document whose root
//! carries a `status` attribute and whose payload lives in nested `result`
//! elements. These helpers give each response shape a named accessor so the
//! rest of the crate never does ad hoc tag lookups.

use crate::error::JobError;

/// Opaque identifier of a server-side report job
///
/// The appliance mints the token; panreport only carries it back in
/// subsequent requests and never interprets its content.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    /// Wrap a raw job token
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The raw token, for request construction
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Extract the job identifier from an initiation response
///
/// Returns the text content of the single `job` element, exactly as the
/// appliance sent it.
///
/// # Errors
///
/// - [`JobError::MalformedResponse`] if the body is not well-formed XML
/// - [`JobError::MissingJobId`] if no `job` element exists or it is empty
pub fn job_id(body: &str) -> Result<JobId, JobError> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| JobError::MalformedResponse(e.to_string()))?;

    doc.descendants()
        .find(|node| node.has_tag_name("job"))
        .and_then(|node| node.text())
        .map(JobId::new)
        .ok_or(JobError::MissingJobId)
}

/// Classification of one job status probe
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PollStatus {
    /// The root `status` attribute equals "success"; the job is done
    Complete,
    /// The appliance does not know the job (yet)
    NotFound,
    /// Any other shape, including unparseable bodies; probe again later
    Pending,
}

/// Classify a job status response body
///
/// Never fails: bodies that are not well-formed XML fall through to the
/// substring checks, and anything unrecognized is [`PollStatus::Pending`].
pub fn poll_status(body: &str) -> PollStatus {
    if let Ok(doc) = roxmltree::Document::parse(body)
        && doc.root_element().attribute("status") == Some("success")
    {
        return PollStatus::Complete;
    }
    if body.contains("not found") {
        PollStatus::NotFound
    } else {
        PollStatus::Pending
    }
}

/// One currently connected Global Protect user
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GpUser {
    /// Login name
    pub username: String,
    /// Assigned tunnel address
    pub ip: String,
    /// Reported machine name
    pub computer: String,
}

/// Extract the connected users from a gateway current-user response
///
/// Each `entry` element contributes one user. Entries missing any of the
/// `username`, `virtual-ip` or `computer` children are skipped with a
/// warning rather than failing the whole listing.
///
/// # Errors
///
/// [`JobError::MalformedResponse`] if the body is not well-formed XML.
pub fn gp_users(body: &str) -> Result<Vec<GpUser>, JobError> {
    let doc = roxmltree::Document::parse(body)
        .map_err(|e| JobError::MalformedResponse(e.to_string()))?;

    let mut users = Vec::new();
    for entry in doc.descendants().filter(|n| n.has_tag_name("entry")) {
        let field = |name: &str| {
            entry
                .children()
                .find(|c| c.is_element() && c.tag_name().name() == name)
                .and_then(|c| c.text())
                .map(str::to_string)
        };

        match (field("username"), field("virtual-ip"), field("computer")) {
            (Some(username), Some(ip), Some(computer)) => users.push(GpUser {
                username,
                ip,
                computer,
            }),
            _ => {
                tracing::warn!("skipping user entry with missing fields");
            }
        }
    }
    Ok(users)
}
