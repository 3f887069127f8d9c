//! # panreport
//!
//! Exports asynchronous log-report jobs from a PAN-OS appliance to CSV.
//!
//! ## Design Philosophy
//!
//! - **Linear pipeline** - initiate a job, poll to completion, fetch the raw
//!   result, flatten it to a table; no stage depends on another beyond the
//!   job identifier
//! - **Typed failures** - every distinct failure cause is its own error
//!   variant, so callers branch on the reason instead of parsing log text
//! - **Bounded waiting** - a fixed poll interval with a hard attempt
//!   ceiling; the worst-case runtime is always `max_attempts * interval`
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::path::Path;
//! use std::time::Duration;
//! use panreport::config::{ApiKey, PollConfig, QueryConfig};
//! use panreport::{ApiClient, ReportSchema, run_report};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ApiClient::for_hostname(
//!         "panorama.example.com",
//!         ApiKey::new("LUFRPT1..."),
//!         Duration::from_secs(30),
//!     )?;
//!
//!     let table = run_report(
//!         &client,
//!         &QueryConfig::default(),
//!         &PollConfig::default(),
//!         &ReportSchema::default(),
//!         Path::new("hip_users_report.csv"),
//!     )
//!     .await?;
//!
//!     println!("{} records exported", table.rows.len());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// HTTP client for the appliance API
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Job-completion polling
pub mod poll;
/// Result flattening and CSV output
pub mod report;
/// Typed XML response views
pub mod response;

// Re-export commonly used types
pub use client::ApiClient;
pub use config::{ApiKey, Config, PollConfig, QueryConfig};
pub use error::{Error, JobError, ReportError, Result};
pub use poll::poll_for_completion;
pub use report::{ReportSchema, ReportTable, flatten};
pub use response::{GpUser, JobId, PollStatus};

use std::path::Path;

/// Run the whole report pipeline against one appliance
///
/// Initiates the job, polls until completion, fetches the raw result and
/// writes the flattened table to `output`. The output file is only created
/// once flattening succeeds; failures in earlier stages leave no partial
/// file behind.
///
/// # Errors
///
/// Returns the first stage failure: [`JobError`] variants from initiation
/// and polling, transport errors from the fetch, [`ReportError`] variants
/// from flattening, and I/O or CSV errors from the write.
pub async fn run_report(
    client: &ApiClient,
    query: &QueryConfig,
    poll: &PollConfig,
    schema: &ReportSchema,
    output: &Path,
) -> Result<ReportTable> {
    let job = client.initiate_job(query).await?;
    tracing::info!(job = %job, "report job initiated");

    poll_for_completion(client, &job, poll).await?;

    let payload = client.fetch_results(&job).await?;
    let table = report::flatten(&payload, schema)?;
    table.write_csv(output)?;

    tracing::info!(
        job = %job,
        output = %output.display(),
        records = table.rows.len(),
        "report written"
    );
    Ok(table)
}
