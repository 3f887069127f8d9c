//! panreport - export appliance log-report jobs to CSV

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use panreport::config::{self, Config};
use panreport::{ApiClient, Error, ReportSchema, Result, poll_for_completion, report};

#[derive(Parser)]
#[command(
    name = "panreport",
    version,
    about = "Export log-report jobs from a PAN-OS appliance to CSV"
)]
struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Hostname of the PAN-OS appliance (overrides the config file)
    #[arg(long, global = true)]
    hostname: Option<String>,

    /// Path to the configuration file (default: panreport.toml if present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a log-report job and export the result to CSV
    Fetch {
        /// Number of logs to capture (informational only)
        #[arg(long, default_value_t = 5000)]
        logs: u32,

        /// Date to start the query, format: YYYY/MM/DD HH:MM:SS
        #[arg(long)]
        startdate: Option<String>,

        /// Output CSV path (overrides the config file)
        #[arg(long, value_name = "PATH")]
        output: Option<PathBuf>,
    },

    /// List connected Global Protect users and print a HIP report for each
    GpReport,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.debug);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging(debug: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(if debug { "debug" } else { "info" }));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(hostname) = cli.hostname {
        config.hostname = Some(hostname);
    }

    match cli.command {
        Commands::Fetch {
            logs,
            startdate,
            output,
        } => fetch(config, logs, startdate, output).await,
        Commands::GpReport => gp_report(config).await,
    }
}

fn client_from(config: &Config) -> Result<ApiClient> {
    let hostname = config.hostname.as_deref().ok_or_else(|| Error::Config {
        message: "no hostname configured (use --hostname or the config file)".to_string(),
        key: Some("hostname".to_string()),
    })?;
    let key = config.resolve_api_key()?;
    ApiClient::for_hostname(hostname, key, config.request_timeout)
}

async fn fetch(
    mut config: Config,
    logs: u32,
    startdate: Option<String>,
    output: Option<PathBuf>,
) -> Result<()> {
    config.query.max_logs = logs;
    if let Some(startdate) = startdate {
        config.query.start_date = startdate;
    }
    if let Some(output) = output {
        config.output = output;
    }
    config::validate_start_date(&config.query.start_date)?;

    let client = client_from(&config)?;
    tracing::info!(
        log_type = %config.query.log_type,
        start_date = %config.query.start_date,
        max_logs = config.query.max_logs,
        "requesting report"
    );

    let job = match client.initiate_job(&config.query).await {
        Ok(job) => job,
        Err(e) => {
            println!("Failed to initiate job. Check your API key and the log output for details.");
            return Err(e.into());
        }
    };
    println!("Job ID: {job}");

    if let Err(e) = poll_for_completion(&client, &job, &config.poll).await {
        println!("Job did not complete within the configured attempts.");
        return Err(e.into());
    }

    let payload = client.fetch_results(&job).await?;
    let table = report::flatten(&payload, &ReportSchema::default())?;
    table.write_csv(&config.output)?;
    println!(
        "Report with {} records saved to {}",
        table.rows.len(),
        config.output.display()
    );
    Ok(())
}

async fn gp_report(config: Config) -> Result<()> {
    let client = client_from(&config)?;

    let users = client.current_gp_users().await?;
    if users.is_empty() {
        println!("No connected Global Protect users.");
        return Ok(());
    }

    for user in &users {
        match client.hip_report(user).await {
            Ok(body) => println!("HIP report for {}:\n{}", user.username, body),
            Err(e) => {
                tracing::warn!(user = %user.username, error = %e, "failed to retrieve HIP report");
            }
        }
    }
    Ok(())
}
