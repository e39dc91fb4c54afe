use std::time::Duration;

use clap::Parser;
use db_bootstrap::{ensure_database_exists_from_env, BootstrapSettings, CreationOutcome};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "db-bootstrap")]
#[command(about = "Create the databases named by DSN environment variables if they are missing")]
struct Args {
    /// Environment variable holding a DSN; repeat for several databases
    #[arg(
        short = 'e',
        long = "env-var",
        value_name = "NAME",
        default_values = ["SQL_DSN", "LOG_SQL_DSN"]
    )]
    env_vars: Vec<String>,

    /// Bound on opening each admin connection and on its liveness probe
    #[arg(long, value_name = "MS")]
    probe_timeout_ms: Option<u64>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stdout)
        .without_time()
        .with_target(false)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_line_number(false)
        .with_file(false)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,sea_orm=warn")),
        )
        .init();

    let args = Args::parse();

    let mut settings = BootstrapSettings::from_env();
    if let Some(ms) = args.probe_timeout_ms {
        settings = settings.with_probe_timeout(Duration::from_millis(ms));
    }

    for env_name in &args.env_vars {
        match ensure_database_exists_from_env(env_name, &settings).await {
            Ok(CreationOutcome::Skipped(reason)) => {
                info!(env = %env_name, reason = ?reason, "bootstrap=skipped");
            }
            Ok(outcome) => {
                info!(env = %env_name, outcome = ?outcome, "bootstrap=done");
            }
            Err(e) => {
                eprintln!("❌ Database bootstrap failed ({:?}): {e}", e.kind());
                std::process::exit(1);
            }
        }
    }
}
