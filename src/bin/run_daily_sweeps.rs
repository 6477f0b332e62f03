// Daily scheduled job: commission expiry, compliance scan, renewal notices.
//
// Usage:
//   run_daily_sweeps [db_path] [now_rfc3339]
//
// Prints the sweep report as JSON on stdout.
// Exit code: 0 = all steps succeeded, 1 = partial failure, 2 = startup failure.

use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use hrm8_sales_engine::app::{get_default_db_path, AppState};
use hrm8_sales_engine::logging;

fn parse_now(arg: Option<String>) -> anyhow::Result<DateTime<Utc>> {
    match arg.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) {
        Some(raw) => Ok(DateTime::parse_from_rfc3339(&raw)
            .with_context(|| format!("invalid timestamp: {}", raw))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

async fn run() -> anyhow::Result<i32> {
    let mut args = std::env::args().skip(1);
    let db_path = args.next().unwrap_or_else(get_default_db_path);
    let now = parse_now(args.next())?;

    let state = AppState::new(db_path).map_err(|e| anyhow!(e))?;
    let report = state.sweeps.run_daily(now).await;

    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("serializing sweep report")?
    );
    Ok(report.status_code())
}

#[tokio::main]
async fn main() {
    if std::env::var("HRM8_LOG_JSON").is_ok() {
        logging::init_json();
    } else {
        logging::init();
    }

    let code = match run().await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "daily sweeps aborted");
            2
        }
    };
    std::process::exit(code);
}
