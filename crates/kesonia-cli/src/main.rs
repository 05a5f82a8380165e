mod config;
mod display;
mod error;
mod server;
mod service;
#[cfg(test)]
mod testing;

use std::path::Path;

use anyhow::Context;
use clap::Parser;
use kesonia_core::ApplicantRecord;
use serde_json::Value;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use config::{Cli, Command};
use service::LoanService;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kesonia=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    tracing::debug!("kesonia v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Command::Serve(args) => {
            let context = args.models.load()?;
            let sink = args.audit_sink()?;
            server::serve(args.bind, LoanService::new(context, sink)).await
        }
        Command::Predict { file, models } => {
            let context = models.load()?;
            let evaluation = context.evaluate(&read_applicant(&file)?)?;
            display::print_decision(&evaluation.decision)
        }
        Command::Explain {
            file,
            models,
            table,
        } => {
            let context = models.load()?;
            let record = ApplicantRecord::from_json(&read_applicant(&file)?)?;
            let frames = context.explain(&record)?;
            display::print_frames(&frames, table)
        }
    }
}

fn read_applicant(path: &Path) -> anyhow::Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}
