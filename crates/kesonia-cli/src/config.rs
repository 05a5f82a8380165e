//! Command-line and environment configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, ensure};
use clap::{Args, Parser, Subcommand};
use kesonia_ai::{ModelContext, load_context};
use kesonia_core::APPROVAL_THRESHOLD;
use kesonia_sync::{AuditSink, HttpAuditSink, NoopSink};
use tracing::warn;

#[derive(Parser, Debug)]
#[command(name = "kesonia", version, about = "Loan decision inference service")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load the model artifacts and serve the HTTP API.
    Serve(ServeArgs),

    /// Evaluate one applicant JSON file and print the decision.
    Predict {
        file: PathBuf,
        #[command(flatten)]
        models: ModelArgs,
    },

    /// Print the feature frames each model scores for an applicant.
    Explain {
        file: PathBuf,
        #[command(flatten)]
        models: ModelArgs,
        /// Render frames as Arrow tables instead of cards.
        #[arg(long)]
        table: bool,
    },
}

#[derive(Args, Debug, Clone)]
pub struct ModelArgs {
    /// Directory holding the exported model artifacts.
    #[arg(long, env = "KESONIA_MODELS_DIR", default_value = "models")]
    pub models_dir: PathBuf,

    /// Minimum approval probability.
    #[arg(long, env = "KESONIA_APPROVAL_THRESHOLD", default_value_t = APPROVAL_THRESHOLD)]
    pub approval_threshold: f64,
}

impl ModelArgs {
    pub fn load(&self) -> anyhow::Result<ModelContext> {
        ensure!(
            (0.0..=1.0).contains(&self.approval_threshold),
            "approval threshold must be within [0, 1], got {}",
            self.approval_threshold
        );
        let context = load_context(&self.models_dir)
            .with_context(|| format!("loading models from {}", self.models_dir.display()))?;
        Ok(context.with_approval_threshold(self.approval_threshold))
    }
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "KESONIA_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    #[command(flatten)]
    pub models: ModelArgs,

    /// Endpoint audit rows are POSTed to. Rows are only logged when unset.
    #[arg(long, env = "KESONIA_AUDIT_URL")]
    pub audit_url: Option<String>,

    #[arg(long, env = "KESONIA_AUDIT_TIMEOUT_SECS", default_value_t = 10)]
    pub audit_timeout_secs: u64,
}

impl ServeArgs {
    pub fn audit_sink(&self) -> anyhow::Result<Arc<dyn AuditSink>> {
        match &self.audit_url {
            Some(url) => {
                let timeout = Duration::from_secs(self.audit_timeout_secs);
                Ok(Arc::new(HttpAuditSink::new(url.clone(), timeout)?))
            }
            None => {
                warn!("KESONIA_AUDIT_URL not set, audit rows will only be logged");
                Ok(Arc::new(NoopSink))
            }
        }
    }
}
