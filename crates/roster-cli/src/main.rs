//! `roster-replay` binary.

use std::process::ExitCode;

use clap::Parser;
use roster_cli::{Args, replay_file};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() -> ExitCode {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&args.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    match replay_file(&args.script, args.room_config(), args.fail_fast) {
        Ok(summary) => {
            info!(
                steps = summary.steps,
                rejected = summary.rejected,
                notifications = summary.notifications,
                present = summary.membership.present_identity_count(),
                messages = summary.messages,
                unacknowledged = summary.unacknowledged,
                "replay finished"
            );
            ExitCode::SUCCESS
        },
        Err(e) => {
            error!(error = %e, "replay failed");
            ExitCode::FAILURE
        },
    }
}
