//! Command-line arguments.

use std::path::PathBuf;

use clap::Parser;
use roster_app::RoomConfig;
use roster_core::{DispatchConfig, EngineConfig};

/// Replay a JSON-lines channel event script through a room
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "roster-replay")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to the event script
    pub script: PathBuf,

    /// Topic outbound messages are pushed to
    #[arg(long, default_value = "chat:lobby")]
    pub topic: String,

    /// Event name carrying chat messages, inbound and outbound
    #[arg(long, default_value = "new:msg")]
    pub message_event: String,

    /// Log filter used when `RUST_LOG` is unset (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Stop at the first rejected step
    #[arg(long)]
    pub fail_fast: bool,
}

impl Args {
    /// Room configuration selected by these arguments.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig {
            engine: EngineConfig { message_event: self.message_event.clone() },
            dispatch: DispatchConfig {
                topic: self.topic.clone(),
                message_event: self.message_event.clone(),
            },
        }
    }
}
