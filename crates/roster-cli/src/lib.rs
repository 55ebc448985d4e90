//! Script replay for Roster
//!
//! Reads a JSON-lines script of channel events, drives a [`roster_app::Room`]
//! with it and reports what happened. Used to reproduce presence bugs from
//! captured channel traffic without a live server.

mod cli;
mod error;
mod replay;
mod script;

pub use cli::Args;
pub use error::{ReplayError, StepError};
pub use replay::{ReplayChannel, ReplaySummary, Replayer, replay_file, replay_str};
pub use script::{NumberedStep, ScriptStep, parse_script};
