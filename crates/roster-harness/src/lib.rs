//! Deterministic simulation harness for Roster presence testing.
//!
//! A reference model of room presence, the operation vocabulary shared by
//! model-based tests and fuzz targets, a simulated channel with seeded
//! acknowledgment reordering and duplication, and payload fixtures.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod model;
pub mod operation;
pub mod recorder;
pub mod sim_channel;

pub use model::{ModelPresence, OperationError, OperationResult, membership_view};
pub use operation::{ModelDevice, ModelIdentity, ModelRecord, Operation};
pub use recorder::Recorder;
pub use sim_channel::{AckScheduler, SimChannel};
