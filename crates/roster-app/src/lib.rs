//! Application layer for Roster
//!
//! Connects the pure presence engine and message dispatcher to a channel
//! transport on one side and to observers on the other. All processing is
//! synchronous and happens in event delivery order.
//!
//! # Components
//!
//! - [`Room`]: Controller owning the engine, dispatcher and subscribers
//! - [`Channel`]: Trait for the injected transport handle
//! - [`Observer`]: Trait for notification subscribers
//! - [`RoomEvent`]: Inputs from the transport and the user
//! - [`RoomNotification`]: Outputs delivered to observers

mod channel;
mod error;
mod event;
mod notification;
mod observer;
mod room;

pub use channel::{Channel, ChannelError};
pub use error::RoomError;
pub use event::RoomEvent;
pub use notification::RoomNotification;
pub use observer::{Observer, SubscriptionId};
pub use room::{Room, RoomConfig};
