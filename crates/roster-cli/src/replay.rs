//! Script replay.
//!
//! Feeds parsed steps into a [`Room`] over a [`ReplayChannel`] and logs every
//! notification the room publishes.

use std::{cell::Cell, collections::VecDeque, path::Path, rc::Rc};

use roster_app::{Channel, ChannelError, Room, RoomConfig, RoomEvent, RoomNotification};
use roster_core::{MembershipTable, OutboundMessage};
use tracing::{debug, info, warn};

use crate::{
    ReplayError, StepError,
    script::{NumberedStep, ScriptStep, parse_script},
};

/// Channel that queues pushed messages until an `ack` step resolves them.
#[derive(Debug, Default)]
pub struct ReplayChannel {
    pending: VecDeque<OutboundMessage>,
}

impl ReplayChannel {
    /// Oldest pushed message not yet acknowledged.
    pub fn next_pending(&mut self) -> Option<OutboundMessage> {
        self.pending.pop_front()
    }

    /// Forget every queued push. Returns how many were dropped.
    pub fn drop_pending(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }

    /// Number of unacknowledged pushes.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }
}

impl Channel for ReplayChannel {
    fn push(&mut self, message: &OutboundMessage) -> Result<(), ChannelError> {
        info!(
            send_ref = %message.send_ref,
            topic = %message.topic,
            event = %message.event,
            payload = %message.payload,
            "push"
        );
        self.pending.push_back(message.clone());
        Ok(())
    }
}

/// Outcome of a completed replay.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    /// Steps executed.
    pub steps: usize,
    /// Steps the room rejected.
    pub rejected: usize,
    /// Notifications published to observers.
    pub notifications: usize,
    /// Final membership.
    pub membership: MembershipTable,
    /// Chat messages received.
    pub messages: usize,
    /// Pushes never acknowledged.
    pub unacknowledged: usize,
}

/// Runs steps against one room.
#[derive(Debug)]
pub struct Replayer {
    room: Room<ReplayChannel>,
    notifications: Rc<Cell<usize>>,
    fail_fast: bool,
}

impl Replayer {
    /// Replayer over a fresh room.
    pub fn new(config: RoomConfig, fail_fast: bool) -> Self {
        let mut room = Room::new(ReplayChannel::default(), config);
        let notifications = Rc::new(Cell::new(0));
        let counter = Rc::clone(&notifications);
        room.subscribe(move |notification: &RoomNotification| {
            counter.set(counter.get() + 1);
            log_notification(notification);
        });

        Self { room, notifications, fail_fast }
    }

    /// Run every step in order.
    ///
    /// A rejected step is logged and counted. With `fail_fast` it ends the
    /// replay instead.
    ///
    /// # Errors
    ///
    /// `ReplayError::Step` for the first rejected step when `fail_fast` is
    /// set.
    pub fn run(mut self, steps: &[NumberedStep]) -> Result<ReplaySummary, ReplayError> {
        let mut rejected = 0;

        for NumberedStep { line, step } in steps {
            debug!(line, ?step, "step");
            if let Err(source) = self.apply(step) {
                if self.fail_fast {
                    return Err(ReplayError::Step { line: *line, source });
                }
                warn!(line, error = %source, "step rejected");
                rejected += 1;
            }
        }

        let summary = ReplaySummary {
            steps: steps.len(),
            rejected,
            notifications: self.notifications.get(),
            membership: self.room.membership(),
            messages: self.room.messages().len(),
            unacknowledged: self.room.channel().pending_len(),
        };
        self.room.teardown();
        Ok(summary)
    }

    fn apply(&mut self, step: &ScriptStep) -> Result<(), StepError> {
        let resets_connection = matches!(step, ScriptStep::Connected | ScriptStep::Disconnected);

        let event = match step.clone() {
            ScriptStep::Connected => RoomEvent::Connected,
            ScriptStep::Disconnected => RoomEvent::Disconnected,
            ScriptStep::PresenceState { payload } => RoomEvent::PresenceState(payload),
            ScriptStep::PresenceDiff { payload } => RoomEvent::PresenceDiff(payload),
            ScriptStep::Message { event, payload } => RoomEvent::Message { event, payload },
            ScriptStep::Compose { text } => RoomEvent::TextChanged(text),
            ScriptStep::Send => RoomEvent::SendRequested,
            ScriptStep::Ack { ok, reason } => {
                let message =
                    self.room.channel_mut().next_pending().ok_or(StepError::NoPendingSend)?;
                let outcome = if ok {
                    Ok(())
                } else {
                    Err(reason.unwrap_or_else(|| "rejected".to_string()))
                };
                RoomEvent::SendAcked { send_ref: message.send_ref, outcome }
            },
        };

        self.room.handle(event)?;

        // Pushes lost with the connection never get an acknowledgment
        if resets_connection && self.room.in_flight().is_none() {
            let dropped = self.room.channel_mut().drop_pending();
            if dropped > 0 {
                debug!(dropped, "dropping pushes lost with the connection");
            }
        }

        Ok(())
    }
}

/// Parse and run a script held in memory.
///
/// # Errors
///
/// `ReplayError::Parse` for an invalid line, `ReplayError::Step` for a
/// rejected step when `fail_fast` is set.
pub fn replay_str(
    script: &str,
    config: RoomConfig,
    fail_fast: bool,
) -> Result<ReplaySummary, ReplayError> {
    let steps = parse_script(script)?;
    Replayer::new(config, fail_fast).run(&steps)
}

/// Read, parse and run a script file.
///
/// # Errors
///
/// `ReplayError::Io` if the file cannot be read, otherwise as
/// [`replay_str`].
pub fn replay_file(
    path: &Path,
    config: RoomConfig,
    fail_fast: bool,
) -> Result<ReplaySummary, ReplayError> {
    let script = std::fs::read_to_string(path)
        .map_err(|source| ReplayError::Io { path: path.to_path_buf(), source })?;
    info!(path = %path.display(), "replaying script");
    replay_str(&script, config, fail_fast)
}

fn log_notification(notification: &RoomNotification) {
    match notification {
        RoomNotification::MembershipChanged { count, table } => {
            let identities: Vec<&str> = table.identities().collect();
            info!(count, devices = table.device_count(), ?identities, "membership changed");
        },
        RoomNotification::RecordAppended(message) => {
            info!(sender = %message.sender, body = %message.body, "message");
        },
        RoomNotification::SendStateChanged { can_send } => {
            debug!(can_send, "send state changed");
        },
        RoomNotification::SendDelivered { send_ref } => info!(%send_ref, "send delivered"),
        RoomNotification::SendFailed { send_ref, reason } => {
            warn!(%send_ref, %reason, "send failed");
        },
    }
}
