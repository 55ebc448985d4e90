//! Simulated channel.
//!
//! [`SimChannel`] records pushed messages instead of sending them.
//! [`AckScheduler`] turns those messages into acknowledgment events the way
//! an unreliable transport might deliver them: out of order, sometimes
//! failed, and sometimes reported twice with conflicting outcomes.

use rand::{Rng, SeedableRng, seq::SliceRandom};
use rand_chacha::ChaCha8Rng;
use roster_app::{Channel, ChannelError, RoomEvent};
use roster_core::OutboundMessage;
use tracing::trace;

/// Channel that keeps pushed messages for the test to acknowledge.
#[derive(Debug, Default)]
pub struct SimChannel {
    pending: Vec<OutboundMessage>,
    pushed: usize,
    refuse: Option<String>,
}

impl SimChannel {
    /// Channel that accepts every push.
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse subsequent pushes with `reason`.
    pub fn refuse_pushes(&mut self, reason: impl Into<String>) {
        self.refuse = Some(reason.into());
    }

    /// Accept subsequent pushes again.
    pub fn accept_pushes(&mut self) {
        self.refuse = None;
    }

    /// Messages pushed but not yet taken.
    pub fn pending(&self) -> &[OutboundMessage] {
        &self.pending
    }

    /// Take all pushed messages.
    pub fn take_pending(&mut self) -> Vec<OutboundMessage> {
        std::mem::take(&mut self.pending)
    }

    /// Total accepted pushes.
    pub fn pushed_count(&self) -> usize {
        self.pushed
    }
}

impl Channel for SimChannel {
    fn push(&mut self, message: &OutboundMessage) -> Result<(), ChannelError> {
        if let Some(reason) = &self.refuse {
            return Err(ChannelError::Closed { reason: reason.clone() });
        }
        trace!(send_ref = %message.send_ref, "simulated push");
        self.pending.push(message.clone());
        self.pushed += 1;
        Ok(())
    }
}

/// Seeded generator of acknowledgment events.
#[derive(Debug, Clone)]
pub struct AckScheduler {
    rng: ChaCha8Rng,
    failure_rate: f64,
    duplicate_rate: f64,
}

impl AckScheduler {
    /// Scheduler that always succeeds exactly once.
    pub fn with_seed(seed: u64) -> Self {
        Self { rng: ChaCha8Rng::seed_from_u64(seed), failure_rate: 0.0, duplicate_rate: 0.0 }
    }

    /// Probability that an acknowledgment reports failure.
    #[must_use]
    pub fn failure_rate(mut self, rate: f64) -> Self {
        self.failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Probability that a second, conflicting acknowledgment follows.
    #[must_use]
    pub fn duplicate_rate(mut self, rate: f64) -> Self {
        self.duplicate_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Acknowledgments for `messages`, shuffled.
    pub fn schedule(&mut self, messages: Vec<OutboundMessage>) -> Vec<RoomEvent> {
        let mut events = Vec::with_capacity(messages.len());

        for message in messages {
            let failed = self.rng.gen_bool(self.failure_rate);
            events.push(ack(&message, failed));

            if self.rng.gen_bool(self.duplicate_rate) {
                events.push(ack(&message, !failed));
            }
        }

        events.shuffle(&mut self.rng);
        events
    }
}

fn ack(message: &OutboundMessage, failed: bool) -> RoomEvent {
    let outcome = if failed { Err("simulated failure".to_string()) } else { Ok(()) };
    RoomEvent::SendAcked { send_ref: message.send_ref, outcome }
}
