//! Room controller.
//!
//! Owns the presence engine, the message dispatcher, the injected channel
//! handle and the observer registry. Every [`RoomEvent`] is handled to
//! completion before the next one, and observers are notified synchronously
//! after each change.

use roster_core::{
    DispatchConfig, DispatchError, EngineConfig, EngineState, MembershipTable, MessageDispatch, MessageLog,
    PresenceAction, PresenceEngine, PresenceEvent, SendRef, SendResolution,
};
use tracing::{debug, info, warn};

use crate::{
    Channel, Observer, RoomError, RoomEvent, RoomNotification, SubscriptionId,
    observer::Subscribers,
};

/// Room configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomConfig {
    /// Presence engine settings.
    pub engine: EngineConfig,
    /// Outbound dispatch settings.
    pub dispatch: DispatchConfig,
}

/// One room on one channel.
#[derive(Debug)]
pub struct Room<C> {
    channel: C,
    engine: PresenceEngine,
    dispatch: MessageDispatch,
    subscribers: Subscribers,
    can_send: bool,
}

impl<C: Channel> Room<C> {
    /// Create a room over an already constructed channel handle.
    pub fn new(channel: C, config: RoomConfig) -> Self {
        Self {
            channel,
            engine: PresenceEngine::new(config.engine),
            dispatch: MessageDispatch::new(config.dispatch),
            subscribers: Subscribers::default(),
            can_send: false,
        }
    }

    /// Register an observer.
    pub fn subscribe(&mut self, observer: impl Observer + 'static) -> SubscriptionId {
        let id = self.subscribers.subscribe(Box::new(observer));
        debug!(%id, "observer subscribed");
        id
    }

    /// Remove an observer. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let removed = self.subscribers.unsubscribe(id);
        debug!(%id, removed, "observer unsubscribed");
        removed
    }

    /// Number of registered observers.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Process one event.
    ///
    /// # Errors
    ///
    /// Returns the rejected presence or dispatch error. The room's state is
    /// unchanged by a rejected event.
    pub fn handle(&mut self, event: RoomEvent) -> Result<(), RoomError> {
        match event {
            RoomEvent::Connected => {
                self.on_connected();
                Ok(())
            },
            RoomEvent::Disconnected => {
                self.on_disconnected();
                Ok(())
            },
            RoomEvent::PresenceState(payload) => {
                self.apply_presence(PresenceEvent::FullState(payload))
            },
            RoomEvent::PresenceDiff(payload) => self.apply_presence(PresenceEvent::Diff(payload)),
            RoomEvent::Message { event, payload } => {
                self.apply_presence(PresenceEvent::Custom { event, payload })
            },
            RoomEvent::SendAcked { send_ref, outcome } => self.on_send_acked(send_ref, outcome),
            RoomEvent::TextChanged(text) => {
                self.compose(text);
                Ok(())
            },
            RoomEvent::SendRequested => self.send().map(|_| ()),
        }
    }

    /// Update the composed text.
    pub fn compose(&mut self, text: impl Into<String>) {
        self.dispatch.set_text(text);
        self.refresh_send_state();
    }

    /// Push the composed text to the channel.
    ///
    /// # Errors
    ///
    /// - `Dispatch(SendInFlight)` or `Dispatch(EmptyMessage)` if sending is
    ///   not allowed right now
    /// - `Dispatch(SendFailed)` if the channel refused the message; the text
    ///   is kept and sending is enabled again
    pub fn send(&mut self) -> Result<SendRef, RoomError> {
        let message = self.dispatch.send()?;
        let send_ref = message.send_ref;
        self.refresh_send_state();

        if let Err(e) = self.channel.push(&message) {
            warn!(%send_ref, error = %e, "channel refused message");
            let resolution = self.dispatch.resolve(send_ref, Err(e.to_string()))?;
            self.publish_resolution(&resolution);
            return resolution.into_result().map_err(RoomError::from);
        }

        Ok(send_ref)
    }

    /// Replace the composed text with `text` and push it.
    ///
    /// Rejected with `Dispatch(SendInFlight)` before the composed text is
    /// touched if a send is outstanding.
    pub fn send_text(&mut self, text: impl Into<String>) -> Result<SendRef, RoomError> {
        if let Some(in_flight) = self.dispatch.in_flight() {
            return Err(DispatchError::SendInFlight { in_flight }.into());
        }
        self.compose(text);
        self.send()
    }

    /// Snapshot of current membership.
    pub fn membership(&self) -> MembershipTable {
        self.engine.current_membership()
    }

    /// Identities with at least one present device.
    pub fn present_identity_count(&self) -> usize {
        self.engine.present_identity_count()
    }

    /// Received chat messages.
    pub fn messages(&self) -> &MessageLog {
        self.engine.messages()
    }

    /// Composed text.
    pub fn text(&self) -> &str {
        self.dispatch.text()
    }

    /// Whether the send control is enabled.
    pub fn can_send(&self) -> bool {
        self.dispatch.can_send()
    }

    /// Outstanding send, if any.
    pub fn in_flight(&self) -> Option<SendRef> {
        self.dispatch.in_flight()
    }

    /// The injected channel.
    pub fn channel(&self) -> &C {
        &self.channel
    }

    /// The injected channel, mutably.
    pub fn channel_mut(&mut self) -> &mut C {
        &mut self.channel
    }

    /// Unsubscribe every observer and drop all state.
    ///
    /// Observers are removed first, so none of them sees the reset.
    pub fn teardown(&mut self) {
        self.subscribers.clear();
        self.engine.on_connection_lost();
        self.dispatch.reset();
        self.can_send = false;
        info!("room torn down");
    }

    fn apply_presence(&mut self, event: PresenceEvent) -> Result<(), RoomError> {
        let actions = self.engine.handle(event)?;

        for action in actions {
            let notification = match action {
                PresenceAction::MembershipChanged { count, table } => {
                    RoomNotification::MembershipChanged { count, table }
                },
                PresenceAction::RecordAppended(message) => {
                    RoomNotification::RecordAppended(message)
                },
            };
            self.subscribers.publish(&notification);
        }

        Ok(())
    }

    fn on_connected(&mut self) {
        // A connect without a preceding disconnect still starts a new session
        if self.engine.state() == EngineState::Synced {
            warn!("channel connected while synced, dropping stale membership");
            self.reset_connection();
        }
        info!("channel connected");
    }

    fn on_disconnected(&mut self) {
        info!("channel disconnected");
        self.reset_connection();
    }

    fn reset_connection(&mut self) {
        // A send lost with the connection never gets its callback
        if let Some(send_ref) = self.dispatch.in_flight()
            && let Ok(resolution) =
                self.dispatch.resolve(send_ref, Err("connection lost".to_string()))
        {
            self.publish_resolution(&resolution);
        }

        for action in self.engine.on_connection_lost() {
            if let PresenceAction::MembershipChanged { count, table } = action {
                self.subscribers.publish(&RoomNotification::MembershipChanged { count, table });
            }
        }
    }

    fn on_send_acked(
        &mut self,
        send_ref: SendRef,
        outcome: Result<(), String>,
    ) -> Result<(), RoomError> {
        let resolution = self.dispatch.resolve(send_ref, outcome)?;
        self.publish_resolution(&resolution);
        Ok(())
    }

    fn publish_resolution(&mut self, resolution: &SendResolution) {
        let notification = match resolution {
            SendResolution::Delivered { send_ref } => {
                RoomNotification::SendDelivered { send_ref: *send_ref }
            },
            SendResolution::Failed { send_ref, reason } => {
                RoomNotification::SendFailed { send_ref: *send_ref, reason: reason.clone() }
            },
        };
        self.subscribers.publish(&notification);
        self.refresh_send_state();
    }

    fn refresh_send_state(&mut self) {
        let can_send = self.dispatch.can_send();
        if can_send != self.can_send {
            self.can_send = can_send;
            self.subscribers.publish(&RoomNotification::SendStateChanged { can_send });
        }
    }
}
