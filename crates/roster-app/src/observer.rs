//! Observer registry.
//!
//! Observers are registered explicitly and receive a [`SubscriptionId`] they
//! can use to unsubscribe before they go away. The room holds observers by
//! value; nothing is captured implicitly.

use std::fmt;

use crate::RoomNotification;

/// Receives room notifications.
pub trait Observer {
    /// Called synchronously after each change, in order.
    fn notify(&mut self, notification: &RoomNotification);
}

impl<F> Observer for F
where
    F: FnMut(&RoomNotification),
{
    fn notify(&mut self, notification: &RoomNotification) {
        self(notification);
    }
}

/// Handle returned by [`crate::Room::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    observers: Vec<(SubscriptionId, Box<dyn Observer>)>,
}

impl Subscribers {
    pub(crate) fn subscribe(&mut self, observer: Box<dyn Observer>) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.observers.push((id, observer));
        id
    }

    pub(crate) fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    pub(crate) fn clear(&mut self) {
        self.observers.clear();
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn publish(&mut self, notification: &RoomNotification) {
        for (_, observer) in &mut self.observers {
            observer.notify(notification);
        }
    }
}

impl fmt::Debug for Subscribers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscribers")
            .field("next_id", &self.next_id)
            .field("observers", &self.observers.len())
            .finish()
    }
}
