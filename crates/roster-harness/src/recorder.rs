//! Observer that records every notification.

use std::{cell::RefCell, rc::Rc};

use roster_app::{Observer, RoomNotification};

/// Records notifications. Clones share the same log, so a test can keep one
/// clone and subscribe another.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    log: Rc<RefCell<Vec<RoomNotification>>>,
}

impl Recorder {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far, in order.
    pub fn notifications(&self) -> Vec<RoomNotification> {
        self.log.borrow().clone()
    }

    /// Number of recorded notifications.
    pub fn len(&self) -> usize {
        self.log.borrow().len()
    }

    /// True if nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.log.borrow().is_empty()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    /// Count carried by the most recent membership notification.
    pub fn last_count(&self) -> Option<usize> {
        self.log.borrow().iter().rev().find_map(|n| match n {
            RoomNotification::MembershipChanged { count, .. } => Some(*count),
            _ => None,
        })
    }
}

impl Observer for Recorder {
    fn notify(&mut self, notification: &RoomNotification) {
        self.log.borrow_mut().push(notification.clone());
    }
}
