use crate::core::customer::Customer;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use log::{debug, warn};

/// Bounded, thread-safe FIFO between the arrival generator and the diner.
///
/// Both ends are non-blocking. Clones share the same underlying buffer.
#[derive(Debug, Clone)]
pub struct ArrivalQueue {
    sender: Sender<Customer>,
    receiver: Receiver<Customer>,
    capacity: usize,
}

impl ArrivalQueue {
    pub fn new(capacity: usize) -> Self {
        let (sender, receiver) = crossbeam_channel::bounded(capacity);
        Self {
            sender,
            receiver,
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.sender.is_full()
    }

    /// Try to enqueue without blocking.
    ///
    /// A full queue drops the customer; that is a normal outcome, not an error.
    pub fn offer(&self, customer: Customer) -> bool {
        match self.sender.try_send(customer) {
            Ok(()) => true,
            Err(TrySendError::Full(dropped)) => {
                warn!(
                    "[ArrivalQueue] Queue full ({}/{}), dropping {}",
                    self.len(),
                    self.capacity,
                    dropped.display_id()
                );
                false
            }
            Err(TrySendError::Disconnected(dropped)) => {
                warn!("[ArrivalQueue] Queue closed, dropping {}", dropped.display_id());
                false
            }
        }
    }

    /// Move everything currently queued onto the end of `target`, in
    /// arrival order. Returns the number moved.
    pub fn drain_into(&self, target: &mut Vec<Customer>) -> usize {
        let available = self.receiver.len();
        let before = target.len();
        target.extend(self.receiver.try_iter().take(available));
        let moved = target.len() - before;
        if moved > 0 {
            debug!("[ArrivalQueue] Drained {} arrivals", moved);
        }
        moved
    }
}
