//! Single-slot, latest-wins handoff between the render thread and the
//! encode worker.
//!
//! A publish replaces any unconsumed value and raises a wake signal; the
//! signal saturates at one pending wake. Because `recv` removes the value
//! from the slot, a slow consumer never processes the same value twice for
//! accumulated wakes: excess signals collapse, the consumer simply finds
//! the slot empty and goes back to waiting. This keeps the producer free of
//! backlog no matter how far the consumer falls behind.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;

struct Slot<T> {
    value: Mutex<Option<T>>,
    closed: AtomicBool,
}

/// Producer side of the handoff. Held by the render-tick sampler.
pub struct MailboxSender<T> {
    slot: Arc<Slot<T>>,
    wake: Sender<()>,
}

/// Consumer side of the handoff. Held by the encode worker.
pub struct MailboxReceiver<T> {
    slot: Arc<Slot<T>>,
    wake: Receiver<()>,
}

/// Create a connected sender/receiver pair around one slot.
pub fn mailbox<T>() -> (MailboxSender<T>, MailboxReceiver<T>) {
    let slot = Arc::new(Slot {
        value: Mutex::new(None),
        closed: AtomicBool::new(false),
    });
    let (wake_tx, wake_rx) = bounded(1);

    (
        MailboxSender {
            slot: Arc::clone(&slot),
            wake: wake_tx,
        },
        MailboxReceiver {
            slot,
            wake: wake_rx,
        },
    )
}

impl<T> MailboxSender<T> {
    /// Install `value`, displacing any unconsumed previous value.
    ///
    /// Returns the displaced value so the caller can drop or count it. The
    /// slot lock is released before the wake signal is raised, so the
    /// consumer never contends with the producer while waking.
    pub fn publish(&self, value: T) -> Option<T> {
        let displaced = self.slot.value.lock().replace(value);
        // Full means a wake is already pending; Disconnected means the
        // consumer is gone. Neither needs handling here.
        let _ = self.wake.try_send(());
        displaced
    }

    /// Close the mailbox and wake a blocked consumer.
    ///
    /// Idempotent. After close, `recv` returns `None` even if a value is
    /// still installed: shutdown processes no further work.
    pub fn close(&self) {
        self.slot.closed.store(true, Ordering::SeqCst);
        let _ = self.wake.try_send(());
    }

    pub fn is_closed(&self) -> bool {
        self.slot.closed.load(Ordering::SeqCst)
    }
}

impl<T> MailboxReceiver<T> {
    /// Block until a value is available or the mailbox is closed.
    ///
    /// The closed flag is checked at the wait boundary, before any value is
    /// touched. A wake that finds the slot already drained (the consumer
    /// raced ahead of a previous signal) loops back to waiting.
    pub fn recv(&self) -> Option<T> {
        loop {
            if self.slot.closed.load(Ordering::SeqCst) {
                return None;
            }
            if self.wake.recv().is_err() {
                // Sender dropped without closing.
                return None;
            }
            if self.slot.closed.load(Ordering::SeqCst) {
                return None;
            }
            if let Some(value) = self.slot.value.lock().take() {
                return Some(value);
            }
        }
    }
}
