use std::{
    cell::Cell,
    sync::atomic::{AtomicBool, Ordering},
};

use parking_lot::RwLock;

thread_local! {
    static DELIVERING: Cell<bool> = const { Cell::new(false) };
}

/// Admission control for completion callbacks.
///
/// Callbacks run while holding a read lock; [`close`](Self::close) flips the
/// flag and then takes the write lock, so once it returns no callback is
/// running and none will start.
#[derive(Debug, Default)]
pub(crate) struct DeliveryGate {
    closed: AtomicBool,
    in_flight: RwLock<()>,
}

impl DeliveryGate {
    /// Run `deliver` unless the gate is closed. Returns whether it ran.
    pub(crate) fn deliver(&self, deliver: impl FnOnce()) -> bool {
        let _guard = self.in_flight.read_recursive();
        if self.closed.load(Ordering::SeqCst) {
            return false;
        }
        let _delivering = Delivering::enter();
        deliver();
        true
    }

    /// Refuse further deliveries and wait for running ones to return.
    ///
    /// Called from inside a callback, it cannot wait for that callback
    /// itself and returns right after closing.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if !DELIVERING.with(Cell::get) {
            drop(self.in_flight.write());
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

/// Marks the current thread as running a callback until dropped.
struct Delivering(bool);

impl Delivering {
    fn enter() -> Self {
        Delivering(DELIVERING.with(|d| d.replace(true)))
    }
}

impl Drop for Delivering {
    fn drop(&mut self) {
        DELIVERING.with(|d| d.set(self.0));
    }
}
