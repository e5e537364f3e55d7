//! Per-handle FIFO ordering across a parallel worker pool.
//!
//! Two jobs against different handles may run on different workers at the
//! same time. Two jobs against the *same* handle must still run in the
//! order the framer received them, even though nothing else about their
//! scheduling is guaranteed to preserve that order. [`Gate`] is the piece
//! that restores it: each handle gets a numbered queue, and a worker
//! holding a handle's current ticket blocks everyone else waiting on that
//! handle until it calls [`Ticket::release`] (or simply drops it).
//!
//! Jobs that don't reference a handle at all (`REALPATH`, `MKDIR`, ...)
//! never touch the gate and run fully in parallel.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};

use rustc_hash::FxHashMap;

struct HandleState {
    /// Ticket number currently allowed to proceed.
    serving: u64,
    /// Next ticket number to hand out.
    next: u64,
}

/// Serializes access to handles shared across the worker pool.
pub struct Gate {
    state: Mutex<FxHashMap<Vec<u8>, HandleState>>,
    cv: Condvar,
}

impl Default for Gate {
    fn default() -> Self {
        Self::new()
    }
}

impl Gate {
    /// Creates an empty gate with no handles registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FxHashMap::default()),
            cv: Condvar::new(),
        }
    }

    /// Assigns `handle`'s next FIFO ticket without blocking. Callers that
    /// split reservation from admission (dispatch does, so the ticket order
    /// matches receive order even though jobs are later picked up by
    /// whichever worker happens to be free) must call this on the thread
    /// that owns receive order, then [`Gate::admit`] the returned
    /// [`Reservation`] wherever the job actually runs.
    pub fn reserve(&self, handle: &[u8]) -> Reservation {
        let mut guard = self.state.lock().expect("gate mutex poisoned");
        let entry = guard
            .entry(handle.to_vec())
            .or_insert(HandleState { serving: 0, next: 0 });
        let ticket = entry.next;
        entry.next += 1;
        Reservation { handle: handle.to_vec(), ticket }
    }

    /// Blocks until `reservation`'s turn arrives, then returns a ticket
    /// granting exclusive access to its handle. Dropping the ticket (or
    /// calling [`Ticket::release`] explicitly) admits the next waiter in
    /// order.
    pub fn admit(&self, reservation: Reservation) -> Ticket<'_> {
        let mut guard = self.state.lock().expect("gate mutex poisoned");
        loop {
            let serving = guard.get(&reservation.handle).map(|s| s.serving).unwrap_or(0);
            if serving == reservation.ticket {
                break;
            }
            guard = self.cv.wait(guard).expect("gate mutex poisoned");
        }
        Ticket {
            gate: self,
            handle: reservation.handle,
            ticket: reservation.ticket,
            released: false,
        }
    }

    /// Reserves and immediately waits out `handle`'s turn. Equivalent to
    /// [`Gate::reserve`] followed by [`Gate::admit`]; only correct when
    /// reservation and admission happen on the same thread; a caller
    /// crossing a worker-pool boundary needs the two calls kept apart so
    /// the reservation lands in receive order instead of scheduling order.
    pub fn enter(&self, handle: &[u8]) -> Ticket<'_> {
        self.admit(self.reserve(handle))
    }

    fn release(&self, handle: &[u8], ticket: u64) {
        let mut guard = self.state.lock().expect("gate mutex poisoned");
        let remove = if let Some(entry) = guard.get_mut(handle) {
            entry.serving = ticket + 1;
            entry.serving == entry.next
        } else {
            false
        };
        if remove {
            guard.remove(handle);
        }
        drop(guard);
        self.cv.notify_all();
    }
}

/// A handle's FIFO position, assigned by [`Gate::reserve`] before the job
/// it belongs to crosses into a worker thread. Redeemed by [`Gate::admit`].
pub struct Reservation {
    handle: Vec<u8>,
    ticket: u64,
}

/// Exclusive access to a handle, granted by [`Gate::enter`].
pub struct Ticket<'a> {
    gate: &'a Gate,
    handle: Vec<u8>,
    ticket: u64,
    released: bool,
}

impl Ticket<'_> {
    /// Releases the handle, admitting the next waiter. Equivalent to
    /// dropping the ticket; provided so callers that want the release
    /// point to be visible in their own code can spell it out.
    pub fn release(mut self) {
        self.released = true;
        self.gate.release(&self.handle, self.ticket);
    }
}

impl Drop for Ticket<'_> {
    fn drop(&mut self) {
        if !self.released {
            self.gate.release(&self.handle, self.ticket);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn different_handles_never_block_each_other() {
        let gate = Gate::new();
        let a = gate.enter(b"handle-a");
        let b = gate.enter(b"handle-b");
        drop(a);
        drop(b);
    }

    #[test]
    fn same_handle_serializes_in_entry_order() {
        let gate = Arc::new(Gate::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        let first = gate.enter(b"same");
        let gate2 = Arc::clone(&gate);
        let order2 = Arc::clone(&order);
        let handle = thread::spawn(move || {
            let ticket = gate2.enter(b"same");
            order2.lock().unwrap().push(2);
            drop(ticket);
        });

        thread::sleep(Duration::from_millis(20));
        order.lock().unwrap().push(1);
        drop(first);
        handle.join().unwrap();

        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn reservations_assigned_in_order_admit_in_that_order_even_if_admitted_out_of_order() {
        let gate = Arc::new(Gate::new());
        let order = Arc::new(Mutex::new(Vec::new()));

        // Reserve both tickets up front, as a reader thread would, before
        // either job reaches a worker.
        let first = gate.reserve(b"same");
        let second = gate.reserve(b"same");

        // Admit the second reservation first on another thread; it must
        // still block behind the first ticket's release.
        let gate2 = Arc::clone(&gate);
        let order2 = Arc::clone(&order);
        let handle = thread::spawn(move || {
            let ticket = gate2.admit(second);
            order2.lock().unwrap().push(2);
            drop(ticket);
        });

        thread::sleep(Duration::from_millis(20));
        let ticket = gate.admit(first);
        order.lock().unwrap().push(1);
        drop(ticket);
        handle.join().unwrap();

        assert_eq!(*order.lock().unwrap(), vec![1, 2]);
    }

    #[test]
    fn releasing_the_last_waiter_removes_the_handle_entry() {
        let gate = Gate::new();
        let ticket = gate.enter(b"transient");
        ticket.release();
        assert!(gate.state.lock().unwrap().is_empty());
    }
}
