//! Lamport logical clock.
//!
//! The server holds one instance; every client holds its own. There is no
//! global clock, only the merge protocol keeping the instances causally
//! consistent: `merge` applies `max(local, remote) + 1` for events carrying a
//! remote timestamp, `tick` applies `local + 1` for purely local events.

use std::sync::Mutex;

/// A monotonically advancing Lamport counter.
///
/// All reads and writes are serialized through a single mutex; the critical
/// sections contain no I/O and never await, so calls from concurrent tasks
/// only ever block for the duration of the arithmetic.
#[derive(Debug, Default)]
pub struct LamportClock {
    counter: Mutex<u64>,
}

impl LamportClock {
    /// Create a clock starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the clock for a local event and return the new value.
    pub fn tick(&self) -> u64 {
        let mut counter = self.counter.lock().expect("lamport clock lock poisoned");
        *counter += 1;
        *counter
    }

    /// Merge a remote timestamp into the clock and return the new value.
    ///
    /// Applies the Lamport rule `max(local, remote) + 1`.
    pub fn merge(&self, remote: u64) -> u64 {
        let mut counter = self.counter.lock().expect("lamport clock lock poisoned");
        *counter = (*counter).max(remote).saturating_add(1);
        *counter
    }

    /// Read the current value without advancing it.
    ///
    /// Only used for logging; ordering decisions always go through `tick` or
    /// `merge`.
    pub fn current(&self) -> u64 {
        *self.counter.lock().expect("lamport clock lock poisoned")
    }
}
