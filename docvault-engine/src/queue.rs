//! FIFO serialization of mutating operations.
//!
//! When enabled, the queue admits one operation at a time in strict
//! submission order, built on the fair async mutex from `mea`: each caller
//! parks on the lock's wait queue and runs only after every earlier
//! operation has settled. A failing operation releases the queue like any
//! other — its error goes back to its own caller and never blocks the chain.
//!
//! When disabled, operations run immediately and concurrent mutations may
//! interleave at the point of map access — the documented trade-off between
//! throughput and strict write linearizability.

use mea::mutex::Mutex;
use std::future::Future;

/// Serializes mutating operations into a single FIFO chain.
pub struct OperationQueue {
    serial: Option<Mutex<()>>,
}

impl OperationQueue {
    /// Creates the queue; pass `false` to run operations unserialized.
    pub fn new(serialize: bool) -> Self {
        Self {
            serial: serialize.then(|| Mutex::new(())),
        }
    }

    /// True when operations are serialized.
    pub fn is_enabled(&self) -> bool {
        self.serial.is_some()
    }

    /// Runs an operation, waiting for every previously admitted operation to
    /// settle first when serialization is enabled. The operation's own
    /// result or error is returned to its caller.
    pub async fn run<F, Fut, R>(&self, operation: F) -> R
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = R>,
    {
        match &self.serial {
            Some(lock) => {
                let _guard = lock.lock().await;
                operation().await
            }
            None => operation().await,
        }
    }
}
