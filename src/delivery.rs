//! Where worker-side callbacks run.
//!
//! A [`Client`](crate::Client) never calls a callback from a worker
//! directly: it posts the delivery through a [`Deliverer`]. Callers with
//! an event loop own the matching [`DeliveryQueue`] and pump it from that
//! loop, so callbacks land on the same context that issued the requests.
//!
//! Cancellations that never reach a worker (a request cancelled before
//! `execute`, or a task stopped while still queued) are reported directly
//! on the thread that cancelled, without going through the queue.

use std::fmt;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

type Delivery = Box<dyn FnOnce() + Send>;

/// Sending side of a delivery context.
#[derive(Clone)]
pub struct Deliverer {
    tx: Option<UnboundedSender<Delivery>>,
}

impl Deliverer {
    /// A deliverer that runs callbacks immediately on the worker that finished the task.
    pub fn inline() -> Self {
        Self { tx: None }
    }

    pub(crate) fn post(&self, delivery: Delivery) {
        match &self.tx {
            None => delivery(),
            Some(tx) => {
                if let Err(mpsc::error::SendError(delivery)) = tx.send(delivery) {
                    // queue owner is gone, the callback still has to fire once
                    log::warn!("delivery queue dropped, delivering on worker");
                    delivery();
                }
            }
        }
    }
}

impl fmt::Debug for Deliverer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deliverer")
            .field("inline", &self.tx.is_none())
            .finish()
    }
}

/// Receiving side of a delivery context, owned by the caller's event loop.
#[derive(Debug)]
pub struct DeliveryQueue {
    rx: UnboundedReceiver<Delivery>,
}

impl DeliveryQueue {
    /// Creates a queue and the [`Deliverer`] that feeds it.
    #[allow(clippy::new_ret_no_self)]
    pub fn new() -> (DeliveryQueue, Deliverer) {
        let (tx, rx) = mpsc::unbounded_channel();
        (DeliveryQueue { rx }, Deliverer { tx: Some(tx) })
    }

    /// Runs every delivery that is already queued, without waiting.
    ///
    /// Returns how many callbacks ran.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut count = 0;
        while let Ok(delivery) = self.rx.try_recv() {
            delivery();
            count += 1;
        }
        count
    }

    /// Waits for the next delivery and runs it.
    ///
    /// Returns `false` once every [`Deliverer`] is dropped and the queue is empty.
    pub async fn dispatch_next(&mut self) -> bool {
        match self.rx.recv().await {
            Some(delivery) => {
                delivery();
                true
            }
            None => false,
        }
    }
}
