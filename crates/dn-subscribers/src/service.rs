//! # Observe Service
//!
//! Serves live event streams. Each `observe_events` call registers a fresh
//! [`StreamSub`] with the broker and spawns a forwarder task:
//!
//! ```text
//!   broker ──► StreamSub ──get_data──► forwarder ──try_send──► reader
//!                                          ▲
//!                        batch size updates┘
//! ```
//!
//! ## Backpressure
//!
//! The forwarder never blocks on a slow reader. When the output channel is
//! full the batch is dropped and the retry budget is spent; once it runs out
//! the stream is torn down. A successful send restores the full budget. A
//! negative budget never runs out.
//!
//! The stream ends when the caller's token is cancelled, the reader drops
//! its receiver, or the budget is exhausted. On exit the stream subscriber
//! is halted and unregistered, and the output channel closes.

use crate::config::SubscriberConfig;
use crate::ports::inbound::EventObserver;
use crate::stream::{EventFilter, StreamSub};
use shared_bus::{Broker, Event, EventType, Subscriber, SubscriberId};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Output channel capacity, in batches.
const OUTPUT_CAPACITY: usize = 1;

/// Event observation on top of a broker.
pub struct Service<B: Broker> {
    broker: Arc<B>,
    config: SubscriberConfig,
}

impl<B: Broker + 'static> Service<B> {
    pub fn new(broker: Arc<B>, config: SubscriberConfig) -> Self {
        Self { broker, config }
    }

    #[must_use]
    pub fn broker(&self) -> &Arc<B> {
        &self.broker
    }
}

enum Forward {
    Sent,
    Dropped,
    Closed,
}

fn forward(out: &mpsc::Sender<Vec<Event>>, data: Vec<Event>) -> Forward {
    match out.try_send(data) {
        Ok(()) => Forward::Sent,
        Err(TrySendError::Full(_)) => Forward::Dropped,
        Err(TrySendError::Closed(_)) => Forward::Closed,
    }
}

/// Spend one retry. Returns `false` once the budget is exhausted.
fn spend_retry(budget: &mut i64) -> bool {
    if *budget < 0 {
        return true;
    }
    if *budget == 0 {
        return false;
    }
    *budget -= 1;
    true
}

async fn run_forwarder<B: Broker>(
    broker: Arc<B>,
    sub: Arc<StreamSub>,
    id: SubscriberId,
    token: CancellationToken,
    retries: i64,
    out: mpsc::Sender<Vec<Event>>,
    mut sizes: mpsc::Receiver<usize>,
) {
    let mut budget = retries;
    loop {
        let outcome = tokio::select! {
            biased;
            () = token.cancelled() => {
                debug!(id, "Observer cancelled");
                break;
            }
            () = out.closed() => {
                debug!(id, "Observer reader gone");
                break;
            }
            Some(size) = sizes.recv() => {
                let pending = sub.update_batch_size(size);
                budget = retries;
                debug!(id, batch_size = size, pending = pending.len(), "Batch size updated");
                if pending.is_empty() {
                    continue;
                }
                forward(&out, pending)
            }
            data = sub.get_data() => {
                if data.is_empty() {
                    if sub.base().is_closed() {
                        debug!(id, "Stream halted");
                        break;
                    }
                    continue;
                }
                forward(&out, data)
            }
        };

        match outcome {
            Forward::Sent => budget = retries,
            Forward::Dropped => {
                if !spend_retry(&mut budget) {
                    warn!(id, retries, "Observer too slow, retries exhausted");
                    break;
                }
                debug!(id, remaining = budget, "Observer not ready, batch dropped");
            }
            Forward::Closed => {
                debug!(id, "Observer reader gone");
                break;
            }
        }
    }

    sub.halt();
    if broker.unsubscribe(id).is_err() {
        debug!(id, "Stream already unregistered");
    }
    info!(id, "Event observer stopped");
}

impl<B: Broker + 'static> EventObserver for Service<B> {
    fn observe_events(
        &self,
        ctx: &CancellationToken,
        retries: i64,
        types: Vec<EventType>,
        batch_size: usize,
        filters: Vec<EventFilter>,
    ) -> (mpsc::Receiver<Vec<Event>>, mpsc::Sender<usize>) {
        let token = ctx.child_token();
        let sub = StreamSub::new(&token, types, batch_size, filters, self.config);
        let id = self.broker.subscribe(sub.clone());
        info!(id, retries, batch_size, types = ?sub.types(), "Event observer started");

        let (out_tx, out_rx) = mpsc::channel(OUTPUT_CAPACITY);
        let (size_tx, size_rx) = mpsc::channel(1);

        tokio::spawn(run_forwarder(
            Arc::clone(&self.broker),
            sub,
            id,
            token,
            retries,
            out_tx,
            size_rx,
        ));

        (out_rx, size_tx)
    }
}
