//! # Stream Subscriber
//!
//! Generic, filterable subscriber backing live streaming endpoints. It keeps
//! every routed event that passes all of its filters until the single reader
//! drains them with [`StreamSub::get_data`].
//!
//! ```text
//!   push ──► filters (AND) ──► data ──┐
//!                                     │ notify once per drain
//!   get_data ◄── wait until ready ◄───┘
//! ```
//!
//! Ready means: any change (batch size 0), or at least `batch_size` buffered
//! events, or halted. Many pushes between two reads coalesce into one wakeup.
//! Exactly one reader may call `get_data` at a time.

use crate::config::SubscriberConfig;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, Event, EventBatch, EventType, Subscriber};
use std::sync::Arc;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Predicate over events. A stream keeps an event only if all pass.
pub type EventFilter = Box<dyn Fn(&Event) -> bool + Send + Sync>;

/// Events related to `market`.
#[must_use]
pub fn market_filter(market: impl Into<String>) -> EventFilter {
    let market = market.into();
    Box::new(move |e| e.market_id() == Some(market.as_str()))
}

/// Events involving `party`.
#[must_use]
pub fn party_filter(party: impl Into<String>) -> EventFilter {
    let party = party.into();
    Box::new(move |e| e.party_ids().contains(&party.as_str()))
}

#[derive(Default)]
struct StreamState {
    data: Vec<Event>,
    /// Pushes that added data since the last drain.
    change_count: usize,
    batch_size: usize,
    halted: bool,
}

impl StreamState {
    fn ready(&self) -> bool {
        if self.halted {
            return true;
        }
        if self.batch_size == 0 {
            self.change_count > 0
        } else {
            self.data.len() >= self.batch_size
        }
    }

    fn drain(&mut self) -> Vec<Event> {
        self.change_count = 0;
        std::mem::take(&mut self.data)
    }
}

pub struct StreamSub {
    base: Base,
    types: Vec<EventType>,
    filters: Vec<EventFilter>,
    state: Mutex<StreamState>,
    updated: Notify,
}

impl StreamSub {
    /// An empty `types` list subscribes to every event type.
    pub fn new(
        ctx: &CancellationToken,
        types: Vec<EventType>,
        batch_size: usize,
        filters: Vec<EventFilter>,
        config: SubscriberConfig,
    ) -> Arc<Self> {
        let types = if types.is_empty() {
            vec![EventType::All]
        } else {
            types
        };
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            types,
            filters,
            state: Mutex::new(StreamState {
                batch_size,
                ..StreamState::default()
            }),
            updated: Notify::new(),
        });
        spawn_loop(&sub);
        sub
    }

    fn keep(&self, event: &Event) -> bool {
        self.filters.iter().all(|f| f(event))
    }

    /// Wait until data is ready, then take it.
    ///
    /// Returns whatever is left, possibly nothing, once the stream is halted.
    pub async fn get_data(&self) -> Vec<Event> {
        loop {
            let notified = self.updated.notified();
            {
                let mut state = self.state.lock();
                if state.ready() {
                    return state.drain();
                }
            }
            notified.await;
        }
    }

    /// Apply a new batch size and return what was buffered under the old one.
    pub fn update_batch_size(&self, batch_size: usize) -> Vec<Event> {
        let mut state = self.state.lock();
        state.batch_size = batch_size;
        state.drain()
    }

    #[must_use]
    pub fn batch_size(&self) -> usize {
        self.state.lock().batch_size
    }

    #[must_use]
    pub fn pending(&self) -> usize {
        self.state.lock().data.len()
    }
}

impl Subscriber for StreamSub {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        self.types.clone()
    }

    fn push(&self, events: EventBatch) {
        let kept: Vec<Event> = events.into_iter().filter(|e| self.keep(e)).collect();
        if kept.is_empty() {
            return;
        }
        let ready = {
            let mut state = self.state.lock();
            state.data.extend(kept);
            state.change_count += 1;
            state.ready()
        };
        if ready {
            self.updated.notify_one();
        }
    }

    fn name(&self) -> &'static str {
        "stream"
    }

    /// Release a blocked reader on shutdown.
    fn halt(&self) {
        self.base.halt();
        self.state.lock().halted = true;
        self.updated.notify_one();
        debug!(id = self.base.id(), "Stream halted");
    }
}
