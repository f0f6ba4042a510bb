//! Time subscriber: tracks the latest block time.
//!
//! Readers either poll `last_time` or hold a `watch::Receiver` and await
//! `changed()`. Time updates that do not move the clock forward are
//! ignored.

use crate::config::SubscriberConfig;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::Timestamp;
use std::sync::Arc;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::warn;

pub struct TimeSub {
    base: Base,
    now: watch::Sender<Timestamp>,
}

impl TimeSub {
    pub fn new(ctx: &CancellationToken, config: SubscriberConfig) -> Arc<Self> {
        let (now, _) = watch::channel(0);
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            now,
        });
        spawn_loop(&sub);
        sub
    }

    /// Latest block time, 0 before the first update.
    #[must_use]
    pub fn last_time(&self) -> Timestamp {
        *self.now.borrow()
    }

    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Timestamp> {
        self.now.subscribe()
    }
}

impl Subscriber for TimeSub {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in &events {
            if let EventPayload::TimeUpdate(t) = event.payload() {
                let t = *t;
                self.now.send_if_modified(|now| {
                    if t > *now {
                        *now = t;
                        true
                    } else {
                        if t < *now {
                            warn!(current = *now, received = t, "Time moved backwards, ignored");
                        }
                        false
                    }
                });
            }
        }
    }

    fn name(&self) -> &'static str {
        "time"
    }
}
