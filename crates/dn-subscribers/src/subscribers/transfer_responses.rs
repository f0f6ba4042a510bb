//! Transfer responses subscriber: collects ledger movements (append-only)
//! and resulting balances (latest per account) and saves both on each time
//! update.

use super::{drain_map, drain_vec, persist_with};
use crate::config::SubscriberConfig;
use crate::ports::outbound::TransferResponseStore;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::{Account, LedgerEntry};
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Default)]
struct Ledger {
    entries: Vec<LedgerEntry>,
    balances: HashMap<String, Account>,
}

pub struct TransferResponseSub<S: TransferResponseStore> {
    base: Base,
    store: Arc<S>,
    ledger: Mutex<Ledger>,
}

impl<S: TransferResponseStore + 'static> TransferResponseSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
            ledger: Mutex::new(Ledger::default()),
        });
        spawn_loop(&sub);
        sub
    }

    fn flush(&self) {
        let (entries, balances) = {
            let mut ledger = self.ledger.lock();
            (drain_vec(&mut ledger.entries), drain_map(&mut ledger.balances))
        };
        persist_with(self.name(), entries.len() + balances.len(), || {
            self.store.save_batch(entries, balances)
        });
    }
}

impl<S: TransferResponseStore + 'static> Subscriber for TransferResponseSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::TransferResponses, EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.into_payload() {
                EventPayload::TransferResponses(responses) => {
                    let mut ledger = self.ledger.lock();
                    for response in responses {
                        ledger.entries.extend(response.transfers);
                        for account in response.balances {
                            ledger.balances.insert(account.id.clone(), account);
                        }
                    }
                }
                EventPayload::TimeUpdate(_) => self.flush(),
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "transfer_responses"
    }
}
