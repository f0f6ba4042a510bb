//! Accounts subscriber: keeps the latest balance per account id and saves
//! one row per account on each time update.

use super::{drain_map, persist};
use crate::config::SubscriberConfig;
use crate::ports::outbound::AccountStore;
use parking_lot::Mutex;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::Account;
use std::collections::HashMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct AccountSub<S: AccountStore> {
    base: Base,
    store: Arc<S>,
    buf: Mutex<HashMap<String, Account>>,
}

impl<S: AccountStore + 'static> AccountSub<S> {
    pub fn new(ctx: &CancellationToken, store: Arc<S>, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            store,
            buf: Mutex::new(HashMap::new()),
        });
        spawn_loop(&sub);
        sub
    }

    fn flush(&self) {
        let batch = drain_map(&mut self.buf.lock());
        persist(self.name(), batch, |b| self.store.save_batch(b));
    }
}

impl<S: AccountStore + 'static> Subscriber for AccountSub<S> {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::AccountEvent, EventType::TimeUpdate]
    }

    fn push(&self, events: EventBatch) {
        for event in events {
            match event.into_payload() {
                EventPayload::Account(account) => {
                    self.buf.lock().insert(account.id.clone(), account);
                }
                EventPayload::TimeUpdate(_) => self.flush(),
                _ => {}
            }
        }
    }

    fn name(&self) -> &'static str {
        "accounts"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::RecordingStore;
    use crate::subscribers::test_support::{ev, tick};
    use shared_types::entities::U256;

    fn account(id: &str, balance: u64) -> Account {
        Account {
            id: id.into(),
            balance: U256::from(balance),
            ..Account::default()
        }
    }

    #[test]
    fn test_latest_value_wins() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Account>::new());
        let sub = AccountSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![
            ev(EventPayload::Account(account("acc-1", 100))),
            ev(EventPayload::Account(account("acc-1", 250))),
            tick(1),
        ]);

        let rows = store.records();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].balance, U256::from(250));
    }

    #[test]
    fn test_distinct_keys_kept() {
        let ctx = CancellationToken::new();
        let store = Arc::new(RecordingStore::<Account>::new());
        let sub = AccountSub::new(&ctx, store.clone(), SubscriberConfig::ack());

        sub.push(vec![
            ev(EventPayload::Account(account("acc-1", 1))),
            ev(EventPayload::Account(account("acc-2", 2))),
            ev(EventPayload::Account(account("acc-3", 3))),
            tick(1),
        ]);
        assert_eq!(store.records().len(), 3);

        // Buffer cleared: a second tick saves nothing.
        sub.push(vec![tick(2)]);
        assert_eq!(store.batch_count(), 1);
    }
}
