//! Network parameters subscriber: keeps the latest value of every parameter
//! seen on the bus, for read-side queries.

use crate::config::SubscriberConfig;
use parking_lot::RwLock;
use shared_bus::{spawn_loop, Base, EventBatch, EventPayload, EventType, Subscriber};
use shared_types::entities::NetworkParameter;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub struct NetParamsSub {
    base: Base,
    params: RwLock<BTreeMap<String, String>>,
}

impl NetParamsSub {
    pub fn new(ctx: &CancellationToken, config: SubscriberConfig) -> Arc<Self> {
        let sub = Arc::new(Self {
            base: Base::new(ctx, config.buffer_size, config.ack),
            params: RwLock::new(BTreeMap::new()),
        });
        spawn_loop(&sub);
        sub
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.params.read().get(key).cloned()
    }

    /// Every known parameter, ordered by key.
    #[must_use]
    pub fn all(&self) -> Vec<NetworkParameter> {
        self.params
            .read()
            .iter()
            .map(|(key, value)| NetworkParameter {
                key: key.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

impl Subscriber for NetParamsSub {
    fn base(&self) -> &Base {
        &self.base
    }

    fn types(&self) -> Vec<EventType> {
        vec![EventType::NetworkParameterEvent]
    }

    fn push(&self, events: EventBatch) {
        let mut params = self.params.write();
        for event in events {
            if let EventPayload::NetworkParameter(np) = event.into_payload() {
                params.insert(np.key, np.value);
            }
        }
    }

    fn name(&self) -> &'static str {
        "net_params"
    }
}
