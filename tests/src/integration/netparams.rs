//! # Network Parameters Flows
//!
//! Store updates are published on the broker and mirrored by the read-side
//! `NetParamsSub`; the node runtime loads genesis state and dispatches
//! parameter changes to watchers on time updates.

#[cfg(test)]
mod tests {
    use super::super::{tick, wait_for};
    use dn_netparams::keys::{
        GOVERNANCE_PROPOSAL_MARKET_MIN_CLOSE, MARKET_FEE_FACTORS_MAKER_FEE, REWARD_ASSET,
        VALIDATORS_EPOCH_LENGTH,
    };
    use dn_netparams::{NetParamsError, Parsed, Store};
    use dn_subscribers::{NetParamsSub, SubscriberConfig};
    use node_runtime::{NodeConfig, NodeRuntime};
    use shared_bus::{Broker, CancellationToken, EventPublisher, InMemoryBroker};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    fn runtime_config() -> NodeConfig {
        NodeConfig {
            ack: true,
            shutdown_grace: Duration::ZERO,
            ..NodeConfig::default()
        }
    }

    #[tokio::test]
    async fn test_updates_mirrored_by_subscriber() {
        let ctx = CancellationToken::new();
        let broker = Arc::new(InMemoryBroker::new());
        let sub = NetParamsSub::new(&ctx, SubscriberConfig::default());
        broker.subscribe(sub.clone());
        let store = Store::new()
            .unwrap()
            .with_publisher(Arc::clone(&broker) as Arc<dyn EventPublisher>);

        store
            .update(GOVERNANCE_PROPOSAL_MARKET_MIN_CLOSE, "10h")
            .await
            .unwrap();
        assert!(
            wait_for(|| sub.get(GOVERNANCE_PROPOSAL_MARKET_MIN_CLOSE).as_deref() == Some("10h"))
                .await
        );

        // Rejected updates publish nothing.
        assert!(matches!(
            store.update(MARKET_FEE_FACTORS_MAKER_FEE, "-1").await,
            Err(NetParamsError::InvalidValue { .. })
        ));
        assert_eq!(sub.get(MARKET_FEE_FACTORS_MAKER_FEE), None);
        assert_eq!(broker.events_published(), 1);
    }

    #[tokio::test]
    async fn test_runtime_loads_genesis() {
        let path = std::env::temp_dir().join(format!("dn-genesis-{}.json", std::process::id()));
        let genesis = serde_json::json!({
            "app_state": "ignored",
            "network_parameters": {
                "reward.asset": "VEGA",
                "validators.epoch.length": "12h"
            }
        });
        std::fs::write(&path, genesis.to_string()).unwrap();

        let runtime = NodeRuntime::new(NodeConfig {
            genesis_file: Some(path.clone()),
            ..runtime_config()
        })
        .unwrap();
        runtime.start().await.unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(runtime.netparams().get(REWARD_ASSET).unwrap(), "VEGA");
        assert_eq!(
            runtime.netparams().get_duration(VALIDATORS_EPOCH_LENGTH).unwrap(),
            Duration::from_secs(12 * 3600)
        );
        // Genesis values reach the read side too.
        assert_eq!(runtime.net_params().get(REWARD_ASSET).as_deref(), Some("VEGA"));
    }

    #[tokio::test]
    async fn test_runtime_rejects_bad_genesis() {
        let path = std::env::temp_dir().join(format!("dn-bad-genesis-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"network_parameters": {"reward.asset": 5}}"#).unwrap();

        let runtime = NodeRuntime::new(NodeConfig {
            genesis_file: Some(path.clone()),
            ..runtime_config()
        })
        .unwrap();
        assert!(runtime.start().await.is_err());
        let _ = std::fs::remove_file(&path);
    }

    #[tokio::test]
    async fn test_watchers_fire_on_time_update() {
        let runtime = NodeRuntime::new(runtime_config()).unwrap();
        runtime.start().await.unwrap();

        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::new(slot::Slot::default());
        {
            let calls = Arc::clone(&calls);
            let seen = Arc::clone(&seen);
            runtime
                .netparams()
                .watch(
                    VALIDATORS_EPOCH_LENGTH,
                    Box::new(move |parsed| {
                        calls.fetch_add(1, Ordering::SeqCst);
                        seen.set(parsed.clone());
                    }),
                )
                .unwrap();
        }

        runtime.netparams().update(VALIDATORS_EPOCH_LENGTH, "6h").await.unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        runtime.broker().send(tick(1_000)).await;
        assert!(wait_for(|| calls.load(Ordering::SeqCst) == 1).await);
        assert_eq!(seen.get(), Some(Parsed::Duration(6 * 3600 * 1_000_000_000)));

        runtime.shutdown().await.unwrap();
    }

    mod slot {
        use dn_netparams::Parsed;
        use std::sync::Mutex;

        /// Last value handed to a watcher.
        #[derive(Default)]
        pub struct Slot(Mutex<Option<Parsed>>);

        impl Slot {
            pub fn set(&self, value: Parsed) {
                if let Ok(mut slot) = self.0.lock() {
                    *slot = Some(value);
                }
            }

            pub fn get(&self) -> Option<Parsed> {
                self.0.lock().ok().and_then(|slot| slot.clone())
            }
        }
    }
}
