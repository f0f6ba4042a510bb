//! # Data Node Runtime
//!
//! Owns the root cancellation token, the broker, the network parameters
//! store and every subscriber.
//!
//! ## Startup Sequence
//!
//! 1. Build the broker and the parameters store (publishing through it)
//! 2. Register every subscriber against in-memory stores
//! 3. Load genesis parameters, then the checkpoint, when configured
//! 4. Dispatch parameter changes to watchers on every time update
//!
//! ## Shutdown Sequence
//!
//! 1. Cancel the root token: every subscriber halts
//! 2. Write the parameters checkpoint, when configured
//! 3. Wait out the grace period

use crate::config::NodeConfig;
use anyhow::{Context, Result};
use dn_netparams::Store;
use dn_subscribers::adapters::{MemoryNodeStore, RecordingStore};
use dn_subscribers::{
    AccountSub, CandleSub, CheckpointSub, DelegationBalanceSub, EpochSub, EventFilter,
    EventObserver, GovernanceDataSub, MarketDataSub, MarketDepthBuilder, MarketSub, NetParamsSub,
    NodesSub, OrderSub, PartySub, RiskFactorSub, Service, TimeSub, TradeSub, TransferResponseSub,
    TransferSub,
};
use shared_bus::{Broker, CancellationToken, Event, EventPublisher, EventType, InMemoryBroker};
use shared_types::entities::{
    Account, Candle, Checkpoint, Delegation, Epoch, Market, MarketData, Order, Party, RiskFactor,
    Trade, Transfer, TransferResponse,
};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// In-memory stores behind the persisting subscribers.
#[derive(Default)]
pub struct MemoryStores {
    pub orders: Arc<RecordingStore<Order>>,
    pub trades: Arc<RecordingStore<Trade>>,
    pub parties: Arc<RecordingStore<Party>>,
    pub accounts: Arc<RecordingStore<Account>>,
    pub markets: Arc<RecordingStore<Market>>,
    pub market_data: Arc<RecordingStore<MarketData>>,
    pub risk_factors: Arc<RecordingStore<RiskFactor>>,
    pub candles: Arc<RecordingStore<Candle>>,
    pub transfer_responses: Arc<RecordingStore<TransferResponse>>,
    pub delegations: Arc<RecordingStore<Delegation>>,
    pub transfers: Arc<RecordingStore<Transfer>>,
    pub epochs: Arc<RecordingStore<Epoch>>,
    pub checkpoints: Arc<RecordingStore<Checkpoint>>,
    pub nodes: Arc<MemoryNodeStore>,
}

/// The running data node.
pub struct NodeRuntime {
    config: NodeConfig,
    ctx: CancellationToken,
    broker: Arc<InMemoryBroker>,
    netparams: Arc<Store>,
    service: Service<InMemoryBroker>,
    stores: MemoryStores,
    governance: Arc<GovernanceDataSub>,
    market_depth: Arc<MarketDepthBuilder>,
    nodes: Arc<NodesSub<MemoryNodeStore>>,
    net_params: Arc<NetParamsSub>,
    time: Arc<TimeSub>,
}

impl NodeRuntime {
    /// Build the node and register every subscriber. Must run inside a
    /// tokio runtime: subscriber loops are spawned here.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate().context("invalid node configuration")?;

        let ctx = CancellationToken::new();
        let broker = Arc::new(InMemoryBroker::with_send_timeout(config.send_timeout));
        let netparams = Arc::new(
            Store::new()
                .context("failed to build default network parameters")?
                .with_publisher(Arc::clone(&broker) as Arc<dyn EventPublisher>),
        );
        let sub_config = config.subscriber_config();
        let service = Service::new(Arc::clone(&broker), sub_config);
        let stores = MemoryStores::default();

        broker.subscribe(OrderSub::new(&ctx, Arc::clone(&stores.orders), sub_config));
        broker.subscribe(TradeSub::new(&ctx, Arc::clone(&stores.trades), sub_config));
        broker.subscribe(PartySub::new(&ctx, Arc::clone(&stores.parties), sub_config));
        broker.subscribe(AccountSub::new(&ctx, Arc::clone(&stores.accounts), sub_config));
        broker.subscribe(MarketSub::new(&ctx, Arc::clone(&stores.markets), sub_config));
        broker.subscribe(MarketDataSub::new(
            &ctx,
            Arc::clone(&stores.market_data),
            sub_config,
        ));
        broker.subscribe(RiskFactorSub::new(
            &ctx,
            Arc::clone(&stores.risk_factors),
            sub_config,
        ));
        broker.subscribe(CandleSub::new(&ctx, Arc::clone(&stores.candles), sub_config));
        broker.subscribe(TransferResponseSub::new(
            &ctx,
            Arc::clone(&stores.transfer_responses),
            sub_config,
        ));
        broker.subscribe(DelegationBalanceSub::new(
            &ctx,
            Arc::clone(&stores.delegations),
            sub_config,
        ));
        broker.subscribe(TransferSub::new(&ctx, Arc::clone(&stores.transfers), sub_config));
        broker.subscribe(EpochSub::new(&ctx, Arc::clone(&stores.epochs), sub_config));
        broker.subscribe(CheckpointSub::new(
            &ctx,
            Arc::clone(&stores.checkpoints),
            sub_config,
        ));

        let nodes = NodesSub::new(&ctx, Arc::clone(&stores.nodes), sub_config);
        let governance = GovernanceDataSub::new(&ctx, sub_config);
        let market_depth = MarketDepthBuilder::new(&ctx, sub_config);
        let net_params = NetParamsSub::new(&ctx, sub_config);
        let time = TimeSub::new(&ctx, sub_config);
        broker.subscribe(nodes.clone());
        broker.subscribe(governance.clone());
        broker.subscribe(market_depth.clone());
        broker.subscribe(net_params.clone());
        broker.subscribe(time.clone());

        info!(
            subscribers = broker.subscriber_count(),
            ack = config.ack,
            buffer_size = config.buffer_size,
            "data node subscribers registered"
        );

        Ok(Self {
            config,
            ctx,
            broker,
            netparams,
            service,
            stores,
            governance,
            market_depth,
            nodes,
            net_params,
            time,
        })
    }

    /// Load configured parameter state and start the watcher dispatch.
    pub async fn start(&self) -> Result<()> {
        if let Some(path) = &self.config.genesis_file {
            let raw = tokio::fs::read(path)
                .await
                .with_context(|| format!("failed to read genesis file {}", path.display()))?;
            self.netparams
                .upload_defaults_from_genesis(&raw)
                .await
                .context("failed to load genesis network parameters")?;
        }

        if let Some(path) = &self.config.checkpoint_file {
            if tokio::fs::try_exists(path).await.unwrap_or(false) {
                let raw = tokio::fs::read(path)
                    .await
                    .with_context(|| format!("failed to read checkpoint {}", path.display()))?;
                self.netparams
                    .load_checkpoint(&raw)
                    .context("failed to restore network parameters checkpoint")?;
            }
        }

        self.spawn_param_dispatch();
        info!("data node running");
        Ok(())
    }

    fn spawn_param_dispatch(&self) {
        let ctx = self.ctx.clone();
        let store = Arc::clone(&self.netparams);
        let mut now = self.time.watch();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => break,
                    changed = now.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        store.dispatch_changes();
                    }
                }
            }
            debug!("network parameter dispatch stopped");
        });
    }

    /// Halt every subscriber, persist the parameters and wait out the
    /// grace period.
    pub async fn shutdown(&self) -> Result<()> {
        info!("initiating graceful shutdown");
        self.ctx.cancel();

        if let Some(path) = &self.config.checkpoint_file {
            let checkpoint = self
                .netparams
                .checkpoint()
                .context("failed to encode network parameters checkpoint")?;
            tokio::fs::write(path, checkpoint)
                .await
                .with_context(|| format!("failed to write checkpoint {}", path.display()))?;
            info!(path = %path.display(), "network parameters checkpoint written");
        }

        tokio::time::sleep(self.config.shutdown_grace).await;
        info!("shutdown complete");
        Ok(())
    }

    #[must_use]
    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Root token; cancelling it halts every subscriber.
    #[must_use]
    pub fn ctx(&self) -> &CancellationToken {
        &self.ctx
    }

    #[must_use]
    pub fn broker(&self) -> &Arc<InMemoryBroker> {
        &self.broker
    }

    #[must_use]
    pub fn netparams(&self) -> &Arc<Store> {
        &self.netparams
    }

    #[must_use]
    pub fn service(&self) -> &Service<InMemoryBroker> {
        &self.service
    }

    /// Open a live event stream with the configured retry budget.
    pub fn observe_events(
        &self,
        ctx: &CancellationToken,
        types: Vec<EventType>,
        batch_size: usize,
        filters: Vec<EventFilter>,
    ) -> (mpsc::Receiver<Vec<Event>>, mpsc::Sender<usize>) {
        self.service
            .observe_events(ctx, self.config.observe_retries, types, batch_size, filters)
    }

    #[must_use]
    pub fn stores(&self) -> &MemoryStores {
        &self.stores
    }

    #[must_use]
    pub fn governance(&self) -> &Arc<GovernanceDataSub> {
        &self.governance
    }

    #[must_use]
    pub fn market_depth(&self) -> &Arc<MarketDepthBuilder> {
        &self.market_depth
    }

    #[must_use]
    pub fn nodes(&self) -> &Arc<NodesSub<MemoryNodeStore>> {
        &self.nodes
    }

    #[must_use]
    pub fn net_params(&self) -> &Arc<NetParamsSub> {
        &self.net_params
    }

    #[must_use]
    pub fn time(&self) -> &Arc<TimeSub> {
        &self.time
    }
}
