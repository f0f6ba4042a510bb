//! Inbound (Driving) ports: read APIs served from subscriber state.

use crate::stream::EventFilter;
use shared_bus::{Event, EventType};
use shared_types::entities::Node;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Live event observation for streaming endpoints.
pub trait EventObserver: Send + Sync {
    /// Start observing events of `types` that pass every filter.
    ///
    /// Returns the batch receiver and a sender for batch-size updates. A
    /// negative `retries` budget never gives up on a slow reader.
    fn observe_events(
        &self,
        ctx: &CancellationToken,
        retries: i64,
        types: Vec<EventType>,
        batch_size: usize,
        filters: Vec<EventFilter>,
    ) -> (mpsc::Receiver<Vec<Event>>, mpsc::Sender<usize>);
}

/// Validator node lookups.
pub trait NodeQuery: Send + Sync {
    fn get_node_by_id(&self, node_id: &str) -> Option<Node>;

    /// All known nodes, ordered by id.
    fn get_nodes(&self) -> Vec<Node>;
}
