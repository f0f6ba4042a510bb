//! # Subscriber Contract
//!
//! Every consumer registered with the broker implements [`Subscriber`] and
//! embeds a [`Base`], the shared lifecycle primitive.
//!
//! ## Lifecycle
//!
//! ```text
//!            new(ack = false)                 new(ack = true)
//!                  │                                │
//!                  ▼                                ▼
//!   ┌────────── RUNNING ◄──── resume() ──── PAUSED (skip fires)
//!   │              │                                ▲
//!   │              └──────────── pause() ───────────┘
//!   │
//!   └─ halt() / parent cancelled ──► HALTED (closed fires, channel closed)
//! ```
//!
//! - `closed()` is permanent: the broker stops routing and unregisters.
//! - `skip()` is temporary: the broker drops deliveries while it fires.
//! - An ack subscriber starts paused and has no loop; the broker calls
//!   `push` on it synchronously.

use crate::events::{Event, EventType};
use dn_telemetry::SUBSCRIBER_EVENTS;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};
use tracing::debug;

/// Broker-assigned subscriber identity.
pub type SubscriberId = u64;

/// Batch of events delivered in one channel send.
pub type EventBatch = Vec<Event>;

/// The contract the broker routes against.
///
/// `types` is fixed for the lifetime of the subscriber. `push` is called
/// either from the subscriber's own loop task or, in ack mode, directly from
/// the broker.
pub trait Subscriber: Send + Sync + 'static {
    /// Embedded lifecycle state.
    fn base(&self) -> &Base;

    /// Event types this subscriber wants routed to it.
    fn types(&self) -> Vec<EventType>;

    /// Handle a batch of events, in delivery order.
    fn push(&self, events: EventBatch);

    /// Short name used in logs and metric labels.
    fn name(&self) -> &'static str;

    /// Terminal shutdown. Overridable for subscribers that must release
    /// blocked readers.
    fn halt(&self) {
        self.base().halt();
    }

    fn id(&self) -> SubscriberId {
        self.base().id()
    }

    fn set_id(&self, id: SubscriberId) {
        self.base().set_id(id);
    }

    fn ack(&self) -> bool {
        self.base().ack()
    }
}

/// Shared lifecycle primitive: event channel, cancellation, pause gate and
/// identity.
pub struct Base {
    token: CancellationToken,
    tx: mpsc::Sender<EventBatch>,
    rx: Mutex<Option<mpsc::Receiver<EventBatch>>>,
    /// `true` while paused; the broker's skip signal.
    paused: watch::Sender<bool>,
    running: AtomicBool,
    ack: bool,
    id: AtomicU64,
}

impl Base {
    /// Create the lifecycle state as a child of `parent`.
    ///
    /// Cancelling `parent` halts the subscriber. A `buffer` of zero is
    /// treated as one.
    #[must_use]
    pub fn new(parent: &CancellationToken, buffer: usize, ack: bool) -> Self {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let running = !ack;
        let (paused, _) = watch::channel(!running);
        Self {
            token: parent.child_token(),
            tx,
            rx: Mutex::new(Some(rx)),
            paused,
            running: AtomicBool::new(running),
            ack,
            id: AtomicU64::new(0),
        }
    }

    /// Send side of the event channel.
    #[must_use]
    pub fn c(&self) -> mpsc::Sender<EventBatch> {
        self.tx.clone()
    }

    /// Resolves once the subscriber is halted.
    #[must_use]
    pub fn closed(&self) -> WaitForCancellationFutureOwned {
        self.token.clone().cancelled_owned()
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Resolves while the subscriber is paused. Re-armed by `resume`.
    pub fn skip(&self) -> impl Future<Output = ()> + Send + 'static {
        let mut paused = self.paused.subscribe();
        async move {
            // A dropped sender means the subscriber is gone; treat as skip.
            let _ = paused.wait_for(|p| *p).await;
        }
    }

    #[must_use]
    pub fn is_skipping(&self) -> bool {
        *self.paused.borrow()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn pause(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            self.paused.send_replace(true);
        }
    }

    /// Reopen the gate. No effect once halted.
    pub fn resume(&self) {
        if self.is_closed() {
            return;
        }
        if !self.running.swap(true, Ordering::AcqRel) {
            self.paused.send_replace(false);
        }
    }

    /// Cancel, pause and close the event channel. Safe to call repeatedly.
    pub fn halt(&self) {
        self.token.cancel();
        self.pause();
        if let Some(rx) = self.rx.lock().as_mut() {
            rx.close();
        }
    }

    #[must_use]
    pub fn ack(&self) -> bool {
        self.ack
    }

    #[must_use]
    pub fn id(&self) -> SubscriberId {
        self.id.load(Ordering::Acquire)
    }

    pub fn set_id(&self, id: SubscriberId) {
        self.id.store(id, Ordering::Release);
    }

    /// Cancellation token scoped to this subscriber.
    #[must_use]
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Hand the receive side to the loop task. Returns `None` once taken.
    pub fn take_receiver(&self) -> Option<mpsc::Receiver<EventBatch>> {
        self.rx.lock().take()
    }
}

/// Spawn the loop task that drains the subscriber's channel.
///
/// Ack subscribers have no loop; inside a runtime they get a task that halts
/// them when the parent token is cancelled. Batches read while paused are dropped. On
/// cancellation the channel is closed and the subscriber halted.
pub fn spawn_loop<S: Subscriber>(sub: &Arc<S>) -> Option<JoinHandle<()>> {
    let base = sub.base();
    if base.ack() {
        return spawn_halt_on_cancel(sub);
    }
    if !base.is_running() {
        return None;
    }
    let mut rx = base.take_receiver()?;
    let token = base.token().clone();
    let sub = Arc::clone(sub);

    Some(tokio::spawn(async move {
        loop {
            tokio::select! {
                biased;
                () = token.cancelled() => {
                    rx.close();
                    sub.halt();
                    debug!(subscriber = sub.name(), id = sub.id(), "Subscriber loop stopped");
                    return;
                }
                batch = rx.recv() => match batch {
                    Some(events) => {
                        if sub.base().is_running() {
                            SUBSCRIBER_EVENTS
                                .with_label_values(&[sub.name()])
                                .inc_by(events.len() as f64);
                            sub.push(events);
                        }
                    }
                    None => return,
                },
            }
        }
    }))
}

fn spawn_halt_on_cancel<S: Subscriber>(sub: &Arc<S>) -> Option<JoinHandle<()>> {
    let runtime = tokio::runtime::Handle::try_current().ok()?;
    let token = sub.base().token().clone();
    let weak = Arc::downgrade(sub);
    Some(runtime.spawn(async move {
        token.cancelled().await;
        if let Some(sub) = weak.upgrade() {
            sub.halt();
            debug!(subscriber = sub.name(), id = sub.id(), "Ack subscriber halted");
        }
    }))
}
