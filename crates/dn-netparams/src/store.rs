//! # Network Parameters Store
//!
//! Single owner of every network parameter. One lock guards the whole
//! key/value map: reads share it, an update holds it exclusively for the
//! full validate-then-commit sequence. Writers are also serialized across
//! commit and publish, so events leave in commit order.
//!
//! ```text
//!   update(key, raw) ──► mutable? ──► parse ──► rules ──► dependencies
//!                                                              │
//!                          commit + mark dirty ◄───────────────┘
//!                                  │
//!                   NetworkParameter event ──► broker
//!
//!   time update ──► dispatch_changes() ──► watchers of dirty keys
//! ```

use crate::defaults::{default_values, DEPENDENCIES};
use crate::error::{NetParamsError, NetParamsResult};
use crate::keys::is_deprecated;
use crate::values::{Parsed, Value};
use dn_telemetry::NETPARAMS_UPDATES;
use parking_lot::{Mutex, RwLock};
use primitive_types::U256;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use shared_bus::{Event, EventPayload, EventPublisher};
use shared_types::entities::NetworkParameter;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const TRACE_ID: &str = "netparams";

/// Callback invoked with the new value of a watched parameter.
pub type Watcher = Box<dyn Fn(&Parsed) + Send + Sync>;

#[derive(Debug, Deserialize)]
struct GenesisState {
    #[serde(default)]
    network_parameters: BTreeMap<String, String>,
}

struct Inner {
    values: BTreeMap<String, Value>,
    dirty: BTreeSet<String>,
}

impl Inner {
    fn value(&self, key: &str) -> NetParamsResult<&Value> {
        self.values
            .get(key)
            .ok_or_else(|| NetParamsError::UnknownKey(key.to_string()))
    }

    /// Check `parsed`, a candidate for `key`, against every parameter it
    /// depends on. `staged` overrides current values of other keys.
    fn check_dependencies(
        &self,
        key: &str,
        parsed: &Parsed,
        staged: &BTreeMap<String, (String, Parsed)>,
    ) -> NetParamsResult<()> {
        let failures: Vec<String> = DEPENDENCIES
            .iter()
            .filter(|dep| dep.key == key)
            .filter_map(|dep| {
                let other = match staged.get(dep.other) {
                    Some((_, staged_value)) => staged_value,
                    None => self.values.get(dep.other)?.parsed(),
                };
                dep.relation.check(parsed, dep.other, other).err()
            })
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(NetParamsError::InvalidValue {
                key: key.to_string(),
                reason: failures.join(", "),
            })
        }
    }

    fn commit(&mut self, key: &str, raw: &str, parsed: Parsed) {
        if let Some(value) = self.values.get_mut(key) {
            value.commit(raw, parsed);
            self.dirty.insert(key.to_string());
        }
    }
}

/// Typed, validated key/value store of network parameters.
pub struct Store {
    inner: RwLock<Inner>,
    watchers: Mutex<BTreeMap<String, Vec<Watcher>>>,
    publisher: Option<Arc<dyn EventPublisher>>,
    /// Held from commit until the change is published.
    writes: tokio::sync::Mutex<()>,
}

impl Store {
    /// Store holding every known parameter at its default value.
    pub fn new() -> NetParamsResult<Self> {
        Ok(Self {
            inner: RwLock::new(Inner {
                values: default_values()?,
                dirty: BTreeSet::new(),
            }),
            watchers: Mutex::new(BTreeMap::new()),
            publisher: None,
            writes: tokio::sync::Mutex::new(()),
        })
    }

    /// Publish a `NetworkParameter` event for every applied change.
    #[must_use]
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Check `raw` for `key` without changing anything.
    pub fn validate(&self, key: &str, raw: &str) -> NetParamsResult<()> {
        let inner = self.inner.read();
        let parsed = inner
            .value(key)?
            .validate(raw)
            .map_err(|e| e.for_key(key))?;
        inner.check_dependencies(key, &parsed, &BTreeMap::new())
    }

    /// Validate and commit `raw` for `key`, then publish the change.
    pub async fn update(&self, key: &str, raw: &str) -> NetParamsResult<()> {
        let _writing = self.writes.lock().await;
        let result = self.apply_update(key, raw);
        match &result {
            Ok(()) => {
                NETPARAMS_UPDATES.with_label_values(&["applied"]).inc();
                info!(key, value = raw, "network parameter updated");
            }
            Err(e) => {
                NETPARAMS_UPDATES.with_label_values(&["rejected"]).inc();
                debug!(key, value = raw, error = %e, "network parameter update rejected");
            }
        }
        result?;
        self.publish(key, raw).await;
        Ok(())
    }

    fn apply_update(&self, key: &str, raw: &str) -> NetParamsResult<()> {
        let mut inner = self.inner.write();
        let parsed = inner
            .value(key)?
            .prepare_update(raw)
            .map_err(|e| e.for_key(key))?;
        inner.check_dependencies(key, &parsed, &BTreeMap::new())?;
        inner.commit(key, raw, parsed);
        Ok(())
    }

    async fn publish(&self, key: &str, raw: &str) {
        if let Some(publisher) = &self.publisher {
            let param = NetworkParameter {
                key: key.to_string(),
                value: raw.to_string(),
            };
            publisher
                .send(Event::new(TRACE_ID, EventPayload::NetworkParameter(param)))
                .await;
        }
    }

    /// The value of `key` exactly as last written.
    pub fn get(&self, key: &str) -> NetParamsResult<String> {
        Ok(self.inner.read().value(key)?.raw().to_string())
    }

    #[must_use]
    pub fn exists(&self, key: &str) -> bool {
        self.inner.read().values.contains_key(key)
    }

    fn parsed(&self, key: &str) -> NetParamsResult<Parsed> {
        Ok(self.inner.read().value(key)?.parsed().clone())
    }

    fn wrong_kind(key: &str, expected: &'static str) -> NetParamsError {
        NetParamsError::WrongKind {
            key: key.to_string(),
            expected,
        }
    }

    pub fn get_float(&self, key: &str) -> NetParamsResult<f64> {
        match self.parsed(key)? {
            Parsed::Float(v) => Ok(v),
            _ => Err(Self::wrong_kind(key, "float")),
        }
    }

    pub fn get_int(&self, key: &str) -> NetParamsResult<i64> {
        match self.parsed(key)? {
            Parsed::Int(v) => Ok(v),
            _ => Err(Self::wrong_kind(key, "int")),
        }
    }

    pub fn get_uint(&self, key: &str) -> NetParamsResult<U256> {
        match self.parsed(key)? {
            Parsed::Uint(v) => Ok(v),
            _ => Err(Self::wrong_kind(key, "uint")),
        }
    }

    /// Durations are signed; a negative one cannot be read this way.
    pub fn get_duration(&self, key: &str) -> NetParamsResult<Duration> {
        match self.parsed(key)? {
            Parsed::Duration(nanos) => u64::try_from(nanos)
                .map(Duration::from_nanos)
                .map_err(|_| NetParamsError::InvalidValue {
                    key: key.to_string(),
                    reason: "negative duration".to_string(),
                }),
            _ => Err(Self::wrong_kind(key, "duration")),
        }
    }

    pub fn get_json<T: DeserializeOwned>(&self, key: &str) -> NetParamsResult<T> {
        match self.parsed(key)? {
            Parsed::Json(v) => serde_json::from_value(v).map_err(|e| NetParamsError::Parse {
                key: key.to_string(),
                reason: e.to_string(),
            }),
            _ => Err(Self::wrong_kind(key, "json")),
        }
    }

    pub fn get_string(&self, key: &str) -> NetParamsResult<String> {
        match self.parsed(key)? {
            Parsed::String(v) => Ok(v),
            _ => Err(Self::wrong_kind(key, "string")),
        }
    }

    /// Every parameter, ordered by key.
    #[must_use]
    pub fn all(&self) -> Vec<NetworkParameter> {
        self.inner
            .read()
            .values
            .iter()
            .map(|(key, value)| NetworkParameter {
                key: key.clone(),
                value: value.raw().to_string(),
            })
            .collect()
    }

    /// Overwrite defaults with the `network_parameters` object of a genesis
    /// document. Either every value is applied or none is.
    pub async fn upload_defaults_from_genesis(&self, raw: &[u8]) -> NetParamsResult<()> {
        let state: GenesisState = serde_json::from_slice(raw)
            .map_err(|e| NetParamsError::Genesis(format!("unable to decode genesis state: {e}")))?;

        let _writing = self.writes.lock().await;
        let applied = {
            let mut inner = self.inner.write();
            let mut staged = BTreeMap::new();
            for (key, value) in state.network_parameters {
                if is_deprecated(&key) {
                    warn!(key = %key, "skipping deprecated network parameter in genesis");
                    continue;
                }
                let parsed = inner
                    .value(&key)
                    .and_then(|v| v.check_raw(&value).map_err(|e| e.for_key(&key)))
                    .map_err(|e| NetParamsError::Genesis(e.to_string()))?;
                staged.insert(key, (value, parsed));
            }
            for (key, (_, parsed)) in &staged {
                inner
                    .check_dependencies(key, parsed, &staged)
                    .map_err(|e| NetParamsError::Genesis(e.to_string()))?;
            }
            staged
                .into_iter()
                .map(|(key, (value, parsed))| {
                    inner.commit(&key, &value, parsed);
                    (key, value)
                })
                .collect::<Vec<_>>()
        };

        info!(count = applied.len(), "network parameters loaded from genesis");
        for (key, value) in &applied {
            self.publish(key, value).await;
        }
        Ok(())
    }

    /// Encoded key/value list, ordered by key.
    pub fn checkpoint(&self) -> NetParamsResult<Vec<u8>> {
        bincode::serialize(&self.all())
            .map_err(|e| NetParamsError::Checkpoint(e.to_string()))
    }

    /// Restore state written by [`Store::checkpoint`]. Values are parsed but
    /// rules are not re-run: they held when the checkpoint was taken.
    pub fn load_checkpoint(&self, raw: &[u8]) -> NetParamsResult<()> {
        let params: Vec<NetworkParameter> =
            bincode::deserialize(raw).map_err(|e| NetParamsError::Checkpoint(e.to_string()))?;

        let mut inner = self.inner.write();
        let mut staged = Vec::with_capacity(params.len());
        for param in params {
            let parsed = inner
                .value(&param.key)
                .and_then(|v| v.parse_only(&param.value).map_err(|e| e.for_key(&param.key)))
                .map_err(|e| NetParamsError::Checkpoint(e.to_string()))?;
            staged.push((param, parsed));
        }
        let count = staged.len();
        for (param, parsed) in staged {
            inner.commit(&param.key, &param.value, parsed);
        }
        info!(count, "network parameters restored from checkpoint");
        Ok(())
    }

    /// SHA-256 of the checkpoint encoding.
    pub fn state_hash(&self) -> NetParamsResult<[u8; 32]> {
        let mut hasher = Sha256::new();
        hasher.update(self.checkpoint()?);
        Ok(hasher.finalize().into())
    }

    /// Register `watcher` for changes of `key`. Watchers must not register
    /// further watchers from inside the callback.
    pub fn watch(&self, key: &str, watcher: Watcher) -> NetParamsResult<()> {
        if !self.exists(key) {
            return Err(NetParamsError::UnknownKey(key.to_string()));
        }
        self.watchers
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(watcher);
        Ok(())
    }

    /// Invoke the watchers of every key changed since the last dispatch,
    /// once per key with its latest value.
    pub fn dispatch_changes(&self) {
        let changed: Vec<(String, Parsed)> = {
            let mut inner = self.inner.write();
            let dirty = std::mem::take(&mut inner.dirty);
            dirty
                .into_iter()
                .filter_map(|key| {
                    let parsed = inner.values.get(&key)?.parsed().clone();
                    Some((key, parsed))
                })
                .collect()
        };
        if changed.is_empty() {
            return;
        }

        let watchers = self.watchers.lock();
        for (key, parsed) in &changed {
            if let Some(list) = watchers.get(key) {
                debug!(key = %key, watchers = list.len(), "dispatching network parameter change");
                for watcher in list {
                    watcher(parsed);
                }
            }
        }
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("params", &self.inner.read().values.len())
            .field("publisher", &self.publisher.is_some())
            .finish_non_exhaustive()
    }
}
