//! Entry point for issuing rest calls.
//!
//! # Design
//! The controller gates every call on connectivity, hands accepted calls to
//! a `Dispatcher` on a fresh dispatch thread and keeps a ledger of completed
//! calls. Results are never returned from `submit`; they arrive later on the
//! event bus. The ledger (history plus counters) sits behind one mutex so
//! the history length always equals `successes + errors`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::thread;

use crate::bus::Subscription;
use crate::call::RestCall;
use crate::client::RestClient;
use crate::connectivity::ConnectivityOracle;
use crate::dispatcher::Dispatcher;
use crate::error::ApiError;
use crate::types::{CallRecord, Params, RequestType};

#[derive(Debug, Default)]
struct Ledger {
    history: Vec<Arc<CallRecord>>,
    successes: u64,
    errors: u64,
}

struct Inner {
    client: RestClient,
    oracle: RwLock<Option<Arc<dyn ConnectivityOracle>>>,
    ledger: Mutex<Ledger>,
}

/// Cheap to clone; clones share the ledger and the client.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<Inner>,
}

impl Controller {
    /// A controller with no connectivity oracle. Every call is refused until
    /// `init` is called.
    pub fn new(client: RestClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                oracle: RwLock::new(None),
                ledger: Mutex::new(Ledger::default()),
            }),
        }
    }

    pub fn with_oracle(client: RestClient, oracle: impl ConnectivityOracle + 'static) -> Self {
        let controller = Self::new(client);
        controller.init(oracle);
        controller
    }

    /// Install the connectivity oracle, replacing any previous one.
    pub fn init(&self, oracle: impl ConnectivityOracle + 'static) {
        let oracle: Arc<dyn ConnectivityOracle> = Arc::new(oracle);
        let mut slot = self
            .inner
            .oracle
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(oracle);
        tracing::info!(base_url = %self.inner.client.base_url(), "controller initialised");
    }

    pub fn client(&self) -> &RestClient {
        &self.inner.client
    }

    /// Whether the network is reachable. Oracle errors and a missing oracle
    /// both count as unreachable.
    pub fn connectivity_available(&self) -> bool {
        let oracle = self
            .inner
            .oracle
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        let Some(oracle) = oracle else {
            tracing::debug!("no connectivity oracle installed");
            return false;
        };
        match oracle.is_available() {
            Ok(available) => available,
            Err(err) => {
                tracing::debug!(error = %err, "connectivity check failed");
                false
            }
        }
    }

    /// Submit `method_name` with default event templates.
    pub fn submit_call(
        &self,
        method_name: &str,
        params: Params,
        request_type: RequestType,
    ) -> Result<bool, ApiError> {
        self.submit(RestCall::new(method_name, request_type).params(params))
    }

    /// Dispatch `call` in the background.
    ///
    /// Returns `Ok(false)` without doing anything when the network is
    /// unreachable, `Ok(true)` once the call is on its way. A JSON call
    /// without a body is rejected with `ApiError::MissingJsonBody` before
    /// anything is sent or published.
    pub fn submit(&self, call: RestCall) -> Result<bool, ApiError> {
        if !self.connectivity_available() {
            tracing::debug!(method_call = %call.name(), "offline, call not submitted");
            return Ok(false);
        }

        let request = self.inner.client.build_request(&call)?;
        let dispatcher = Dispatcher::new(self.clone(), call);
        thread::Builder::new()
            .name("restkik-dispatch".to_string())
            .spawn(move || dispatcher.run(request))
            .map_err(|e| ApiError::Spawn(e.to_string()))?;
        Ok(true)
    }

    /// Append a completed call to the history and bump its counter.
    pub fn record_outcome(&self, call: impl Into<Arc<CallRecord>>) {
        let call = call.into();
        let mut ledger = self.ledger();
        if call.succeeded {
            ledger.successes += 1;
        } else {
            ledger.errors += 1;
        }
        ledger.history.push(call);
    }

    /// Completed calls in the order they were recorded.
    pub fn history(&self) -> Vec<Arc<CallRecord>> {
        self.ledger().history.clone()
    }

    pub fn history_json(&self) -> Result<String, ApiError> {
        let history = self.history();
        let records: Vec<&CallRecord> = history.iter().map(Arc::as_ref).collect();
        serde_json::to_string(&records).map_err(|e| ApiError::SerializationError(e.to_string()))
    }

    pub fn success_count(&self) -> u64 {
        self.ledger().successes
    }

    pub fn error_count(&self) -> u64 {
        self.ledger().errors
    }

    /// Receive every event published after this call.
    pub fn subscribe(&self) -> Subscription {
        self.inner.client.bus().subscribe()
    }

    fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.inner.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for Controller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ledger = self.ledger();
        f.debug_struct("Controller")
            .field("client", &self.inner.client)
            .field("successes", &ledger.successes)
            .field("errors", &ledger.errors)
            .finish_non_exhaustive()
    }
}
