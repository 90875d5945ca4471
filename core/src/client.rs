//! Shared client context: configuration, transport and event bus.
//!
//! # Design
//! One `RestClient` is built at startup and handed to the `Controller`. It
//! replaces process-wide globals: the base URL and socket timeout come from
//! `ClientConfig`, every call goes through the same `Transport`, and every
//! result is published on the same `EventBus`. Cloning is cheap and all
//! clones share the transport and bus.

use std::sync::Arc;

use crate::bus::EventBus;
use crate::call::RestCall;
use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError};
use crate::http::{HttpRequest, HttpResponse};
use crate::transport::{Transport, UreqTransport};

#[derive(Clone)]
pub struct RestClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    bus: EventBus,
}

impl RestClient {
    /// Client backed by `UreqTransport` with the configured socket timeout.
    pub fn new(config: ClientConfig) -> Self {
        let transport = Arc::new(UreqTransport::new(config.socket_timeout()));
        Self::with_transport(config, transport)
    }

    pub fn with_transport(config: ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let bus = EventBus::new();
        Self {
            config,
            transport,
            bus,
        }
    }

    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self::new(ClientConfig::from_env()?))
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn build_request(&self, call: &RestCall) -> Result<HttpRequest, ApiError> {
        call.build_request(&self.config.base_url)
    }

    pub(crate) fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        self.transport.execute(request)
    }
}

impl std::fmt::Debug for RestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RestClient")
            .field("config", &self.config)
            .field("subscribers", &self.bus.subscriber_count())
            .finish_non_exhaustive()
    }
}
