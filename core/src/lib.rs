//! Named rest calls dispatched in the background, with results delivered as
//! events.
//!
//! # Overview
//! A `Controller` accepts `RestCall`s (a method name, parameters and a
//! request type), checks connectivity, and hands each call to a dispatcher
//! thread. The dispatcher runs the request through the shared `Transport`,
//! records a `CallRecord` with the controller and publishes exactly one
//! `Event` on the client's `EventBus`.
//!
//! # Design
//! - `RestClient` holds the base URL, socket timeout, transport and bus; no
//!   global state.
//! - `RestCall` is consumed on submission, so calls never share builder
//!   state.
//! - Requests and responses are plain data (`HttpRequest`/`HttpResponse`);
//!   only the `Transport` touches the network.
//! - Callers customise payload parsing per call with `EventTemplate` hooks.

pub mod bus;
pub mod call;
pub mod client;
pub mod config;
pub mod connectivity;
pub mod controller;
mod dispatcher;
pub mod error;
pub mod event;
pub mod http;
pub mod response;
pub mod transport;
pub mod types;

pub use bus::{EventBus, Subscription};
pub use call::RestCall;
pub use client::RestClient;
pub use config::ClientConfig;
pub use connectivity::{AlwaysOnline, ConnectivityOracle, TcpProbe};
pub use controller::Controller;
pub use error::{ApiError, ConnectivityError, TransportError};
pub use event::{Event, EventTemplate, FailureEvent, Payload, SuccessEvent};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use response::{classify, Outcome};
pub use transport::{Transport, UreqTransport};
pub use types::{CallRecord, Params, RequestType};
