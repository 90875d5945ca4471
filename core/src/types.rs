//! Value types shared by every stage of a rest call.
//!
//! # Design
//! `CallRecord` is created once per completed dispatch and never mutated.
//! The dispatcher wraps it in an `Arc` so the published event and the
//! controller history point at the same record.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Request parameters. Ordered so query strings and form bodies are stable.
pub type Params = BTreeMap<String, String>;

/// How a call is sent over HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestType {
    /// Parameters go into the query string.
    #[default]
    Get,
    /// Parameters go into a form-encoded body.
    Post,
    /// Parameters go into a form-encoded body.
    Put,
    /// A pre-built JSON body is POSTed; parameters are not sent.
    Json,
}

/// Outcome summary of one dispatched call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallRecord {
    /// HTTP status, or `0` when no response was received.
    pub status_code: u16,
    pub method_name: String,
    pub duration_ms: u64,
    pub succeeded: bool,
    pub params: Params,
}

impl CallRecord {
    pub fn new(
        status_code: u16,
        method_name: impl Into<String>,
        duration: Duration,
        succeeded: bool,
        params: Params,
    ) -> Self {
        Self {
            status_code,
            method_name: method_name.into(),
            duration_ms: u64::try_from(duration.as_millis()).unwrap_or(u64::MAX),
            succeeded,
            params,
        }
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms)
    }
}
