//! Classification of a finished HTTP exchange.
//!
//! Every exchange ends in exactly one `Outcome`:
//!
//! | Status | Body | Outcome |
//! |--------|------|---------|
//! | 2xx | JSON object / array | `Success` with that payload |
//! | 2xx | empty | `Success`, payload absent |
//! | 2xx | anything else | `FailureText` |
//! | other | JSON object | `Failure` with object payload |
//! | other | empty | `Failure`, payload absent |
//! | other | anything else | `FailureText` |
//! | no response | - | `FailureText`, status 0, error message |

use serde_json::Value;

use crate::error::TransportError;
use crate::event::Payload;
use crate::http::HttpResponse;

/// How a call ended, before any event is built.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success { status: u16, payload: Payload },
    /// Structured failure; `text` keeps the raw body.
    Failure { status: u16, payload: Payload, text: String },
    /// Failure with only a raw string. Parse hooks are not run for these.
    FailureText { status: u16, text: String },
}

impl Outcome {
    pub fn status(&self) -> u16 {
        match self {
            Outcome::Success { status, .. }
            | Outcome::Failure { status, .. }
            | Outcome::FailureText { status, .. } => *status,
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

enum Body {
    Json(Payload),
    Empty,
    Raw,
}

fn read_body(body: &str) -> Body {
    if body.trim().is_empty() {
        return Body::Empty;
    }
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(obj)) => Body::Json(Payload::Object(obj)),
        Ok(Value::Array(items)) => Body::Json(Payload::List(items)),
        _ => Body::Raw,
    }
}

/// Map a transport result onto an `Outcome`.
pub fn classify(result: Result<HttpResponse, TransportError>) -> Outcome {
    let response = match result {
        Ok(response) => response,
        Err(err) => {
            return Outcome::FailureText {
                status: 0,
                text: err.to_string(),
            }
        }
    };
    let status = response.status;

    if response.is_success() {
        return match read_body(&response.body) {
            Body::Json(payload) => Outcome::Success { status, payload },
            Body::Empty => Outcome::Success {
                status,
                payload: Payload::Absent,
            },
            Body::Raw => Outcome::FailureText {
                status,
                text: response.body,
            },
        };
    }

    match read_body(&response.body) {
        Body::Json(payload @ Payload::Object(_)) => Outcome::Failure {
            status,
            payload,
            text: response.body,
        },
        Body::Empty => Outcome::Failure {
            status,
            payload: Payload::Absent,
            text: response.body,
        },
        _ => Outcome::FailureText {
            status,
            text: response.body,
        },
    }
}
