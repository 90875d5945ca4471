//! Per-call bridge from the transport to the event model.
//!
//! # Design
//! A `Dispatcher` is created for every submitted call and lives on its own
//! dispatch thread. It runs the request, classifies the result, records the
//! `CallRecord` with the controller and then publishes exactly one event.
//! The record is stored before the parse hook runs, so a panicking hook
//! still leaves the counters correct.

use std::sync::Arc;
use std::time::Instant;

use crate::call::RestCall;
use crate::controller::Controller;
use crate::event::{Event, EventTemplate, FailureEvent, SuccessEvent};
use crate::http::HttpRequest;
use crate::response::{classify, Outcome};
use crate::types::{CallRecord, Params};

pub(crate) struct Dispatcher {
    controller: Controller,
    on_success: EventTemplate,
    on_failure: EventTemplate,
    method_name: String,
    params: Params,
    started: Instant,
}

impl Dispatcher {
    pub(crate) fn new(controller: Controller, call: RestCall) -> Self {
        let (method_name, params, on_success, on_failure) = call.into_parts();
        Self {
            controller,
            on_success,
            on_failure,
            method_name,
            params,
            started: Instant::now(),
        }
    }

    pub(crate) fn run(self, request: HttpRequest) {
        tracing::debug!(
            method_call = %self.method_name,
            http_method = request.method.as_str(),
            url = %request.url,
            "dispatching call"
        );
        let result = self.controller.client().execute(request);
        let event = self.complete(classify(result));
        self.publish(event);
    }

    /// Turn `outcome` into the event to publish, recording the call on the
    /// way.
    fn complete(&self, outcome: Outcome) -> Event {
        let record = Arc::new(CallRecord::new(
            outcome.status(),
            self.method_name.as_str(),
            self.started.elapsed(),
            outcome.succeeded(),
            self.params.clone(),
        ));
        self.controller.record_outcome(Arc::clone(&record));

        match outcome {
            Outcome::Success { payload, .. } => {
                let mut event = SuccessEvent::new(&self.on_success, record);
                event.attach(payload);
                event.parse(&self.on_success);
                Event::Success(event)
            }
            Outcome::Failure { payload, text, .. } => {
                let mut event = FailureEvent::new(&self.on_failure, record);
                event.attach(payload);
                event.set_response_text(text);
                event.parse(&self.on_failure);
                Event::Failure(event)
            }
            Outcome::FailureText { text, .. } => {
                let mut event = FailureEvent::new(&self.on_failure, record);
                event.set_response_text(text);
                Event::Failure(event)
            }
        }
    }

    fn publish(self, event: Event) {
        let call = event.call();
        tracing::debug!(
            method_call = %call.method_name,
            status = call.status_code,
            succeeded = call.succeeded,
            duration_ms = call.duration_ms,
            "call completed"
        );
        self.controller.client().bus().publish(event);
    }
}
