//! Result events published after a call completes.
//!
//! # Design
//! An event is either `Success` or `Failure`. Callers customise how the raw
//! JSON payload becomes domain data by handing an `EventTemplate` to the
//! call: the template carries optional object and list parse hooks, and the
//! hook output is stored type-erased on the event (`parsed::<T>()`).
//!
//! Templates without a matching hook log a warning and leave `parsed` empty.
//! The default failure template renders error objects back to JSON text, so
//! structured failures on the default path parse without a warning.
//! A hook that panics takes down the dispatch thread running it; the event
//! for that call is never published.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::types::CallRecord;

/// Type-erased output of a parse hook.
pub type Parsed = Arc<dyn Any + Send + Sync>;

type ObjectHook = Arc<dyn Fn(&Map<String, Value>) -> Parsed + Send + Sync>;
type ListHook = Arc<dyn Fn(&[Value]) -> Parsed + Send + Sync>;

/// Raw JSON payload of a response. At most one shape is ever present.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Payload {
    Object(Map<String, Value>),
    List(Vec<Value>),
    #[default]
    Absent,
}

impl Payload {
    pub fn as_object(&self) -> Option<&Map<String, Value>> {
        match self {
            Payload::Object(obj) => Some(obj),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Payload::List(items) => Some(items.as_slice()),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Payload::Absent)
    }
}

/// Per-call recipe for turning a payload into domain data.
#[derive(Clone)]
pub struct EventTemplate {
    name: Cow<'static, str>,
    object_hook: Option<ObjectHook>,
    list_hook: Option<ListHook>,
}

impl EventTemplate {
    /// A template with no hooks. `name` shows up in diagnostics.
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            object_hook: None,
            list_hook: None,
        }
    }

    /// Default template used for successful calls.
    pub fn success() -> Self {
        Self::new("success")
    }

    /// Default template used for failed calls. Error objects are rendered
    /// to their JSON text, read back with `parsed::<String>()`.
    pub fn failure() -> Self {
        Self::new("failure").on_object(|obj| Value::Object(obj.clone()).to_string())
    }

    /// Parse object payloads with `hook`.
    pub fn on_object<T, F>(mut self, hook: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&Map<String, Value>) -> T + Send + Sync + 'static,
    {
        self.object_hook = Some(Arc::new(move |obj: &Map<String, Value>| -> Parsed {
            Arc::new(hook(obj))
        }));
        self
    }

    /// Parse list payloads with `hook`.
    pub fn on_list<T, F>(mut self, hook: F) -> Self
    where
        T: Any + Send + Sync,
        F: Fn(&[Value]) -> T + Send + Sync + 'static,
    {
        self.list_hook = Some(Arc::new(move |items: &[Value]| -> Parsed { Arc::new(hook(items)) }));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn parse(&self, payload: &Payload) -> Option<Parsed> {
        match payload {
            Payload::Object(obj) => match &self.object_hook {
                Some(hook) => Some(hook(obj)),
                None => {
                    tracing::warn!(template = %self.name, "object payload received but no object parser set");
                    None
                }
            },
            Payload::List(items) => match &self.list_hook {
                Some(hook) => Some(hook(items.as_slice())),
                None => {
                    tracing::warn!(template = %self.name, "list payload received but no list parser set");
                    None
                }
            },
            Payload::Absent => None,
        }
    }
}

impl fmt::Debug for EventTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventTemplate")
            .field("name", &self.name)
            .field("object_hook", &self.object_hook.is_some())
            .field("list_hook", &self.list_hook.is_some())
            .finish()
    }
}

/// State shared by both event variants.
#[derive(Debug, Clone)]
struct EventBody {
    template: Cow<'static, str>,
    payload: Payload,
    parsed: Option<Parsed>,
    call: Arc<CallRecord>,
}

impl EventBody {
    fn new(template: &EventTemplate, call: Arc<CallRecord>) -> Self {
        Self {
            template: template.name.clone(),
            payload: Payload::Absent,
            parsed: None,
            call,
        }
    }

    fn parsed<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.parsed.as_deref().and_then(|p| p.downcast_ref::<T>())
    }
}

/// Published when a call returned a 2xx response with a JSON body (or none).
#[derive(Debug, Clone)]
pub struct SuccessEvent {
    body: EventBody,
}

impl SuccessEvent {
    pub(crate) fn new(template: &EventTemplate, call: Arc<CallRecord>) -> Self {
        Self {
            body: EventBody::new(template, call),
        }
    }

    pub(crate) fn attach(&mut self, payload: Payload) {
        self.body.payload = payload;
    }

    /// Run the template hook that matches the attached payload.
    pub(crate) fn parse(&mut self, template: &EventTemplate) {
        self.body.parsed = template.parse(&self.body.payload);
    }

    pub fn payload(&self) -> &Payload {
        &self.body.payload
    }

    pub fn parsed<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.body.parsed()
    }

    pub fn call(&self) -> &Arc<CallRecord> {
        &self.body.call
    }

    pub fn template(&self) -> &str {
        &self.body.template
    }
}

/// Published when a call failed at the HTTP or transport level.
#[derive(Debug, Clone)]
pub struct FailureEvent {
    body: EventBody,
    response_text: String,
}

impl FailureEvent {
    pub(crate) fn new(template: &EventTemplate, call: Arc<CallRecord>) -> Self {
        Self {
            body: EventBody::new(template, call),
            response_text: String::new(),
        }
    }

    pub(crate) fn attach(&mut self, payload: Payload) {
        self.body.payload = payload;
    }

    pub(crate) fn parse(&mut self, template: &EventTemplate) {
        self.body.parsed = template.parse(&self.body.payload);
    }

    pub(crate) fn set_response_text(&mut self, text: impl Into<String>) {
        self.response_text = text.into();
    }

    pub fn payload(&self) -> &Payload {
        &self.body.payload
    }

    pub fn parsed<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.body.parsed()
    }

    pub fn call(&self) -> &Arc<CallRecord> {
        &self.body.call
    }

    pub fn template(&self) -> &str {
        &self.body.template
    }

    /// Raw response body, or the transport error message when no response
    /// arrived. Empty for failures without a body.
    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    /// Name of the method call that failed.
    pub fn method_name(&self) -> &str {
        &self.body.call.method_name
    }
}

/// A completed call, as delivered to subscribers.
#[derive(Debug, Clone)]
pub enum Event {
    Success(SuccessEvent),
    Failure(FailureEvent),
}

impl Event {
    pub fn call(&self) -> &Arc<CallRecord> {
        match self {
            Event::Success(ev) => ev.call(),
            Event::Failure(ev) => ev.call(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Event::Success(_))
    }

    pub fn payload(&self) -> &Payload {
        match self {
            Event::Success(ev) => ev.payload(),
            Event::Failure(ev) => ev.payload(),
        }
    }
}
