//! Controller behaviour against a scripted transport.
//!
//! # Design
//! `Scripted` answers by absolute URL and records every request it sees, so
//! each test can assert both what was sent and what was published without a
//! socket. Events are awaited with a bounded poll to keep a broken dispatch
//! from hanging the suite.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use restkik_core::{
    ApiError, AlwaysOnline, ClientConfig, ConnectivityError, ConnectivityOracle, Controller,
    Event, EventTemplate, HttpMethod, HttpRequest, HttpResponse, Params, RequestType, RestCall,
    RestClient, Subscription, Transport, TransportError,
};
use tokio::sync::mpsc::error::TryRecvError;

const BASE_URL: &str = "http://api.test/";

#[derive(Default)]
struct Scripted {
    responses: Mutex<HashMap<String, Result<HttpResponse, TransportError>>>,
    seen: Mutex<Vec<HttpRequest>>,
}

impl Scripted {
    fn respond(&self, url: &str, status: u16, body: &str) -> &Self {
        let response = HttpResponse {
            status,
            body: body.to_string(),
        };
        self.responses.lock().unwrap().insert(url.to_string(), Ok(response));
        self
    }

    fn fail(&self, url: &str, err: TransportError) -> &Self {
        self.responses.lock().unwrap().insert(url.to_string(), Err(err));
        self
    }

    fn requests(&self) -> Vec<HttpRequest> {
        self.seen.lock().unwrap().clone()
    }
}

impl Transport for Scripted {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let url = request.url.clone();
        self.seen.lock().unwrap().push(request);
        self.responses
            .lock()
            .unwrap()
            .get(&url)
            .cloned()
            .unwrap_or_else(|| Err(TransportError::Io(format!("no script for {url}"))))
    }
}

struct Offline;

impl ConnectivityOracle for Offline {
    fn is_available(&self) -> Result<bool, ConnectivityError> {
        Ok(false)
    }
}

fn setup(oracle: impl ConnectivityOracle + 'static) -> (Controller, Arc<Scripted>) {
    let transport = Arc::new(Scripted::default());
    let client = RestClient::with_transport(ClientConfig::new(BASE_URL), transport.clone());
    (Controller::with_oracle(client, oracle), transport)
}

fn next_event(rx: &mut Subscription) -> Event {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        match rx.try_recv() {
            Ok(event) => return event,
            Err(TryRecvError::Empty) if Instant::now() < deadline => {
                thread::sleep(Duration::from_millis(5));
            }
            Err(err) => panic!("no event received: {err:?}"),
        }
    }
}

fn assert_quiet(rx: &mut Subscription) {
    thread::sleep(Duration::from_millis(50));
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

fn params(pairs: &[(&str, &str)]) -> Params {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn offline_call_is_refused_without_side_effects() {
    let (controller, transport) = setup(Offline);
    let mut rx = controller.subscribe();

    let submitted = controller
        .submit_call("users", params(&[("id", "5")]), RequestType::Get)
        .unwrap();

    assert!(!submitted);
    assert_quiet(&mut rx);
    assert!(transport.requests().is_empty());
    assert_eq!(controller.success_count(), 0);
    assert_eq!(controller.error_count(), 0);
    assert!(controller.history().is_empty());
}

#[test]
fn successful_get_publishes_one_success_event() {
    let (controller, transport) = setup(AlwaysOnline);
    transport.respond("http://api.test/users?id=5", 200, r#"{"id":5,"name":"ada"}"#);
    let mut rx = controller.subscribe();

    assert!(controller
        .submit_call("users", params(&[("id", "5")]), RequestType::Get)
        .unwrap());

    let Event::Success(event) = next_event(&mut rx) else {
        panic!("expected success event");
    };
    let call = event.call();
    assert_eq!(call.status_code, 200);
    assert_eq!(call.method_name, "users");
    assert!(call.succeeded);
    assert_eq!(call.params, params(&[("id", "5")]));
    assert_eq!(event.payload().as_object().unwrap()["name"], "ada");
    assert_quiet(&mut rx);

    assert_eq!(controller.success_count(), 1);
    assert_eq!(controller.error_count(), 0);
    assert_eq!(transport.requests()[0].method, HttpMethod::Get);
}

#[test]
fn raw_text_failure_skips_parse_hooks() {
    let (controller, transport) = setup(AlwaysOnline);
    transport.respond("http://api.test/users?id=9", 404, "Not Found");
    let hits = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&hits);
    let template = EventTemplate::new("user_error").on_object(move |_| {
        seen.fetch_add(1, Ordering::SeqCst);
    });
    let mut rx = controller.subscribe();

    controller
        .submit(RestCall::get("users").param("id", 9).on_failure(template))
        .unwrap();

    let Event::Failure(event) = next_event(&mut rx) else {
        panic!("expected failure event");
    };
    assert_eq!(event.response_text(), "Not Found");
    assert_eq!(event.call().status_code, 404);
    assert!(event.payload().is_absent());
    assert_eq!(hits.load(Ordering::SeqCst), 0);
    assert_eq!(controller.error_count(), 1);
    assert_eq!(controller.success_count(), 0);
}

#[test]
fn structured_failure_runs_failure_hook() {
    let (controller, transport) = setup(AlwaysOnline);
    transport.respond("http://api.test/users", 422, r#"{"error":"name is required"}"#);
    let template = EventTemplate::new("form_error")
        .on_object(|obj| obj["error"].as_str().unwrap_or_default().to_string());
    let mut rx = controller.subscribe();

    controller
        .submit(RestCall::post("users").on_failure(template))
        .unwrap();

    let Event::Failure(event) = next_event(&mut rx) else {
        panic!("expected failure event");
    };
    assert_eq!(event.parsed::<String>().map(String::as_str), Some("name is required"));
    assert_eq!(event.method_name(), "users");
    assert_eq!(controller.error_count(), 1);
}

#[test]
fn json_call_without_body_fails_fast() {
    let (controller, transport) = setup(AlwaysOnline);
    let mut rx = controller.subscribe();

    let err = controller
        .submit_call("users", Params::new(), RequestType::Json)
        .unwrap_err();

    assert!(matches!(err, ApiError::MissingJsonBody { ref method } if method == "users"));
    assert_quiet(&mut rx);
    assert!(transport.requests().is_empty());
    assert!(controller.history().is_empty());
}

#[test]
fn json_call_posts_body_with_json_content_type() {
    let (controller, transport) = setup(AlwaysOnline);
    transport.respond("http://api.test/users", 201, r#"{"id":1}"#);
    let mut rx = controller.subscribe();

    controller
        .submit(RestCall::json("users", r#"{"name":"ada"}"#))
        .unwrap();
    next_event(&mut rx);

    let request = &transport.requests()[0];
    assert_eq!(request.method, HttpMethod::Post);
    assert_eq!(request.header("content-type"), Some("application/json"));
    assert_eq!(request.body.as_deref(), Some(r#"{"name":"ada"}"#));
}

#[test]
fn list_payload_uses_list_hook() {
    let (controller, transport) = setup(AlwaysOnline);
    transport.respond("http://api.test/users", 200, r#"[{"id":1},{"id":2}]"#);
    let template = EventTemplate::new("users").on_list(|items| {
        items
            .iter()
            .filter_map(|item| item["id"].as_u64())
            .collect::<Vec<u64>>()
    });
    let mut rx = controller.subscribe();

    controller.submit(RestCall::get("users").on_success(template)).unwrap();

    let Event::Success(event) = next_event(&mut rx) else {
        panic!("expected success event");
    };
    assert_eq!(event.parsed::<Vec<u64>>(), Some(&vec![1, 2]));
}

#[test]
fn transport_error_is_failure_with_status_zero() {
    let (controller, transport) = setup(AlwaysOnline);
    transport.fail("http://api.test/slow", TransportError::Timeout);
    let mut rx = controller.subscribe();

    controller.submit(RestCall::get("slow")).unwrap();

    let Event::Failure(event) = next_event(&mut rx) else {
        panic!("expected failure event");
    };
    assert_eq!(event.call().status_code, 0);
    assert_eq!(event.response_text(), "request timed out");
    assert_eq!(controller.error_count(), 1);
}

#[test]
fn history_counts_every_completed_call() {
    let (controller, transport) = setup(AlwaysOnline);
    transport
        .respond("http://api.test/ok", 200, "{}")
        .respond("http://api.test/missing", 404, "")
        .respond("http://api.test/text", 200, "plain text");
    let mut rx = controller.subscribe();

    let methods = ["ok", "missing", "text", "ok", "ok", "missing"];
    for method in methods {
        assert!(controller.submit(RestCall::get(method)).unwrap());
    }
    let events: Vec<Event> = methods.iter().map(|_| next_event(&mut rx)).collect();

    assert_eq!(events.iter().filter(|e| e.is_success()).count(), 3);
    assert_eq!(controller.success_count(), 3);
    assert_eq!(controller.error_count(), 3);
    let history = controller.history();
    assert_eq!(history.len(), methods.len());
    for event in &events {
        assert!(history.iter().any(|record| Arc::ptr_eq(record, event.call())));
    }
}

#[test]
fn later_calls_do_not_inherit_earlier_configuration() {
    let (controller, transport) = setup(AlwaysOnline);
    transport
        .respond("http://api.test/users?id=5", 200, r#"{"id":5}"#)
        .respond("http://api.test/other", 200, r#"{"id":6}"#);
    let template = EventTemplate::new("user").on_object(|obj| obj["id"].as_u64());
    let mut rx = controller.subscribe();

    controller
        .submit(RestCall::get("users").param("id", 5).on_success(template))
        .unwrap();
    let Event::Success(first) = next_event(&mut rx) else {
        panic!("expected success event");
    };
    assert_eq!(first.template(), "user");
    assert_eq!(first.parsed::<Option<u64>>(), Some(&Some(5)));

    controller
        .submit_call("other", Params::new(), RequestType::Get)
        .unwrap();
    let Event::Success(second) = next_event(&mut rx) else {
        panic!("expected success event");
    };
    assert_eq!(second.template(), "success");
    assert_eq!(second.call().method_name, "other");
    assert!(second.call().params.is_empty());
    assert!(second.parsed::<Option<u64>>().is_none());
    assert_eq!(transport.requests()[1].url, "http://api.test/other");
}

#[test]
fn every_subscriber_receives_the_event() {
    let (controller, transport) = setup(AlwaysOnline);
    transport.respond("http://api.test/status", 204, "");
    let mut first = controller.subscribe();
    let mut second = controller.client().bus().subscribe();

    controller.submit(RestCall::get("status")).unwrap();

    let a = next_event(&mut first);
    let b = next_event(&mut second);
    assert!(a.is_success() && b.is_success());
    assert!(a.payload().is_absent());
    assert!(Arc::ptr_eq(a.call(), b.call()));
}

#[test]
fn late_draining_subscriber_receives_every_event() {
    let (controller, transport) = setup(AlwaysOnline);
    transport.respond("http://api.test/users", 200, r#"{"id":1}"#);
    let mut rx = controller.subscribe();

    for _ in 0..100 {
        assert!(controller.submit(RestCall::get("users")).unwrap());
    }
    let deadline = Instant::now() + Duration::from_secs(5);
    while controller.history().len() < 100 && Instant::now() < deadline {
        thread::sleep(Duration::from_millis(5));
    }
    assert_eq!(controller.success_count(), 100);

    for _ in 0..100 {
        assert!(next_event(&mut rx).is_success());
    }
    assert_quiet(&mut rx);
}
