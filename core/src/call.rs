//! Per-call configuration and request building.
//!
//! # Design
//! A `RestCall` is an immutable-by-value description of one method call. It
//! is consumed when submitted, so nothing from one call can bleed into the
//! next. `build_request` turns it into an `HttpRequest` against a base URL;
//! the only way it can fail is a JSON call without a body.

use url::form_urlencoded;

use crate::error::ApiError;
use crate::event::EventTemplate;
use crate::http::{HttpMethod, HttpRequest};
use crate::types::{Params, RequestType};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
const JSON_CONTENT_TYPE: &str = "application/json";

/// One method call, ready to be submitted to a `Controller`.
#[derive(Debug, Clone, Default)]
pub struct RestCall {
    method_name: String,
    params: Params,
    request_type: RequestType,
    body: Option<String>,
    on_success: Option<EventTemplate>,
    on_failure: Option<EventTemplate>,
}

impl RestCall {
    pub fn new(method_name: impl Into<String>, request_type: RequestType) -> Self {
        Self {
            method_name: method_name.into(),
            request_type,
            ..Self::default()
        }
    }

    pub fn get(method_name: impl Into<String>) -> Self {
        Self::new(method_name, RequestType::Get)
    }

    pub fn post(method_name: impl Into<String>) -> Self {
        Self::new(method_name, RequestType::Post)
    }

    pub fn put(method_name: impl Into<String>) -> Self {
        Self::new(method_name, RequestType::Put)
    }

    /// A JSON POST carrying `body` verbatim.
    pub fn json(method_name: impl Into<String>, body: impl Into<String>) -> Self {
        Self::new(method_name, RequestType::Json).body(body)
    }

    pub fn method_name(mut self, method_name: impl Into<String>) -> Self {
        self.method_name = method_name.into();
        self
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    /// Replace all parameters.
    pub fn params(mut self, params: Params) -> Self {
        self.params = params;
        self
    }

    pub fn request_type(mut self, request_type: RequestType) -> Self {
        self.request_type = request_type;
        self
    }

    /// Pre-built body for `RequestType::Json`. Ignored by other types.
    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn on_success(mut self, template: EventTemplate) -> Self {
        self.on_success = Some(template);
        self
    }

    pub fn on_failure(mut self, template: EventTemplate) -> Self {
        self.on_failure = Some(template);
        self
    }

    pub fn name(&self) -> &str {
        &self.method_name
    }

    pub fn kind(&self) -> RequestType {
        self.request_type
    }

    pub fn parameters(&self) -> &Params {
        &self.params
    }

    /// Build the HTTP exchange for this call. The URL is `base_url` followed
    /// directly by the method name.
    pub fn build_request(&self, base_url: &str) -> Result<HttpRequest, ApiError> {
        let url = format!("{base_url}{}", self.method_name);
        let request = match self.request_type {
            RequestType::Get => HttpRequest {
                method: HttpMethod::Get,
                url: append_query(url, &self.params),
                headers: Vec::new(),
                body: None,
            },
            RequestType::Post => form_request(HttpMethod::Post, url, &self.params),
            RequestType::Put => form_request(HttpMethod::Put, url, &self.params),
            RequestType::Json => {
                let body = self.body.clone().ok_or_else(|| ApiError::MissingJsonBody {
                    method: self.method_name.clone(),
                })?;
                HttpRequest {
                    method: HttpMethod::Post,
                    url,
                    headers: vec![("content-type".to_string(), JSON_CONTENT_TYPE.to_string())],
                    body: Some(body),
                }
            }
        };
        Ok(request)
    }

    /// Split into the pieces the dispatcher owns, falling back to the
    /// default templates.
    pub(crate) fn into_parts(self) -> (String, Params, EventTemplate, EventTemplate) {
        (
            self.method_name,
            self.params,
            self.on_success.unwrap_or_else(EventTemplate::success),
            self.on_failure.unwrap_or_else(EventTemplate::failure),
        )
    }
}

fn encode(params: &Params) -> String {
    form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter())
        .finish()
}

fn append_query(url: String, params: &Params) -> String {
    if params.is_empty() {
        return url;
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}", encode(params))
}

fn form_request(method: HttpMethod, url: String, params: &Params) -> HttpRequest {
    if params.is_empty() {
        return HttpRequest {
            method,
            url,
            headers: Vec::new(),
            body: None,
        };
    }
    HttpRequest {
        method,
        url,
        headers: vec![("content-type".to_string(), FORM_CONTENT_TYPE.to_string())],
        body: Some(encode(params)),
    }
}
