//! Fluent request builder for the Snipcart API.
//!
//! # Design
//! `SnipcartClient` accumulates method, endpoint, payload, headers and
//! transport options through chained `&mut self` setters. `build_request`
//! turns that state into an `HttpRequest` without any I/O; `send` hands it to
//! the configured `Transport` exactly once and records the status and the
//! decoded body. Non-2xx statuses are results, not errors.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::Value;
use tracing::debug;

use crate::error::Result;
use crate::http::{HttpMethod, HttpRequest, Transport};
use crate::options::{set_header, ClientConfig, RequestOptions};
use crate::payload::{Payload, PostEncoding};
use crate::transport::UreqTransport;

/// Decoded response body.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    Json(Value),
    /// The body was not valid JSON (including an empty body) and is kept as text.
    Raw(String),
}

impl ResponseBody {
    fn parse(body: String) -> Self {
        match serde_json::from_str(&body) {
            Ok(value) => ResponseBody::Json(value),
            Err(e) => {
                debug!(error = %e, len = body.len(), "response body is not json, keeping raw text");
                ResponseBody::Raw(body)
            }
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ResponseBody::Json(value) => Some(value),
            ResponseBody::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            ResponseBody::Json(_) => None,
            ResponseBody::Raw(text) => Some(text),
        }
    }
}

/// Builder-style client for one request at a time.
///
/// ```no_run
/// use snipcart_core::{Payload, SnipcartClient};
///
/// let mut snipcart = SnipcartClient::new("secret_key");
/// let orders = snipcart
///     .get()
///     .to("/orders")
///     .payload(Payload::from_key_value("status", "Processed"))
///     .send()?
///     .clone();
/// if snipcart.successful() {
///     println!("{orders:?}");
/// }
/// # Ok::<(), snipcart_core::ApiError>(())
/// ```
#[derive(Debug, Clone)]
pub struct SnipcartClient<T = UreqTransport> {
    transport: T,
    api_key: String,
    base_url: String,
    headers: Vec<(String, String)>,
    options: RequestOptions,
    method: HttpMethod,
    endpoint: String,
    payload: Payload,
    post_encoding: PostEncoding,
    status: u16,
    response: Option<ResponseBody>,
}

impl SnipcartClient<UreqTransport> {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_config(ClientConfig::new(api_key))
    }

    pub fn with_config(config: ClientConfig) -> Self {
        Self::with_transport(config, UreqTransport::new())
    }

    /// Client configured from `SNIPCART_API_KEY` / `SNIPCART_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        Ok(Self::with_config(ClientConfig::from_env()?))
    }
}

impl<T: Transport> SnipcartClient<T> {
    pub fn with_transport(config: ClientConfig, transport: T) -> Self {
        Self {
            transport,
            api_key: config.api_key,
            base_url: config.base_url,
            headers: config.headers,
            options: config.options,
            method: HttpMethod::Get,
            endpoint: String::new(),
            payload: Payload::default(),
            post_encoding: PostEncoding::Body,
            status: 0,
            response: None,
        }
    }

    /// Replace the key used as the Basic-auth username from the next request on.
    pub fn api_key(&mut self, api_key: impl Into<String>) -> &mut Self {
        self.api_key = api_key.into();
        self
    }

    pub fn method(&mut self, method: HttpMethod) -> &mut Self {
        self.method = method;
        self
    }

    pub fn get(&mut self) -> &mut Self {
        self.method(HttpMethod::Get)
    }

    pub fn post(&mut self) -> &mut Self {
        self.method(HttpMethod::Post)
    }

    pub fn put(&mut self) -> &mut Self {
        self.method(HttpMethod::Put)
    }

    pub fn patch(&mut self) -> &mut Self {
        self.method(HttpMethod::Patch)
    }

    pub fn delete(&mut self) -> &mut Self {
        self.method(HttpMethod::Delete)
    }

    /// Endpoint path relative to the base url.
    pub fn to(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Same as [`SnipcartClient::to`]; reads better after `get()`.
    pub fn from(&mut self, endpoint: impl Into<String>) -> &mut Self {
        self.to(endpoint)
    }

    pub fn post_encoding(&mut self, encoding: PostEncoding) -> &mut Self {
        self.post_encoding = encoding;
        self
    }

    /// Replace the payload.
    pub fn payload(&mut self, payload: impl Into<Payload>) -> &mut Self {
        self.payload = payload.into();
        self
    }

    pub fn payload_pair(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.payload(Payload::from_key_value(key, value))
    }

    /// Pre-encoded query string or body, sent exactly as given.
    ///
    /// On a GET the string lands in the url, so it must already be
    /// percent-encoded; `"a=1 2"` fails with `ApiError::InvalidRequest`.
    pub fn raw_payload(&mut self, raw: impl Into<String>) -> &mut Self {
        self.payload(Payload::from_raw(raw))
    }

    /// Add or replace a header. Ignored when either side is empty.
    ///
    /// An `Authorization` header set here replaces the Basic credentials
    /// derived from the api key.
    pub fn header(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        let (name, value) = (name.into(), value.into());
        if !name.is_empty() && !value.is_empty() {
            set_header(&mut self.headers, name, value);
        }
        self
    }

    pub fn headers<I, K, V>(&mut self, headers: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (name, value) in headers {
            self.header(name, value);
        }
        self
    }

    pub fn request_options(&mut self, options: RequestOptions) -> &mut Self {
        self.options.merge(options);
        self
    }

    /// Base url and endpoint joined by a single `/`, plus the encoded
    /// payload as query string for GET requests.
    pub fn full_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let endpoint = self.endpoint.trim_matches('/');
        let mut url = if endpoint.is_empty() {
            base.to_string()
        } else {
            format!("{base}/{endpoint}")
        };

        if self.method == HttpMethod::Get {
            let query = self.payload.to_query_string();
            let query = query.strip_prefix('?').unwrap_or(&query);
            if !query.is_empty() {
                url.push('?');
                url.push_str(query);
            }
        }
        url
    }

    /// The request `send` would issue, built without any I/O.
    pub fn build_request(&self) -> Result<HttpRequest> {
        let mut headers = self.headers.clone();
        let body = match (self.method, &self.payload) {
            (HttpMethod::Get, _) => None,
            (_, Payload::Raw(raw)) => Some(raw.clone()),
            (_, payload) if payload.is_empty() => None,
            (_, payload) => {
                let body = match self.post_encoding {
                    PostEncoding::Body => payload.to_json()?,
                    PostEncoding::Form => payload.to_form(),
                };
                if self.post_encoding == PostEncoding::Form {
                    set_header(
                        &mut headers,
                        "Content-Type".to_string(),
                        PostEncoding::Form.content_type().to_string(),
                    );
                }
                Some(body)
            }
        };
        if !headers.iter().any(|(k, _)| k.eq_ignore_ascii_case("authorization")) {
            headers.push(("Authorization".to_string(), self.basic_auth()));
        }

        Ok(HttpRequest {
            method: self.method,
            url: self.full_url(),
            headers,
            body,
        })
    }

    /// Issue the request once and return the decoded body.
    ///
    /// Transport failures are returned as errors; any HTTP status, including
    /// 4xx and 5xx, completes normally and is available from `status_code`.
    pub fn send(&mut self) -> Result<&ResponseBody> {
        self.status = 0;
        self.response = None;

        let request = self.build_request()?;
        debug!(
            method = %request.method,
            url = %request.url,
            body_len = request.body.as_ref().map_or(0, String::len),
            "sending snipcart request"
        );

        let response = self.transport.execute(&request, &self.options)?;
        debug!(status = response.status, url = %request.url, "snipcart request completed");

        self.status = response.status;
        Ok(&*self.response.insert(ResponseBody::parse(response.body)))
    }

    /// Status of the last completed request, 0 before the first one.
    pub fn status_code(&self) -> u16 {
        self.status
    }

    /// Whether the last status code is in the 2xx range.
    pub fn successful(&self) -> bool {
        self.status.to_string().starts_with('2')
    }

    pub fn response(&self) -> Option<&ResponseBody> {
        self.response.as_ref()
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn current_payload(&self) -> &Payload {
        &self.payload
    }

    pub fn current_headers(&self) -> &[(String, String)] {
        &self.headers
    }

    fn basic_auth(&self) -> String {
        format!("Basic {}", STANDARD.encode(format!("{}:", self.api_key)))
    }
}
