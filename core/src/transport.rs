//! Blocking `Transport` backed by a `ureq` agent.

use ureq::http;
use ureq::tls::TlsConfig;
use ureq::{Agent, AsSendBody};

use crate::error::{ApiError, Result};
use crate::http::{HttpRequest, HttpResponse, Transport};
use crate::options::RequestOptions;

/// Executes requests with a shared `ureq::Agent` (and its connection pool).
///
/// The agent never turns 4xx/5xx into errors, so every status the server
/// sends back reaches the caller as an `HttpResponse`.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .new_agent();
        Self { agent }
    }

    fn configure<S: AsSendBody>(&self, request: http::Request<S>, options: &RequestOptions) -> http::Request<S> {
        let mut config = self.agent.configure_request(request).http_status_as_error(false);
        if let Some(timeout) = options.timeout {
            config = config.timeout_global(Some(timeout));
        }
        if let Some(timeout) = options.connect_timeout {
            config = config.timeout_connect(Some(timeout));
        }
        if let Some(max) = options.max_redirects {
            config = config.max_redirects(max);
        }
        if let Some(disable) = options.disable_tls_verification {
            config = config.tls_config(TlsConfig::builder().disable_verification(disable).build());
        }
        config.build()
    }

    fn run<S: AsSendBody>(
        &self,
        request: &HttpRequest,
        wire: http::Request<S>,
        options: &RequestOptions,
    ) -> Result<HttpResponse> {
        let transport_error = |source: ureq::Error| ApiError::Transport {
            method: request.method,
            url: request.url.clone(),
            source: Box::new(source),
        };

        let mut response = self.agent.run(self.configure(wire, options)).map_err(transport_error)?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_string(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response.body_mut().read_to_string().map_err(transport_error)?;

        Ok(HttpResponse { status, headers, body })
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for UreqTransport {
    fn execute(&self, request: &HttpRequest, options: &RequestOptions) -> Result<HttpResponse> {
        let mut builder = http::Request::builder()
            .method(request.method.as_str())
            .uri(request.url.as_str());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let invalid = |e: http::Error| ApiError::InvalidRequest(e.to_string());
        match &request.body {
            Some(body) => {
                let wire = builder.body(body.clone().into_bytes()).map_err(invalid)?;
                self.run(request, wire, options)
            }
            None => {
                let wire = builder.body(()).map_err(invalid)?;
                self.run(request, wire, options)
            }
        }
    }
}
