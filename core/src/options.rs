//! Client configuration and per-request transport options.

use std::time::Duration;

use crate::error::{ApiError, Result};

pub const DEFAULT_BASE_URL: &str = "https://app.snipcart.com/api";
pub const USER_AGENT: &str = "snipcart-core (github.com/mtownsend5512/snipcart-api)";

pub const API_KEY_ENV: &str = "SNIPCART_API_KEY";
pub const BASE_URL_ENV: &str = "SNIPCART_BASE_URL";

/// Transport settings layered over the transport's own defaults.
///
/// Every field is optional; `None` means "leave the default alone".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Upper bound on the whole call, connect through body.
    pub timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub max_redirects: Option<u32>,
    /// Skip certificate verification. Only meant for local test endpoints.
    pub disable_tls_verification: Option<bool>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    pub fn max_redirects(mut self, max: u32) -> Self {
        self.max_redirects = Some(max);
        self
    }

    pub fn disable_tls_verification(mut self, disable: bool) -> Self {
        self.disable_tls_verification = Some(disable);
        self
    }

    /// Shallow merge: each field set in `overlay` replaces ours.
    pub fn merge(&mut self, overlay: RequestOptions) {
        if overlay.timeout.is_some() {
            self.timeout = overlay.timeout;
        }
        if overlay.connect_timeout.is_some() {
            self.connect_timeout = overlay.connect_timeout;
        }
        if overlay.max_redirects.is_some() {
            self.max_redirects = overlay.max_redirects;
        }
        if overlay.disable_tls_verification.is_some() {
            self.disable_tls_verification = overlay.disable_tls_verification;
        }
    }
}

/// Everything a client needs before the first request is configured.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub api_key: String,
    pub base_url: String,
    /// Sent with every request, in order. Names are unique ignoring case.
    pub headers: Vec<(String, String)>,
    pub options: RequestOptions,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            headers: vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("User-Agent".to_string(), USER_AGENT.to_string()),
            ],
            options: RequestOptions::default(),
        }
    }

    /// Reads the key from `SNIPCART_API_KEY` and, when set, the base url
    /// from `SNIPCART_BASE_URL`.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.is_empty())
            .ok_or(ApiError::MissingApiKey(API_KEY_ENV))?;
        let mut config = Self::new(api_key);
        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            if !base_url.is_empty() {
                config.base_url = base_url;
            }
        }
        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        set_header(&mut self.headers, name.into(), value.into());
        self
    }

    pub fn with_options(mut self, options: RequestOptions) -> Self {
        self.options.merge(options);
        self
    }
}

/// Insert or replace `name`, keeping the position of an existing entry.
pub(crate) fn set_header(headers: &mut Vec<(String, String)>, name: String, value: String) {
    match headers.iter_mut().find(|(k, _)| k.eq_ignore_ascii_case(&name)) {
        Some(entry) => *entry = (name, value),
        None => headers.push((name, value)),
    }
}
