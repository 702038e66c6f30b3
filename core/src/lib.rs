//! Synchronous client for the Snipcart REST API.
//!
//! # Overview
//! `SnipcartClient` is a fluent request builder: pick a method, an endpoint
//! and a payload, then `send` once and inspect `status_code` / `successful`
//! and the decoded body.
//!
//! # Design
//! - Request construction is pure (`build_request` yields an `HttpRequest`);
//!   I/O lives behind the `Transport` trait, with `UreqTransport` as default.
//! - GET payloads become the query string; other methods carry a JSON or
//!   form-encoded body, chosen by `PostEncoding`. Raw payloads skip encoding.
//! - Non-2xx responses complete normally. Only transport failures are errors.
//! - Bodies that are not JSON come back as `ResponseBody::Raw`.

pub mod client;
pub mod error;
pub mod http;
pub mod options;
pub mod payload;
pub mod transport;

pub use client::{ResponseBody, SnipcartClient};
pub use error::{ApiError, Result};
pub use http::{HttpMethod, HttpRequest, HttpResponse, Transport};
pub use options::{ClientConfig, RequestOptions, DEFAULT_BASE_URL};
pub use payload::{Payload, PostEncoding};
pub use transport::UreqTransport;
