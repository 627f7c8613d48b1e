//! Retrying HTTP session for rate-limited web archive APIs.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable configuration, request and response types
//! - [`core`] - Pure transformations (backoff arithmetic, status classification)
//! - [`effects`] - I/O operations behind the [`HttpClient`] trait
//!
//! # Key Features
//!
//! - **Transparent retries**: 429/502/503/504 and connect/read timeouts or
//!   truncated bodies are retried with full-jitter exponential backoff
//! - **Per-host limits**: every clone of a [`Session`] shares one connection
//!   limiter, so concurrent pipelines never exceed an archive's cap
//! - **GET only**: every call is read-only, which is what makes retries safe

pub mod core;
pub mod data;
pub mod effects;
mod error;

pub use core::{honors_retry_after, is_retryable_status, jittered_delay, retry_delay};
pub use data::{HttpRequest, HttpResponse, HttpVersion, SessionOptions, duration_ms};
pub use effects::{HostLimiter, HttpClient, Session, TransportError};

#[cfg(feature = "reqwest")]
pub use effects::ReqwestClient;

pub use error::{Error, Result};
