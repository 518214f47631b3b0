//! Control-plane REST API client.
//!
//! Every installer talks to the same account/provisioning API: read the
//! application record, create database users and databases, flip the
//! installed flag, and post notices. The client is deliberately thin — one
//! bearer-authenticated request per call, full body parsed as JSON, no
//! retries and no timeouts. Resilience (the create-then-poll loops around
//! database provisioning) belongs to the callers.

mod client;
pub mod types;


pub use client::{ApiClient, ApiError, DbKind};
pub use types::{AppRecord, DbRecord, LoginResponse};
