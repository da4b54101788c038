//! `opsledger-api` — the HTTP trust boundary for the authorization engine.
//!
//! This crate owns credential verification and maps engine decisions to
//! HTTP responses. All authorization logic lives in `opsledger-authz`; the
//! handlers here are consumers of its decisions, never sources of policy.

pub mod app;
pub mod context;
pub mod jwt;
pub mod middleware;
