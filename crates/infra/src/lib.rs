//! `opsledger-infra` — backing-store implementations for the authorization
//! engine's persistence seams.
//!
//! In-memory stores serve tests and development wiring; Postgres-backed
//! stores serve production deployments.

pub mod memory;
pub mod postgres;

pub use memory::{
    InMemoryActorDirectory, InMemoryOverrideStore, InMemorySubscriptionStore, InMemoryUsageStore,
};
pub use postgres::{PostgresOverrideStore, PostgresSubscriptionStore};
