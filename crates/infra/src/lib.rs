//! `atlaserp-infra` — persistence-facing adapters.
//!
//! Everything the authorization engine reads (grant rows, the org hierarchy)
//! comes through the [`store::ScopeStore`] trait. The engine itself never
//! writes.

pub mod store;

pub use store::{InMemoryScopeStore, PostgresScopeStore, ScopeStore, StoreError};
