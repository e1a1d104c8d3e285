//! `atlaserp-auth` — pure hierarchical scope-authorization engine.
//!
//! Decides whether a principal may act on an organizational scope (tenant →
//! group company → country / legal entity → operating unit), reconciling
//! role-derived permission grants with user-specific data-scope overrides
//! under deny-precedence semantics.
//!
//! This crate is intentionally decoupled from HTTP and storage: everything
//! here is a pure function over values the infra layer reads.

pub mod claims;
pub mod context;
pub mod decision;
pub mod error;
pub mod evaluate;
pub mod filter;
pub mod hierarchy;
pub mod rows;
pub mod scope;

pub use claims::{
    Hs256JwtValidator, JwtClaims, JwtValidator, TokenValidationError, validate_claims,
};
pub use context::{ScopeContext, build_scope_context};
pub use decision::{AccessDecision, ScopeRowSource};
pub use error::AuthzError;
pub use evaluate::{assert_scope_access, has_scope_access, is_scope_allowed};
pub use filter::build_scope_filter;
pub use hierarchy::{EntityParents, OrgHierarchy};
pub use rows::{ParsedScopeRows, ScopeSets, parse_scope_rows};
pub use scope::{Effect, RequestedScope, ScopeKind, ScopeRow, ScopeType};
