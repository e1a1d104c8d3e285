//! Read interface the authorization engine depends on.

use async_trait::async_trait;
use thiserror::Error;

use atlaserp_auth::{OrgHierarchy, ScopeRow};
use atlaserp_core::{TenantId, UserId};

mod in_memory;
mod postgres;

pub use in_memory::InMemoryScopeStore;
pub use postgres::PostgresScopeStore;

/// Error raised by a scope store.
///
/// Anything surfacing here is an infrastructure failure; authorization
/// outcomes (missing grants, denied scopes) are not store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying database failure.
    #[error("read query failed: {0}")]
    Query(#[from] sqlx::Error),

    /// The store itself is unusable (e.g. poisoned state in dev stores).
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Read-only persistence contract of the authorization engine.
///
/// Implementations must be cheap to share across requests (`Send + Sync`);
/// the engine issues only SELECT-shaped reads through this trait.
#[async_trait]
pub trait ScopeStore: Send + Sync {
    /// Grant rows attached to the user's role assignments in this tenant,
    /// restricted to roles that carry `permission_code`.
    async fn permission_scope_rows(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        permission_code: &str,
    ) -> Result<Vec<ScopeRow>, StoreError>;

    /// User-specific data-scope override rows.
    ///
    /// A deployment whose override table has not been migrated yet yields an
    /// empty set rather than an error, so authorization keeps working during
    /// incremental schema rollout.
    async fn data_scope_rows(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<Vec<ScopeRow>, StoreError>;

    /// Load the tenant's organization hierarchy snapshot.
    ///
    /// An empty tenant is valid and yields an empty hierarchy.
    async fn load_hierarchy(&self, tenant_id: TenantId) -> Result<OrgHierarchy, StoreError>;
}
