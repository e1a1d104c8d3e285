//! Permission guard: the per-request authorization pipeline.
//!
//! One pass per request, read-only, no retries. The guard resolves the
//! tenant, loads the user's grants and the org hierarchy, builds the
//! permission and data-scope contexts, and returns an [`AccessDecision`]
//! that handlers thread explicitly into their queries and point checks.

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::instrument;

use atlaserp_auth::{
    AccessDecision, AuthzError, RequestedScope, ScopeRowSource, build_scope_context,
    is_scope_allowed,
};
use atlaserp_core::TenantId;
use atlaserp_infra::{ScopeStore, StoreError};

use crate::context::AuthSession;

/// Pipeline failure: an authorization outcome (400/403) or an infrastructure
/// failure (500 at the HTTP boundary).
#[derive(Debug, Error)]
pub enum GuardError {
    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Produces the specific scope a request acts on.
///
/// Route-specific: a resolver may read domain rows (e.g. a journal's owning
/// legal entity) before the decision is made. `None` means "any non-empty
/// access suffices".
#[async_trait]
pub trait ScopeResolver: Send + Sync {
    async fn resolve(&self, tenant_id: TenantId) -> Result<Option<RequestedScope>, GuardError>;
}

/// Resolver for routes whose target scope is known up front.
pub struct FixedScope(pub RequestedScope);

#[async_trait]
impl ScopeResolver for FixedScope {
    async fn resolve(&self, _tenant_id: TenantId) -> Result<Option<RequestedScope>, GuardError> {
        Ok(Some(self.0))
    }
}

/// The authorization pipeline over a scope store.
#[derive(Clone)]
pub struct PermissionGuard {
    store: Arc<dyn ScopeStore>,
}

impl PermissionGuard {
    pub fn new(store: Arc<dyn ScopeStore>) -> Self {
        Self { store }
    }

    /// Authorize an unscoped request ("does the caller have any access under
    /// this permission?").
    pub async fn authorize(
        &self,
        session: &AuthSession,
        permission_code: &str,
    ) -> Result<AccessDecision, GuardError> {
        self.run(session, permission_code, None).await
    }

    /// Authorize a request against the specific scope the resolver produces.
    pub async fn authorize_scoped(
        &self,
        session: &AuthSession,
        permission_code: &str,
        resolver: &dyn ScopeResolver,
    ) -> Result<AccessDecision, GuardError> {
        self.run(session, permission_code, Some(resolver)).await
    }

    #[instrument(skip(self, session, resolver), fields(permission = permission_code))]
    async fn run(
        &self,
        session: &AuthSession,
        permission_code: &str,
        resolver: Option<&dyn ScopeResolver>,
    ) -> Result<AccessDecision, GuardError> {
        let code = permission_code.trim();
        debug_assert!(!code.is_empty(), "permission code is required");

        let Some(user_id) = session.user_id else {
            return Err(AuthzError::bad_request("Authenticated user is required").into());
        };
        let Some(tenant_id) = session.tenant_id else {
            return Err(AuthzError::bad_request("tenantId is required").into());
        };

        let permission_rows = self
            .store
            .permission_scope_rows(user_id, tenant_id, code)
            .await?;
        if permission_rows.is_empty() {
            return Err(AuthzError::forbidden(format!("Missing permission: {code}")).into());
        }

        let hierarchy = self.store.load_hierarchy(tenant_id).await?;
        let permission_context = build_scope_context(tenant_id, &permission_rows, &hierarchy);

        let requested_scope = match resolver {
            Some(resolver) => match resolver.resolve(tenant_id).await? {
                Some(scope) => Some(scope.normalize(tenant_id)?),
                None => None,
            },
            None => None,
        };

        if !is_scope_allowed(&permission_context, requested_scope.as_ref()) {
            return Err(AuthzError::forbidden(format!("Missing permission: {code}")).into());
        }

        // User-specific overrides narrow (or widen) what the roles granted;
        // with none present the permission rows double as the data source.
        let data_rows = self.store.data_scope_rows(user_id, tenant_id).await?;
        let (source, data_rows) = if data_rows.is_empty() {
            (ScopeRowSource::PermissionScopes, permission_rows)
        } else {
            (ScopeRowSource::DataScopes, data_rows)
        };

        let data_context = build_scope_context(tenant_id, &data_rows, &hierarchy);

        if !is_scope_allowed(&data_context, requested_scope.as_ref()) {
            return Err(AuthzError::forbidden(format!("Data scope denied: {code}")).into());
        }

        tracing::debug!(?source, ?requested_scope, "authorization granted");

        Ok(AccessDecision {
            permission_code: code.to_string(),
            tenant_id,
            requested_scope,
            source,
            permission_context,
            data_context,
        })
    }
}
