//! The authorization decision handed to route handlers.

use serde::Serialize;

use atlaserp_core::TenantId;

use crate::context::ScopeContext;
use crate::error::AuthzError;
use crate::evaluate::{assert_scope_access, has_scope_access};
use crate::filter::build_scope_filter;
use crate::scope::{RequestedScope, ScopeKind};

/// Which row set produced the data-scope context.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeRowSource {
    /// No user-specific overrides existed; the role-derived permission rows
    /// were reused.
    PermissionScopes,
    /// User-specific data-scope override rows.
    DataScopes,
}

/// Outcome of a successful authorization pipeline run.
///
/// Returned by the guard and threaded explicitly into handlers; there is no
/// hidden request-state mutation. Point checks and list filters evaluate
/// against the data-scope context; the permission context is carried for
/// auditing and debug endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct AccessDecision {
    pub permission_code: String,
    pub tenant_id: TenantId,
    pub requested_scope: Option<RequestedScope>,
    pub source: ScopeRowSource,
    pub permission_context: ScopeContext,
    pub data_context: ScopeContext,
}

impl AccessDecision {
    /// May the caller touch this specific scope id?
    pub fn has_scope_access(&self, kind: ScopeKind, scope_id: i64) -> bool {
        has_scope_access(&self.data_context, kind, scope_id)
    }

    /// Forbidden (carrying `label`) unless the scope id is reachable.
    pub fn assert_scope_access(
        &self,
        kind: ScopeKind,
        scope_id: i64,
        label: &str,
    ) -> Result<(), AuthzError> {
        assert_scope_access(&self.data_context, kind, scope_id, label)
    }

    /// Render a list-query filter over the reachable ids for `kind`.
    pub fn scope_filter(&self, kind: ScopeKind, column: &str, params: &mut Vec<i64>) -> String {
        build_scope_filter(Some(&self.data_context), kind, column, params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_scope_context;
    use crate::hierarchy::OrgHierarchy;
    use crate::scope::ScopeRow;

    fn decision() -> AccessDecision {
        let tenant = TenantId::new(1).unwrap();

        let mut h = OrgHierarchy::new();
        h.add_group_company(10);
        h.add_legal_entity(101, Some(10), Some(1));
        h.add_operating_unit(1001, Some(101));

        let permission_rows = vec![ScopeRow::new("ALLOW", "TENANT", 1)];
        let data_rows = vec![ScopeRow::new("ALLOW", "LEGAL_ENTITY", 101)];

        AccessDecision {
            permission_code: "gl.journal.read".to_string(),
            tenant_id: tenant,
            requested_scope: None,
            source: ScopeRowSource::DataScopes,
            permission_context: build_scope_context(tenant, &permission_rows, &h),
            data_context: build_scope_context(tenant, &data_rows, &h),
        }
    }

    #[test]
    fn point_checks_use_the_data_context() {
        let d = decision();

        // Tenant-wide permission context, but data scopes narrow to entity 101.
        assert!(d.permission_context.tenant_wide);
        assert!(d.has_scope_access(ScopeKind::LegalEntity, 101));
        assert!(!d.has_scope_access(ScopeKind::LegalEntity, 102));
    }

    #[test]
    fn filters_use_the_data_context() {
        let d = decision();

        let mut params = Vec::new();
        let sql = d.scope_filter(ScopeKind::LegalEntity, "id", &mut params);
        assert_eq!(sql, "id IN ($1)");
        assert_eq!(params, vec![101]);
    }
}
