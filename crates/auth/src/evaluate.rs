//! Scope access checks over a built context.

use atlaserp_core::{CountryId, GroupCompanyId, LegalEntityId, OperatingUnitId};

use crate::context::ScopeContext;
use crate::error::AuthzError;
use crate::scope::{RequestedScope, ScopeKind, ScopeType};

/// Check whether the context permits the requested scope.
///
/// With no requested scope the question becomes "does this context grant any
/// access at all?". A TENANT request is answered by the `tenant_wide` flag
/// alone; everything else is membership in the matching set.
pub fn is_scope_allowed(context: &ScopeContext, requested: Option<&RequestedScope>) -> bool {
    let Some(requested) = requested else {
        return context.tenant_wide
            || !context.groups.is_empty()
            || !context.countries.is_empty()
            || !context.legal_entities.is_empty()
            || !context.operating_units.is_empty();
    };

    match requested.scope_type {
        ScopeType::Tenant => context.tenant_wide,
        ScopeType::Group => GroupCompanyId::new(requested.scope_id)
            .is_some_and(|id| context.groups.contains(&id)),
        ScopeType::Country => {
            CountryId::new(requested.scope_id).is_some_and(|id| context.countries.contains(&id))
        }
        ScopeType::LegalEntity => LegalEntityId::new(requested.scope_id)
            .is_some_and(|id| context.legal_entities.contains(&id)),
        ScopeType::OperatingUnit => OperatingUnitId::new(requested.scope_id)
            .is_some_and(|id| context.operating_units.contains(&id)),
    }
}

/// Point check used by handlers after authorization: may the caller touch
/// this specific scope id? Tenant-wide access short-circuits to true;
/// non-positive ids are never accessible.
pub fn has_scope_access(context: &ScopeContext, kind: ScopeKind, scope_id: i64) -> bool {
    if context.tenant_wide {
        return true;
    }

    match kind {
        ScopeKind::Group => {
            GroupCompanyId::new(scope_id).is_some_and(|id| context.groups.contains(&id))
        }
        ScopeKind::Country => {
            CountryId::new(scope_id).is_some_and(|id| context.countries.contains(&id))
        }
        ScopeKind::LegalEntity => {
            LegalEntityId::new(scope_id).is_some_and(|id| context.legal_entities.contains(&id))
        }
        ScopeKind::OperatingUnit => {
            OperatingUnitId::new(scope_id).is_some_and(|id| context.operating_units.contains(&id))
        }
    }
}

/// Like [`has_scope_access`], raising Forbidden with a caller-supplied label
/// (typically the offending request field) on failure.
pub fn assert_scope_access(
    context: &ScopeContext,
    kind: ScopeKind,
    scope_id: i64,
    label: &str,
) -> Result<(), AuthzError> {
    if has_scope_access(context, kind, scope_id) {
        Ok(())
    } else {
        Err(AuthzError::forbidden(format!("Access denied for {label}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::build_scope_context;
    use crate::hierarchy::OrgHierarchy;
    use crate::scope::ScopeRow;
    use atlaserp_core::TenantId;

    fn tenant() -> TenantId {
        TenantId::new(1).unwrap()
    }

    fn fixture() -> OrgHierarchy {
        let mut h = OrgHierarchy::new();
        h.add_group_company(10);
        h.add_group_company(20);
        h.add_legal_entity(101, Some(10), Some(1));
        h.add_legal_entity(102, Some(10), Some(1));
        h.add_legal_entity(201, Some(20), Some(2));
        h.add_operating_unit(1001, Some(101));
        h.add_operating_unit(1002, Some(101));
        h.add_operating_unit(2001, Some(201));
        h
    }

    /// Scenario A context: allow group 10, deny entity 102.
    fn scenario_a() -> ScopeContext {
        let rows = vec![
            ScopeRow::new("ALLOW", "GROUP", 10),
            ScopeRow::new("DENY", "LEGAL_ENTITY", 102),
        ];
        build_scope_context(tenant(), &rows, &fixture())
    }

    #[test]
    fn specific_scope_follows_the_deny() {
        // Scenario C: entity 102 was denied, entity 101 survives.
        let ctx = scenario_a();

        let denied = RequestedScope::new(ScopeType::LegalEntity, 102);
        let allowed = RequestedScope::new(ScopeType::LegalEntity, 101);

        assert!(!is_scope_allowed(&ctx, Some(&denied)));
        assert!(is_scope_allowed(&ctx, Some(&allowed)));
    }

    #[test]
    fn absent_scope_asks_for_any_access() {
        let ctx = scenario_a();
        assert!(is_scope_allowed(&ctx, None));

        let empty = build_scope_context(tenant(), &[], &fixture());
        assert!(!is_scope_allowed(&empty, None));
    }

    #[test]
    fn tenant_request_requires_tenant_wide() {
        let ctx = scenario_a();
        let whole_tenant = RequestedScope::new(ScopeType::Tenant, 1);
        assert!(!is_scope_allowed(&ctx, Some(&whole_tenant)));

        let rows = vec![ScopeRow::new("ALLOW", "TENANT", 1)];
        let wide = build_scope_context(tenant(), &rows, &fixture());
        assert!(is_scope_allowed(&wide, Some(&whole_tenant)));
    }

    #[test]
    fn point_check_short_circuits_on_tenant_wide() {
        let rows = vec![ScopeRow::new("ALLOW", "TENANT", 1)];
        let wide = build_scope_context(tenant(), &rows, &fixture());

        // Even an id outside the hierarchy passes under tenant-wide access.
        assert!(has_scope_access(&wide, ScopeKind::Group, 999));
    }

    #[test]
    fn point_check_rejects_non_positive_ids() {
        let ctx = scenario_a();
        assert!(!has_scope_access(&ctx, ScopeKind::Group, 0));
        assert!(!has_scope_access(&ctx, ScopeKind::Group, -10));
    }

    #[test]
    fn assert_carries_the_label() {
        let ctx = scenario_a();
        let err = assert_scope_access(&ctx, ScopeKind::LegalEntity, 102, "legalEntityId")
            .unwrap_err();

        assert_eq!(err.status(), 403);
        assert!(err.to_string().contains("legalEntityId"));

        assert!(assert_scope_access(&ctx, ScopeKind::LegalEntity, 101, "legalEntityId").is_ok());
    }
}
