//! SQL fragment rendering for scope-restricted list queries.

use crate::context::ScopeContext;
use crate::scope::ScopeKind;

/// Render a WHERE fragment restricting `column` to the ids the context can
/// reach for `kind`.
///
/// - no context → `1 = 0` (matches nothing)
/// - tenant-wide → `1 = 1` (matches everything)
/// - empty set → `1 = 0`
/// - otherwise → `column IN ($n, …)`, pushing each id onto `params`
///
/// Placeholders are numbered from `params.len() + 1`, so the fragment can be
/// appended to a query that already binds parameters. This only renders the
/// fragment; executing the query is the caller's business.
pub fn build_scope_filter(
    context: Option<&ScopeContext>,
    kind: ScopeKind,
    column: &str,
    params: &mut Vec<i64>,
) -> String {
    let Some(context) = context else {
        return "1 = 0".to_string();
    };
    if context.tenant_wide {
        return "1 = 1".to_string();
    }

    let ids: Vec<i64> = match kind {
        ScopeKind::Group => context.groups.iter().map(|id| id.get()).collect(),
        ScopeKind::Country => context.countries.iter().map(|id| id.get()).collect(),
        ScopeKind::LegalEntity => context.legal_entities.iter().map(|id| id.get()).collect(),
        ScopeKind::OperatingUnit => context.operating_units.iter().map(|id| id.get()).collect(),
    };
    if ids.is_empty() {
        return "1 = 0".to_string();
    }

    let mut placeholders = Vec::with_capacity(ids.len());
    for id in ids {
        params.push(id);
        placeholders.push(format!("${}", params.len()));
    }

    format!("{column} IN ({})", placeholders.join(", "))
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
        h.add_legal_entity(101, Some(10), Some(1));
        h.add_legal_entity(102, Some(10), Some(1));
        h.add_operating_unit(1001, Some(101));
        h
    }

    #[test]
    fn absent_context_matches_nothing() {
        let mut params = Vec::new();
        let sql = build_scope_filter(None, ScopeKind::Group, "id", &mut params);
        assert_eq!(sql, "1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn tenant_wide_matches_everything() {
        let rows = vec![ScopeRow::new("ALLOW", "TENANT", 1)];
        let ctx = build_scope_context(tenant(), &rows, &fixture());

        let mut params = Vec::new();
        let sql = build_scope_filter(Some(&ctx), ScopeKind::LegalEntity, "id", &mut params);
        assert_eq!(sql, "1 = 1");
        assert!(params.is_empty());
    }

    #[test]
    fn empty_set_matches_nothing() {
        let ctx = build_scope_context(tenant(), &[], &fixture());

        let mut params = Vec::new();
        let sql = build_scope_filter(Some(&ctx), ScopeKind::OperatingUnit, "id", &mut params);
        assert_eq!(sql, "1 = 0");
        assert!(params.is_empty());
    }

    #[test]
    fn in_clause_binds_one_parameter_per_id() {
        let rows = vec![ScopeRow::new("ALLOW", "GROUP", 10)];
        let ctx = build_scope_context(tenant(), &rows, &fixture());
        assert_eq!(ctx.legal_entities.len(), 2);

        let mut params = Vec::new();
        let sql = build_scope_filter(Some(&ctx), ScopeKind::LegalEntity, "le.id", &mut params);

        assert_eq!(params.len(), 2);
        assert!(sql.starts_with("le.id IN ("));
        assert!(sql.contains("$1") && sql.contains("$2"));
    }

    #[test]
    fn placeholders_offset_past_existing_params() {
        let rows = vec![ScopeRow::new("ALLOW", "LEGAL_ENTITY", 101)];
        let ctx = build_scope_context(tenant(), &rows, &fixture());

        // Caller already bound the tenant id as $1.
        let mut params = vec![tenant().get()];
        let sql = build_scope_filter(Some(&ctx), ScopeKind::LegalEntity, "id", &mut params);

        assert_eq!(sql, "id IN ($2)");
        assert_eq!(params, vec![1, 101]);
    }
}
