//! Effective reachable-scope computation.

use std::collections::HashSet;

use serde::Serialize;

use atlaserp_core::{CountryId, GroupCompanyId, LegalEntityId, OperatingUnitId, TenantId};

use crate::hierarchy::OrgHierarchy;
use crate::rows::{ParsedScopeRows, parse_scope_rows};
use crate::scope::ScopeRow;

/// The effective reachable-scope set for one principal in one tenant.
///
/// # Invariants
/// - If `tenant_wide` is true, the four sets are a snapshot of the full
///   hierarchy at construction time.
/// - Otherwise the sets hold exactly the ids reachable through
///   allow/expand/deny-remove logic, plus back-filled ancestors of every
///   surviving legal entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScopeContext {
    pub tenant_id: TenantId,
    pub tenant_wide: bool,
    pub groups: HashSet<GroupCompanyId>,
    pub countries: HashSet<CountryId>,
    pub legal_entities: HashSet<LegalEntityId>,
    pub operating_units: HashSet<OperatingUnitId>,
}

impl ScopeContext {
    /// A context that grants nothing.
    pub fn empty(tenant_id: TenantId) -> Self {
        Self {
            tenant_id,
            tenant_wide: false,
            groups: HashSet::new(),
            countries: HashSet::new(),
            legal_entities: HashSet::new(),
            operating_units: HashSet::new(),
        }
    }
}

/// Combine grant rows with the tenant hierarchy into the effective context.
///
/// Pure: identical inputs always produce identical outputs; nothing external
/// is read or mutated. The steps run in a fixed order:
///
/// 1. Parse rows into allow/deny sets.
/// 2. A tenant-level DENY short-circuits to an empty context. It is a
///    kill-switch: no other row in the set can re-open access.
/// 3. A tenant-level ALLOW seeds the sets with the full hierarchy snapshot.
/// 4. Explicit allow ids are unioned in.
/// 5. Allowed groups and countries expand to their legal entities; every
///    legal entity present expands to its operating units.
/// 6. Deny pass: direct removals, then cascade removal of entities under
///    denied groups/countries and of units under removed entities.
/// 7. Ancestor back-fill: every surviving legal entity re-adds its group and
///    country, so parent-level listings can see it.
/// 8. `tenant_wide` reflects "tenant allow and not a single deny": a coarse
///    unrestricted flag, independent of whether narrower grants happen to
///    cover the whole tree.
pub fn build_scope_context(
    tenant_id: TenantId,
    rows: &[ScopeRow],
    hierarchy: &OrgHierarchy,
) -> ScopeContext {
    let ParsedScopeRows { allow, deny } = parse_scope_rows(rows);

    if deny.tenant {
        return ScopeContext::empty(tenant_id);
    }

    let (mut groups, mut countries, mut legal_entities, mut operating_units) = if allow.tenant {
        (
            hierarchy.group_ids().clone(),
            hierarchy.country_ids().clone(),
            hierarchy.legal_entity_ids().clone(),
            hierarchy.operating_unit_ids().clone(),
        )
    } else {
        (
            HashSet::new(),
            HashSet::new(),
            HashSet::new(),
            HashSet::new(),
        )
    };

    groups.extend(allow.groups.iter().copied());
    countries.extend(allow.countries.iter().copied());
    legal_entities.extend(allow.legal_entities.iter().copied());
    operating_units.extend(allow.operating_units.iter().copied());

    // Expand downward: group/country grants imply their entities, entity
    // reachability implies the entity's units.
    for group_id in &allow.groups {
        if let Some(entities) = hierarchy.entities_in_group(*group_id) {
            legal_entities.extend(entities.iter().copied());
        }
    }
    for country_id in &allow.countries {
        if let Some(entities) = hierarchy.entities_in_country(*country_id) {
            legal_entities.extend(entities.iter().copied());
        }
    }
    for entity_id in &legal_entities {
        if let Some(units) = hierarchy.units_of_entity(*entity_id) {
            operating_units.extend(units.iter().copied());
        }
    }

    // Deny pass. Direct removals first, then ancestor denies cascade to
    // descendants; a denied unit removes only itself.
    for id in &deny.groups {
        groups.remove(id);
    }
    for id in &deny.countries {
        countries.remove(id);
    }
    for id in &deny.legal_entities {
        legal_entities.remove(id);
    }
    for id in &deny.operating_units {
        operating_units.remove(id);
    }

    for group_id in &deny.groups {
        if let Some(entities) = hierarchy.entities_in_group(*group_id) {
            for entity_id in entities {
                legal_entities.remove(entity_id);
                if let Some(units) = hierarchy.units_of_entity(*entity_id) {
                    for unit_id in units {
                        operating_units.remove(unit_id);
                    }
                }
            }
        }
    }

    for country_id in &deny.countries {
        if let Some(entities) = hierarchy.entities_in_country(*country_id) {
            for entity_id in entities {
                legal_entities.remove(entity_id);
                if let Some(units) = hierarchy.units_of_entity(*entity_id) {
                    for unit_id in units {
                        operating_units.remove(unit_id);
                    }
                }
            }
        }
    }

    for entity_id in &deny.legal_entities {
        if let Some(units) = hierarchy.units_of_entity(*entity_id) {
            for unit_id in units {
                operating_units.remove(unit_id);
            }
        }
    }

    // Ancestor back-fill over the survivors only; a denied entity never
    // re-introduces its parents.
    for entity_id in &legal_entities {
        if let Some(parents) = hierarchy.parents_of(*entity_id) {
            groups.insert(parents.group);
            countries.insert(parents.country);
        }
    }

    let tenant_wide = allow.tenant && deny.has_no_scoped_ids();

    ScopeContext {
        tenant_id,
        tenant_wide,
        groups,
        countries,
        legal_entities,
        operating_units,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::{Effect, ScopeType};
    use proptest::prelude::*;

    fn tenant() -> TenantId {
        TenantId::new(1).unwrap()
    }

    fn gid(raw: i64) -> GroupCompanyId {
        GroupCompanyId::new(raw).unwrap()
    }

    fn cid(raw: i64) -> CountryId {
        CountryId::new(raw).unwrap()
    }

    fn eid(raw: i64) -> LegalEntityId {
        LegalEntityId::new(raw).unwrap()
    }

    fn uid(raw: i64) -> OperatingUnitId {
        OperatingUnitId::new(raw).unwrap()
    }

    /// Group 10 ⊇ {101, 102}, group 20 ⊇ {201}; entity 101 ⊇ units
    /// {1001, 1002}, entity 201 ⊇ {2001}. Entities 101/102 sit in country 1,
    /// entity 201 in country 2.
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

    fn ids<T: Copy + Ord>(set: &HashSet<T>) -> Vec<T> {
        let mut v: Vec<T> = set.iter().copied().collect();
        v.sort();
        v
    }

    #[test]
    fn tenant_allow_snapshots_the_full_hierarchy() {
        let h = fixture();
        let rows = vec![ScopeRow::new("ALLOW", "TENANT", 1)];

        let ctx = build_scope_context(tenant(), &rows, &h);

        assert!(ctx.tenant_wide);
        assert_eq!(&ctx.groups, h.group_ids());
        assert_eq!(&ctx.countries, h.country_ids());
        assert_eq!(&ctx.legal_entities, h.legal_entity_ids());
        assert_eq!(&ctx.operating_units, h.operating_unit_ids());
    }

    #[test]
    fn tenant_deny_short_circuits_every_allow() {
        // Scenario B: the tenant-level deny overrides the group allow.
        let h = fixture();
        let rows = vec![
            ScopeRow::new("DENY", "TENANT", 1),
            ScopeRow::new("ALLOW", "GROUP", 10),
            ScopeRow::new("ALLOW", "TENANT", 1),
        ];

        let ctx = build_scope_context(tenant(), &rows, &h);

        assert_eq!(ctx, ScopeContext::empty(tenant()));
    }

    #[test]
    fn group_allow_with_entity_deny() {
        // Scenario A: allow group 10, deny entity 102.
        let h = fixture();
        let rows = vec![
            ScopeRow::new("ALLOW", "GROUP", 10),
            ScopeRow::new("DENY", "LEGAL_ENTITY", 102),
        ];

        let ctx = build_scope_context(tenant(), &rows, &h);

        assert!(!ctx.tenant_wide);
        assert_eq!(ids(&ctx.groups), vec![gid(10)]);
        assert_eq!(ids(&ctx.countries), vec![cid(1)]);
        assert_eq!(ids(&ctx.legal_entities), vec![eid(101)]);
        assert_eq!(ids(&ctx.operating_units), vec![uid(1001), uid(1002)]);
    }

    #[test]
    fn country_allow_expands_entities_and_units() {
        let h = fixture();
        let rows = vec![ScopeRow::new("ALLOW", "COUNTRY", 2)];

        let ctx = build_scope_context(tenant(), &rows, &h);

        assert_eq!(ids(&ctx.legal_entities), vec![eid(201)]);
        assert_eq!(ids(&ctx.operating_units), vec![uid(2001)]);
        // Back-fill reaches the parent group even though it was never allowed.
        assert_eq!(ids(&ctx.groups), vec![gid(20)]);
        assert_eq!(ids(&ctx.countries), vec![cid(2)]);
    }

    #[test]
    fn entity_allow_backfills_group_and_country() {
        let h = fixture();
        let rows = vec![ScopeRow::new("ALLOW", "LEGAL_ENTITY", 102)];

        let ctx = build_scope_context(tenant(), &rows, &h);

        assert_eq!(ids(&ctx.groups), vec![gid(10)]);
        assert_eq!(ids(&ctx.countries), vec![cid(1)]);
        assert_eq!(ids(&ctx.legal_entities), vec![eid(102)]);
        // Entity 102 has no units in the fixture.
        assert!(ctx.operating_units.is_empty());
    }

    #[test]
    fn denied_entity_loses_units_reachable_via_allowed_ancestor() {
        let h = fixture();
        let rows = vec![
            ScopeRow::new("ALLOW", "TENANT", 1),
            ScopeRow::new("DENY", "LEGAL_ENTITY", 101),
        ];

        let ctx = build_scope_context(tenant(), &rows, &h);

        assert!(!ctx.tenant_wide);
        assert!(!ctx.legal_entities.contains(&eid(101)));
        assert!(!ctx.operating_units.contains(&uid(1001)));
        assert!(!ctx.operating_units.contains(&uid(1002)));
        // The sibling group survives untouched.
        assert!(ctx.legal_entities.contains(&eid(201)));
        assert!(ctx.operating_units.contains(&uid(2001)));
    }

    #[test]
    fn group_deny_cascades_to_entities_and_units() {
        let h = fixture();
        let rows = vec![
            ScopeRow::new("ALLOW", "TENANT", 1),
            ScopeRow::new("DENY", "GROUP", 10),
        ];

        let ctx = build_scope_context(tenant(), &rows, &h);

        assert!(!ctx.groups.contains(&gid(10)));
        assert!(!ctx.legal_entities.contains(&eid(101)));
        assert!(!ctx.legal_entities.contains(&eid(102)));
        assert!(!ctx.operating_units.contains(&uid(1001)));
        assert!(!ctx.operating_units.contains(&uid(1002)));
        assert!(ctx.legal_entities.contains(&eid(201)));
    }

    #[test]
    fn unit_deny_removes_only_the_unit() {
        let h = fixture();
        let rows = vec![
            ScopeRow::new("ALLOW", "GROUP", 10),
            ScopeRow::new("DENY", "OPERATING_UNIT", 1001),
        ];

        let ctx = build_scope_context(tenant(), &rows, &h);

        assert!(!ctx.operating_units.contains(&uid(1001)));
        assert!(ctx.operating_units.contains(&uid(1002)));
        assert!(ctx.legal_entities.contains(&eid(101)));
        // Any deny clears the coarse unrestricted flag.
        assert!(!ctx.tenant_wide);
    }

    #[test]
    fn empty_rows_grant_nothing() {
        let ctx = build_scope_context(tenant(), &[], &fixture());
        assert_eq!(ctx, ScopeContext::empty(tenant()));
    }

    #[test]
    fn empty_hierarchy_is_valid() {
        let rows = vec![ScopeRow::new("ALLOW", "TENANT", 1)];
        let ctx = build_scope_context(tenant(), &rows, &OrgHierarchy::new());

        assert!(ctx.tenant_wide);
        assert!(ctx.groups.is_empty());
        assert!(ctx.operating_units.is_empty());
    }

    #[test]
    fn builder_is_deterministic() {
        let h = fixture();
        let rows = vec![
            ScopeRow::new("ALLOW", "GROUP", 10),
            ScopeRow::new("ALLOW", "COUNTRY", 2),
            ScopeRow::new("DENY", "LEGAL_ENTITY", 102),
            ScopeRow::new("DENY", "OPERATING_UNIT", 2001),
        ];

        let first = build_scope_context(tenant(), &rows, &h);
        let second = build_scope_context(tenant(), &rows, &h);
        assert_eq!(first, second);
    }

    // Row generators over the fixture's id space (plus ids outside it).
    fn arb_row() -> impl Strategy<Value = ScopeRow> {
        let effects = prop_oneof![Just("ALLOW"), Just("DENY")];
        let types = prop_oneof![
            Just("TENANT"),
            Just("GROUP"),
            Just("COUNTRY"),
            Just("LEGAL_ENTITY"),
            Just("OPERATING_UNIT"),
        ];
        (effects, types, 1i64..2500).prop_map(|(e, t, id)| ScopeRow::new(e, t, id))
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a TENANT DENY collapses the context to empty no matter
        /// which other rows are present.
        #[test]
        fn tenant_deny_always_collapses(rows in prop::collection::vec(arb_row(), 0..12)) {
            let mut rows = rows;
            rows.push(ScopeRow::new("DENY", "TENANT", 1));

            let ctx = build_scope_context(tenant(), &rows, &fixture());
            prop_assert_eq!(ctx, ScopeContext::empty(tenant()));
        }

        /// Property: an explicitly denied legal entity contributes none of
        /// its operating units, however broad the allows are.
        #[test]
        fn denied_entity_units_never_survive(rows in prop::collection::vec(arb_row(), 0..12)) {
            let mut rows = rows;
            rows.retain(|r| {
                !(ScopeType::parse(&r.scope_type) == Some(ScopeType::Tenant)
                    && Effect::parse(&r.effect) == Some(Effect::Deny))
            });
            rows.push(ScopeRow::new("DENY", "LEGAL_ENTITY", 101));

            let ctx = build_scope_context(tenant(), &rows, &fixture());
            prop_assert!(!ctx.legal_entities.contains(&eid(101)));
            prop_assert!(!ctx.operating_units.contains(&uid(1001)));
            prop_assert!(!ctx.operating_units.contains(&uid(1002)));
        }

        /// Property: identical inputs yield identical contexts.
        #[test]
        fn builder_is_pure(rows in prop::collection::vec(arb_row(), 0..16)) {
            let h = fixture();
            let a = build_scope_context(tenant(), &rows, &h);
            let b = build_scope_context(tenant(), &rows, &h);
            prop_assert_eq!(a, b);
        }
    }
}
