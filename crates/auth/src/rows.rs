//! Grant-row parsing: raw storage rows → allow/deny scope sets.

use std::collections::HashSet;

use atlaserp_core::{CountryId, GroupCompanyId, LegalEntityId, OperatingUnitId};

use crate::scope::{Effect, ScopeRow, ScopeType};

/// One side (allow or deny) of a parsed grant row set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeSets {
    pub tenant: bool,
    pub groups: HashSet<GroupCompanyId>,
    pub countries: HashSet<CountryId>,
    pub legal_entities: HashSet<LegalEntityId>,
    pub operating_units: HashSet<OperatingUnitId>,
}

impl ScopeSets {
    /// True when no scope below tenant level is present.
    pub fn has_no_scoped_ids(&self) -> bool {
        self.groups.is_empty()
            && self.countries.is_empty()
            && self.legal_entities.is_empty()
            && self.operating_units.is_empty()
    }
}

/// Grant rows split into their allow and deny sides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedScopeRows {
    pub allow: ScopeSets,
    pub deny: ScopeSets,
}

/// Split raw grant rows into allow/deny scope sets.
///
/// Rows with an unrecognized scope type, an effect outside ALLOW/DENY, or a
/// non-positive scope id are skipped. Parsing never fails: a grant table
/// containing rows from an older schema version must not take every request
/// down with it.
pub fn parse_scope_rows(rows: &[ScopeRow]) -> ParsedScopeRows {
    let mut parsed = ParsedScopeRows::default();

    for row in rows {
        let Some(effect) = Effect::parse(&row.effect) else {
            continue;
        };
        let Some(scope_type) = ScopeType::parse(&row.scope_type) else {
            continue;
        };
        if row.scope_id <= 0 {
            continue;
        }

        let target = match effect {
            Effect::Allow => &mut parsed.allow,
            Effect::Deny => &mut parsed.deny,
        };

        match scope_type {
            ScopeType::Tenant => target.tenant = true,
            ScopeType::Group => {
                if let Some(id) = GroupCompanyId::new(row.scope_id) {
                    target.groups.insert(id);
                }
            }
            ScopeType::Country => {
                if let Some(id) = CountryId::new(row.scope_id) {
                    target.countries.insert(id);
                }
            }
            ScopeType::LegalEntity => {
                if let Some(id) = LegalEntityId::new(row.scope_id) {
                    target.legal_entities.insert(id);
                }
            }
            ScopeType::OperatingUnit => {
                if let Some(id) = OperatingUnitId::new(row.scope_id) {
                    target.operating_units.insert(id);
                }
            }
        }
    }

    parsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_rows_by_effect() {
        let rows = vec![
            ScopeRow::new("ALLOW", "GROUP", 10),
            ScopeRow::new("ALLOW", "LEGAL_ENTITY", 101),
            ScopeRow::new("DENY", "OPERATING_UNIT", 1001),
        ];

        let parsed = parse_scope_rows(&rows);
        assert_eq!(parsed.allow.groups.len(), 1);
        assert_eq!(parsed.allow.legal_entities.len(), 1);
        assert_eq!(parsed.deny.operating_units.len(), 1);
        assert!(!parsed.allow.tenant);
        assert!(!parsed.deny.tenant);
    }

    #[test]
    fn tenant_rows_set_the_boolean_not_a_set() {
        let rows = vec![
            ScopeRow::new("ALLOW", "TENANT", 1),
            ScopeRow::new("DENY", "TENANT", 1),
        ];

        let parsed = parse_scope_rows(&rows);
        assert!(parsed.allow.tenant);
        assert!(parsed.deny.tenant);
        assert!(parsed.allow.has_no_scoped_ids());
        assert!(parsed.deny.has_no_scoped_ids());
    }

    #[test]
    fn malformed_rows_are_skipped() {
        let rows = vec![
            ScopeRow::new("GRANT", "GROUP", 10),
            ScopeRow::new("ALLOW", "REGION", 10),
            ScopeRow::new("ALLOW", "GROUP", 0),
            ScopeRow::new("ALLOW", "GROUP", -4),
            ScopeRow::new("DENY", "TENANT", 0),
        ];

        let parsed = parse_scope_rows(&rows);
        assert_eq!(parsed, ParsedScopeRows::default());
    }

    #[test]
    fn labels_parse_case_insensitively() {
        let rows = vec![ScopeRow::new("allow", "legal_entity", 7)];
        let parsed = parse_scope_rows(&rows);
        assert_eq!(parsed.allow.legal_entities.len(), 1);
    }
}
