//! Scope model: the five-level organizational containment hierarchy and the
//! raw grant rows evaluated against it.

use core::str::FromStr;

use serde::{Deserialize, Serialize};

use atlaserp_core::TenantId;

use crate::error::AuthzError;

/// A level in the organizational containment hierarchy.
///
/// Ordered by containment: TENANT ⊇ GROUP/COUNTRY ⊇ LEGAL_ENTITY ⊇
/// OPERATING_UNIT. A legal entity belongs to exactly one group company and
/// one country; an operating unit belongs to exactly one legal entity.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScopeType {
    Tenant,
    Group,
    Country,
    LegalEntity,
    OperatingUnit,
}

impl ScopeType {
    /// Parse a storage label, case-insensitively. `None` for unknown labels
    /// so callers can skip malformed rows instead of failing.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "TENANT" => Some(Self::Tenant),
            "GROUP" => Some(Self::Group),
            "COUNTRY" => Some(Self::Country),
            "LEGAL_ENTITY" => Some(Self::LegalEntity),
            "OPERATING_UNIT" => Some(Self::OperatingUnit),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Tenant => "TENANT",
            Self::Group => "GROUP",
            Self::Country => "COUNTRY",
            Self::LegalEntity => "LEGAL_ENTITY",
            Self::OperatingUnit => "OPERATING_UNIT",
        }
    }
}

impl core::fmt::Display for ScopeType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Grant effect. DENY always wins over ALLOW for the same or a descendant
/// scope.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    /// Parse a storage label, case-insensitively; `None` for anything else.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_ascii_uppercase().as_str() {
            "ALLOW" => Some(Self::Allow),
            "DENY" => Some(Self::Deny),
            _ => None,
        }
    }
}

/// A grant row exactly as read from storage.
///
/// Effect and scope type stay unparsed here: grant tables can hold rows
/// written by older schema versions, and the engine skips what it does not
/// recognize rather than rejecting the whole row set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRow {
    pub effect: String,
    pub scope_type: String,
    pub scope_id: i64,
}

impl ScopeRow {
    pub fn new(effect: impl Into<String>, scope_type: impl Into<String>, scope_id: i64) -> Self {
        Self {
            effect: effect.into(),
            scope_type: scope_type.into(),
            scope_id,
        }
    }
}

/// The specific organizational scope a request targets.
///
/// Produced by route-specific resolution logic; absent means "check for any
/// non-empty access".
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestedScope {
    pub scope_type: ScopeType,
    pub scope_id: i64,
}

impl RequestedScope {
    pub fn new(scope_type: ScopeType, scope_id: i64) -> Self {
        Self {
            scope_type,
            scope_id,
        }
    }

    /// Validate the scope against the authenticated tenant.
    ///
    /// The id must be positive, and a TENANT scope must reference the
    /// resolved tenant itself.
    pub fn normalize(self, tenant_id: TenantId) -> Result<Self, AuthzError> {
        if self.scope_id <= 0 {
            return Err(AuthzError::bad_request(
                "scopeId must be a positive integer",
            ));
        }
        if self.scope_type == ScopeType::Tenant && self.scope_id != tenant_id.get() {
            return Err(AuthzError::forbidden(
                "Tenant scope does not match authenticated tenant",
            ));
        }
        Ok(self)
    }
}

/// Lower-case scope selector used by point checks and list filters.
///
/// TENANT is deliberately absent: tenant-level access is the `tenant_wide`
/// flag, not a set membership question.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScopeKind {
    Group,
    Country,
    LegalEntity,
    OperatingUnit,
}

impl ScopeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Group => "group",
            Self::Country => "country",
            Self::LegalEntity => "legal_entity",
            Self::OperatingUnit => "operating_unit",
        }
    }
}

impl core::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScopeKind {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "group" => Ok(Self::Group),
            "country" => Ok(Self::Country),
            "legal_entity" => Ok(Self::LegalEntity),
            "operating_unit" => Ok(Self::OperatingUnit),
            other => Err(AuthzError::bad_request(format!(
                "Unsupported scope kind: {other}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_type_parse_is_case_insensitive() {
        assert_eq!(ScopeType::parse("legal_entity"), Some(ScopeType::LegalEntity));
        assert_eq!(ScopeType::parse(" TENANT "), Some(ScopeType::Tenant));
        assert_eq!(ScopeType::parse("REGION"), None);
        assert_eq!(ScopeType::parse(""), None);
    }

    #[test]
    fn effect_parse_rejects_unknown_labels() {
        assert_eq!(Effect::parse("allow"), Some(Effect::Allow));
        assert_eq!(Effect::parse("DENY"), Some(Effect::Deny));
        assert_eq!(Effect::parse("GRANT"), None);
    }

    #[test]
    fn normalize_rejects_non_positive_ids() {
        let tenant = TenantId::new(3).unwrap();
        let err = RequestedScope::new(ScopeType::Group, 0)
            .normalize(tenant)
            .unwrap_err();
        assert_eq!(err.status(), 400);
    }

    #[test]
    fn normalize_rejects_foreign_tenant_scope() {
        let tenant = TenantId::new(3).unwrap();
        let err = RequestedScope::new(ScopeType::Tenant, 4)
            .normalize(tenant)
            .unwrap_err();
        assert_eq!(err.status(), 403);

        let ok = RequestedScope::new(ScopeType::Tenant, 3).normalize(tenant);
        assert!(ok.is_ok());
    }

    #[test]
    fn scope_kind_from_str() {
        assert_eq!("operating_unit".parse::<ScopeKind>().unwrap(), ScopeKind::OperatingUnit);
        assert!("tenant".parse::<ScopeKind>().is_err());
    }
}
