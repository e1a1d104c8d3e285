//! Strongly-typed identifiers used across the domain.
//!
//! The organization tables are integer-keyed (`BIGINT` primary keys), so ids
//! are newtypes over `i64`. A raw value is only an id if it is strictly
//! positive; `new` returns `None` otherwise, which lets callers skip
//! malformed rows instead of failing a whole read.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Identifier of a tenant (multi-tenant boundary).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(i64);

/// Identifier of a user (actor identity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

/// Identifier of a group company (top organizational grouping in a tenant).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupCompanyId(i64);

/// Identifier of a country, as referenced by legal entities.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CountryId(i64);

/// Identifier of a legal entity (belongs to one group company, one country).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LegalEntityId(i64);

/// Identifier of an operating unit (belongs to one legal entity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperatingUnitId(i64);

macro_rules! impl_i64_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a raw database id. Returns `None` unless strictly positive.
            pub fn new(raw: i64) -> Option<Self> {
                (raw > 0).then_some(Self(raw))
            }

            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<$t> for i64 {
            fn from(value: $t) -> Self {
                value.0
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let raw: i64 = s
                    .parse()
                    .map_err(|e| DomainError::invalid_id(format!("{}: {}", $name, e)))?;
                Self::new(raw).ok_or_else(|| {
                    DomainError::invalid_id(format!("{}: must be a positive integer", $name))
                })
            }
        }
    };
}

impl_i64_newtype!(TenantId, "TenantId");
impl_i64_newtype!(UserId, "UserId");
impl_i64_newtype!(GroupCompanyId, "GroupCompanyId");
impl_i64_newtype!(CountryId, "CountryId");
impl_i64_newtype!(LegalEntityId, "LegalEntityId");
impl_i64_newtype!(OperatingUnitId, "OperatingUnitId");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_ids() {
        assert!(TenantId::new(0).is_none());
        assert!(TenantId::new(-7).is_none());
        assert_eq!(TenantId::new(1).map(|id| id.get()), Some(1));
    }

    #[test]
    fn parses_from_str() {
        let id: LegalEntityId = "42".parse().unwrap();
        assert_eq!(id.get(), 42);

        assert!("0".parse::<LegalEntityId>().is_err());
        assert!("abc".parse::<LegalEntityId>().is_err());
    }
}
