//! Per-tenant snapshot of the organizational tree.

use std::collections::{HashMap, HashSet};

use atlaserp_core::{CountryId, GroupCompanyId, LegalEntityId, OperatingUnitId};

/// Parents of a legal entity in the containment tree.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct EntityParents {
    pub group: GroupCompanyId,
    pub country: CountryId,
}

/// Every organizational scope reachable in one tenant, with the lookup maps
/// the context builder needs for expansion and cascade removal.
///
/// Rebuilt fresh for each authorization decision and read-only afterwards.
/// Insertion is tolerant: rows with missing or non-positive foreign keys are
/// skipped, so a partially broken org table degrades to a smaller hierarchy
/// instead of a failed decision.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgHierarchy {
    group_ids: HashSet<GroupCompanyId>,
    country_ids: HashSet<CountryId>,
    legal_entity_ids: HashSet<LegalEntityId>,
    operating_unit_ids: HashSet<OperatingUnitId>,

    parents_by_entity: HashMap<LegalEntityId, EntityParents>,
    entities_by_group: HashMap<GroupCompanyId, HashSet<LegalEntityId>>,
    entities_by_country: HashMap<CountryId, HashSet<LegalEntityId>>,
    units_by_entity: HashMap<LegalEntityId, HashSet<OperatingUnitId>>,
}

impl OrgHierarchy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a group company row.
    pub fn add_group_company(&mut self, id: i64) {
        if let Some(id) = GroupCompanyId::new(id) {
            self.group_ids.insert(id);
        }
    }

    /// Register a legal entity with its group company and country parents.
    ///
    /// Country ids enter the hierarchy only through legal entities: a country
    /// with no entity in this tenant is not a reachable scope.
    pub fn add_legal_entity(
        &mut self,
        id: i64,
        group_company_id: Option<i64>,
        country_id: Option<i64>,
    ) {
        let (Some(id), Some(group), Some(country)) = (
            LegalEntityId::new(id),
            group_company_id.and_then(GroupCompanyId::new),
            country_id.and_then(CountryId::new),
        ) else {
            return;
        };

        self.legal_entity_ids.insert(id);
        self.group_ids.insert(group);
        self.country_ids.insert(country);
        self.parents_by_entity
            .insert(id, EntityParents { group, country });
        self.entities_by_group.entry(group).or_default().insert(id);
        self.entities_by_country
            .entry(country)
            .or_default()
            .insert(id);
    }

    /// Register an operating unit under its legal entity.
    pub fn add_operating_unit(&mut self, id: i64, legal_entity_id: Option<i64>) {
        let (Some(id), Some(entity)) = (
            OperatingUnitId::new(id),
            legal_entity_id.and_then(LegalEntityId::new),
        ) else {
            return;
        };

        self.operating_unit_ids.insert(id);
        self.units_by_entity.entry(entity).or_default().insert(id);
    }

    pub fn group_ids(&self) -> &HashSet<GroupCompanyId> {
        &self.group_ids
    }

    pub fn country_ids(&self) -> &HashSet<CountryId> {
        &self.country_ids
    }

    pub fn legal_entity_ids(&self) -> &HashSet<LegalEntityId> {
        &self.legal_entity_ids
    }

    pub fn operating_unit_ids(&self) -> &HashSet<OperatingUnitId> {
        &self.operating_unit_ids
    }

    pub fn parents_of(&self, entity: LegalEntityId) -> Option<EntityParents> {
        self.parents_by_entity.get(&entity).copied()
    }

    pub fn entities_in_group(&self, group: GroupCompanyId) -> Option<&HashSet<LegalEntityId>> {
        self.entities_by_group.get(&group)
    }

    pub fn entities_in_country(&self, country: CountryId) -> Option<&HashSet<LegalEntityId>> {
        self.entities_by_country.get(&country)
    }

    pub fn units_of_entity(&self, entity: LegalEntityId) -> Option<&HashSet<OperatingUnitId>> {
        self.units_by_entity.get(&entity)
    }
}
