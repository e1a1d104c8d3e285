//! In-memory scope store.
//!
//! Intended for tests/dev. Not optimized for performance.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use atlaserp_auth::{OrgHierarchy, ScopeRow};
use atlaserp_core::{TenantId, UserId};

use super::{ScopeStore, StoreError};

#[derive(Debug, Default)]
struct Inner {
    permission_rows: HashMap<(TenantId, UserId, String), Vec<ScopeRow>>,
    data_rows: HashMap<(TenantId, UserId), Vec<ScopeRow>>,
    hierarchies: HashMap<TenantId, OrgHierarchy>,
    data_scope_table_missing: bool,
}

/// In-memory twin of the Postgres store.
#[derive(Debug, Default)]
pub struct InMemoryScopeStore {
    inner: RwLock<Inner>,
}

impl InMemoryScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the tenant's hierarchy snapshot.
    pub fn set_hierarchy(&self, tenant_id: TenantId, hierarchy: OrgHierarchy) {
        self.write().hierarchies.insert(tenant_id, hierarchy);
    }

    /// Attach grant rows to (tenant, user, permission code).
    pub fn grant_permission(
        &self,
        tenant_id: TenantId,
        user_id: UserId,
        permission_code: &str,
        rows: Vec<ScopeRow>,
    ) {
        self.write()
            .permission_rows
            .insert((tenant_id, user_id, permission_code.to_string()), rows);
    }

    /// Set user-specific data-scope override rows.
    pub fn set_data_scopes(&self, tenant_id: TenantId, user_id: UserId, rows: Vec<ScopeRow>) {
        self.write().data_rows.insert((tenant_id, user_id), rows);
    }

    /// Emulate a deployment where the data-scope override table has not been
    /// migrated yet: reads yield empty sets, exactly like the `42P01`
    /// carve-out in the Postgres store.
    pub fn mark_data_scope_table_missing(&self) {
        self.write().data_scope_table_missing = true;
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Inner> {
        self.inner.write().unwrap_or_else(|e| e.into_inner())
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Inner> {
        self.inner.read().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl ScopeStore for InMemoryScopeStore {
    async fn permission_scope_rows(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        permission_code: &str,
    ) -> Result<Vec<ScopeRow>, StoreError> {
        Ok(self
            .read()
            .permission_rows
            .get(&(tenant_id, user_id, permission_code.to_string()))
            .cloned()
            .unwrap_or_default())
    }

    async fn data_scope_rows(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<Vec<ScopeRow>, StoreError> {
        let inner = self.read();
        if inner.data_scope_table_missing {
            return Ok(Vec::new());
        }
        Ok(inner
            .data_rows
            .get(&(tenant_id, user_id))
            .cloned()
            .unwrap_or_default())
    }

    async fn load_hierarchy(&self, tenant_id: TenantId) -> Result<OrgHierarchy, StoreError> {
        Ok(self
            .read()
            .hierarchies
            .get(&tenant_id)
            .cloned()
            .unwrap_or_default())
    }
}
