//! Postgres-backed scope store.
//!
//! All reads are tenant-scoped in the WHERE clause, so a decision can never
//! see another tenant's grants or hierarchy.
//!
//! ## Error mapping
//!
//! sqlx errors propagate as [`StoreError::Query`], with one carve-out: an
//! undefined-table error (SQLSTATE `42P01`) on the `data_scopes` read maps to
//! an empty row set. The override table arrives late in some deployments and
//! authorization must keep working while the migration rolls out.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use tracing::instrument;

use atlaserp_auth::{OrgHierarchy, ScopeRow};
use atlaserp_core::{TenantId, UserId};

use super::{ScopeStore, StoreError};

/// Scope store over a shared Postgres connection pool.
///
/// The pool handles connection management; this type is `Send + Sync` and
/// cheap to clone.
#[derive(Debug, Clone)]
pub struct PostgresScopeStore {
    pool: Arc<PgPool>,
}

impl PostgresScopeStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }
}

// SQLx row types

#[derive(Debug)]
struct ScopeRowRecord {
    effect: String,
    scope_type: String,
    scope_id: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for ScopeRowRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(ScopeRowRecord {
            effect: row.try_get("effect")?,
            scope_type: row.try_get("scope_type")?,
            scope_id: row.try_get("scope_id")?,
        })
    }
}

impl From<ScopeRowRecord> for ScopeRow {
    fn from(record: ScopeRowRecord) -> Self {
        ScopeRow::new(record.effect, record.scope_type, record.scope_id)
    }
}

#[derive(Debug)]
struct GroupCompanyRecord {
    id: i64,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for GroupCompanyRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(GroupCompanyRecord {
            id: row.try_get("id")?,
        })
    }
}

#[derive(Debug)]
struct LegalEntityRecord {
    id: i64,
    group_company_id: Option<i64>,
    country_id: Option<i64>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for LegalEntityRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(LegalEntityRecord {
            id: row.try_get("id")?,
            group_company_id: row.try_get("group_company_id")?,
            country_id: row.try_get("country_id")?,
        })
    }
}

#[derive(Debug)]
struct OperatingUnitRecord {
    id: i64,
    legal_entity_id: Option<i64>,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for OperatingUnitRecord {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(OperatingUnitRecord {
            id: row.try_get("id")?,
            legal_entity_id: row.try_get("legal_entity_id")?,
        })
    }
}

#[async_trait]
impl ScopeStore for PostgresScopeStore {
    #[instrument(skip(self), fields(user_id = %user_id, tenant_id = %tenant_id), err)]
    async fn permission_scope_rows(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
        permission_code: &str,
    ) -> Result<Vec<ScopeRow>, StoreError> {
        let rows: Vec<ScopeRowRecord> = sqlx::query_as(
            r#"
            SELECT urs.effect, urs.scope_type, urs.scope_id
            FROM user_role_scopes urs
            JOIN roles r ON r.id = urs.role_id
            JOIN role_permissions rp ON rp.role_id = r.id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE urs.user_id = $1
              AND urs.tenant_id = $2
              AND p.code = $3
            "#,
        )
        .bind(user_id.get())
        .bind(tenant_id.get())
        .bind(permission_code)
        .fetch_all(&*self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self), fields(user_id = %user_id, tenant_id = %tenant_id), err)]
    async fn data_scope_rows(
        &self,
        user_id: UserId,
        tenant_id: TenantId,
    ) -> Result<Vec<ScopeRow>, StoreError> {
        let result: Result<Vec<ScopeRowRecord>, sqlx::Error> = sqlx::query_as(
            r#"
            SELECT effect, scope_type, scope_id
            FROM data_scopes
            WHERE tenant_id = $1
              AND user_id = $2
            "#,
        )
        .bind(tenant_id.get())
        .bind(user_id.get())
        .fetch_all(&*self.pool)
        .await;

        match result {
            Ok(rows) => Ok(rows.into_iter().map(Into::into).collect()),
            Err(e) if is_undefined_table(&e) => {
                tracing::debug!("data_scopes table not migrated yet; treating as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    #[instrument(skip(self), fields(tenant_id = %tenant_id), err)]
    async fn load_hierarchy(&self, tenant_id: TenantId) -> Result<OrgHierarchy, StoreError> {
        let pool = &*self.pool;

        // The three reads are independent; issue them concurrently.
        let (groups, entities, units) = tokio::try_join!(
            async {
                sqlx::query_as::<_, GroupCompanyRecord>(
                    "SELECT id FROM group_companies WHERE tenant_id = $1",
                )
                .bind(tenant_id.get())
                .fetch_all(pool)
                .await
            },
            async {
                sqlx::query_as::<_, LegalEntityRecord>(
                    r#"
                    SELECT id, group_company_id, country_id
                    FROM legal_entities
                    WHERE tenant_id = $1
                    "#,
                )
                .bind(tenant_id.get())
                .fetch_all(pool)
                .await
            },
            async {
                sqlx::query_as::<_, OperatingUnitRecord>(
                    r#"
                    SELECT id, legal_entity_id
                    FROM operating_units
                    WHERE tenant_id = $1
                    "#,
                )
                .bind(tenant_id.get())
                .fetch_all(pool)
                .await
            },
        )?;

        let mut hierarchy = OrgHierarchy::new();
        for row in groups {
            hierarchy.add_group_company(row.id);
        }
        for row in entities {
            hierarchy.add_legal_entity(row.id, row.group_company_id, row.country_id);
        }
        for row in units {
            hierarchy.add_operating_unit(row.id, row.legal_entity_id);
        }

        Ok(hierarchy)
    }
}

fn is_undefined_table(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.code().as_deref() == Some("42P01"))
}
