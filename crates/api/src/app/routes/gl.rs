//! General-ledger journal routes.
//!
//! Point reads resolve the journal's owning legal entity before the
//! decision; a missing or malformed id degrades to a TENANT-level scope, so
//! only tenant-wide callers can probe ids that resolve to nothing.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Extension, Json, Router,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use atlaserp_auth::{RequestedScope, ScopeKind, ScopeType};
use atlaserp_core::TenantId;
use atlaserp_infra::StoreError;

use crate::app::{errors, services::AppServices};
use crate::context::AuthSession;
use crate::guard::{GuardError, ScopeResolver};

pub fn router() -> Router {
    Router::new()
        .route("/gl/journals", get(list_journals).post(create_journal))
        .route("/gl/journals/:id", get(get_journal))
}

#[derive(Debug, Serialize)]
struct JournalRow {
    id: i64,
    book_id: i64,
    legal_entity_id: i64,
    journal_no: String,
    description: Option<String>,
    status: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for JournalRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(JournalRow {
            id: row.try_get("id")?,
            book_id: row.try_get("book_id")?,
            legal_entity_id: row.try_get("legal_entity_id")?,
            journal_no: row.try_get("journal_no")?,
            description: row.try_get("description")?,
            status: row.try_get("status")?,
        })
    }
}

/// Scope of an existing journal: its owning legal entity.
struct JournalScope {
    pool: PgPool,
    journal_id: i64,
}

#[async_trait]
impl ScopeResolver for JournalScope {
    async fn resolve(&self, tenant_id: TenantId) -> Result<Option<RequestedScope>, GuardError> {
        if self.journal_id <= 0 {
            return Ok(Some(RequestedScope::new(ScopeType::Tenant, tenant_id.get())));
        }

        let row: Option<(Option<i64>,)> = sqlx::query_as(
            "SELECT legal_entity_id FROM journal_entries WHERE id = $1 AND tenant_id = $2 LIMIT 1",
        )
        .bind(self.journal_id)
        .bind(tenant_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let entity_id = row.and_then(|(id,)| id).filter(|id| *id > 0);
        Ok(Some(match entity_id {
            Some(id) => RequestedScope::new(ScopeType::LegalEntity, id),
            None => RequestedScope::new(ScopeType::Tenant, tenant_id.get()),
        }))
    }
}

/// Scope of a journal being created: the target book's legal entity.
struct BookScope {
    pool: PgPool,
    book_id: i64,
}

#[async_trait]
impl ScopeResolver for BookScope {
    async fn resolve(&self, tenant_id: TenantId) -> Result<Option<RequestedScope>, GuardError> {
        if self.book_id <= 0 {
            return Ok(Some(RequestedScope::new(ScopeType::Tenant, tenant_id.get())));
        }

        let row: Option<(Option<i64>,)> = sqlx::query_as(
            "SELECT legal_entity_id FROM books WHERE id = $1 AND tenant_id = $2 LIMIT 1",
        )
        .bind(self.book_id)
        .bind(tenant_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::from)?;

        let entity_id = row.and_then(|(id,)| id).filter(|id| *id > 0);
        Ok(Some(match entity_id {
            Some(id) => RequestedScope::new(ScopeType::LegalEntity, id),
            None => RequestedScope::new(ScopeType::Tenant, tenant_id.get()),
        }))
    }
}

/// GET /gl/journals - journals under the caller's reachable legal entities.
async fn list_journals(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<AuthSession>,
) -> axum::response::Response {
    let decision = match services.guard.authorize(&session, "gl.journal.read").await {
        Ok(d) => d,
        Err(e) => return errors::guard_error_response(e),
    };

    let mut params = vec![decision.tenant_id.get()];
    let filter = decision.scope_filter(ScopeKind::LegalEntity, "legal_entity_id", &mut params);
    let sql = format!(
        "SELECT id, book_id, legal_entity_id, journal_no, description, status \
         FROM journal_entries WHERE tenant_id = $1 AND {filter} ORDER BY id DESC"
    );
    let mut query = sqlx::query_as::<_, JournalRow>(&sql);
    for p in &params {
        query = query.bind(*p);
    }

    match query.fetch_all(&services.pool).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "journals": rows }))).into_response(),
        Err(e) => errors::db_error_response(e),
    }
}

/// GET /gl/journals/{id} - point read behind a journal-scope resolution.
async fn get_journal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<AuthSession>,
    Path(journal_id): Path<i64>,
) -> axum::response::Response {
    let resolver = JournalScope {
        pool: services.pool.clone(),
        journal_id,
    };
    let decision = match services
        .guard
        .authorize_scoped(&session, "gl.journal.read", &resolver)
        .await
    {
        Ok(d) => d,
        Err(e) => return errors::guard_error_response(e),
    };

    let row: Result<Option<JournalRow>, sqlx::Error> = sqlx::query_as(
        "SELECT id, book_id, legal_entity_id, journal_no, description, status \
         FROM journal_entries WHERE id = $1 AND tenant_id = $2 LIMIT 1",
    )
    .bind(journal_id)
    .bind(decision.tenant_id.get())
    .fetch_optional(&services.pool)
    .await;

    match row {
        Ok(Some(journal)) => (StatusCode::OK, Json(json!({ "journal": journal }))).into_response(),
        Ok(None) => errors::json_error(StatusCode::NOT_FOUND, "not_found", "journal not found"),
        Err(e) => errors::db_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct CreateJournalRequest {
    book_id: i64,
    description: Option<String>,
    lines: Vec<JournalLineRequest>,
}

#[derive(Debug, Deserialize)]
struct JournalLineRequest {
    account_id: i64,
    operating_unit_id: Option<i64>,
    debit: i64,
    credit: i64,
}

/// POST /gl/journals - create a draft journal in the target book.
///
/// The guard checks the book's legal entity; line-level operating units are
/// re-asserted individually because a journal can fan out across units.
async fn create_journal(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<AuthSession>,
    Json(payload): Json<CreateJournalRequest>,
) -> axum::response::Response {
    let resolver = BookScope {
        pool: services.pool.clone(),
        book_id: payload.book_id,
    };
    let decision = match services
        .guard
        .authorize_scoped(&session, "gl.journal.create", &resolver)
        .await
    {
        Ok(d) => d,
        Err(e) => return errors::guard_error_response(e),
    };

    if payload.lines.is_empty() {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_error",
            "at least one line is required",
        );
    }

    for (index, line) in payload.lines.iter().enumerate() {
        if let Some(unit_id) = line.operating_unit_id {
            let label = format!("lines[{index}].operatingUnitId");
            if let Err(e) =
                decision.assert_scope_access(ScopeKind::OperatingUnit, unit_id, &label)
            {
                return errors::authz_error_response(e);
            }
        }
    }

    let book: Option<(i64, Option<i64>)> = match sqlx::query_as(
        "SELECT id, legal_entity_id FROM books WHERE id = $1 AND tenant_id = $2 LIMIT 1",
    )
    .bind(payload.book_id)
    .bind(decision.tenant_id.get())
    .fetch_optional(&services.pool)
    .await
    {
        Ok(row) => row,
        Err(e) => return errors::db_error_response(e),
    };
    let Some((book_id, Some(legal_entity_id))) = book else {
        return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "unknown bookId");
    };

    let journal_no = format!("JRN-{}", Uuid::now_v7().simple());

    let mut tx = match services.pool.begin().await {
        Ok(tx) => tx,
        Err(e) => return errors::db_error_response(e),
    };

    let inserted: Result<(i64,), sqlx::Error> = sqlx::query_as(
        "INSERT INTO journal_entries (tenant_id, book_id, legal_entity_id, journal_no, description, status) \
         VALUES ($1, $2, $3, $4, $5, 'DRAFT') RETURNING id",
    )
    .bind(decision.tenant_id.get())
    .bind(book_id)
    .bind(legal_entity_id)
    .bind(&journal_no)
    .bind(payload.description.as_deref())
    .fetch_one(&mut *tx)
    .await;
    let journal_id = match inserted {
        Ok((id,)) => id,
        Err(e) => return errors::db_error_response(e),
    };

    for (index, line) in payload.lines.iter().enumerate() {
        let result = sqlx::query(
            "INSERT INTO journal_lines (journal_id, line_no, account_id, operating_unit_id, debit, credit) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(journal_id)
        .bind((index + 1) as i64)
        .bind(line.account_id)
        .bind(line.operating_unit_id)
        .bind(line.debit)
        .bind(line.credit)
        .execute(&mut *tx)
        .await;
        if let Err(e) = result {
            return errors::db_error_response(e);
        }
    }

    if let Err(e) = tx.commit().await {
        return errors::db_error_response(e);
    }

    (
        StatusCode::CREATED,
        Json(json!({ "id": journal_id, "journal_no": journal_no })),
    )
        .into_response()
}
