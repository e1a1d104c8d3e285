//! Organization hierarchy routes.
//!
//! Every list here is scoped: the decision's filter narrows each query to
//! the ids the caller can actually reach.

use std::sync::Arc;

use axum::{
    Extension, Json, Router,
    extract::Query,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::Row;

use atlaserp_auth::ScopeKind;

use crate::app::{errors, services::AppServices};
use crate::context::AuthSession;

pub fn router() -> Router {
    Router::new()
        .route("/org/tree", get(org_tree))
        .route("/org/legal-entities", get(list_legal_entities))
        .route("/org/operating-units", get(list_operating_units))
}

#[derive(Debug, Serialize)]
struct GroupCompanyRow {
    id: i64,
    code: String,
    name: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for GroupCompanyRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(GroupCompanyRow {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct CountryRow {
    id: i64,
    iso2: String,
    name: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for CountryRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(CountryRow {
            id: row.try_get("id")?,
            iso2: row.try_get("iso2")?,
            name: row.try_get("name")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct LegalEntityRow {
    id: i64,
    group_company_id: i64,
    country_id: i64,
    code: String,
    name: String,
    functional_currency_code: String,
    status: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for LegalEntityRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(LegalEntityRow {
            id: row.try_get("id")?,
            group_company_id: row.try_get("group_company_id")?,
            country_id: row.try_get("country_id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            functional_currency_code: row.try_get("functional_currency_code")?,
            status: row.try_get("status")?,
        })
    }
}

#[derive(Debug, Serialize)]
struct OperatingUnitRow {
    id: i64,
    legal_entity_id: i64,
    code: String,
    name: String,
}

impl<'r> sqlx::FromRow<'r, sqlx::postgres::PgRow> for OperatingUnitRow {
    fn from_row(row: &'r sqlx::postgres::PgRow) -> Result<Self, sqlx::Error> {
        Ok(OperatingUnitRow {
            id: row.try_get("id")?,
            legal_entity_id: row.try_get("legal_entity_id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
        })
    }
}

/// GET /org/tree - the hierarchy visible to the caller.
async fn org_tree(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<AuthSession>,
) -> axum::response::Response {
    let decision = match services.guard.authorize(&session, "org.tree.read").await {
        Ok(d) => d,
        Err(e) => return errors::guard_error_response(e),
    };
    let tenant_id = decision.tenant_id.get();

    let mut group_params = vec![tenant_id];
    let group_filter = decision.scope_filter(ScopeKind::Group, "id", &mut group_params);
    let sql = format!(
        "SELECT id, code, name FROM group_companies WHERE tenant_id = $1 AND {group_filter} ORDER BY id"
    );
    let mut query = sqlx::query_as::<_, GroupCompanyRow>(&sql);
    for p in &group_params {
        query = query.bind(*p);
    }
    let groups = match query.fetch_all(&services.pool).await {
        Ok(rows) => rows,
        Err(e) => return errors::db_error_response(e),
    };

    // Countries surface through the legal entities the caller can see.
    let mut country_params = vec![tenant_id];
    let country_entity_filter =
        decision.scope_filter(ScopeKind::LegalEntity, "le.id", &mut country_params);
    let sql = format!(
        "SELECT c.id, c.iso2, c.name \
         FROM countries c \
         JOIN legal_entities le ON le.country_id = c.id \
         WHERE le.tenant_id = $1 AND {country_entity_filter} \
         GROUP BY c.id, c.iso2, c.name \
         ORDER BY c.name"
    );
    let mut query = sqlx::query_as::<_, CountryRow>(&sql);
    for p in &country_params {
        query = query.bind(*p);
    }
    let countries = match query.fetch_all(&services.pool).await {
        Ok(rows) => rows,
        Err(e) => return errors::db_error_response(e),
    };

    let mut entity_params = vec![tenant_id];
    let entity_filter = decision.scope_filter(ScopeKind::LegalEntity, "id", &mut entity_params);
    let sql = format!(
        "SELECT id, group_company_id, country_id, code, name, functional_currency_code, status \
         FROM legal_entities WHERE tenant_id = $1 AND {entity_filter} ORDER BY id"
    );
    let mut query = sqlx::query_as::<_, LegalEntityRow>(&sql);
    for p in &entity_params {
        query = query.bind(*p);
    }
    let entities = match query.fetch_all(&services.pool).await {
        Ok(rows) => rows,
        Err(e) => return errors::db_error_response(e),
    };

    let mut unit_params = vec![tenant_id];
    let unit_filter = decision.scope_filter(ScopeKind::OperatingUnit, "id", &mut unit_params);
    let sql = format!(
        "SELECT id, legal_entity_id, code, name \
         FROM operating_units WHERE tenant_id = $1 AND {unit_filter} ORDER BY id"
    );
    let mut query = sqlx::query_as::<_, OperatingUnitRow>(&sql);
    for p in &unit_params {
        query = query.bind(*p);
    }
    let units = match query.fetch_all(&services.pool).await {
        Ok(rows) => rows,
        Err(e) => return errors::db_error_response(e),
    };

    (
        StatusCode::OK,
        Json(json!({
            "groups": groups,
            "countries": countries,
            "legal_entities": entities,
            "operating_units": units,
        })),
    )
        .into_response()
}

/// GET /org/legal-entities - flat scoped list.
async fn list_legal_entities(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<AuthSession>,
) -> axum::response::Response {
    let decision = match services.guard.authorize(&session, "org.tree.read").await {
        Ok(d) => d,
        Err(e) => return errors::guard_error_response(e),
    };

    let mut params = vec![decision.tenant_id.get()];
    let filter = decision.scope_filter(ScopeKind::LegalEntity, "id", &mut params);
    let sql = format!(
        "SELECT id, group_company_id, country_id, code, name, functional_currency_code, status \
         FROM legal_entities WHERE tenant_id = $1 AND {filter} ORDER BY id"
    );
    let mut query = sqlx::query_as::<_, LegalEntityRow>(&sql);
    for p in &params {
        query = query.bind(*p);
    }

    match query.fetch_all(&services.pool).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "legal_entities": rows }))).into_response(),
        Err(e) => errors::db_error_response(e),
    }
}

#[derive(Debug, Deserialize)]
struct OperatingUnitQuery {
    legal_entity_id: Option<i64>,
}

/// GET /org/operating-units - scoped list, optionally narrowed to one legal
/// entity (which itself must be reachable).
async fn list_operating_units(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<AuthSession>,
    Query(query_params): Query<OperatingUnitQuery>,
) -> axum::response::Response {
    let decision = match services.guard.authorize(&session, "org.tree.read").await {
        Ok(d) => d,
        Err(e) => return errors::guard_error_response(e),
    };

    let mut params = vec![decision.tenant_id.get()];
    let mut conditions = vec!["tenant_id = $1".to_string()];

    if let Some(legal_entity_id) = query_params.legal_entity_id {
        if let Err(e) =
            decision.assert_scope_access(ScopeKind::LegalEntity, legal_entity_id, "legalEntityId")
        {
            return errors::authz_error_response(e);
        }
        params.push(legal_entity_id);
        conditions.push(format!("legal_entity_id = ${}", params.len()));
    }

    conditions.push(decision.scope_filter(ScopeKind::OperatingUnit, "id", &mut params));

    let sql = format!(
        "SELECT id, legal_entity_id, code, name FROM operating_units WHERE {} ORDER BY id",
        conditions.join(" AND ")
    );
    let mut query = sqlx::query_as::<_, OperatingUnitRow>(&sql);
    for p in &params {
        query = query.bind(*p);
    }

    match query.fetch_all(&services.pool).await {
        Ok(rows) => (StatusCode::OK, Json(json!({ "operating_units": rows }))).into_response(),
        Err(e) => errors::db_error_response(e),
    }
}
