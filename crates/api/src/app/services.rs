//! Infrastructure wiring shared by all protected routes.

use std::sync::Arc;

use sqlx::PgPool;

use atlaserp_infra::{PostgresScopeStore, ScopeStore};

use crate::guard::PermissionGuard;

/// Services handed to handlers as a request extension.
pub struct AppServices {
    pub pool: PgPool,
    pub guard: PermissionGuard,
}

pub fn build_services(pool: PgPool) -> AppServices {
    let store: Arc<dyn ScopeStore> = Arc::new(PostgresScopeStore::new(pool.clone()));
    AppServices {
        pool,
        guard: PermissionGuard::new(store),
    }
}
