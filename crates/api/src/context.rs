use uuid::Uuid;

use atlaserp_core::{TenantId, UserId};

/// Authenticated request identity, extracted by the auth middleware.
///
/// Ids are optional on purpose: a token can verify and still carry a junk
/// subject or no tenant at all. The authorization pipeline turns the gaps
/// into BadRequest instead of the middleware guessing.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct AuthSession {
    pub user_id: Option<UserId>,
    pub tenant_id: Option<TenantId>,
}

impl AuthSession {
    pub fn new(user_id: Option<UserId>, tenant_id: Option<TenantId>) -> Self {
        Self { user_id, tenant_id }
    }
}

/// Per-request correlation id for log lines and error responses.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestId(pub Uuid);

impl RequestId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for RequestId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
