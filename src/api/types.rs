//! Shared types for the API layer.

use std::sync::Arc;

use crate::app_state::AppState;
use crate::models::enums::UserRole;

/// Shared context for all API routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub state: Arc<AppState>,
}

impl ApiContext {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }
}

/// Authenticated session context, injected into request extensions by the
/// auth middleware after token verification.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub user_id: String,
    pub role: UserRole,
    /// The raw bearer token, kept so logout can invalidate it.
    pub token: String,
}

impl SessionContext {
    pub fn is_client(&self) -> bool {
        self.role == UserRole::Cliente
    }

    pub fn is_lawyer(&self) -> bool {
        self.role == UserRole::Abogado
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_helpers() {
        let client = SessionContext {
            user_id: "u1".into(),
            role: UserRole::Cliente,
            token: "t".into(),
        };
        assert!(client.is_client());
        assert!(!client.is_lawyer());

        let lawyer = SessionContext {
            user_id: "u2".into(),
            role: UserRole::Abogado,
            token: "t".into(),
        };
        assert!(lawyer.is_lawyer());
        assert!(!lawyer.is_client());
    }
}
