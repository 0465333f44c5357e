/// Authentication context for Axum handlers
///
/// The API server's JWT middleware validates the Bearer token and inserts
/// an [`AuthContext`] into the request extensions. Handlers extract it with
/// Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use axum::Extension;
/// use bitsleuth_shared::auth::middleware::AuthContext;
///
/// async fn handler(Extension(auth): Extension<AuthContext>) -> String {
///     format!("User: {}", auth.user_id)
/// }
/// ```

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;

/// Authentication context added to request extensions
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Authenticated user's email (audit log actor)
    pub email: String,
}

impl AuthContext {
    /// Builds an auth context from validated JWT claims
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            email: claims.email,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_claims() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id, "user@example.com".to_string(), 30);
        let ctx = AuthContext::from_claims(claims);
        assert_eq!(ctx.user_id, user_id);
        assert_eq!(ctx.email, "user@example.com");
    }
}
