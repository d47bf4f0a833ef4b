//! Authentication middleware and permission guard

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use common::token::AuthUser;
use rules::{Action, Resource, has_permission};
use tracing::warn;

use crate::{
    error::{ApiError, ApiResult},
    state::AppState,
};

/// Authentication middleware
///
/// Verifies the bearer access token, then reloads the account so that a
/// deactivation or role change applies to tokens already issued. The
/// caller goes into the request extensions as [`AuthUser`] carrying the
/// stored role.
pub async fn auth_middleware(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(ApiError::Unauthorized)?;

    let claims = state.verifier.verify_access(bearer.token()).map_err(|e| {
        warn!("Rejected access token: {}", e);
        ApiError::Unauthorized
    })?;

    let Some(account) = state.accounts.find_account(claims.id).await? else {
        warn!("Access token for unknown account {}", claims.id);
        return Err(ApiError::Unauthorized);
    };

    if !account.active {
        warn!("Access token used by disabled account {}", account.email);
        return Err(ApiError::Forbidden);
    }

    req.extensions_mut().insert(AuthUser {
        id: account.id,
        email: account.email,
        role: account.role,
    });

    Ok(next.run(req).await)
}

/// Fail with 403 unless the caller's role grants `action` on `resource`
pub fn authorize(user: &AuthUser, resource: Resource, action: Action) -> ApiResult<()> {
    if has_permission(Some(user), resource, action) {
        Ok(())
    } else {
        warn!(
            "Denied {} on {} to {} ({})",
            action, resource, user.email, user.role
        );
        Err(ApiError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rules::Role;
    use uuid::Uuid;

    fn caller(role: Role) -> AuthUser {
        AuthUser {
            id: Uuid::new_v4(),
            email: "agent@ministere.example".to_string(),
            role,
        }
    }

    #[test]
    fn test_authorize_follows_the_permission_table() {
        assert!(authorize(&caller(Role::Manager), Resource::Employe, Action::Update).is_ok());
        assert!(matches!(
            authorize(&caller(Role::User), Resource::Employe, Action::Update),
            Err(ApiError::Forbidden)
        ));
        assert!(matches!(
            authorize(&caller(Role::Manager), Resource::Stock, Action::Delete),
            Err(ApiError::Forbidden)
        ));
        assert!(authorize(&caller(Role::Admin), Resource::Audit, Action::Read).is_ok());
    }
}
