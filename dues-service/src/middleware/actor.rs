//! Actor context extractor.
//!
//! The mobile/web frontends authenticate the user and forward the session
//! identity (`email`, role) as headers. The service treats that identity as
//! an opaque read-only input and scopes every per-user query by it.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const USER_EMAIL_HEADER: &str = "X-User-Email";
pub const USER_ROLE_HEADER: &str = "X-User-Role";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Admin,
}

/// Who is acting, extracted from request headers.
#[derive(Debug, Clone)]
pub struct ActorContext {
    /// Client identity; email is the natural key for all user-scoped data.
    pub email: String,
    pub role: Role,
}

impl ActorContext {
    pub fn require_admin(&self) -> Result<(), AppError> {
        match self.role {
            Role::Admin => Ok(()),
            Role::Client => Err(AppError::Forbidden(anyhow::anyhow!(
                "admin role required for this operation"
            ))),
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for ActorContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let email = parts
            .headers
            .get(USER_EMAIL_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| {
                AppError::Unauthorized(anyhow::anyhow!("Missing {} header", USER_EMAIL_HEADER))
            })?;

        let role = match parts
            .headers
            .get(USER_ROLE_HEADER)
            .and_then(|v| v.to_str().ok())
        {
            Some(value) if value.eq_ignore_ascii_case("admin") => Role::Admin,
            _ => Role::Client,
        };

        let span = tracing::Span::current();
        span.record("actor", email);

        Ok(ActorContext {
            email: email.to_string(),
            role,
        })
    }
}
