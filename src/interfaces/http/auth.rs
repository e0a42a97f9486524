use crate::application::AppContext;
use crate::domain::identity::Identity;
use crate::domain::ports::IdentityProvider;
use crate::error::MarketError;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use tracing::debug;

/// The caller behind the request's bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl FromRequestParts<AppContext> for CurrentUser {
    type Rejection = MarketError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppContext,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| MarketError::Auth("Missing Authorization header".to_string()))?;
        let token = header
            .strip_prefix("Bearer ")
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| MarketError::Auth("Invalid Authorization format".to_string()))?;

        match state.identity.resolve(token).await? {
            Some(identity) => Ok(Self(identity)),
            None => {
                debug!(uri = %parts.uri, "Unknown bearer token");
                Err(MarketError::Auth("Invalid token".to_string()))
            }
        }
    }
}
