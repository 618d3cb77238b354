use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use rusqlite::params;

use crate::db::models;
use crate::error::AppError;
use crate::policy::Actor;
use crate::state::AppState;

/// The authenticated caller, resolved from the `Authorization: Bearer` header.
/// Returns 401 if the token is missing, unknown or expired.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Actor);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthenticated)?;

        let conn = state.db.get()?;
        conn.query_row(
            "SELECT u.id, u.username, u.roles, u.ban FROM sessions s \
             JOIN user u ON u.id = s.user_id \
             WHERE s.token = ?1 AND s.expires_at > datetime('now')",
            params![token],
            |row| {
                Ok(CurrentUser(Actor {
                    id: row.get(0)?,
                    username: row.get(1)?,
                    roles: models::parse_roles(&row.get::<_, String>(2)?),
                    banned: row.get(3)?,
                }))
            },
        )
        .map_err(|_| AppError::Unauthenticated)
    }
}

pub(crate) fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
}
