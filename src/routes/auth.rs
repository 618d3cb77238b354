use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::session;
use crate::db::models::User;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::service;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/myself", get(myself))
}

async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let token = service::users::login(&state, &req.username, &req.password)?;
    Ok(Json(LoginResponse { token }))
}

async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<StatusCode> {
    if let Some(token) = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
    {
        session::delete_session(&state.db, token.trim())?;
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn myself(State(state): State<AppState>, user: CurrentUser) -> AppResult<Json<User>> {
    let me = service::users::get(&state, user.0.id)?;
    Ok(Json(me))
}
