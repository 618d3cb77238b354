use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use crate::db::models::{Like, Post, User};
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::service;
use crate::service::users::{Register, UpdateUser};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SearchParams {
    pub username: String,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/inscription", post(register))
        .route("/api/users", get(list))
        .route("/api/users/search", get(search))
        .route(
            "/api/users/{id}",
            get(get_by_id).put(update).delete(remove),
        )
        .route("/api/users/{id}/posts", get(posts_of))
        .route("/api/users/{id}/like", get(likes_of))
}

async fn register(
    State(state): State<AppState>,
    Json(req): Json<Register>,
) -> AppResult<(StatusCode, Json<User>)> {
    let user = service::users::register(&state, req)?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<User>>> {
    Ok(Json(service::users::list(&state)?))
}

async fn search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<User>> {
    Ok(Json(service::users::find_by_username(
        &state,
        &params.username,
    )?))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<User>> {
    Ok(Json(service::users::get(&state, id)?))
}

async fn posts_of(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(service::posts::list_by_user(&state, id)?))
}

async fn likes_of(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Vec<Like>>> {
    Ok(Json(service::likes::list_by_user(&state, id)?))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateUser>,
) -> AppResult<Json<User>> {
    Ok(Json(service::users::update(&state, &user.0, id, req)?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    service::users::delete(&state, &user.0, id)?;
    Ok(StatusCode::NO_CONTENT)
}
