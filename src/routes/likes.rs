use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::Like;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::service;
use crate::service::likes::{CreateLike, UpdateLike};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/like", get(list).post(create))
        .route(
            "/api/like/{id}",
            get(get_by_id).put(update).delete(remove),
        )
}

async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Like>>> {
    Ok(Json(service::likes::list(&state)?))
}

async fn get_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> AppResult<Json<Like>> {
    Ok(Json(service::likes::get(&state, id)?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateLike>,
) -> AppResult<(StatusCode, Json<Like>)> {
    let like = service::likes::create(&state, &user.0, req)?;
    Ok((StatusCode::CREATED, Json(like)))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateLike>,
) -> AppResult<Json<Like>> {
    Ok(Json(service::likes::update(&state, &user.0, id, req)?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    service::likes::delete(&state, &user.0, id)?;
    Ok(StatusCode::NO_CONTENT)
}
