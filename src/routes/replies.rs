use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::Reponse;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::service;
use crate::service::replies::{CreateReponse, UpdateReponse};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/reponse", get(list).post(create))
        .route(
            "/api/reponse/{id}",
            get(get_by_id).put(update).delete(remove),
        )
}

async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Reponse>>> {
    Ok(Json(service::replies::list(&state)?))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Reponse>> {
    Ok(Json(service::replies::get(&state, id)?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateReponse>,
) -> AppResult<(StatusCode, Json<Reponse>)> {
    let reponse = service::replies::create(&state, &user.0, req)?;
    Ok((StatusCode::CREATED, Json(reponse)))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateReponse>,
) -> AppResult<Json<Reponse>> {
    Ok(Json(service::replies::update(&state, &user.0, id, req)?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    service::replies::delete(&state, &user.0, id)?;
    Ok(StatusCode::NO_CONTENT)
}
