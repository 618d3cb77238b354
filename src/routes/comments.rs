use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::Commentaire;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::service;
use crate::service::comments::{CreateCommentaire, UpdateCommentaire};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/commentaire", get(list).post(create))
        .route(
            "/api/commentaire/{id}",
            get(get_by_id).put(update).delete(remove),
        )
}

async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Commentaire>>> {
    Ok(Json(service::comments::list(&state)?))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Commentaire>> {
    Ok(Json(service::comments::get(&state, id)?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreateCommentaire>,
) -> AppResult<(StatusCode, Json<Commentaire>)> {
    let commentaire = service::comments::create(&state, &user.0, req)?;
    Ok((StatusCode::CREATED, Json(commentaire)))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdateCommentaire>,
) -> AppResult<Json<Commentaire>> {
    Ok(Json(service::comments::update(&state, &user.0, id, req)?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    service::comments::delete(&state, &user.0, id)?;
    Ok(StatusCode::NO_CONTENT)
}
