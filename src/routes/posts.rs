use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};

use crate::db::models::Post;
use crate::error::AppResult;
use crate::extractors::CurrentUser;
use crate::service;
use crate::service::posts::{CreatePost, UpdatePost};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/posts", get(list).post(create))
        .route(
            "/api/posts/{id}",
            get(get_by_id).put(update).delete(remove),
        )
}

async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<Post>>> {
    Ok(Json(service::posts::list(&state)?))
}

async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Post>> {
    Ok(Json(service::posts::get(&state, id)?))
}

async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(req): Json<CreatePost>,
) -> AppResult<(StatusCode, Json<Post>)> {
    let post = service::posts::create(&state, &user.0, req)?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePost>,
) -> AppResult<Json<Post>> {
    Ok(Json(service::posts::update(&state, &user.0, id, req)?))
}

async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    service::posts::delete(&state, &user.0, id)?;
    Ok(StatusCode::NO_CONTENT)
}
