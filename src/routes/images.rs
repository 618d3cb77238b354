use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::error::{AppError, AppResult};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/images/{name}", get(serve))
}

/// Serves stored avatars and post images.
async fn serve(State(state): State<AppState>, Path(name): Path<String>) -> AppResult<Response> {
    let bytes = state
        .blobs
        .get(&name)
        // Malformed keys look the same as absent ones from outside.
        .map_err(|_| AppError::NotFound)?
        .ok_or(AppError::NotFound)?;

    let mime = mime_guess::from_path(&name).first_or_octet_stream();
    Ok(([(header::CONTENT_TYPE, mime.to_string())], bytes).into_response())
}
