//! Mutation service: every write loads its target, asks the policy, applies
//! the change and persists it inside the store's transaction boundary.

pub mod comments;
pub mod likes;
pub mod posts;
pub mod replies;
pub mod users;

use crate::error::AppError;

/// Server-set timestamp for commentaires and reponses.
pub(crate) fn now_stamp() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Maps a missing row onto the domain error; everything else stays a
/// database failure.
pub(crate) fn not_found(err: rusqlite::Error) -> AppError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => AppError::NotFound,
        other => AppError::Database(other),
    }
}

pub(crate) fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}
