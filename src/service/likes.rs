use rusqlite::params;
use serde::Deserialize;

use crate::db::models::Like;
use crate::error::{AppError, AppResult};
use crate::policy::{self, Actor, Operation, Target};
use crate::service::{is_unique_violation, not_found};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateLike {
    pub post_id: i64,
    pub islike: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateLike {
    pub islike: bool,
}

fn row_to_like(row: &rusqlite::Row<'_>) -> rusqlite::Result<Like> {
    Ok(Like {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        islike: row.get(3)?,
    })
}

pub fn list(state: &AppState) -> AppResult<Vec<Like>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare("SELECT id, user_id, post_id, islike FROM \"like\" ORDER BY id")?;
    let likes = stmt
        .query_map([], row_to_like)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(likes)
}

pub fn get(state: &AppState, id: i64) -> AppResult<Like> {
    let conn = state.db.get()?;
    conn.query_row(
        "SELECT id, user_id, post_id, islike FROM \"like\" WHERE id = ?1",
        params![id],
        row_to_like,
    )
    .map_err(not_found)
}

pub fn list_by_user(state: &AppState, user_id: i64) -> AppResult<Vec<Like>> {
    crate::service::users::get(state, user_id)?;

    let conn = state.db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, user_id, post_id, islike FROM \"like\" WHERE user_id = ?1 ORDER BY id",
    )?;
    let likes = stmt
        .query_map(params![user_id], row_to_like)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(likes)
}

fn post_owner(state: &AppState, post_id: i64) -> AppResult<i64> {
    let conn = state.db.get()?;
    conn.query_row(
        "SELECT user_id FROM post WHERE id = ?1",
        params![post_id],
        |r| r.get(0),
    )
    .map_err(not_found)
}

pub fn create(state: &AppState, actor: &Actor, req: CreateLike) -> AppResult<Like> {
    policy::check(
        Some(actor),
        Operation::Create,
        &Target::Like { owner: actor.id },
    )?;

    // Reacting to your own post is off the table for everyone, admins
    // included: a data invariant, not an authorization rule.
    if post_owner(state, req.post_id)? == actor.id {
        return Err(AppError::SelfLike);
    }

    let conn = state.db.get()?;
    let inserted = conn.execute(
        "INSERT INTO \"like\" (user_id, post_id, islike) VALUES (?1, ?2, ?3)",
        params![actor.id, req.post_id, req.islike],
    );
    match inserted {
        Ok(_) => Ok(Like {
            id: conn.last_insert_rowid(),
            user_id: actor.id,
            post_id: req.post_id,
            islike: req.islike,
        }),
        // The UNIQUE(user_id, post_id) constraint carries the one-reaction
        // invariant, concurrent requests included.
        Err(err) if is_unique_violation(&err) => Err(AppError::Conflict(
            "you have already reacted to this post".into(),
        )),
        Err(err) => Err(err.into()),
    }
}

pub fn update(state: &AppState, actor: &Actor, id: i64, req: UpdateLike) -> AppResult<Like> {
    let mut like = get(state, id)?;
    policy::check(
        Some(actor),
        Operation::Update,
        &Target::Like {
            owner: like.user_id,
        },
    )?;

    if post_owner(state, like.post_id)? == actor.id {
        return Err(AppError::SelfLike);
    }

    like.islike = req.islike;

    let conn = state.db.get()?;
    conn.execute(
        "UPDATE \"like\" SET islike = ?1 WHERE id = ?2",
        params![like.islike, id],
    )?;

    Ok(like)
}

pub fn delete(state: &AppState, actor: &Actor, id: i64) -> AppResult<()> {
    let like = get(state, id)?;
    policy::check(
        Some(actor),
        Operation::Delete,
        &Target::Like {
            owner: like.user_id,
        },
    )?;

    let conn = state.db.get()?;
    conn.execute("DELETE FROM \"like\" WHERE id = ?1", params![id])?;
    Ok(())
}
