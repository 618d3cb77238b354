use rusqlite::params;
use serde::Deserialize;

use crate::db::models::Reponse;
use crate::error::{AppError, AppResult};
use crate::policy::{self, Actor, Operation, Target};
use crate::service::{not_found, now_stamp};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateReponse {
    pub commentaire_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateReponse {
    pub content: String,
}

fn row_to_reponse(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reponse> {
    Ok(Reponse {
        id: row.get(0)?,
        user_id: row.get(1)?,
        commentaire_id: row.get(2)?,
        content: row.get(3)?,
        date: row.get(4)?,
    })
}

pub fn list(state: &AppState) -> AppResult<Vec<Reponse>> {
    let conn = state.db.get()?;
    let mut stmt = conn
        .prepare("SELECT id, user_id, commentaire_id, content, date FROM reponse ORDER BY id")?;
    let reponses = stmt
        .query_map([], row_to_reponse)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(reponses)
}

pub fn get(state: &AppState, id: i64) -> AppResult<Reponse> {
    let conn = state.db.get()?;
    conn.query_row(
        "SELECT id, user_id, commentaire_id, content, date FROM reponse WHERE id = ?1",
        params![id],
        row_to_reponse,
    )
    .map_err(not_found)
}

pub fn create(state: &AppState, actor: &Actor, req: CreateReponse) -> AppResult<Reponse> {
    policy::check(
        Some(actor),
        Operation::Create,
        &Target::Reponse { owner: actor.id },
    )?;

    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }

    let conn = state.db.get()?;
    // The parent commentaire must exist.
    conn.query_row(
        "SELECT id FROM commentaire WHERE id = ?1",
        params![req.commentaire_id],
        |r| r.get::<_, i64>(0),
    )
    .map_err(not_found)?;

    let date = now_stamp();
    conn.execute(
        "INSERT INTO reponse (user_id, commentaire_id, content, date) VALUES (?1, ?2, ?3, ?4)",
        params![actor.id, req.commentaire_id, content, date],
    )?;

    Ok(Reponse {
        id: conn.last_insert_rowid(),
        user_id: actor.id,
        commentaire_id: req.commentaire_id,
        content,
        date,
    })
}

pub fn update(state: &AppState, actor: &Actor, id: i64, req: UpdateReponse) -> AppResult<Reponse> {
    let mut reponse = get(state, id)?;
    policy::check(
        Some(actor),
        Operation::Update,
        &Target::Reponse {
            owner: reponse.user_id,
        },
    )?;

    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }

    reponse.content = content;
    reponse.date = now_stamp();

    let conn = state.db.get()?;
    conn.execute(
        "UPDATE reponse SET content = ?1, date = ?2 WHERE id = ?3",
        params![reponse.content, reponse.date, id],
    )?;

    Ok(reponse)
}

pub fn delete(state: &AppState, actor: &Actor, id: i64) -> AppResult<()> {
    let reponse = get(state, id)?;
    policy::check(
        Some(actor),
        Operation::Delete,
        &Target::Reponse {
            owner: reponse.user_id,
        },
    )?;

    let conn = state.db.get()?;
    conn.execute("DELETE FROM reponse WHERE id = ?1", params![id])?;
    Ok(())
}
