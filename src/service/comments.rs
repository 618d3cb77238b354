use rusqlite::params;
use serde::Deserialize;

use crate::db::models::Commentaire;
use crate::error::{AppError, AppResult};
use crate::policy::{self, Actor, Operation, Target};
use crate::service::{not_found, now_stamp};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateCommentaire {
    pub post_id: i64,
    pub content: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateCommentaire {
    pub content: String,
}

fn row_to_commentaire(row: &rusqlite::Row<'_>) -> rusqlite::Result<Commentaire> {
    Ok(Commentaire {
        id: row.get(0)?,
        user_id: row.get(1)?,
        post_id: row.get(2)?,
        content: row.get(3)?,
        date: row.get(4)?,
    })
}

pub fn list(state: &AppState) -> AppResult<Vec<Commentaire>> {
    let conn = state.db.get()?;
    let mut stmt =
        conn.prepare("SELECT id, user_id, post_id, content, date FROM commentaire ORDER BY id")?;
    let commentaires = stmt
        .query_map([], row_to_commentaire)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(commentaires)
}

pub fn get(state: &AppState, id: i64) -> AppResult<Commentaire> {
    let conn = state.db.get()?;
    conn.query_row(
        "SELECT id, user_id, post_id, content, date FROM commentaire WHERE id = ?1",
        params![id],
        row_to_commentaire,
    )
    .map_err(not_found)
}

pub fn create(state: &AppState, actor: &Actor, req: CreateCommentaire) -> AppResult<Commentaire> {
    policy::check(
        Some(actor),
        Operation::Create,
        &Target::Commentaire { owner: actor.id },
    )?;

    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }

    let conn = state.db.get()?;
    // The parent post must exist.
    conn.query_row(
        "SELECT id FROM post WHERE id = ?1",
        params![req.post_id],
        |r| r.get::<_, i64>(0),
    )
    .map_err(not_found)?;

    let date = now_stamp();
    conn.execute(
        "INSERT INTO commentaire (user_id, post_id, content, date) VALUES (?1, ?2, ?3, ?4)",
        params![actor.id, req.post_id, content, date],
    )?;

    Ok(Commentaire {
        id: conn.last_insert_rowid(),
        user_id: actor.id,
        post_id: req.post_id,
        content,
        date,
    })
}

pub fn update(
    state: &AppState,
    actor: &Actor,
    id: i64,
    req: UpdateCommentaire,
) -> AppResult<Commentaire> {
    let mut commentaire = get(state, id)?;
    policy::check(
        Some(actor),
        Operation::Update,
        &Target::Commentaire {
            owner: commentaire.user_id,
        },
    )?;

    let content = req.content.trim().to_string();
    if content.is_empty() {
        return Err(AppError::Validation("content must not be empty".into()));
    }

    commentaire.content = content;
    commentaire.date = now_stamp();

    let conn = state.db.get()?;
    conn.execute(
        "UPDATE commentaire SET content = ?1, date = ?2 WHERE id = ?3",
        params![commentaire.content, commentaire.date, id],
    )?;

    Ok(commentaire)
}

pub fn delete(state: &AppState, actor: &Actor, id: i64) -> AppResult<()> {
    let commentaire = get(state, id)?;
    policy::check(
        Some(actor),
        Operation::Delete,
        &Target::Commentaire {
            owner: commentaire.user_id,
        },
    )?;

    // Reponses under this commentaire go with it.
    let conn = state.db.get()?;
    conn.execute("DELETE FROM commentaire WHERE id = ?1", params![id])?;
    Ok(())
}
