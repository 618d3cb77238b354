use rusqlite::params;
use serde::Deserialize;

use crate::auth::{password, session};
use crate::blobs;
use crate::db::models::{self, User};
use crate::error::{AppError, AppResult};
use crate::policy::{self, Actor, Operation, Target, ROLE_ADMIN, ROLE_USER};
use crate::service::{is_unique_violation, not_found};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct Register {
    pub username: String,
    pub password: String,
    pub avatar: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUser {
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub roles: Option<Vec<String>>,
    pub ban: Option<bool>,
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        roles: models::parse_roles(&row.get::<_, String>(2)?),
        avatar: row.get(3)?,
        ban: row.get(4)?,
    })
}

const USER_COLUMNS: &str = "id, username, roles, avatar, ban";

pub fn list(state: &AppState) -> AppResult<Vec<User>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM user ORDER BY id",
        USER_COLUMNS
    ))?;
    let users = stmt
        .query_map([], row_to_user)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(users)
}

pub fn get(state: &AppState, id: i64) -> AppResult<User> {
    let conn = state.db.get()?;
    conn.query_row(
        &format!("SELECT {} FROM user WHERE id = ?1", USER_COLUMNS),
        params![id],
        row_to_user,
    )
    .map_err(not_found)
}

pub fn find_by_username(state: &AppState, username: &str) -> AppResult<User> {
    let conn = state.db.get()?;
    conn.query_row(
        &format!("SELECT {} FROM user WHERE username = ?1", USER_COLUMNS),
        params![username],
        row_to_user,
    )
    .map_err(not_found)
}

/// Verify credentials and issue a bearer token.
pub fn login(state: &AppState, username: &str, plaintext: &str) -> AppResult<String> {
    if username.is_empty() || plaintext.is_empty() {
        return Err(AppError::Unauthenticated);
    }

    let (id, hash): (i64, String) = {
        let conn = state.db.get()?;
        conn.query_row(
            "SELECT id, password FROM user WHERE username = ?1",
            params![username],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )
        .map_err(not_found)?
    };

    if !password::verify(plaintext, &hash) {
        return Err(AppError::Unauthenticated);
    }

    session::create_session(&state.db, id, state.config.auth.session_hours)
}

pub fn register(state: &AppState, req: Register) -> AppResult<User> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() || req.avatar.is_empty() {
        return Err(AppError::Validation(
            "username, password and avatar are required".into(),
        ));
    }

    let decoded = blobs::decode_data_url(&req.avatar)?;
    let key = blobs::avatar_key(&username, &decoded.format);
    let hash = password::hash(&req.password)?;
    let roles = vec![ROLE_USER.to_string()];

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    // Claim the username first so a clash cannot clobber an existing
    // user's avatar blob.
    let inserted = tx.execute(
        "INSERT INTO user (username, roles, password, ban) VALUES (?1, ?2, ?3, 0)",
        params![username, serde_json::to_string(&roles)?, hash],
    );
    if let Err(err) = inserted {
        if is_unique_violation(&err) {
            return Err(AppError::Conflict("username already taken".into()));
        }
        return Err(err.into());
    }
    let id = tx.last_insert_rowid();

    state.blobs.put(&key, &decoded.bytes)?;
    tx.execute("UPDATE user SET avatar = ?1 WHERE id = ?2", params![key, id])?;
    tx.commit()?;

    Ok(User {
        id,
        username,
        roles,
        avatar: Some(key),
        ban: false,
    })
}

pub fn update(state: &AppState, actor: &Actor, id: i64, req: UpdateUser) -> AppResult<User> {
    let mut user = get(state, id)?;
    policy::check(Some(actor), Operation::Update, &Target::User { id })?;

    // Role and ban switches are moderation, not self-service.
    if (req.roles.is_some() || req.ban.is_some()) && !actor.is_admin() {
        return Err(AppError::Forbidden);
    }

    let mut password_hash: Option<String> = None;
    if let Some(plaintext) = req.password.as_deref() {
        if plaintext.is_empty() {
            return Err(AppError::Validation("password must not be empty".into()));
        }
        password_hash = Some(password::hash(plaintext)?);
    }

    if let Some(roles) = req.roles {
        if roles.is_empty() || roles.iter().any(|r| r != ROLE_USER && r != ROLE_ADMIN) {
            return Err(AppError::Validation("unknown role tag".into()));
        }
        user.roles = roles;
    }
    if let Some(ban) = req.ban {
        user.ban = ban;
    }
    if let Some(data_url) = req.avatar.as_deref() {
        let decoded = blobs::decode_data_url(data_url)?;
        let key = blobs::avatar_key(&user.username, &decoded.format);
        if let Some(old) = user.avatar.as_deref() {
            if old != key {
                state.blobs.delete(old)?;
            }
        }
        state.blobs.put(&key, &decoded.bytes)?;
        user.avatar = Some(key);
    }

    let conn = state.db.get()?;
    match password_hash {
        Some(hash) => conn.execute(
            "UPDATE user SET roles = ?1, avatar = ?2, ban = ?3, password = ?4 WHERE id = ?5",
            params![
                serde_json::to_string(&user.roles)?,
                user.avatar,
                user.ban,
                hash,
                id
            ],
        )?,
        None => conn.execute(
            "UPDATE user SET roles = ?1, avatar = ?2, ban = ?3 WHERE id = ?4",
            params![serde_json::to_string(&user.roles)?, user.avatar, user.ban, id],
        )?,
    };

    Ok(user)
}

pub fn delete(state: &AppState, actor: &Actor, id: i64) -> AppResult<()> {
    let user = get(state, id)?;
    policy::check(Some(actor), Operation::Delete, &Target::User { id })?;

    // Gather blob names before the row goes away.
    let conn = state.db.get()?;
    let mut images: Vec<String> = {
        let mut stmt =
            conn.prepare("SELECT image FROM post WHERE user_id = ?1 AND image IS NOT NULL")?;
        let rows = stmt
            .query_map(params![id], |r| r.get(0))?
            .collect::<Result<Vec<_>, _>>()?;
        rows
    };
    if let Some(avatar) = user.avatar {
        images.push(avatar);
    }

    // One statement; the cascades take posts (and their children), likes,
    // commentaires, reponses and sessions atomically.
    conn.execute("DELETE FROM user WHERE id = ?1", params![id])?;

    for image in images {
        if let Err(err) = state.blobs.delete(&image) {
            tracing::warn!("Failed to delete image {}: {}", image, err);
        }
    }

    Ok(())
}
