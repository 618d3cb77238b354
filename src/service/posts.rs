use rusqlite::params;
use serde::Deserialize;

use crate::blobs;
use crate::db::models::Post;
use crate::error::{AppError, AppResult};
use crate::policy::{self, Actor, Operation, Target};
use crate::service::{not_found, users};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePost {
    pub image: Option<String>,
    #[serde(default)]
    pub islock: bool,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdatePost {
    pub image: Option<String>,
    pub islock: Option<bool>,
    pub description: Option<String>,
}

fn row_to_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        user_id: row.get(1)?,
        image: row.get(2)?,
        islock: row.get(3)?,
        description: row.get(4)?,
    })
}

pub fn list(state: &AppState) -> AppResult<Vec<Post>> {
    let conn = state.db.get()?;
    let mut stmt =
        conn.prepare("SELECT id, user_id, image, islock, description FROM post ORDER BY id")?;
    let posts = stmt
        .query_map([], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn get(state: &AppState, id: i64) -> AppResult<Post> {
    let conn = state.db.get()?;
    conn.query_row(
        "SELECT id, user_id, image, islock, description FROM post WHERE id = ?1",
        params![id],
        row_to_post,
    )
    .map_err(not_found)
}

pub fn list_by_user(state: &AppState, user_id: i64) -> AppResult<Vec<Post>> {
    // 404 for a user that does not exist, empty list for one with no posts.
    users::get(state, user_id)?;

    let conn = state.db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, user_id, image, islock, description FROM post WHERE user_id = ?1 ORDER BY id",
    )?;
    let posts = stmt
        .query_map(params![user_id], row_to_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn create(state: &AppState, actor: &Actor, req: CreatePost) -> AppResult<Post> {
    policy::check(Some(actor), Operation::Create, &Target::Post { owner: actor.id })?;

    let has_description = req
        .description
        .as_deref()
        .is_some_and(|d| !d.trim().is_empty());
    if !has_description && req.image.is_none() {
        return Err(AppError::Validation(
            "a post needs a description or an image".into(),
        ));
    }
    // Locking is a moderation switch, not an author one.
    if req.islock && !actor.is_admin() {
        return Err(AppError::Forbidden);
    }

    let decoded = req.image.as_deref().map(blobs::decode_data_url).transpose()?;

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    tx.execute(
        "INSERT INTO post (user_id, islock, description) VALUES (?1, ?2, ?3)",
        params![actor.id, req.islock, req.description],
    )?;
    let id = tx.last_insert_rowid();

    // The blob name needs the row id, so the image lands inside the same
    // transaction: a failed write rolls the post back.
    let image = match decoded {
        Some(img) => {
            let key = blobs::post_image_key(&actor.username, id, &img.format);
            state.blobs.put(&key, &img.bytes)?;
            tx.execute("UPDATE post SET image = ?1 WHERE id = ?2", params![key, id])?;
            Some(key)
        }
        None => None,
    };
    tx.commit()?;

    Ok(Post {
        id,
        user_id: actor.id,
        image,
        islock: req.islock,
        description: req.description,
    })
}

pub fn update(state: &AppState, actor: &Actor, id: i64, req: UpdatePost) -> AppResult<Post> {
    let mut post = get(state, id)?;
    policy::check(
        Some(actor),
        Operation::Update,
        &Target::Post {
            owner: post.user_id,
        },
    )?;

    if let Some(islock) = req.islock {
        if islock != post.islock && !actor.is_admin() {
            return Err(AppError::Forbidden);
        }
        post.islock = islock;
    }
    if let Some(description) = req.description {
        post.description = Some(description);
    }
    if let Some(data_url) = req.image.as_deref() {
        let decoded = blobs::decode_data_url(data_url)?;
        // Keyed by the owner's name, not the caller's: admins edit other
        // users' posts.
        let owner = users::get(state, post.user_id)?;
        let key = blobs::post_image_key(&owner.username, id, &decoded.format);
        if let Some(old) = post.image.as_deref() {
            if old != key {
                state.blobs.delete(old)?;
            }
        }
        state.blobs.put(&key, &decoded.bytes)?;
        post.image = Some(key);
    }

    let conn = state.db.get()?;
    conn.execute(
        "UPDATE post SET image = ?1, islock = ?2, description = ?3 WHERE id = ?4",
        params![post.image, post.islock, post.description, id],
    )?;

    Ok(post)
}

pub fn delete(state: &AppState, actor: &Actor, id: i64) -> AppResult<()> {
    let post = get(state, id)?;
    policy::check(
        Some(actor),
        Operation::Delete,
        &Target::Post {
            owner: post.user_id,
        },
    )?;

    // FK cascades take the post's commentaires, reponses and likes with it
    // in the same statement.
    let conn = state.db.get()?;
    conn.execute("DELETE FROM post WHERE id = ?1", params![id])?;

    if let Some(image) = post.image.as_deref() {
        if let Err(err) = state.blobs.delete(image) {
            tracing::warn!("Failed to delete image {}: {}", image, err);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testutil::{admin, banned, count, insert_post, member, test_state};

    const PNG: &str = "data:image/png;base64,aGVsbG8=";

    #[test]
    fn create_requires_description_or_image() {
        let state = test_state();
        let alice = member(&state.db, "alice");

        let err = create(
            &state,
            &alice,
            CreatePost {
                image: None,
                islock: false,
                description: Some("   ".into()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn create_persists_post_owned_by_actor() {
        let state = test_state();
        let alice = member(&state.db, "alice");

        let post = create(
            &state,
            &alice,
            CreatePost {
                image: None,
                islock: false,
                description: Some("hello".into()),
            },
        )
        .unwrap();

        assert_eq!(post.user_id, alice.id);
        assert_eq!(get(&state, post.id).unwrap().description.as_deref(), Some("hello"));
    }

    #[test]
    fn create_stores_image_under_deterministic_name() {
        let state = test_state();
        let alice = member(&state.db, "alice");

        let post = create(
            &state,
            &alice,
            CreatePost {
                image: Some(PNG.into()),
                islock: false,
                description: None,
            },
        )
        .unwrap();

        let key = format!("alicePost{}.png", post.id);
        assert_eq!(post.image.as_deref(), Some(key.as_str()));
        assert_eq!(state.blobs.get(&key).unwrap().unwrap(), b"hello");
    }

    #[test]
    fn create_with_bad_image_is_validation_and_leaves_no_row() {
        let state = test_state();
        let alice = member(&state.db, "alice");

        let err = create(
            &state,
            &alice,
            CreatePost {
                image: Some("data:text/plain;base64,aGVsbG8=".into()),
                islock: false,
                description: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(count(&state.db, "post"), 0);
    }

    #[test]
    fn locking_at_creation_is_admin_only() {
        let state = test_state();
        let root = admin(&state.db);
        let alice = member(&state.db, "alice");

        let err = create(
            &state,
            &alice,
            CreatePost {
                image: None,
                islock: true,
                description: Some("mine".into()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));

        let post = create(
            &state,
            &root,
            CreatePost {
                image: None,
                islock: true,
                description: Some("pinned".into()),
            },
        )
        .unwrap();
        assert!(post.islock);
    }

    #[test]
    fn banned_actor_cannot_create() {
        let state = test_state();
        let blocked = banned(&state.db, "test");

        let err = create(
            &state,
            &blocked,
            CreatePost {
                image: None,
                islock: false,
                description: Some("nope".into()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn update_by_non_owner_is_forbidden() {
        let state = test_state();
        let root = admin(&state.db);
        let alice = member(&state.db, "alice");
        let post_id = insert_post(&state.db, root.id, "admin post");

        let err = update(
            &state,
            &alice,
            post_id,
            UpdatePost {
                image: None,
                islock: None,
                description: Some("hijack".into()),
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn owner_updates_description_but_not_lock() {
        let state = test_state();
        let alice = member(&state.db, "alice");
        let post_id = insert_post(&state.db, alice.id, "before");

        let post = update(
            &state,
            &alice,
            post_id,
            UpdatePost {
                image: None,
                islock: None,
                description: Some("after".into()),
            },
        )
        .unwrap();
        assert_eq!(post.description.as_deref(), Some("after"));

        let err = update(
            &state,
            &alice,
            post_id,
            UpdatePost {
                image: None,
                islock: Some(true),
                description: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
    }

    #[test]
    fn admin_can_lock_any_post() {
        let state = test_state();
        let root = admin(&state.db);
        let alice = member(&state.db, "alice");
        let post_id = insert_post(&state.db, alice.id, "content");

        let post = update(
            &state,
            &root,
            post_id,
            UpdatePost {
                image: None,
                islock: Some(true),
                description: None,
            },
        )
        .unwrap();
        assert!(post.islock);
        // The owner is untouched.
        assert_eq!(post.user_id, alice.id);
    }

    #[test]
    fn replacing_an_image_deletes_the_previous_blob() {
        let state = test_state();
        let alice = member(&state.db, "alice");

        let post = create(
            &state,
            &alice,
            CreatePost {
                image: Some(PNG.into()),
                islock: false,
                description: None,
            },
        )
        .unwrap();
        let old_key = post.image.clone().unwrap();

        let updated = update(
            &state,
            &alice,
            post.id,
            UpdatePost {
                image: Some("data:image/jpeg;base64,d29ybGQ=".into()),
                islock: None,
                description: None,
            },
        )
        .unwrap();

        let new_key = updated.image.unwrap();
        assert_ne!(new_key, old_key);
        assert!(state.blobs.get(&old_key).unwrap().is_none());
        assert_eq!(state.blobs.get(&new_key).unwrap().unwrap(), b"world");
    }

    #[test]
    fn delete_cascades_to_children_and_blob() {
        let state = test_state();
        let root = admin(&state.db);
        let alice = member(&state.db, "alice");

        let post = create(
            &state,
            &alice,
            CreatePost {
                image: Some(PNG.into()),
                islock: false,
                description: Some("doomed".into()),
            },
        )
        .unwrap();

        let conn = state.db.get().unwrap();
        conn.execute(
            "INSERT INTO commentaire (user_id, post_id, content, date) \
             VALUES (?1, ?2, 'hi', '2024-01-01 00:00:00')",
            params![root.id, post.id],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO reponse (user_id, commentaire_id, content, date) \
             VALUES (?1, ?2, 'yo', '2024-01-01 00:00:00')",
            params![alice.id, conn.last_insert_rowid()],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO \"like\" (user_id, post_id, islike) VALUES (?1, ?2, 1)",
            params![root.id, post.id],
        )
        .unwrap();
        drop(conn);

        delete(&state, &alice, post.id).unwrap();

        assert_eq!(count(&state.db, "post"), 0);
        assert_eq!(count(&state.db, "commentaire"), 0);
        assert_eq!(count(&state.db, "reponse"), 0);
        assert_eq!(count(&state.db, "\"like\""), 0);
        assert!(state.blobs.get(&post.image.unwrap()).unwrap().is_none());
    }

    #[test]
    fn delete_by_non_owner_is_forbidden_and_post_survives() {
        let state = test_state();
        let root = admin(&state.db);
        let alice = member(&state.db, "alice");
        let post_id = insert_post(&state.db, root.id, "p1");

        let err = delete(&state, &alice, post_id).unwrap_err();
        assert!(matches!(err, AppError::Forbidden));
        assert!(get(&state, post_id).is_ok());
    }

    #[test]
    fn admin_deletes_any_post() {
        let state = test_state();
        let root = admin(&state.db);
        let alice = member(&state.db, "alice");
        let post_id = insert_post(&state.db, alice.id, "p1");

        delete(&state, &root, post_id).unwrap();
        assert!(matches!(get(&state, post_id), Err(AppError::NotFound)));
    }

    #[test]
    fn missing_post_is_not_found() {
        let state = test_state();
        let alice = member(&state.db, "alice");
        assert!(matches!(get(&state, 999), Err(AppError::NotFound)));
        assert!(matches!(
            delete(&state, &alice, 999),
            Err(AppError::NotFound)
        ));
    }
}
