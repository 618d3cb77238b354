//! Demo dataset for local development: three accounts (one admin, one
//! regular, one banned), a few posts, likes and comment threads.

use rusqlite::params;

use crate::auth::password;
use crate::state::DbPool;

pub fn load(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    let count: i64 = conn.query_row("SELECT COUNT(*) FROM user", [], |r| r.get(0))?;
    if count > 0 {
        tracing::info!("Fixtures skipped, user table is not empty");
        return Ok(());
    }

    let users: &[(&str, &str, bool)] = &[
        ("root", r#"["ROLE_ADMIN"]"#, false),
        ("user", r#"["ROLE_USER"]"#, false),
        ("test", r#"["ROLE_USER"]"#, true),
    ];
    for (username, roles, ban) in users {
        // Demo passwords match the usernames.
        let hash = password::hash(username)?;
        conn.execute(
            "INSERT INTO user (username, roles, password, ban) VALUES (?1, ?2, ?3, ?4)",
            params![username, roles, hash, ban],
        )?;
    }

    conn.execute_batch(
        "INSERT INTO post (user_id, islock, description) VALUES
            (1, 0, 'Premier poste, bienvenue !'),
            (2, 0, 'Un deuxieme poste'),
            (3, 1, 'Un poste verrouille');

         INSERT INTO \"like\" (user_id, post_id, islike) VALUES
            (2, 1, 1),
            (2, 3, 0),
            (3, 2, 0),
            (1, 2, 1);

         INSERT INTO commentaire (user_id, post_id, content, date) VALUES
            (2, 1, 'ceci est un test', '2016-01-01 00:00:00'),
            (2, 3, 'ceci est le deuxieme commentaire', '2050-08-10 00:00:00'),
            (1, 3, 'un commentaire avec des reponses', '2055-08-10 00:00:00');

         INSERT INTO reponse (user_id, commentaire_id, content, date) VALUES
            (1, 3, 'Alpha', '2016-01-01 00:00:00'),
            (2, 3, 'Beta', '2050-08-10 00:00:00'),
            (3, 1, 'Omega', '2055-08-10 00:00:00');",
    )?;

    tracing::info!("Loaded demo fixtures");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use r2d2::Pool;
    use r2d2_sqlite::SqliteConnectionManager;
    use crate::state::DbPool;

    fn seeded_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory()
            .with_init(|c| c.execute_batch("PRAGMA foreign_keys = ON;"));
        let pool = Pool::builder().max_size(1).build(manager).unwrap();
        crate::db::run_migrations(&pool).unwrap();
        load(&pool).unwrap();
        pool
    }

    #[test]
    fn load_seeds_demo_accounts_and_content() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();

        let users: i64 = conn.query_row("SELECT COUNT(*) FROM user", [], |r| r.get(0)).unwrap();
        let posts: i64 = conn.query_row("SELECT COUNT(*) FROM post", [], |r| r.get(0)).unwrap();
        let likes: i64 = conn
            .query_row("SELECT COUNT(*) FROM \"like\"", [], |r| r.get(0))
            .unwrap();
        assert_eq!((users, posts, likes), (3, 3, 4));

        let banned: bool = conn
            .query_row("SELECT ban FROM user WHERE username = 'test'", [], |r| r.get(0))
            .unwrap();
        assert!(banned);
    }

    #[test]
    fn load_is_a_noop_on_populated_databases() {
        let pool = seeded_pool();
        load(&pool).unwrap();

        let conn = pool.get().unwrap();
        let users: i64 = conn.query_row("SELECT COUNT(*) FROM user", [], |r| r.get(0)).unwrap();
        assert_eq!(users, 3);
    }

    #[test]
    fn demo_passwords_verify() {
        let pool = seeded_pool();
        let conn = pool.get().unwrap();
        let hash: String = conn
            .query_row("SELECT password FROM user WHERE username = 'root'", [], |r| r.get(0))
            .unwrap();
        assert!(password::verify("root", &hash));
        assert!(!password::verify("wrong", &hash));
    }
}
