use serde::{Deserialize, Serialize};

use crate::policy::ROLE_USER;

/// A user as exposed by every read path. The password hash stays in the
/// store; credential checks go through a dedicated lookup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub avatar: Option<String>,
    pub ban: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub image: Option<String>,
    pub islock: bool,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commentaire {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub content: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reponse {
    pub id: i64,
    pub user_id: i64,
    pub commentaire_id: i64,
    pub content: String,
    pub date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
    pub islike: bool,
}

/// Roles are stored as a JSON array column. A row that fails to parse keeps
/// the base role rather than poisoning the whole read.
pub fn parse_roles(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_else(|_| vec![ROLE_USER.to_string()])
}
