//! Ownership and role rules, decided without touching the store.
//!
//! Every mutation goes through [`can_perform`] with the acting identity and a
//! reduced view of the target. Admins may act on anything; banned accounts
//! lose all write access; everyone else only writes what they own. Reads are
//! public.

pub const ROLE_USER: &str = "ROLE_USER";
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// The identity performing an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
    pub banned: bool,
}

impl Actor {
    pub fn is_admin(&self) -> bool {
        self.roles.iter().any(|r| r == ROLE_ADMIN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

/// What an operation is aimed at, reduced to the fields the rules need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Post { owner: i64 },
    Commentaire { owner: i64 },
    Reponse { owner: i64 },
    Like { owner: i64 },
    User { id: i64 },
}

impl Target {
    fn owner(&self) -> i64 {
        match *self {
            Target::Post { owner }
            | Target::Commentaire { owner }
            | Target::Reponse { owner }
            | Target::Like { owner } => owner,
            Target::User { id } => id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    Forbidden,
}

pub fn can_perform(actor: Option<&Actor>, op: Operation, target: &Target) -> Decision {
    // Reads are public, listing and by-id alike.
    if op == Operation::Read {
        return Decision::Allow;
    }

    // No anonymous writes.
    let Some(actor) = actor else {
        return Decision::Deny(DenyReason::Unauthenticated);
    };

    // Admins may act on any resource.
    if actor.is_admin() {
        return Decision::Allow;
    }

    // Banned accounts lose every write, their own resources included.
    if actor.banned {
        return Decision::Deny(DenyReason::Forbidden);
    }

    match (op, target) {
        (Operation::Create, _) => Decision::Allow,
        // Users may update themselves; deleting an account is admin-only.
        (Operation::Update, Target::User { id }) if *id == actor.id => Decision::Allow,
        (_, Target::User { .. }) => Decision::Deny(DenyReason::Forbidden),
        (_, target) if target.owner() == actor.id => Decision::Allow,
        _ => Decision::Deny(DenyReason::Forbidden),
    }
}

/// Variant of [`can_perform`] for call sites that propagate the denial.
pub fn check(actor: Option<&Actor>, op: Operation, target: &Target) -> Result<(), DenyReason> {
    match can_perform(actor, op, target) {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => Err(reason),
    }
}
