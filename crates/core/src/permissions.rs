//! Role-based permission evaluator.
//!
//! Every mutation right in the API is decided here. Handlers translate the
//! request into an ([`Actor`], [`Access`], [`Resource`], owner) tuple and call
//! [`authorize`]; nothing else compares roles.
//!
//! Evaluation happens in two stages, mirroring how handlers load data:
//!
//! 1. view level (`owner == None`): may this actor perform this kind of
//!    access on this kind of resource at all?
//! 2. object level (`owner == Some(author_id)`): for authored content, is the
//!    actor the author or privileged enough to act on someone else's object?

use crate::error::CoreError;
use crate::roles::Role;
use crate::types::DbId;

/// The authenticated caller, as far as permissions are concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub user_id: DbId,
    pub role: Role,
    pub is_superuser: bool,
}

impl Actor {
    fn is_admin(&self) -> bool {
        self.is_superuser || self.role.is_admin()
    }

    fn can_moderate(&self) -> bool {
        self.is_superuser || self.role.can_moderate()
    }
}

/// Kind of access requested, derived from the HTTP verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Create,
    Update,
    Delete,
}

impl Access {
    /// Map an HTTP method name onto an access kind.
    ///
    /// GET, HEAD and OPTIONS are safe reads; unknown verbs are treated as
    /// updates so they never slip through as reads.
    pub fn from_method(method: &str) -> Self {
        match method.to_ascii_uppercase().as_str() {
            "GET" | "HEAD" | "OPTIONS" => Access::Read,
            "POST" => Access::Create,
            "DELETE" => Access::Delete,
            _ => Access::Update,
        }
    }

    pub fn is_read(self) -> bool {
        self == Access::Read
    }
}

/// Resource kinds the evaluator knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Category,
    Genre,
    Title,
    Review,
    Comment,
    /// User administration (`/users/`, `/users/{username}/`).
    User,
    /// The caller's own profile (`/users/me/`).
    Profile,
}

impl Resource {
    fn is_catalog(self) -> bool {
        matches!(self, Resource::Category | Resource::Genre | Resource::Title)
    }

    fn is_authored(self) -> bool {
        matches!(self, Resource::Review | Resource::Comment)
    }
}

/// Decide whether `actor` may perform `access` on `resource`.
///
/// `owner` is the author id of the target object when one has been loaded.
/// Returns `Unauthorized` for anonymous callers that need an identity and
/// `Forbidden` for authenticated callers lacking the privilege.
pub fn authorize(
    actor: Option<&Actor>,
    access: Access,
    resource: Resource,
    owner: Option<DbId>,
) -> Result<(), CoreError> {
    let publicly_readable = resource.is_catalog() || resource.is_authored();
    if access.is_read() && publicly_readable {
        return Ok(());
    }

    let Some(actor) = actor else {
        return Err(CoreError::Unauthorized(
            "Authentication credentials were not provided".into(),
        ));
    };

    match resource {
        Resource::Category | Resource::Genre | Resource::Title | Resource::User => {
            if actor.is_admin() {
                Ok(())
            } else {
                Err(CoreError::Forbidden("Admin role required".into()))
            }
        }
        Resource::Review | Resource::Comment => match (access, owner) {
            (Access::Create, _) | (_, None) => Ok(()),
            (_, Some(author_id)) => {
                if author_id == actor.user_id || actor.can_moderate() {
                    Ok(())
                } else {
                    Err(CoreError::Forbidden(
                        "Only the author, a moderator or an admin may change this".into(),
                    ))
                }
            }
        },
        Resource::Profile => match access {
            Access::Read | Access::Update => Ok(()),
            Access::Create | Access::Delete => {
                Err(CoreError::Forbidden("Profiles cannot be created or deleted here".into()))
            }
        },
    }
}
