//! Permission extractors.
//!
//! [`Permit<R>`] runs the view-level permission check for resource `R`
//! against the request method before the body is read, so an anonymous
//! write is rejected with 401 regardless of its payload. Object-level checks
//! for authored content happen later through [`Permit::check_owner`].
//!
//! All decisions are delegated to [`yamdb_core::permissions::authorize`].

use std::marker::PhantomData;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use yamdb_core::error::CoreError;
use yamdb_core::permissions::{authorize, Access, Resource};
use yamdb_core::types::DbId;

use super::auth::{AuthUser, MaybeAuthUser};
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Associates a marker type with the resource it guards.
pub trait Guarded {
    const RESOURCE: Resource;
}

macro_rules! guarded {
    ($($name:ident => $resource:ident),* $(,)?) => {
        $(
            #[derive(Debug)]
            pub struct $name;

            impl Guarded for $name {
                const RESOURCE: Resource = Resource::$resource;
            }
        )*
    };
}

guarded! {
    Categories => Category,
    Genres => Genre,
    Titles => Title,
    Reviews => Review,
    Comments => Comment,
    Users => User,
    Profile => Profile,
}

/// Caller that passed the view-level check for `R` and the request method.
///
/// ```ignore
/// async fn create_genre(permit: Permit<Genres>, ApiJson(input): ApiJson<..>) -> AppResult<..> {
///     // only admins reach this point
/// }
/// ```
#[derive(Debug)]
pub struct Permit<R> {
    user: Option<AuthUser>,
    access: Access,
    _resource: PhantomData<R>,
}

impl<R: Guarded> Permit<R> {
    /// The authenticated caller, if any.
    pub fn user(&self) -> Option<&AuthUser> {
        self.user.as_ref()
    }

    /// The authenticated caller, or 401 if the request is anonymous.
    pub fn require_user(&self) -> AppResult<&AuthUser> {
        self.user.as_ref().ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Authentication credentials were not provided".into(),
            ))
        })
    }

    /// Object-level check against the author of the loaded object.
    pub fn check_owner(&self, owner: DbId) -> AppResult<()> {
        let actor = self.user.as_ref().map(AuthUser::actor);
        authorize(actor.as_ref(), self.access, R::RESOURCE, Some(owner))?;
        Ok(())
    }
}

impl<R: Guarded + Send> FromRequestParts<AppState> for Permit<R> {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let MaybeAuthUser(user) = MaybeAuthUser::from_request_parts(parts, state).await?;
        let access = Access::from_method(parts.method.as_str());
        let actor = user.as_ref().map(AuthUser::actor);

        authorize(actor.as_ref(), access, R::RESOURCE, None)?;

        Ok(Permit {
            user,
            access,
            _resource: PhantomData,
        })
    }
}
