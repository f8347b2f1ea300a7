use actix_web::{http::header, web, FromRequest};
use futures::future::{ready, LocalBoxFuture};
use thiserror::Error as ThisError;

use crate::{
  auth::token,
  schema::{Role, Session, User},
  types, App,
};

use super::Error;

/// The identity behind a request, resolved from the bearer token in
/// the `Authorization` header. An invalid or revoked token resolves
/// to `Anonymous`; protected handlers then fail with 401 through
/// [`Actor::require_user`], never 403.
#[derive(Debug)]
pub enum Actor {
  Anonymous,
  User(User),
}

impl Actor {
  pub fn require_user(self) -> Result<User, Error> {
    #[derive(Debug, ThisError)]
    #[error("Attempt to access an authenticated-only route")]
    struct Unauthenticated;
    match self {
      Self::User(n) => Ok(n),
      Self::Anonymous => Err(Error::from_context(
        types::Error::Unauthorized,
        Unauthenticated,
      )),
    }
  }

  /// The role gate. An empty role set admits any authenticated user;
  /// otherwise the user's role must be a member of `roles`.
  pub fn require_role(self, roles: &[Role]) -> Result<User, Error> {
    #[derive(Debug, ThisError)]
    #[error("Attempt to access a role-restricted route")]
    struct InsufficientRole;

    let user = self.require_user()?;
    if roles.is_empty() || roles.contains(&user.role) {
      Ok(user)
    } else {
      Err(Error::from_context(
        types::Error::Forbidden,
        InsufficientRole,
      ))
    }
  }
}

impl FromRequest for Actor {
  type Error = Error;
  type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

  fn from_request(
    req: &actix_web::HttpRequest,
    _payload: &mut actix_web::dev::Payload,
  ) -> Self::Future {
    let token = req
      .headers()
      .get(header::AUTHORIZATION)
      .and_then(|v| v.to_str().ok())
      .and_then(|v| v.strip_prefix("Bearer "));

    if let Some(token) = token {
      let Some(app) = req.app_data::<web::Data<App>>() else {
        #[derive(Debug, ThisError)]
        #[error("The web app has no available configuration")]
        struct NoConfig;
        return Box::pin(ready(Err(Error::from_context(
          types::Error::Internal,
          NoConfig,
        ))));
      };

      let app = app.clone();
      let token_hash = token::digest(token);
      Box::pin(async move {
        let ttl_secs = app
          .config
          .auth
          .session_ttl_secs
          .map(|ttl| ttl.get() as i64);

        // Consulted on every protected call, so it must observe the
        // latest revocations and role changes.
        let mut conn = app.db_read_prefer_primary().await?;
        match Session::resolve_user(&mut conn, &token_hash, ttl_secs).await? {
          Some(user) => Ok(Actor::User(user)),
          None => Ok(Actor::Anonymous),
        }
      })
    } else {
      Box::pin(ready(Ok(Actor::Anonymous)))
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use chrono::Utc;

  fn user_with_role(role: Role) -> User {
    User {
      id: crate::types::id::UserId(1),
      name: "Test User".into(),
      email: "user@example.com".into(),
      password_hash: "<phc>".into(),
      role,
      created_at: Utc::now().naive_utc(),
      updated_at: None,
      deleted_at: None,
    }
  }

  #[test]
  fn anonymous_is_unauthorized_before_forbidden() {
    let error = Actor::Anonymous
      .require_role(&[Role::Admin])
      .unwrap_err();
    assert_eq!(error.as_type(), &types::Error::Unauthorized);
  }

  #[test]
  fn wrong_role_is_forbidden() {
    let actor = Actor::User(user_with_role(Role::Candidate));
    let error = actor.require_role(&[Role::Admin]).unwrap_err();
    assert_eq!(error.as_type(), &types::Error::Forbidden);
  }

  #[test]
  fn role_sets_admit_members() {
    let actor = Actor::User(user_with_role(Role::Reviewer));
    let user = actor.require_role(&[Role::Reviewer, Role::Admin]).unwrap();
    assert_eq!(user.role, Role::Reviewer);
  }

  #[test]
  fn empty_role_set_admits_any_authenticated_user() {
    let actor = Actor::User(user_with_role(Role::Candidate));
    assert!(actor.require_role(&[]).is_ok());
  }
}
