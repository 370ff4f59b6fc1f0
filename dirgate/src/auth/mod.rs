//! Session Login Gate
//!
//! Identity is asserted by name only: whoever posts a name to the login form
//! is logged in as that name. This is only suitable for trusted networks.

use std::io;

use actix_session::Session;

use crate::error::ServeError;

mod guard;
mod session;

pub use guard::RequireLogin;
pub use session::{KeySource, MIN_SECRET_LEN, session_middleware};

/// Route serving the login form.
pub const LOGIN_PATH: &str = "/login";

/// Session key holding the logged in username.
const USER_KEY: &str = "user";

/// Username of an authenticated request.
///
/// Inserted into the request extensions by [`RequireLogin`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

/// Username bound to the session, if any.
///
/// Missing, tampered and undecodable sessions are all anonymous.
pub fn current_user(session: &Session) -> Option<String> {
    session
        .get::<String>(USER_KEY)
        .ok()
        .flatten()
        .filter(|user| !user.is_empty())
}

/// Mark the session as authenticated for `username`.
pub fn login(session: &Session, username: &str) -> Result<(), ServeError> {
    session.renew();
    session
        .insert(USER_KEY, username)
        .map_err(|err| ServeError::Internal(io::Error::other(err.to_string())))?;
    log::info!("user {username:?} logged in");
    Ok(())
}
