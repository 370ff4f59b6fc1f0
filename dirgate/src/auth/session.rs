//! Cookie Session Signing and Middleware

use std::fmt::Debug;

use actix_session::{
    SessionMiddleware,
    config::{BrowserSession, CookieContentSecurity, SessionLifecycle},
    storage::CookieSessionStore,
};
use actix_web::cookie::Key;
use anyhow::{Result, anyhow};

use crate::config::SessionCfg;

/// Minimum length of a configured signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Where the cookie signing key comes from.
#[derive(Clone, Default)]
pub enum KeySource {
    /// Fresh random key per process. Restarting logs everyone out.
    #[default]
    Generated,
    /// Key derived from a configured secret, stable across restarts.
    Secret(String),
}

impl Debug for KeySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Generated => write!(f, "KeySource::Generated"),
            Self::Secret(_) => write!(f, "KeySource::Secret(..)"),
        }
    }
}

impl KeySource {
    /// Produce the signing key.
    ///
    /// Must be called once per process, not once per worker, or each worker
    /// would reject the cookies signed by the others.
    pub fn key(&self) -> Result<Key> {
        match self {
            Self::Generated => Ok(Key::generate()),
            Self::Secret(secret) if secret.len() < MIN_SECRET_LEN => Err(anyhow!(
                "session secret must be at least {MIN_SECRET_LEN} bytes"
            )),
            Self::Secret(secret) => Ok(Key::derive_from(secret.as_bytes())),
        }
    }
}

/// Build the cookie session middleware.
pub fn session_middleware(key: Key, config: &SessionCfg) -> SessionMiddleware<CookieSessionStore> {
    let security = match config.private {
        true => CookieContentSecurity::Private,
        false => CookieContentSecurity::Signed,
    };
    SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(config.cookie_name())
        .cookie_secure(config.secure)
        .cookie_content_security(security)
        .session_lifecycle(SessionLifecycle::BrowserSession(BrowserSession::default()))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_secrets_are_refused() {
        assert!(KeySource::Secret("too short".to_owned()).key().is_err());
    }

    #[test]
    fn secret_keys_are_stable() {
        let secret = KeySource::Secret("x".repeat(MIN_SECRET_LEN));
        assert_eq!(
            secret.key().unwrap().master(),
            secret.key().unwrap().master()
        );
    }

    #[test]
    fn generated_keys_differ() {
        let a = KeySource::Generated.key().unwrap();
        let b = KeySource::Generated.key().unwrap();
        assert_ne!(a.master(), b.master());
    }

    #[test]
    fn debug_hides_secret() {
        let secret = KeySource::Secret("hunter2".repeat(8));
        assert!(!format!("{secret:?}").contains("hunter2"));
    }
}
