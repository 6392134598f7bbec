//! Authentication state for the current user.
//!
//! The session cookie is opaque here: its presence means logged in, and its
//! value is carried along as the bearer token. One [`AuthSession`] is owned
//! by whatever manages the session and lent to consumers by reference.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Name of the cookie that carries the session token.
pub const SESSION_COOKIE_NAME: &str = "user_session";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    token: Option<String>,
}

impl AuthSession {
    /// Initializes from the session cookie's value, if one was sent. An
    /// empty cookie counts as no cookie.
    pub fn init(cookie: Option<&str>) -> Self {
        let mut session = Self::default();
        session.update(cookie);
        session
    }

    /// Replaces the token, e.g. after the cookie is refreshed.
    pub fn update(
        &mut self,
        cookie: Option<&str>,
    ) {
        self.token = cookie
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        debug!(logged_in = self.is_logged_in(), "session updated");
    }

    /// Logs out.
    pub fn clear(&mut self) {
        if self.token.take().is_some() {
            info!("session cleared");
        }
    }

    pub fn is_logged_in(&self) -> bool {
        self.token.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Finds the session cookie in a raw `Cookie` header
    /// (`name=value; other=value`).
    pub fn from_cookie_header(header: &str) -> Self {
        let value = header.split(';').find_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            (name.trim() == SESSION_COOKIE_NAME).then_some(value)
        });
        Self::init(value)
    }
}
