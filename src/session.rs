//! Per-request session context.
//!
//! Handlers receive a [`SessionContext`] instead of reaching for the raw
//! cookie session, so every key the application stores lives in one place.

use actix_session::config::{PersistentSession, TtlExtensionPolicy};
use actix_session::storage::CookieSessionStore;
use actix_session::{Session, SessionExt, SessionMiddleware};
use actix_web::cookie::{time::Duration, Key};
use actix_web::{dev::Payload, FromRequest, HttpRequest};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use subtle::ConstantTimeEq;

use crate::auth;
use crate::error::AppError;

pub const SESSION_COOKIE: &str = "review_session";

const USER_ID_KEY: &str = "user_id";
const USERNAME_KEY: &str = "username";
const FLASHES_KEY: &str = "_flashes";
const CSRF_KEY: &str = "csrf_token";

/// Signed, encrypted cookie store. Without a TTL the cookie lives as long as
/// the browser session; with one it is extended on every request.
pub fn session_middleware(
    key: Key,
    cookie_secure: bool,
    ttl_secs: Option<i64>,
) -> SessionMiddleware<CookieSessionStore> {
    let builder = SessionMiddleware::builder(CookieSessionStore::default(), key)
        .cookie_name(SESSION_COOKIE.to_owned())
        .cookie_secure(cookie_secure);
    match ttl_secs {
        Some(secs) => builder
            .session_lifecycle(
                PersistentSession::default()
                    .session_ttl(Duration::seconds(secs))
                    .session_ttl_extension_policy(TtlExtensionPolicy::OnEveryRequest),
            )
            .build(),
        None => builder.build(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionUser {
    pub id: i64,
    pub username: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl FlashLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            FlashLevel::Success => "success",
            FlashLevel::Info => "info",
            FlashLevel::Warning => "warning",
            FlashLevel::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub level: FlashLevel,
    pub message: String,
}

#[derive(Clone)]
pub struct SessionContext(Session);

impl SessionContext {
    pub fn new(session: Session) -> Self {
        Self(session)
    }

    /// The logged-in user, if both halves of the identity are present.
    pub fn user(&self) -> Result<Option<SessionUser>, AppError> {
        let id = self.0.get::<i64>(USER_ID_KEY)?;
        let username = self.0.get::<String>(USERNAME_KEY)?;
        Ok(match (id, username) {
            (Some(id), Some(username)) => Some(SessionUser { id, username }),
            _ => None,
        })
    }

    pub fn log_in(&self, user: &SessionUser) -> Result<(), AppError> {
        self.0.insert(USER_ID_KEY, user.id)?;
        self.0.insert(USERNAME_KEY, &user.username)?;
        Ok(())
    }

    /// Drops every key, including pending flashes and the CSRF token.
    pub fn log_out(&self) {
        self.0.clear();
    }

    pub fn flash(&self, level: FlashLevel, message: impl Into<String>) -> Result<(), AppError> {
        let mut flashes = self.0.get::<Vec<Flash>>(FLASHES_KEY)?.unwrap_or_default();
        flashes.push(Flash {
            level,
            message: message.into(),
        });
        self.0.insert(FLASHES_KEY, flashes)?;
        Ok(())
    }

    /// Pending flashes; each is returned exactly once.
    pub fn take_flashes(&self) -> Result<Vec<Flash>, AppError> {
        let flashes = self.0.get::<Vec<Flash>>(FLASHES_KEY)?.unwrap_or_default();
        if !flashes.is_empty() {
            self.0.remove(FLASHES_KEY);
        }
        Ok(flashes)
    }

    pub fn csrf_token(&self) -> Result<String, AppError> {
        if let Some(token) = self.0.get::<String>(CSRF_KEY)? {
            return Ok(token);
        }
        let token = auth::generate_token();
        self.0.insert(CSRF_KEY, &token)?;
        Ok(token)
    }

    pub fn verify_csrf(&self, submitted: &str) -> Result<bool, AppError> {
        Ok(match self.0.get::<String>(CSRF_KEY)? {
            Some(expected) => bool::from(expected.as_bytes().ct_eq(submitted.as_bytes())),
            None => false,
        })
    }
}

impl FromRequest for SessionContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(SessionContext::new(req.get_session())))
    }
}
