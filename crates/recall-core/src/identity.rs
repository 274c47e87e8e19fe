//! Caller identity.
//!
//! Authentication happens outside this crate. Callers hand in a
//! [`CallContext`] that either carries a verified [`UserId`] or nothing.

use std::fmt;

use crate::domain::{RecallError, Result};

/// A verified user identifier, usable as a document id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(String);

impl UserId {
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.is_empty() {
            return Err(RecallError::invalid("user id must not be empty"));
        }
        if raw.contains('/') {
            return Err(RecallError::invalid(format!(
                "user id must not contain '/': {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Per-call request context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    user: Option<UserId>,
}

impl CallContext {
    /// A call with no verified identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(user: UserId) -> Self {
        Self { user: Some(user) }
    }

    pub fn user(&self) -> Option<&UserId> {
        self.user.as_ref()
    }

    /// The verified user, or `Unauthenticated`.
    pub fn require_user(&self) -> Result<&UserId> {
        self.user.as_ref().ok_or(RecallError::Unauthenticated)
    }
}
