//! User identity as supplied by the identity provider.
//!
//! The canvas never creates or mutates identities; it only receives an
//! authenticated `{id, username}` pair or nothing at all.

use std::fmt;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Opaque user identifier.
///
/// Used as the key of the cooldown map and the distinct-user set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
#[schema(value_type = String)]
pub struct UserId(String);

impl UserId {
    /// Wraps an identifier string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Stable user identifier.
    pub id: UserId,
    /// Display name at the time of the request.
    pub username: String,
}

impl Identity {
    /// Creates an identity from its parts.
    #[must_use]
    pub fn new(id: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            id: UserId::new(id),
            username: username.into(),
        }
    }

    /// Builds an identity from optional request fields.
    ///
    /// Returns `None` (unauthenticated) when either part is missing or blank.
    #[must_use]
    pub fn from_parts(id: Option<String>, username: Option<String>) -> Option<Self> {
        let id = id.filter(|s| !s.trim().is_empty())?;
        let username = username.filter(|s| !s.trim().is_empty())?;
        Some(Self::new(id, username))
    }
}
