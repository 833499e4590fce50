//! Cart and order ownership.
//!
//! Shoppers are identified either by an authenticated user id or by an
//! anonymous session token carried out-of-band by the presentation layer.
//! Exactly one of the two identifies the owner of a cart or order; the
//! tagged [`OwnerKey`] variant keeps that invariant in the type system
//! instead of scattering null-checks across the core.

use core::fmt;

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// Errors that can occur when parsing a [`SessionToken`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum SessionTokenError {
    /// The input string is empty.
    #[error("session token cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("session token must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
}

/// An opaque anonymous-session token.
///
/// The token value is minted by the presentation layer (typically a random
/// cookie value); the core only requires it to be a non-empty string of
/// bounded length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionToken(String);

impl SessionToken {
    /// Maximum token length in characters.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a session token from a string.
    ///
    /// # Errors
    ///
    /// Returns [`SessionTokenError`] if the string is empty or longer than
    /// [`Self::MAX_LENGTH`].
    pub fn parse(s: &str) -> Result<Self, SessionTokenError> {
        if s.is_empty() {
            return Err(SessionTokenError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(SessionTokenError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }
        Ok(Self(s.to_owned()))
    }

    /// Get the token as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The value a cart or order belongs to: an authenticated user or an
/// anonymous session - never both.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum OwnerKey {
    /// An authenticated user.
    User(UserId),
    /// An anonymous browser session.
    Session(SessionToken),
}

impl OwnerKey {
    /// The user id, if this key identifies an authenticated user.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User(id) => Some(*id),
            Self::Session(_) => None,
        }
    }

    /// The session token, if this key identifies an anonymous session.
    #[must_use]
    pub fn session_token(&self) -> Option<&SessionToken> {
        match self {
            Self::User(_) => None,
            Self::Session(token) => Some(token),
        }
    }
}

impl fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "user:{id}"),
            Self::Session(token) => write!(f, "session:{token}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_token_rejects_empty() {
        assert!(matches!(
            SessionToken::parse(""),
            Err(SessionTokenError::Empty)
        ));
    }

    #[test]
    fn session_token_rejects_overlong() {
        let long = "x".repeat(SessionToken::MAX_LENGTH + 1);
        assert!(matches!(
            SessionToken::parse(&long),
            Err(SessionTokenError::TooLong { .. })
        ));
    }

    #[test]
    fn session_token_accepts_typical_cookie_value() {
        let token = SessionToken::parse("3f0e8a6c-9c1d-4f6e-a5a4-0b9a2d7c1e44").unwrap();
        assert_eq!(token.as_str(), "3f0e8a6c-9c1d-4f6e-a5a4-0b9a2d7c1e44");
    }

    #[test]
    fn owner_key_accessors_are_exclusive() {
        let user = OwnerKey::User(UserId::new(7));
        assert_eq!(user.user_id(), Some(UserId::new(7)));
        assert!(user.session_token().is_none());

        let session = OwnerKey::Session(SessionToken::parse("abc").unwrap());
        assert!(session.user_id().is_none());
        assert_eq!(session.session_token().map(SessionToken::as_str), Some("abc"));
    }
}
