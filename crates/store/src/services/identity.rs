//! Identity resolution.
//!
//! Maps the identifiers the presentation layer extracted from a request
//! (an authenticated user id, an anonymous session token, both, or
//! neither) to the single owner key the cart and order engines work with.
//! Read-only anonymous browsing never resolves an owner and does not go
//! through here.

use thiserror::Error;

use madrona_core::{OwnerKey, SessionToken, UserId};

/// Errors that can occur during identity resolution.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// The operation needs an owner but neither a user id nor a session
    /// token was supplied.
    #[error("a user id or session token is required")]
    IdentityRequired,
}

/// Resolve an owner key from the request's identifiers.
///
/// An authenticated user always wins over a session token when both are
/// present, so a shopper who logs in mid-session keeps acting as their
/// user identity.
///
/// # Errors
///
/// Returns [`IdentityError::IdentityRequired`] when neither identifier is
/// present.
pub fn resolve_owner(
    user_id: Option<UserId>,
    session_token: Option<SessionToken>,
) -> Result<OwnerKey, IdentityError> {
    match (user_id, session_token) {
        (Some(id), _) => Ok(OwnerKey::User(id)),
        (None, Some(token)) => Ok(OwnerKey::Session(token)),
        (None, None) => Err(IdentityError::IdentityRequired),
    }
}
