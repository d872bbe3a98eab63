//! # Time Validity
//!
//! Built-in checks on the `exp`, `iat` and `nbf` claims.
//!
//! ## Order
//!
//! 1. Outdated: `exp <= now`
//! 2. Issued time: `exp < iat` or `now < iat`
//! 3. Not before: `now < nbf`
//!
//! The first failing check decides the error. A token with a valid window
//! always passes all three.

use super::errors::ClaimsError;
use shared_types::{Claims, Timestamp};

/// Check the validity window of `claims` against `now`.
///
/// # Errors
/// The first failing time check, or `MissingClaim` when the claim it needs is
/// absent.
pub fn check_time_validity(claims: &Claims, now: Timestamp) -> Result<(), ClaimsError> {
    let expiration = claims
        .expiration
        .ok_or(ClaimsError::MissingClaim { claim: "exp" })?;
    if expiration <= now {
        return Err(ClaimsError::Outdated { expiration, now });
    }

    let issued_at = claims
        .issued_at
        .ok_or(ClaimsError::MissingClaim { claim: "iat" })?;
    if expiration < issued_at || now < issued_at {
        return Err(ClaimsError::IssuedTimeInvalid {
            issued_at,
            expiration,
            now,
        });
    }

    let not_before = claims
        .not_before
        .ok_or(ClaimsError::MissingClaim { claim: "nbf" })?;
    if now < not_before {
        return Err(ClaimsError::NotBeforeInvalid { not_before, now });
    }

    Ok(())
}
