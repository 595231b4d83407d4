//! Stand-in for the auth collaborator's session validation (§1: session
//! auth is an external collaborator's contract, not this core's concern).
//! This extractor only reads the caller identity the collaborator would
//! have already attached to the request; it performs no credential
//! checking of its own.

use crate::error::ApiError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use domainflow_core::Error;
use uuid::Uuid;

pub struct AuthedUser(pub Uuid);

impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .ok_or_else(|| Error::permission_denied("missing x-user-id (no authenticated session)"))?
            .to_str()
            .map_err(|_| Error::validation("x-user-id header is not valid UTF-8"))?;
        let id = Uuid::parse_str(raw).map_err(|_| Error::validation("x-user-id is not a valid uuid"))?;
        Ok(AuthedUser(id))
    }
}
