//! Session [`Token`] issuing and verification.

pub mod jwt;

use std::{fmt, time::Duration};

use derive_more::{Display, Error as StdError, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::domain::user::{
    self,
    session::{self, Payload, Token},
};

pub use self::jwt::JwtMaker;

/// Issuer and verifier of session [`Token`]s.
///
/// Implementations own their signing secret, so may be shared across any
/// number of concurrent callers.
pub trait Maker: fmt::Debug + Send + Sync {
    /// Issues a new [`Token`] for the provided [`User`], valid for the
    /// provided `duration`.
    ///
    /// Returns the [`Payload`] signed into the [`Token`] as well, so its
    /// fields may be inspected without parsing the [`Token`] back.
    ///
    /// # Errors
    ///
    /// Errors if the [`Payload`] is invalid or fails to be signed.
    fn create_token(
        &self,
        user_id: user::Id,
        duration: Duration,
    ) -> Result<(Token, Payload), Traced<Error>>;

    /// Verifies the provided untrusted `token` and returns the [`Payload`]
    /// signed into it.
    ///
    /// # Errors
    ///
    /// Errors if the `token` is malformed, not signed by this [`Maker`], or
    /// its [`Payload`] is no longer valid.
    fn verify_token(&self, token: &str) -> Result<Payload, Traced<Error>>;
}

/// Error of a [`Maker`] operation.
#[derive(Debug, Display, From, StdError)]
pub enum Error {
    /// Signing secret is too short.
    #[display(
        "Secret must be at least {} bytes long, but is {_0} bytes",
        JwtMaker::MIN_SECRET_LEN,
    )]
    WeakKey(#[error(not(source))] usize),

    /// [`Payload`] to be signed is invalid.
    #[display("Failed to construct `Payload`: {_0}")]
    PayloadConstructionFailed(session::ValidationError),

    /// [`Payload`] failed to be signed.
    #[display("Failed to sign `Payload`: {_0}")]
    SigningFailed(jsonwebtoken::errors::Error),

    /// [`Token`] is not structured or encoded properly.
    #[display("Malformed `Token`: {_0}")]
    #[from]
    Malformed(Malformed),

    /// [`Token`] declares a signing algorithm other than the expected one.
    #[display("Unexpected `Token` signing algorithm: {_0}")]
    UnexpectedAlgorithm(#[error(not(source))] String),

    /// [`Token`] signature doesn't match its contents.
    #[display("`Token` signature mismatch")]
    BadSignature,

    /// [`Payload`] of the [`Token`] has expired.
    #[display("`Token` has expired")]
    Expired,

    /// [`Payload`] of the [`Token`] has empty identifiers.
    #[display("`Token` identifies nothing: {_0}")]
    MalformedIdentity(session::ValidationError),
}

impl Error {
    /// Classifies the provided [`session::ValidationError`] of an already
    /// signed [`Payload`].
    #[must_use]
    pub fn invalid_payload(err: session::ValidationError) -> Self {
        if err.is_expiry() {
            Self::Expired
        } else {
            Self::MalformedIdentity(err)
        }
    }
}

/// Reason of a [`Token`] being [`Error::Malformed`].
#[derive(Debug, Display, From, StdError)]
pub enum Malformed {
    /// [`Token`] doesn't consist of exactly three segments.
    #[display("expected 3 segments, found {_0}")]
    Segments(#[error(not(source))] usize),

    /// [`Token`] segment is not a valid base64url.
    #[display("invalid base64url: {_0}")]
    #[from]
    Base64(base64::DecodeError),

    /// [`Token`] header is not a valid JSON object.
    #[display("invalid header: {_0}")]
    #[from]
    Header(serde_json::Error),

    /// [`Token`] claims don't represent a [`Payload`].
    #[display("invalid claims: {_0}")]
    #[from]
    Claims(jsonwebtoken::errors::Error),
}
