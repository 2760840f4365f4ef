//! [JWT] implementation of a [`Maker`].
//!
//! [JWT]: https://datatracker.ietf.org/doc/html/rfc7519

use std::time::Duration;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use derive_more::Debug;
use jsonwebtoken::{
    errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use secrecy::{ExposeSecret as _, SecretString};
use serde::Deserialize;
use tracerr::Traced;

use crate::domain::user::{
    self,
    session::{Payload, Token},
};

use super::{Error, Malformed, Maker};

/// [`Maker`] issuing [JWT]s signed with [HMAC-SHA256][1] over a shared
/// secret.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
/// [1]: https://datatracker.ietf.org/doc/html/rfc7518#section-3.2
#[derive(Debug)]
pub struct JwtMaker {
    /// Key signing issued [JWT]s.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    encoding_key: EncodingKey,

    /// Key verifying signatures of presented [JWT]s.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    #[debug(skip)]
    decoding_key: DecodingKey,

    /// [`Validation`] of presented [JWT]s.
    ///
    /// Only the signature is checked here, as [`Payload::validate()`] owns
    /// the rest.
    ///
    /// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
    validation: Validation,
}

impl JwtMaker {
    /// Minimum length (in bytes) of a secret.
    pub const MIN_SECRET_LEN: usize = 32;

    /// The only [`Algorithm`] issued and accepted.
    pub const ALGORITHM: Algorithm = Algorithm::HS256;

    /// Creates a new [`JwtMaker`] signing with the provided `secret`.
    ///
    /// # Errors
    ///
    /// Errors with [`Error::WeakKey`] if the `secret` is shorter than
    /// [`JwtMaker::MIN_SECRET_LEN`] bytes.
    pub fn new(secret: &SecretString) -> Result<Self, Traced<Error>> {
        let secret = secret.expose_secret().as_bytes();
        if secret.len() < Self::MIN_SECRET_LEN {
            return Err(tracerr::new!(Error::WeakKey(secret.len())));
        }

        let mut validation = Validation::new(Self::ALGORITHM);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        })
    }
}

impl Maker for JwtMaker {
    fn create_token(
        &self,
        user_id: user::Id,
        duration: Duration,
    ) -> Result<(Token, Payload), Traced<Error>> {
        let payload = Payload::new(user_id, duration)
            .map_err(|e| tracerr::new!(Error::PayloadConstructionFailed(e)))?;

        let token = jsonwebtoken::encode(
            &Header::new(Self::ALGORITHM),
            &payload,
            &self.encoding_key,
        )
        .map_err(|e| tracerr::new!(Error::SigningFailed(e)))?;

        // SAFETY: `jsonwebtoken::encode` always returns a valid `Token`.
        #[expect(unsafe_code, reason = "invariants are preserved")]
        let token = unsafe { Token::new_unchecked(token) };

        Ok((token, payload))
    }

    fn verify_token(&self, token: &str) -> Result<Payload, Traced<Error>> {
        use Error as E;

        let segments = token.split('.').collect::<Vec<_>>();
        let [header, claims, signature] = segments[..] else {
            return Err(tracerr::new!(E::Malformed(Malformed::Segments(
                segments.len(),
            ))));
        };

        let decode = |segment: &str| -> Result<Vec<u8>, Traced<Error>> {
            URL_SAFE_NO_PAD
                .decode(segment)
                .map_err(tracerr::from_and_wrap!(=> Malformed))
                .map_err(tracerr::map_from)
        };
        let header = decode(header)?;
        _ = decode(claims)?;
        _ = decode(signature)?;

        let header = serde_json::from_slice::<UntrustedHeader>(&header)
            .map_err(tracerr::from_and_wrap!(=> Malformed))
            .map_err(tracerr::map_from)?;
        if header.alg.parse::<Algorithm>().ok() != Some(Self::ALGORITHM) {
            return Err(tracerr::new!(E::UnexpectedAlgorithm(header.alg)));
        }

        let payload = jsonwebtoken::decode::<Payload>(
            token,
            &self.decoding_key,
            &self.validation,
        )
        .map_err(|e| {
            if matches!(e.kind(), ErrorKind::InvalidSignature) {
                tracerr::new!(E::BadSignature)
            } else {
                tracerr::new!(E::Malformed(Malformed::Claims(e)))
            }
        })?
        .claims;

        payload
            .validate()
            .map_err(|e| tracerr::new!(E::invalid_payload(e)))?;

        Ok(payload)
    }
}

/// Header of a presented [JWT], decoded before its signature is checked.
///
/// [JWT]: https://datatracker.ietf.org/doc/html/rfc7519
#[derive(Debug, Deserialize)]
struct UntrustedHeader {
    /// Declared signing algorithm.
    alg: String,
}
