//! Session [`Payload`] definitions.

use std::time::Duration;

#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Display, Error, From, Into};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::user;
#[cfg(doc)]
use crate::domain::User;

/// Claims of a user session, signed into its [`Token`].
///
/// Never persisted: the whole lifetime of a session is encoded in its
/// [`Payload::expires_at`].
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Payload {
    /// ID of this session, unique per issued [`Token`].
    pub session_id: Id,

    /// ID of the [`User`] this session belongs to.
    #[serde(rename = "id")]
    pub user_id: user::Id,

    /// [`DateTime`] when this [`Payload`] was issued.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub issued_at: IssueDateTime,

    /// [`DateTime`] after which this [`Payload`] is no longer valid.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: ExpirationDateTime,
}

impl Payload {
    /// Creates a new [`Payload`] for the provided [`User`], valid for the
    /// provided `duration` since now.
    ///
    /// # Errors
    ///
    /// Errors if the created [`Payload`] is invalid right away, e.g. because
    /// of an empty `user_id` or a zero `duration`.
    pub fn new(
        user_id: user::Id,
        duration: Duration,
    ) -> Result<Self, ValidationError> {
        let issued_at = IssueDateTime::now();
        let expires_at = issued_at
            .checked_add(duration)
            .ok_or(ValidationError::LifetimeOutOfRange)?
            .coerce();

        let payload = Self {
            session_id: Id::new(),
            user_id,
            issued_at,
            expires_at,
        };
        payload.validate()?;

        Ok(payload)
    }

    /// Validates this [`Payload`] against the current time.
    ///
    /// # Errors
    ///
    /// See [`Payload::validate_at()`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.validate_at(common::DateTime::now())
    }

    /// Validates this [`Payload`] as of the provided `now`.
    ///
    /// # Errors
    ///
    /// Errors if:
    /// - this [`Payload`] has expired by `now`;
    /// - this [`Payload`] was issued after its expiration;
    /// - the session or [`User`] identifiers are empty.
    pub fn validate_at<Of: ?Sized>(
        &self,
        now: DateTimeOf<Of>,
    ) -> Result<(), ValidationError> {
        use ValidationError as E;

        let now: ExpirationDateTime = now.coerce();
        if now >= self.expires_at {
            return Err(E::Expired);
        }
        if self.issued_at.coerce::<(Payload, unit::Expiration)>()
            > self.expires_at
        {
            return Err(E::IssuedAfterExpiration);
        }
        if self.session_id.is_nil() {
            return Err(E::NilSessionId);
        }
        if self.user_id.is_empty() {
            return Err(E::EmptyUserId);
        }

        Ok(())
    }
}

/// Error of [`Payload`] validation.
#[derive(Clone, Copy, Debug, Display, Eq, Error, PartialEq)]
pub enum ValidationError {
    /// [`Payload`] has expired.
    #[display("`Payload` has expired")]
    Expired,

    /// [`Payload::issued_at`] is later than [`Payload::expires_at`].
    #[display("`Payload` is issued after its expiration")]
    IssuedAfterExpiration,

    /// [`Payload::expires_at`] cannot be represented.
    #[display("`Payload` lifetime is out of range")]
    LifetimeOutOfRange,

    /// [`Payload::session_id`] is nil.
    #[display("`Payload` has nil session ID")]
    NilSessionId,

    /// [`Payload::user_id`] is empty.
    #[display("`Payload` has empty `User` ID")]
    EmptyUserId,
}

impl ValidationError {
    /// Indicates whether this [`ValidationError`] is caused by the
    /// [`Payload`] time bounds rather than by its identifiers.
    #[must_use]
    pub fn is_expiry(&self) -> bool {
        match self {
            Self::Expired
            | Self::IssuedAfterExpiration
            | Self::LifetimeOutOfRange => true,
            Self::NilSessionId | Self::EmptyUserId => false,
        }
    }
}

/// ID of a session.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    PartialEq,
    Serialize,
)]
#[serde(transparent)]
pub struct Id(Uuid);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Indicates whether this [`Id`] is nil.
    #[must_use]
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

/// Signed bearer token carrying a [`Payload`].
#[derive(AsRef, Clone, Debug, Display)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// [`DateTime`] when a [`Payload`] was issued.
pub type IssueDateTime = DateTimeOf<(Payload, unit::Issuance)>;

/// [`DateTime`] of a [`Payload`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Payload, unit::Expiration)>;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use common::DateTime;
    use uuid::Uuid;

    use crate::domain::user;

    use super::{Id, Payload, ValidationError};

    #[test]
    fn creates_valid_payload() {
        let payload =
            Payload::new(user::Id::from("u1"), Duration::from_secs(60))
                .unwrap();

        assert_eq!(payload.user_id, user::Id::from("u1"));
        assert!(!payload.session_id.is_nil());
        assert_eq!(
            payload.expires_at.coerce::<()>()
                - payload.issued_at.coerce::<()>(),
            Duration::from_secs(60),
        );
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn regenerates_session_id() {
        let id = user::Id::from("u1");
        let a = Payload::new(id.clone(), Duration::from_secs(60)).unwrap();
        let b = Payload::new(id, Duration::from_secs(60)).unwrap();

        assert_ne!(a.session_id, b.session_id);
    }

    #[test]
    fn rejects_zero_duration() {
        assert_eq!(
            Payload::new(user::Id::from("u1"), Duration::ZERO).unwrap_err(),
            ValidationError::Expired,
        );
    }

    #[test]
    fn rejects_unrepresentable_duration() {
        assert_eq!(
            Payload::new(user::Id::from("u1"), Duration::MAX).unwrap_err(),
            ValidationError::LifetimeOutOfRange,
        );
    }

    #[test]
    fn rejects_empty_user_id() {
        assert_eq!(
            Payload::new(user::Id::from(""), Duration::from_secs(60))
                .unwrap_err(),
            ValidationError::EmptyUserId,
        );
    }

    #[test]
    fn expires_strictly_at_expiration() {
        let payload =
            Payload::new(user::Id::from("u1"), Duration::from_secs(60))
                .unwrap();

        let just_before = payload.expires_at - Duration::from_micros(1);
        assert!(payload.validate_at(just_before).is_ok());
        assert_eq!(
            payload.validate_at(payload.expires_at),
            Err(ValidationError::Expired),
        );
        assert_eq!(
            payload.validate_at(payload.expires_at + Duration::from_secs(1)),
            Err(ValidationError::Expired),
        );
    }

    #[test]
    fn rechecks_identifiers() {
        let mut payload =
            Payload::new(user::Id::from("u1"), Duration::from_secs(60))
                .unwrap();
        payload.session_id = Id::from(Uuid::nil());

        assert_eq!(payload.validate(), Err(ValidationError::NilSessionId));
    }

    #[test]
    fn rejects_inverted_lifetime() {
        let mut payload =
            Payload::new(user::Id::from("u1"), Duration::from_secs(60))
                .unwrap();
        payload.issued_at = (payload.expires_at + Duration::from_secs(1))
            .coerce();

        assert_eq!(
            payload.validate_at(DateTime::now()),
            Err(ValidationError::IssuedAfterExpiration),
        );
    }

    #[test]
    fn serializes_claims() {
        let payload =
            Payload::new(user::Id::from("u1"), Duration::from_secs(60))
                .unwrap();

        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["id"], "u1");
        assert_eq!(json["session_id"], payload.session_id.to_string());
        assert_eq!(json["issued_at"], payload.issued_at.to_rfc3339());
        assert_eq!(json["expires_at"], payload.expires_at.to_rfc3339());
        assert_eq!(
            serde_json::from_value::<Payload>(json).unwrap(),
            payload,
        );
    }
}
