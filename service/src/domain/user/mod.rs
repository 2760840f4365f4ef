//! [`User`] definitions.

pub mod session;

use std::sync::LazyLock;

use argon2::{
    password_hash::{rand_core::OsRng, SaltString},
    Argon2, PasswordHasher as _, PasswordVerifier as _,
};
#[cfg(doc)]
use common::DateTime;
use common::{unit, DateTimeOf};
use derive_more::{AsRef, Debug, Display, From, Into};
use regex::Regex;
use secrecy::{zeroize::Zeroize, CloneableSecret};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use self::session::Payload;

/// Platform user.
#[derive(Clone, Debug)]
pub struct User {
    /// ID of this [`User`]
    pub id: Id,

    /// [`Name`] of this [`User`].
    pub name: Name,

    /// [`Email`] of this [`User`].
    pub email: Email,

    /// [`PasswordHash`] of this [`User`].
    pub password_hash: PasswordHash,

    /// [`DateTime`] when this [`User`] was created.
    pub created_at: CreationDateTime,
}

/// ID of a [`User`].
///
/// Opaque for everything except the storage generating it.
#[derive(
    AsRef,
    Clone,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    Into,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[as_ref(str)]
#[from(&str, String)]
#[serde(transparent)]
pub struct Id(String);

impl Id {
    /// Creates a new random [`Id`].
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Indicates whether this [`Id`] is empty, so references nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}


/// Name of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, PartialEq)]
#[as_ref(str, String)]
pub struct Name(String);

impl Name {
    /// Creates a new [`Name`] if the given `name` is valid.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Option<Self> {
        let name = name.into();
        Self::check(&name).then_some(Self(name))
    }

    /// Checks whether the given `name` is a valid [`Name`].
    fn check(name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        name.trim() == name && !name.is_empty() && name.len() <= 512
    }
}


/// Password of a [`User`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Password(#[debug(skip)] String);

impl Password {
    /// Minimum length of a [`Password`].
    pub const MIN_LEN: usize = 8;

    /// Maximum length of a [`Password`].
    pub const MAX_LEN: usize = 128;

    /// Creates a new [`Password`] if the given `password` is valid.
    #[must_use]
    pub fn new(password: impl Into<String>) -> Option<Self> {
        let password = password.into();
        Self::check(&password).then_some(Self(password))
    }

    /// Checks whether the given `password` is a valid [`Password`]:
    /// alphanumeric and between [`Password::MIN_LEN`] and
    /// [`Password::MAX_LEN`] characters long.
    fn check(password: impl AsRef<str>) -> bool {
        let password = password.as_ref();
        (Self::MIN_LEN..=Self::MAX_LEN).contains(&password.len())
            && password.chars().all(|c| c.is_ascii_alphanumeric())
    }
}


impl CloneableSecret for Password {}
impl Zeroize for Password {
    fn zeroize(&mut self) {
        self.0.zeroize();
    }
}

/// [Argon2id] hash of a [`User`]'s [`Password`] in the [PHC string format].
///
/// [Argon2id]: https://datatracker.ietf.org/doc/html/rfc9106
/// [PHC string format]: https://github.com/P-H-C/phc-string-format
#[derive(Clone, Debug, Display, Eq, PartialEq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Hashes the given [`Password`] with a random salt.
    ///
    /// # Errors
    ///
    /// Errors if [`Argon2`] fails to hash the [`Password`].
    pub fn new(
        password: &Password,
    ) -> Result<Self, argon2::password_hash::Error> {
        let salt = SaltString::generate(&mut OsRng);
        Ok(Self(
            Argon2::default()
                .hash_password(password.0.as_bytes(), &salt)?
                .to_string(),
        ))
    }

    /// Checks whether the given [`Password`] matches this [`PasswordHash`].
    #[must_use]
    pub fn verify(&self, password: &Password) -> bool {
        argon2::PasswordHash::new(&self.0).is_ok_and(|hash| {
            Argon2::default()
                .verify_password(password.0.as_bytes(), &hash)
                .is_ok()
        })
    }
}

/// Email address of a [`User`].
#[derive(AsRef, Clone, Debug, Display, Eq, Hash, PartialEq)]
#[as_ref(str, String)]
pub struct Email(String);

impl Email {
    /// Creates a new [`Email`] if the given `address` is valid.
    #[must_use]
    pub fn new(address: impl Into<String>) -> Option<Self> {
        let address = address.into();
        Self::check(&address).then_some(Self(address))
    }

    /// Checks whether the given `address` is a valid [`Email`].
    fn check(address: impl AsRef<str>) -> bool {
        /// Regular expression checking [`Email`] format.
        static REGEX: LazyLock<Regex> = LazyLock::new(|| {
            Regex::new(
                "^([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                  |\\x5c[\\x00-\\x7f])*\\x22)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x22([^\\x0d\\x22\\x5c\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x22))*\\x40\
                  ([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                     \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                  |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d)\
                  (\\x2e([^\\x00-\\x20\\x22\\x28\\x29\\x2c\\x2e\\x3a-\
                           \\x3c\\x3e\\x40\\x5b-\\x5d\\x7f-\\xff]+\
                        |\\x5b([^\\x0d\\x5b-\\x5d\\x80-\\xff]\
                        |\\x5c[\\x00-\\x7f])*\\x5d))*$",
            )
            .expect("valid regex")
        });

        REGEX.is_match(address.as_ref())
    }
}


/// [`DateTime`] when a [`User`] was created.
pub type CreationDateTime = DateTimeOf<(User, unit::Creation)>;

#[cfg(test)]
mod spec {
    use super::{Email, Id, Name, Password, PasswordHash};

    #[test]
    fn generated_ids_are_unique_and_non_empty() {
        let (a, b) = (Id::new(), Id::new());

        assert_ne!(a, b);
        assert!(!a.is_empty());
        assert!(Id::from("").is_empty());
        assert!(Id::from("  ").is_empty());
        assert!(!Id::from("u1").is_empty());
    }

    #[test]
    fn validates_name() {
        assert!(Name::new("John Doe").is_some());

        assert!(Name::new("").is_none());
        assert!(Name::new(" John").is_none());
        assert!(Name::new("x".repeat(513)).is_none());
    }

    #[test]
    fn validates_email() {
        assert!(Email::new("john@example.com").is_some());

        assert!(Email::new("john").is_none());
        assert!(Email::new("john@").is_none());
        assert!(Email::new("@example.com").is_none());
    }

    #[test]
    fn validates_password() {
        assert!(Password::new("password1").is_some());
        assert!(Password::new("12345678").is_some());

        assert!(Password::new("short1").is_none());
        assert!(Password::new("with space").is_none());
        assert!(Password::new("symbols!!").is_none());
        assert!(Password::new("a".repeat(129)).is_none());
    }

    #[test]
    fn hides_password_from_debug_output() {
        let password = Password::new("password1").unwrap();

        assert!(!format!("{password:?}").contains("password1"));
    }

    #[test]
    fn hashes_and_verifies_password() {
        let password = Password::new("password1").unwrap();

        let hash = PasswordHash::new(&password).unwrap();

        assert!(hash.to_string().starts_with("$argon2id$"));
        assert!(hash.verify(&password));
        assert!(!hash.verify(&Password::new("password2").unwrap()));
    }

    #[test]
    fn salts_every_hash() {
        let password = Password::new("password1").unwrap();

        assert_ne!(
            PasswordHash::new(&password).unwrap(),
            PasswordHash::new(&password).unwrap(),
        );
    }
}
