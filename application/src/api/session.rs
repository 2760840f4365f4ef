//! User session-related definitions.

use axum::{Extension, Json};
use axum_extra::extract::WithRejection;
use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::user,
};

#[cfg(doc)]
use crate::api::User;
use crate::{
    api::{self, user::UserError},
    define_error, AsError, Error, Service,
};

/// Credentials of a [`User`] logging in.
#[derive(Clone, Debug, Deserialize)]
pub struct CreateRequest {
    /// Email of the [`User`].
    pub email: String,

    /// Password of the [`User`].
    pub password: String,
}

/// Newly issued session of a [`User`].
#[derive(Clone, Debug, Serialize)]
pub struct CreateResponse {
    /// Bearer token of the session.
    pub token: String,

    /// Email of the [`User`] the session is issued for.
    pub email: String,

    /// [`DateTime`] when the session was issued.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub issued_at: DateTime,

    /// [`DateTime`] when the session expires.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: DateTime,
}

impl From<command::create_user_session::Output> for CreateResponse {
    fn from(output: command::create_user_session::Output) -> Self {
        let command::create_user_session::Output {
            token,
            user,
            payload,
        } = output;
        Self {
            token: token.to_string(),
            email: user.email.to_string(),
            issued_at: payload.issued_at.coerce(),
            expires_at: payload.expires_at.coerce(),
        }
    }
}

/// Logs a [`User`] in by the provided credentials.
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_EMAIL`, `INVALID_PASSWORD` - credentials are malformed;
/// - `WRONG_CREDENTIALS` - credentials don't match any [`User`].
#[tracing::instrument(
    skip_all,
    fields(http.handler = "loginUser", otel.name = api::SPAN_NAME),
)]
pub async fn create(
    Extension(service): Extension<Service>,
    WithRejection(Json(req), _): WithRejection<Json<CreateRequest>, Error>,
) -> Result<Json<CreateResponse>, Error> {
    let CreateRequest { email, password } = req;
    let email = user::Email::new(email).ok_or(UserError::InvalidEmail)?;
    let password =
        user::Password::new(password).ok_or(UserError::InvalidPassword)?;

    service
        .execute(command::CreateUserSession {
            email,
            password: secrecy::SecretBox::init_with(move || password),
        })
        .await
        .map(|out| Json(out.into()))
        .map_err(AsError::into_error)
}

impl AsError for command::create_user_session::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        define_error! {
            enum Error {
                #[code = "WRONG_CREDENTIALS"]
                #[status = UNAUTHORIZED]
                #[message = "Provided credentials does not match any `User`"]
                WrongCredentials,
            }
        }

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Token(e) => e.try_as_error(),
            Self::Blocking(_) => None,
            Self::WrongCredentials => Some(Error::WrongCredentials.into()),
        }
    }
}
