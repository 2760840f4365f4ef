//! [`User`]-related definitions.

use axum::{extract::Path, Extension, Json};
use axum_extra::extract::WithRejection;
use common::DateTime;
use serde::{Deserialize, Serialize};
use service::{
    command::{self, Command as _},
    domain::{self, user},
    query, Query as _,
};

use crate::{
    api::{self, Message},
    define_error, AsError, Error, Service, Session,
};

/// A [`User`] of the system, as exposed to clients.
#[derive(Clone, Debug, Serialize)]
pub struct User {
    /// Unique identifier of this [`User`].
    pub id: user::Id,

    /// Name of this [`User`].
    pub name: String,

    /// Email address of this [`User`].
    pub email: String,

    /// [`DateTime`] when this [`User`] was created.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub created_at: DateTime,
}

impl From<domain::User> for User {
    fn from(user: domain::User) -> Self {
        let domain::User {
            id,
            name,
            email,
            password_hash: _,
            created_at,
        } = user;
        Self {
            id,
            name: name.to_string(),
            email: email.to_string(),
            created_at: created_at.coerce(),
        }
    }
}

/// Registration data of a new [`User`].
#[derive(Clone, Debug, Deserialize)]
pub struct CreateRequest {
    /// Name of the new [`User`].
    pub name: String,

    /// Email address of the new [`User`].
    pub email: String,

    /// Password of the new [`User`].
    pub password: String,
}

/// Registers a new [`User`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_NAME`, `INVALID_EMAIL`, `INVALID_PASSWORD` - the provided data
///   is malformed;
/// - `EMAIL_OCCUPIED` - the email is occupied by another [`User`].
#[tracing::instrument(
    skip_all,
    fields(http.handler = "createUser", otel.name = api::SPAN_NAME),
)]
pub async fn create(
    Extension(service): Extension<Service>,
    WithRejection(Json(req), _): WithRejection<Json<CreateRequest>, Error>,
) -> Result<Json<Message>, Error> {
    let CreateRequest {
        name,
        email,
        password,
    } = req;
    let name = user::Name::new(name).ok_or(UserError::InvalidName)?;
    let email = user::Email::new(email).ok_or(UserError::InvalidEmail)?;
    let password =
        user::Password::new(password).ok_or(UserError::InvalidPassword)?;

    let user = service
        .execute(command::CreateUser {
            name,
            email,
            password: secrecy::SecretBox::init_with(move || password),
        })
        .await
        .map_err(AsError::into_error)?;
    tracing::info!(user.id = %user.id, "user created");

    Ok(Json(Message {
        message: "User created successfully",
    }))
}

/// Response wrapping a single [`User`].
#[derive(Clone, Debug, Serialize)]
pub struct GetResponse {
    /// Requested [`User`].
    pub user: User,
}

/// Returns the [`User`] with the provided ID.
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_EXISTS` - no [`User`] has the provided ID.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "getUser",
        id = %id,
        otel.name = api::SPAN_NAME,
        session.id = %session.id,
    ),
)]
pub async fn get(
    Extension(service): Extension<Service>,
    session: Session,
    Path(id): Path<user::Id>,
) -> Result<Json<GetResponse>, Error> {
    service
        .execute(query::user::ById::by(id))
        .await
        .map_err(AsError::into_error)?
        .ok_or_else(|| UserError::NotExists.into())
        .map(|u| Json(GetResponse { user: u.into() }))
}

/// Response wrapping multiple [`User`]s.
#[derive(Clone, Debug, Serialize)]
pub struct ListResponse {
    /// [`User`]s ordered by their creation.
    pub users: Vec<User>,
}

/// Returns all the [`User`]s ordered by their creation.
///
/// # Errors
///
/// Errors if the storage fails.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "allUsers",
        otel.name = api::SPAN_NAME,
        session.id = %session.id,
    ),
)]
pub async fn list(
    Extension(service): Extension<Service>,
    session: Session,
) -> Result<Json<ListResponse>, Error> {
    let users = service
        .execute(query::users::List::by(()))
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(ListResponse {
        users: users.into_iter().map(Into::into).collect(),
    }))
}

/// Profile changes of the authenticated [`User`].
///
/// Absent or empty fields keep the current values.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateRequest {
    /// New name of the [`User`].
    pub name: Option<String>,

    /// New email address of the [`User`].
    pub email: Option<String>,
}

/// Updated profile of a [`User`] along with a re-issued session.
#[derive(Clone, Debug, Serialize)]
pub struct UpdateResponse {
    /// Bearer token of the re-issued session.
    pub new_token: String,

    /// Email address of the [`User`].
    pub email: String,

    /// Name of the [`User`].
    pub name: String,

    /// [`DateTime`] when the session was issued.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub issued_at: DateTime,

    /// [`DateTime`] when the session expires.
    #[serde(with = "common::datetime::serde::rfc3339")]
    pub expires_at: DateTime,
}

/// Updates the profile of the authenticated [`User`].
///
/// # Errors
///
/// Possible error codes:
/// - `INVALID_NAME`, `INVALID_EMAIL` - the provided data is malformed;
/// - `EMAIL_OCCUPIED` - the email is occupied by another [`User`];
/// - `USER_NOT_EXISTS` - the authenticated [`User`] is gone.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "updateUser",
        otel.name = api::SPAN_NAME,
        session.id = %session.id,
        user.id = %session.user_id,
    ),
)]
pub async fn update(
    Extension(service): Extension<Service>,
    session: Session,
    WithRejection(Json(req), _): WithRejection<Json<UpdateRequest>, Error>,
) -> Result<Json<UpdateResponse>, Error> {
    let UpdateRequest { name, email } = req;
    let name = name
        .filter(|n| !n.is_empty())
        .map(|n| user::Name::new(n).ok_or(UserError::InvalidName))
        .transpose()?;
    let email = email
        .filter(|e| !e.is_empty())
        .map(|e| user::Email::new(e).ok_or(UserError::InvalidEmail))
        .transpose()?;

    let command::update_user::Output {
        user,
        token,
        payload,
    } = service
        .execute(command::UpdateUser {
            user_id: session.user_id,
            name,
            email,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(UpdateResponse {
        new_token: token.to_string(),
        email: user.email.to_string(),
        name: user.name.to_string(),
        issued_at: payload.issued_at.coerce(),
        expires_at: payload.expires_at.coerce(),
    }))
}

/// Deletes the authenticated [`User`].
///
/// Sessions already issued to the [`User`] stay valid until they expire.
///
/// # Errors
///
/// Possible error codes:
/// - `USER_NOT_EXISTS` - the authenticated [`User`] is already gone.
#[tracing::instrument(
    skip_all,
    fields(
        http.handler = "deleteUser",
        otel.name = api::SPAN_NAME,
        session.id = %session.id,
        user.id = %session.user_id,
    ),
)]
pub async fn delete(
    Extension(service): Extension<Service>,
    session: Session,
) -> Result<Json<Message>, Error> {
    service
        .execute(command::DeleteUser {
            user_id: session.user_id,
        })
        .await
        .map_err(AsError::into_error)?;

    Ok(Json(Message {
        message: "User deleted successfully",
    }))
}

define_error! {
    enum UserError {
        #[code = "INVALID_NAME"]
        #[status = BAD_REQUEST]
        #[message = "`name` must be non-empty, untrimmed and at most 512 \
                     bytes long"]
        InvalidName,

        #[code = "INVALID_EMAIL"]
        #[status = BAD_REQUEST]
        #[message = "`email` must be a valid email address"]
        InvalidEmail,

        #[code = "INVALID_PASSWORD"]
        #[status = BAD_REQUEST]
        #[message = "`password` must be alphanumeric and 8 to 128 \
                     characters long"]
        InvalidPassword,

        #[code = "USER_NOT_EXISTS"]
        #[status = NOT_FOUND]
        #[message = "`User` with the provided ID does not exist"]
        NotExists,

        #[code = "EMAIL_OCCUPIED"]
        #[status = CONFLICT]
        #[message = "`email` is occupied by another `User`"]
        EmailOccupied,
    }
}

impl AsError for command::create_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PasswordHashing(_) | Self::Blocking(_) => None,
            Self::EmailOccupied(_) => Some(UserError::EmailOccupied.into()),
        }
    }
}

impl AsError for command::update_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::Token(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
            Self::EmailOccupied(_) => Some(UserError::EmailOccupied.into()),
        }
    }
}

impl AsError for command::delete_user::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::UserNotExists(_) => Some(UserError::NotExists.into()),
        }
    }
}
