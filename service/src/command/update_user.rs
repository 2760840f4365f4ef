//! [`Command`] for updating a [`User`] profile.

use common::operations::{By, Select, Update};
use derive_more::{Display, Error, From};
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Name};
use crate::{
    domain::{
        user::{self, session},
        User,
    },
    infra::{
        database::{self, USERS_EMAIL_KEY},
        token, Database,
    },
    Service,
};

use super::Command;

/// [`Command`] for updating a [`User`] profile.
///
/// Issues a new session, since the old one may carry a stale profile.
#[derive(Clone, Debug)]
pub struct UpdateUser {
    /// ID of the [`User`] to update.
    pub user_id: user::Id,

    /// New [`Name`] of the [`User`].
    ///
    /// [`None`] keeps the current one.
    pub name: Option<user::Name>,

    /// New [`Email`] of the [`User`].
    ///
    /// [`None`] keeps the current one.
    pub email: Option<user::Email>,
}

/// Output of [`UpdateUser`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Updated [`User`].
    pub user: User,

    /// [`session::Token`] of the newly issued session.
    pub token: session::Token,

    /// [`session::Payload`] signed into the [`Output::token`].
    pub payload: session::Payload,
}

impl<Db> Command<UpdateUser> for Service<Db>
where
    Db: Database<
            Select<By<Option<User>, user::Id>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + for<'l> Database<
            Select<By<Option<User>, &'l user::Email>>,
            Ok = Option<User>,
            Err = Traced<database::Error>,
        > + Database<Update<User>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateUser) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateUser {
            user_id,
            name,
            email,
        } = cmd;

        let mut user = self
            .database()
            .execute(Select(By::<Option<User>, _>::new(user_id.clone())))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::UserNotExists(user_id))
            .map_err(tracerr::wrap!())?;

        if let Some(email) = email.filter(|e| *e != user.email) {
            let occupant = self
                .database()
                .execute(Select(By::new(&email)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;
            if occupant.is_some() {
                return Err(tracerr::new!(E::EmailOccupied(email)));
            }
            user.email = email;
        }
        if let Some(name) = name {
            user.name = name;
        }

        self.database()
            .execute(Update(user.clone()))
            .await
            .map_err(|e| {
                if e.as_ref().is_unique_violation(Some(USERS_EMAIL_KEY)) {
                    tracerr::new!(E::EmailOccupied(user.email.clone()))
                } else {
                    tracerr::map_from(e)
                }
            })?;

        let (token, payload) = self
            .token_maker()
            .create_token(user.id.clone(), self.config().session_lifetime)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output {
            user,
            token,
            payload,
        })
    }
}

/// Error of [`UpdateUser`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// [`token::Maker`] error.
    #[display("Failed to issue `session::Token`: {_0}")]
    #[from]
    Token(token::Error),

    /// [`User`] doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),

    /// [`Email`] is already occupied by another [`User`].
    #[display("`{_0}` email is occupied")]
    EmailOccupied(#[error(not(source))] user::Email),
}

#[cfg(test)]
mod spec {
    use secrecy::SecretBox;

    use crate::{
        command::{update_user::ExecutionError, CreateUser},
        domain::{user, User},
        infra::Memory,
        test_service, Command as _, Service,
    };

    use super::UpdateUser;

    async fn create(svc: &Service<Memory>, email: &str) -> User {
        svc.execute(CreateUser {
            name: user::Name::new("John").unwrap(),
            email: user::Email::new(email).unwrap(),
            password: SecretBox::new(Box::new(
                user::Password::new("password1").unwrap(),
            )),
        })
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn updates_only_provided_fields() {
        let svc = test_service(Memory::default());
        let user = create(&svc, "john@example.com").await;

        let out = svc
            .execute(UpdateUser {
                user_id: user.id.clone(),
                name: Some(user::Name::new("Johnny").unwrap()),
                email: None,
            })
            .await
            .unwrap();

        assert_eq!(out.user.name.to_string(), "Johnny");
        assert_eq!(out.user.email, user.email);
        assert_eq!(out.payload.user_id, user.id);
        assert_eq!(
            svc.token_maker().verify_token(out.token.as_ref()).unwrap(),
            out.payload,
        );
    }

    #[tokio::test]
    async fn keeps_own_email() {
        let svc = test_service(Memory::default());
        let user = create(&svc, "john@example.com").await;

        let out = svc
            .execute(UpdateUser {
                user_id: user.id,
                name: None,
                email: Some(user.email.clone()),
            })
            .await
            .unwrap();

        assert_eq!(out.user.email, user.email);
    }

    #[tokio::test]
    async fn rejects_occupied_email() {
        let svc = test_service(Memory::default());
        let john = create(&svc, "john@example.com").await;
        let jane = create(&svc, "jane@example.com").await;

        let err = svc
            .execute(UpdateUser {
                user_id: john.id,
                name: None,
                email: Some(jane.email),
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::EmailOccupied(_)));
    }

    #[tokio::test]
    async fn rejects_unknown_user() {
        let svc = test_service(Memory::default());

        let err = svc
            .execute(UpdateUser {
                user_id: user::Id::from("ghost"),
                name: None,
                email: None,
            })
            .await
            .unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::UserNotExists(_)));
    }
}
