//! [`Command`] for creating a new session of a [`User`].

use common::operations::{By, Select};
use derive_more::{Display, Error, From};
use secrecy::{ExposeSecret as _, SecretBox};
use tokio::task;
use tracerr::Traced;

#[cfg(doc)]
use crate::domain::user::{Email, Password};
use crate::{
    domain::{
        user::{self, session},
        User,
    },
    infra::{database, token, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new session of a [`User`] by its credentials.
#[derive(Clone, Debug)]
pub struct CreateUserSession {
    /// [`Email`] of a [`User`].
    pub email: user::Email,

    /// [`Password`] of a [`User`].
    pub password: SecretBox<user::Password>,
}

/// Output of [`CreateUserSession`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// [`session::Token`] of the created session.
    pub token: session::Token,

    /// [`User`] whose session has been created.
    pub user: User,

    /// [`session::Payload`] signed into the [`Output::token`].
    pub payload: session::Payload,
}

impl<Db> Command<CreateUserSession> for Service<Db>
where
    Db: for<'l> Database<
        Select<By<Option<User>, &'l user::Email>>,
        Ok = Option<User>,
        Err = Traced<database::Error>,
    >,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: CreateUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateUserSession { email, password } = cmd;

        let user = self
            .database()
            .execute(Select(By::new(&email)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::WrongCredentials)
            .map_err(tracerr::wrap!())?;

        let hash = user.password_hash.clone();
        let matches =
            task::spawn_blocking(move || hash.verify(password.expose_secret()))
                .await
                .map_err(tracerr::from_and_wrap!(=> E))?;
        if !matches {
            return Err(tracerr::new!(E::WrongCredentials));
        }

        let (token, payload) = self
            .token_maker()
            .create_token(user.id.clone(), self.config().session_lifetime)
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        Ok(Output {
            token,
            user,
            payload,
        })
    }
}

/// Error of [`CreateUserSession`] [`Command`] execution.
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

    /// Blocking task panicked or was cancelled.
    #[display("Blocking task failed: {_0}")]
    #[from]
    Blocking(task::JoinError),

    /// [`CreateUserSession`] contains wrong credentials.
    #[display("Wrong `User` credentials")]
    WrongCredentials,
}

#[cfg(test)]
mod spec {
    use common::DateTime;
    use secrecy::SecretBox;

    use crate::{
        command::{create_user_session::ExecutionError, CreateUser},
        domain::user,
        infra::Memory,
        test_service, Command as _,
    };

    use super::CreateUserSession;

    fn password(raw: &str) -> SecretBox<user::Password> {
        SecretBox::new(Box::new(user::Password::new(raw).unwrap()))
    }

    fn email() -> user::Email {
        user::Email::new("john@example.com").unwrap()
    }

    #[tokio::test]
    async fn issues_verifiable_token_by_credentials() {
        let svc = test_service(Memory::default());
        let user = svc
            .execute(CreateUser {
                name: user::Name::new("John").unwrap(),
                email: email(),
                password: password("password1"),
            })
            .await
            .unwrap();

        let out = svc
            .execute(CreateUserSession {
                email: email(),
                password: password("password1"),
            })
            .await
            .unwrap();

        assert_eq!(out.user.id, user.id);
        assert_eq!(out.payload.user_id, user.id);
        assert!(out.payload.issued_at.coerce::<()>() <= DateTime::now());

        let verified =
            svc.token_maker().verify_token(out.token.as_ref()).unwrap();
        assert_eq!(verified, out.payload);
    }

    #[tokio::test]
    async fn rejects_wrong_credentials() {
        let svc = test_service(Memory::default());
        drop(
            svc.execute(CreateUser {
                name: user::Name::new("John").unwrap(),
                email: email(),
                password: password("password1"),
            })
            .await
            .unwrap(),
        );

        let wrong_password = svc
            .execute(CreateUserSession {
                email: email(),
                password: password("password2"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            wrong_password.as_ref(),
            ExecutionError::WrongCredentials,
        ));

        let unknown_email = svc
            .execute(CreateUserSession {
                email: user::Email::new("jane@example.com").unwrap(),
                password: password("password1"),
            })
            .await
            .unwrap_err();
        assert!(matches!(
            unknown_email.as_ref(),
            ExecutionError::WrongCredentials,
        ));
    }
}
