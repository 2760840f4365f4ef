//! [`Command`] for authorizing a session of a [`User`].

use tracerr::Traced;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    domain::user::session,
    infra::token,
    Service,
};

use super::Command;

/// [`Command`] for authorizing a session of a [`User`].
///
/// Doesn't touch the [`Database`]: a session stays valid until its
/// [`session::Payload`] expires, even if its [`User`] is gone.
///
/// [`Database`]: crate::infra::Database
#[derive(Clone, Debug)]
pub struct AuthorizeUserSession {
    /// [`session::Token`] to authorize.
    pub token: session::Token,
}

impl<Db> Command<AuthorizeUserSession> for Service<Db> {
    type Ok = session::Payload;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: AuthorizeUserSession,
    ) -> Result<Self::Ok, Self::Err> {
        let AuthorizeUserSession { token } = cmd;

        self.token_maker()
            .verify_token(token.as_ref())
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`AuthorizeUserSession`] [`Command`] execution.
pub type ExecutionError = token::Error;

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use crate::{
        domain::user::{self, session},
        infra::{token, Memory},
        test_service, Command as _,
    };

    use super::AuthorizeUserSession;

    #[tokio::test]
    async fn authorizes_issued_token() {
        let svc = test_service(Memory::default());
        let (token, payload) = svc
            .token_maker()
            .create_token(user::Id::from("u1"), Duration::from_secs(60))
            .unwrap();

        let authorized =
            svc.execute(AuthorizeUserSession { token }).await.unwrap();

        assert_eq!(authorized, payload);
    }

    #[tokio::test]
    async fn rejects_garbage() {
        let svc = test_service(Memory::default());

        #[expect(unsafe_code, reason = "testing invalid input")]
        let token = unsafe { session::Token::new_unchecked("abc".into()) };
        let err =
            svc.execute(AuthorizeUserSession { token }).await.unwrap_err();

        assert!(matches!(err.as_ref(), token::Error::Malformed(_)));
    }
}
