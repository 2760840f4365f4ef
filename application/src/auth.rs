//! Authorization of HTTP requests by session tokens.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    middleware::Next,
    response::{IntoResponse as _, Response},
    Extension,
};
use derive_more::{Display, Error as StdError};
use service::{
    command::{self, Command as _},
    domain::user::{self, session},
};
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use service::domain::User;

use crate::{define_error, Error, Service};

/// Session of the [`User`] who performed the current HTTP request.
///
/// Extracting it from a request which hasn't passed through [`authorize()`]
/// rejects the request as unauthorized.
#[derive(Clone, Debug)]
pub struct Session {
    /// ID of this [`Session`].
    pub id: session::Id,

    /// ID of the [`User`] associated with this [`Session`].
    pub user_id: user::Id,
}

#[async_trait]
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut http::request::Parts,
        _: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Self>()
            .cloned()
            .ok_or_else(|| AuthError::AuthorizationRequired.into())
    }
}

/// Middleware admitting only requests carrying a valid bearer token in their
/// `Authorization` header.
///
/// The verified [`Session`] is stored in the request extensions, so the
/// wrapped handlers may extract it.
pub async fn authorize(
    Extension(service): Extension<Service>,
    mut req: Request,
    next: Next,
) -> Response {
    match authenticate(&service, req.headers()).await {
        Ok(session) => {
            drop(req.extensions_mut().insert(session));
            next.run(req).await
        }
        Err(e) => {
            log::debug!("request is not authorized: {e}");
            Error::from(AuthError::AuthorizationRequired).into_response()
        }
    }
}

/// Authenticates the provided request `headers`.
///
/// # Errors
///
/// Errors if the headers don't carry a valid bearer token.
async fn authenticate(
    service: &Service,
    headers: &http::HeaderMap,
) -> Result<Session, CredentialsError> {
    use CredentialsError as E;

    let header = headers
        .get(http::header::AUTHORIZATION)
        .ok_or(E::MissingCredentials)?
        .to_str()
        .map_err(|_| E::MalformedCredentials)?;

    let mut parts = header.split(' ');
    let (Some(scheme), Some(token), None) =
        (parts.next(), parts.next(), parts.next())
    else {
        return Err(E::MalformedCredentials);
    };
    if !scheme.eq_ignore_ascii_case("bearer") {
        return Err(E::MalformedCredentials);
    }

    #[expect(unsafe_code, reason = "verified right away")]
    let token = unsafe { session::Token::new_unchecked(token.to_owned()) };
    let payload = service
        .execute(command::AuthorizeUserSession { token })
        .await
        .map_err(E::Unauthorized)?;

    Ok(Session {
        id: payload.session_id,
        user_id: payload.user_id,
    })
}

/// Reason of a request not being authorized.
#[derive(Debug, Display, StdError)]
enum CredentialsError {
    /// `Authorization` header is absent.
    #[display("missing `Authorization` header")]
    MissingCredentials,

    /// `Authorization` header is not a bearer token.
    #[display("malformed `Authorization` header")]
    MalformedCredentials,

    /// Bearer token failed verification.
    #[display("{_0}")]
    Unauthorized(Traced<command::authorize_user_session::ExecutionError>),
}

define_error! {
    enum AuthError {
        #[code = "AUTHORIZATION_REQUIRED"]
        #[status = UNAUTHORIZED]
        #[message = "Authorization required"]
        AuthorizationRequired,
    }
}

#[cfg(test)]
mod spec {
    use std::{
        sync::{
            atomic::{AtomicUsize, Ordering},
            Arc,
        },
        time::Duration,
    };

    use axum::{
        body::Body, middleware, routing::get, Extension, Json, Router,
    };
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
    use service::domain::user;
    use tower::ServiceExt as _;

    use crate::{test_service, Service};

    use super::{authorize, Session};

    fn router(service: Service, calls: Arc<AtomicUsize>) -> Router {
        Router::new()
            .route(
                "/me",
                get(move |session: Session| async move {
                    _ = calls.fetch_add(1, Ordering::SeqCst);
                    Json((session.id, session.user_id))
                }),
            )
            .route_layer(middleware::from_fn(authorize))
            .layer(Extension(service))
    }

    async fn call(
        router: Router,
        auth: Option<&str>,
    ) -> (http::StatusCode, serde_json::Value) {
        let mut req = http::Request::get("/me");
        if let Some(auth) = auth {
            req = req.header(http::header::AUTHORIZATION, auth);
        }
        let resp = router
            .oneshot(req.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    fn token(service: &Service, duration: Duration) -> String {
        service
            .token_maker()
            .create_token(user::Id::from("u1"), duration)
            .unwrap()
            .0
            .to_string()
    }

    #[tokio::test]
    async fn admits_valid_bearer_token() {
        let service = test_service();
        let calls = Arc::new(AtomicUsize::new(0));
        let (token, payload) = service
            .token_maker()
            .create_token(user::Id::from("u1"), Duration::from_secs(60))
            .unwrap();

        let (status, json) = call(
            router(service.clone(), calls.clone()),
            Some(&format!("Bearer {token}")),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);
        assert_eq!(
            json,
            serde_json::json!([payload.session_id.to_string(), "u1"]),
        );

        let (status, _) = call(
            router(service, calls.clone()),
            Some(&format!("bEaReR {token}")),
        )
        .await;
        assert_eq!(status, http::StatusCode::OK);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn requires_single_space_separator() {
        let service = test_service();
        let calls = Arc::new(AtomicUsize::new(0));
        let token = token(&service, Duration::from_secs(60));

        for auth in [
            format!("Bearer  {token}"),
            format!("Bearer\t{token}"),
            format!(" Bearer {token} "),
            format!("Bearer {token} "),
        ] {
            let (status, json) =
                call(router(service.clone(), calls.clone()), Some(&auth))
                    .await;
            assert_eq!(status, http::StatusCode::UNAUTHORIZED, "{auth:?}");
            assert_eq!(json["code"], "AUTHORIZATION_REQUIRED");
        }

        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_foreign_scheme_without_calling_handler() {
        let calls = Arc::new(AtomicUsize::new(0));

        let (status, json) = call(
            router(test_service(), calls.clone()),
            Some("Token abc"),
        )
        .await;

        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "AUTHORIZATION_REQUIRED");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_any_failure_alike() {
        let service = test_service();
        let calls = Arc::new(AtomicUsize::new(0));
        let token = token(&service, Duration::from_secs(60));
        let (header, claims, _) = {
            let mut parts = token.split('.');
            (
                parts.next().unwrap().to_owned(),
                parts.next().unwrap().to_owned(),
                parts.next().unwrap().to_owned(),
            )
        };
        let forged = format!(
            "{header}.{claims}.{}",
            URL_SAFE_NO_PAD.encode([0_u8; 32]),
        );

        let mut bodies = vec![];
        for auth in [
            None,
            Some(String::new()),
            Some("Bearer".to_owned()),
            Some(format!("Bearer {token} extra")),
            Some("Bearer abc".to_owned()),
            Some(format!("Bearer {forged}")),
        ] {
            let (status, json) =
                call(router(service.clone(), calls.clone()), auth.as_deref())
                    .await;
            assert_eq!(status, http::StatusCode::UNAUTHORIZED, "{auth:?}");
            bodies.push(json);
        }

        assert!(bodies.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_expired_token() {
        let service = test_service();
        let calls = Arc::new(AtomicUsize::new(0));
        let token = token(&service, Duration::from_secs(1));

        tokio::time::sleep(Duration::from_secs(2)).await;
        let (status, _) = call(
            router(service, calls.clone()),
            Some(&format!("Bearer {token}")),
        )
        .await;

        assert_eq!(status, http::StatusCode::UNAUTHORIZED);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn rejects_unguarded_session_extraction() {
        let router = Router::new()
            .route("/me", get(|_: Session| async { "unreachable" }));

        let resp = router
            .oneshot(
                http::Request::get("/me").body(Body::empty()).unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), http::StatusCode::UNAUTHORIZED);
    }
}
