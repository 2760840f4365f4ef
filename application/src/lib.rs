//! Application provides API for interacting with the [`Service`].

#![deny(
    nonstandard_style,
    rust_2018_idioms,
    rustdoc::all,
    trivial_casts,
    trivial_numeric_casts,
    unsafe_code
)]
#![forbid(non_ascii_idents)]
#![warn(
    clippy::allow_attributes,
    clippy::allow_attributes_without_reason,
    clippy::pedantic,
    clippy::wildcard_enum_match_arm,
    deprecated_in_future,
    missing_copy_implementations,
    missing_debug_implementations,
    missing_docs,
    unreachable_pub,
    unused_crate_dependencies,
    unused_import_braces,
    unused_labels,
    unused_lifetimes,
    unused_qualifications,
    unused_results
)]

pub mod api;
pub mod args;
pub mod auth;
pub mod config;
pub mod error;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Extension, Router,
};
// Used in binary.
use axum_client_ip as _;
use futures as _;
use tokio as _;
use tower_http as _;
use tracing_subscriber as _;

pub use self::{
    args::Args,
    auth::Session,
    config::Config,
    error::{AsError, Error},
};

/// [`Service`] with filled infrastructure dependencies.
///
/// [`Service`]: service::Service
pub type Service = service::Service<service::infra::Memory>;

/// Creates a new [`Router`] serving the HTTP API of the provided
/// [`Service`].
///
/// Routes operating on behalf of a user are guarded by
/// [`auth::authorize()`].
pub fn router(service: Service) -> Router {
    let authorized = Router::new()
        .route("/get-user/:id", get(api::user::get))
        .route("/all-users", get(api::user::list))
        .route("/update-user", put(api::user::update))
        .route("/delete-user", delete(api::user::delete))
        .route_layer(middleware::from_fn(auth::authorize));

    Router::new()
        .route("/", get(api::hello))
        .route("/create-user", post(api::user::create))
        .route("/login-user", post(api::session::create))
        .merge(authorized)
        .layer(Extension(service))
}

/// Creates a new [`Service`] with a fresh storage and a fixed secret.
#[cfg(test)]
fn test_service() -> Service {
    use std::{sync::Arc, time::Duration};

    use secrecy::SecretString;
    use service::infra::{token::JwtMaker, Memory};

    let secret =
        SecretString::from("0123456789abcdef0123456789abcdef".to_owned());
    let (service, _) = Service::new(
        service::Config {
            token_maker: Arc::new(
                JwtMaker::new(&secret).expect("32 bytes secret is strong"),
            ),
            session_lifetime: Duration::from_secs(60),
            log_users_count: service::task::log_users_count::Config {
                interval: Duration::from_secs(10),
            },
        },
        Memory::default(),
    );
    service
}
