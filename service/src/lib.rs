//! Service contains the business logic of the application.
//!
//! List of available Cargo features:
#![doc = document_features::document_features!()]
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

pub mod command;
pub mod domain;
pub mod infra;
pub mod query;
pub mod read;
pub mod task;

use std::{sync::Arc, time};

use common::operations::{By, Start};
use derive_more::Debug;

#[cfg(doc)]
use domain::user::session::Payload;
#[cfg(doc)]
use infra::Database;

pub use self::{command::Command, query::Query, task::Task};

/// [`Service`] configuration.
#[derive(Clone, Debug)]
pub struct Config {
    /// [`infra::token::Maker`] issuing and verifying session tokens.
    pub token_maker: Arc<dyn infra::token::Maker>,

    /// Lifetime of a newly issued session [`Payload`].
    pub session_lifetime: time::Duration,

    /// [`task::LogUsersCount`] configuration.
    pub log_users_count: task::log_users_count::Config,
}

/// Domain service.
#[derive(Clone, Debug)]
pub struct Service<Db> {
    /// Configuration of this [`Service`].
    config: Config,

    /// [`Database`] of this [`Service`].
    database: Db,
}

impl<Db> Service<Db> {
    /// Creates a new [`Service`] with the provided parameters.
    pub fn new(config: Config, database: Db) -> (Self, task::Background)
    where
        Self: Task<
                Start<
                    By<
                        task::LogUsersCount<Self>,
                        task::log_users_count::Config,
                    >,
                >,
                Ok = (),
                Err: std::error::Error,
            > + Clone
            + 'static,
    {
        let this = Service { config, database };

        let mut bg = task::Background::default();
        let svc = this.clone();
        bg.spawn(async move {
            svc.execute(Start(By::new(svc.config().log_users_count)))
                .await
        });

        (this, bg)
    }

    /// Returns [`Config`] of this [`Service`].
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns [`Database`] of this [`Service`].
    #[must_use]
    pub fn database(&self) -> &Db {
        &self.database
    }

    /// Returns [`infra::token::Maker`] of this [`Service`].
    #[must_use]
    pub fn token_maker(&self) -> &dyn infra::token::Maker {
        &*self.config.token_maker
    }
}

/// Creates a [`Service`] over the provided [`Database`] without running any
/// background [`Task`]s.
#[cfg(test)]
fn test_service<Db>(database: Db) -> Service<Db> {
    use secrecy::SecretString;

    let secret = SecretString::from("0123456789abcdef0123456789abcdef".to_owned());
    Service {
        config: Config {
            token_maker: Arc::new(
                infra::token::JwtMaker::new(&secret)
                    .expect("32 bytes secret is strong enough"),
            ),
            session_lifetime: time::Duration::from_secs(60),
            log_users_count: task::log_users_count::Config {
                interval: time::Duration::from_secs(10),
            },
        },
        database,
    }
}
