//! [`LogUsersCount`] [`Task`].

use std::{convert::Infallible, error::Error, time};

use common::operations::{By, Perform, Select, Start};
use tokio::time::interval;
use tracerr::Traced;
use tracing as log;

#[cfg(doc)]
use crate::domain::User;
use crate::{
    infra::{database, Database},
    read, Service,
};

use super::Task;

/// Configuration for [`LogUsersCount`] [`Task`].
#[derive(Clone, Copy, Debug)]
pub struct Config {
    /// Interval between [`User`]s counting.
    pub interval: time::Duration,
}

/// [`Task`] for periodic logging of the total [`User`]s count.
#[derive(Clone, Copy, Debug)]
pub struct LogUsersCount<S> {
    /// [`Config`] of this [`Task`].
    config: Config,

    /// [`Service`] instance.
    service: S,
}

impl<Db> Task<Start<By<LogUsersCount<Self>, Config>>> for Service<Db>
where
    LogUsersCount<Service<Db>>:
        Task<Perform<()>, Ok = read::user::TotalCount, Err: Error>
            + Send
            + Sync
            + 'static,
    Self: Clone,
{
    type Ok = ();
    type Err = Infallible;

    async fn execute(
        &self,
        Start(by): Start<By<LogUsersCount<Self>, Config>>,
    ) -> Result<Self::Ok, Self::Err> {
        let config = by.into_inner();
        let task = LogUsersCount {
            config,
            service: self.clone(),
        };

        let mut interval = interval(task.config.interval);
        loop {
            let _ = interval.tick().await;
            match task.execute(Perform(())).await {
                Ok(count) => log::info!("total users count: {count}"),
                Err(e) => log::error!("`task::LogUsersCount` failed: {e}"),
            }
        }
    }
}

impl<Db> Task<Perform<()>> for LogUsersCount<Service<Db>>
where
    Db: Database<
        Select<By<read::user::TotalCount, ()>>,
        Ok = read::user::TotalCount,
        Err = Traced<database::Error>,
    >,
{
    type Ok = read::user::TotalCount;
    type Err = ExecutionError;

    async fn execute(&self, _: Perform<()>) -> Result<Self::Ok, Self::Err> {
        self.service
            .database()
            .execute(Select(By::new(())))
            .await
            .map_err(tracerr::wrap!())
    }
}

/// Error of [`LogUsersCount`] execution.
pub type ExecutionError = Traced<database::Error>;
