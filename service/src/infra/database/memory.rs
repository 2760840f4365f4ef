//! In-process [`Database`] implementation.

use std::{collections::HashMap, sync::Arc};

use common::operations::{By, Delete, Insert, Select, Update};
use derive_more::{Display, Error as StdError};
use tokio::sync::RwLock;
use tracerr::Traced;

use crate::{
    domain::{user, User},
    infra::{
        database::{self, USERS_EMAIL_KEY, USERS_PKEY},
        Database,
    },
    read,
};

/// [`Database`] keeping all the data in memory of the current process.
///
/// Clones share the same data.
#[derive(Clone, Debug, Default)]
pub struct Memory {
    /// Stored [`User`]s.
    users: Arc<RwLock<Users>>,
}

/// [`User`]s table along with its unique indices.
#[derive(Debug, Default)]
struct Users {
    /// [`User`]s by their IDs.
    by_id: HashMap<user::Id, User>,

    /// IDs of [`User`]s by their [`user::Email`]s.
    by_email: HashMap<user::Email, user::Id>,
}

impl Users {
    /// Checks that the provided [`User`] doesn't collide with any other
    /// stored one by [`user::Email`].
    fn check_email(&self, user: &User) -> Result<(), Traced<database::Error>> {
        match self.by_email.get(&user.email) {
            Some(id) if *id != user.id => Err(tracerr::new!(
                database::Error::from(Error::UniqueViolation(USERS_EMAIL_KEY))
            )),
            Some(_) | None => Ok(()),
        }
    }
}

/// [`Memory`] error.
#[derive(Clone, Debug, Display, StdError)]
pub enum Error {
    /// Unique constraint is violated.
    #[display("Unique constraint `{_0}` is violated")]
    UniqueViolation(#[error(not(source))] &'static str),

    /// [`User`] to be updated doesn't exist.
    #[display("`User(id: {_0})` does not exist")]
    UserNotExists(#[error(not(source))] user::Id),
}

impl Error {
    /// Checks if the error is a unique violation of the specified constraint.
    #[must_use]
    pub fn is_unique_violation(&self, constraint: Option<&str>) -> bool {
        match self {
            Self::UniqueViolation(c) => constraint.map_or(true, |x| x == *c),
            Self::UserNotExists(_) => false,
        }
    }
}

impl Database<Select<By<Option<User>, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        Ok(self.users.read().await.by_id.get(&id).cloned())
    }
}

impl<'l> Database<Select<By<Option<User>, &'l user::Email>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<User>, &'l user::Email>>,
    ) -> Result<Self::Ok, Self::Err> {
        let email = by.into_inner();
        let users = self.users.read().await;
        Ok(users
            .by_email
            .get(email)
            .and_then(|id| users.by_id.get(id))
            .cloned())
    }
}

impl Database<Select<By<Vec<User>, ()>>> for Memory {
    type Ok = Vec<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<Vec<User>, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut list: Vec<_> =
            self.users.read().await.by_id.values().cloned().collect();
        list.sort_unstable_by(|a, b| {
            a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id))
        });
        Ok(list)
    }
}

impl Database<Select<By<read::user::TotalCount, ()>>> for Memory {
    type Ok = read::user::TotalCount;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        _: Select<By<read::user::TotalCount, ()>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.users.read().await.by_id.len().into())
    }
}

impl Database<Insert<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(user): Insert<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut users = self.users.write().await;
        if users.by_id.contains_key(&user.id) {
            return Err(tracerr::new!(database::Error::from(
                Error::UniqueViolation(USERS_PKEY)
            )));
        }
        users.check_email(&user)?;

        drop(users.by_email.insert(user.email.clone(), user.id.clone()));
        drop(users.by_id.insert(user.id.clone(), user));
        Ok(())
    }
}

impl Database<Update<User>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(user): Update<User>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut users = self.users.write().await;
        let Some(old_email) =
            users.by_id.get(&user.id).map(|u| u.email.clone())
        else {
            return Err(tracerr::new!(database::Error::from(
                Error::UserNotExists(user.id)
            )));
        };
        users.check_email(&user)?;

        if old_email != user.email {
            drop(users.by_email.remove(&old_email));
            drop(users.by_email.insert(user.email.clone(), user.id.clone()));
        }
        drop(users.by_id.insert(user.id.clone(), user));
        Ok(())
    }
}

impl Database<Delete<By<User, user::Id>>> for Memory {
    type Ok = Option<User>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<User, user::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let id = by.into_inner();
        let mut users = self.users.write().await;
        let removed = users.by_id.remove(&id);
        if let Some(user) = &removed {
            drop(users.by_email.remove(&user.email));
        }
        Ok(removed)
    }
}
