//! [`Query`] collection related to the multiple [`User`]s.

use common::operations::By;

#[cfg(doc)]
use crate::Query;
use crate::{domain::User, read};

use super::DatabaseQuery;

/// Queries all the [`User`]s ordered by their creation.
pub type List = DatabaseQuery<By<Vec<User>, ()>>;

/// Queries total count of [`User`]s.
pub type TotalCount = DatabaseQuery<By<read::user::TotalCount, ()>>;
