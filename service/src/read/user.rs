//! [`User`] read model definition.
//!
//! [`User`]: crate::domain::User

use derive_more::{Display, From, Into};

#[cfg(doc)]
use crate::domain::User;

/// Total count of [`User`]s.
#[derive(Clone, Copy, Debug, Display, Eq, From, Hash, Into, PartialEq)]
pub struct TotalCount(usize);
