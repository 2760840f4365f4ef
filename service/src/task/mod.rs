//! Background [`Task`]s definitions.

mod background;
pub mod log_users_count;

pub use common::Handler as Task;

pub use self::{background::Background, log_users_count::LogUsersCount};
