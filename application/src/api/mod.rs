//! HTTP API definitions.

pub mod session;
pub mod user;

use axum::Json;
use serde::Serialize;

pub use self::user::User;

/// Name of the [`tracing::Span`] for the API handlers.
const SPAN_NAME: &str = "HTTP handler";

/// Response carrying a human-readable message only.
#[derive(Clone, Copy, Debug, Serialize)]
pub struct Message {
    /// Text of this [`Message`].
    pub message: &'static str,
}

/// Greets the caller, so the server is known to be alive.
#[expect(
    clippy::unused_async,
    reason = "`async` is required to match signature"
)]
pub async fn hello() -> Json<Message> {
    Json(Message {
        message: "Hello world",
    })
}
