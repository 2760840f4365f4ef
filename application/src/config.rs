//! [`Config`]-related definitions.

use std::{sync::Arc, time};

use config::{builder::DefaultState, ConfigBuilder, ConfigError};
use derive_more::{Debug, Display, Error as StdError, From};
use secrecy::SecretString;
use serde::Deserialize;
use service::infra::token::{self, JwtMaker};
use smart_default::SmartDefault;
use tracerr::Traced;

/// Application configuration.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct Config {
    /// Server configuration.
    pub server: Server,

    /// Service configuration.
    pub service: Service,

    /// Log configuration.
    pub log: Log,
}

impl Config {
    /// Creates a new [`Config`] by:
    /// - loading it from the provided `path` (if any);
    /// - merging it with the environment variables (if any);
    /// - using default values for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn new(path: impl AsRef<str>) -> Result<Self, ConfigError> {
        ConfigBuilder::<DefaultState>::default()
            .add_source(config::File::with_name(path.as_ref()).required(false))
            .add_source(config::Environment::with_prefix("CONF").separator("."))
            .build()?
            .try_deserialize()
    }
}

/// Server configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Server {
    /// Host to bind the server to.
    #[default("0.0.0.0".to_owned())]
    pub host: String,

    /// Port to bind the server to.
    #[default(8080)]
    pub port: u16,

    /// [CORS] configuration.
    ///
    /// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
    pub cors: Cors,
}

/// [CORS] configuration.
///
/// [CORS]: https://developer.mozilla.org/en-US/docs/Web/HTTP/CORS
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Cors {
    /// List of allowed origins.
    #[default(vec!["*".to_owned()])]
    pub origins: Vec<String>,
}

/// Service configuration.
#[derive(Clone, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Service {
    /// [JWT] secret.
    ///
    /// Must be at least 32 bytes long.
    ///
    /// [JWT]: https://wikipedia.org/wiki/JSON_Web_Token
    #[debug(skip)]
    pub jwt_secret: String,

    /// Lifetime of a newly issued session token.
    #[default(time::Duration::from_secs(7 * 24 * 60 * 60))]
    #[serde(with = "humantime_serde")]
    pub session_lifetime: time::Duration,

    /// Service tasks configuration.
    pub tasks: Tasks,
}

impl TryFrom<Service> for service::Config {
    type Error = Traced<ServiceError>;

    fn try_from(value: Service) -> Result<Self, Self::Error> {
        let Service {
            jwt_secret,
            session_lifetime,
            tasks: Tasks { log_users_count },
        } = value;

        if log_users_count.interval.is_zero() {
            return Err(tracerr::new!(ServiceError::ZeroTaskInterval(
                "log_users_count",
            )));
        }

        Ok(Self {
            token_maker: Arc::new(
                JwtMaker::new(&SecretString::from(jwt_secret))
                    .map_err(tracerr::map_from_and_wrap!(=> ServiceError))?,
            ),
            session_lifetime,
            log_users_count: service::task::log_users_count::Config {
                interval: log_users_count.interval,
            },
        })
    }
}

/// Error of converting [`Service`] configuration into a [`service::Config`].
#[derive(Debug, Display, From, StdError)]
pub enum ServiceError {
    /// [`token::Maker`] cannot be built.
    #[display("Invalid `token::Maker` configuration: {_0}")]
    #[from]
    Token(token::Error),

    /// Task is configured to run with a zero interval.
    #[display("`{_0}` task interval must be positive")]
    ZeroTaskInterval(#[error(not(source))] &'static str),
}

/// Service tasks configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Tasks {
    /// `LogUsersCount` task configuration.
    pub log_users_count: Task,
}

/// Service task configuration.
#[derive(Clone, Copy, Debug, Deserialize, SmartDefault)]
#[serde(default)]
pub struct Task {
    /// Task execution interval.
    #[default(time::Duration::from_secs(10))]
    #[serde(with = "humantime_serde")]
    pub interval: time::Duration,
}

/// Log configuration.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Log {
    /// Log level.
    pub level: LogLevel,
}

/// Log level.
#[derive(Clone, Copy, Debug, Default, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    /// Designates very low priority, often extremely verbose, information.
    Trace,

    /// Designates lower priority information.
    Debug,

    /// Designates useful information.
    #[default]
    Info,

    /// Designates hazardous situations.
    Warn,

    /// Designates very serious errors.
    Error,
}

impl From<LogLevel> for tracing::Level {
    fn from(value: LogLevel) -> Self {
        match value {
            LogLevel::Trace => Self::TRACE,
            LogLevel::Debug => Self::DEBUG,
            LogLevel::Info => Self::INFO,
            LogLevel::Warn => Self::WARN,
            LogLevel::Error => Self::ERROR,
        }
    }
}

#[cfg(test)]
mod spec {
    use std::time::Duration;

    use service::infra::token;

    use super::{Config, Service, ServiceError, Task, Tasks};

    #[test]
    fn defaults_to_week_long_sessions() {
        let config = Config::default();

        assert_eq!(
            config.service.session_lifetime,
            Duration::from_secs(7 * 24 * 60 * 60),
        );
        assert_eq!(
            config.service.tasks.log_users_count.interval,
            Duration::from_secs(10),
        );
        assert_eq!(config.server.port, 8080);
    }

    #[test]
    fn refuses_weak_secret() {
        let err = service::Config::try_from(Service {
            jwt_secret: "secret".to_owned(),
            ..Service::default()
        })
        .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ServiceError::Token(token::Error::WeakKey(6)),
        ));
    }

    #[test]
    fn refuses_zero_task_interval() {
        let err = service::Config::try_from(Service {
            jwt_secret: "x".repeat(32),
            tasks: Tasks {
                log_users_count: Task {
                    interval: Duration::ZERO,
                },
            },
            ..Service::default()
        })
        .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ServiceError::ZeroTaskInterval("log_users_count"),
        ));
    }

    #[test]
    fn builds_service_config() {
        let config = service::Config::try_from(Service {
            jwt_secret: "x".repeat(32),
            session_lifetime: Duration::from_secs(60),
            ..Service::default()
        })
        .unwrap();

        assert_eq!(config.session_lifetime, Duration::from_secs(60));
    }
}
