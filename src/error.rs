use reqwest::StatusCode;
use rusoto_core::credential::CredentialsError;
use rusoto_core::request::TlsError;
use rusoto_core::RusotoError;
use rusoto_health::{DescribeAffectedEntitiesError, DescribeEventsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MaintenanceNotifierError {
    #[error("Failed to assume role {role}: {source}")]
    Delegation {
        role: String,
        #[source]
        source: CredentialsError,
    },
    #[error("Failed to build http client: {0}")]
    HttpClient(#[from] TlsError),
    #[error("Failed to describe events: {0}")]
    DescribeEvents(#[from] RusotoError<DescribeEventsError>),
    #[error("Failed to describe affected entities: {0}")]
    DescribeAffectedEntities(#[from] RusotoError<DescribeAffectedEntitiesError>),
    #[error("Failed to post service metrics: {0}")]
    Publish(#[from] reqwest::Error),
    #[error("Service metrics rejected with {status}: {message}")]
    PublishRejected { status: StatusCode, message: String },
    #[error("Environment variable {0} is not set")]
    MissingEnvironment(&'static str),
    #[error("Environment variable {name} has invalid value {value:?}")]
    InvalidEnvironment { name: &'static str, value: String },
}
