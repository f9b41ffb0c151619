use async_trait::async_trait;
use rusoto_core::credential::{ProvideAwsCredentials, StaticProvider};
use rusoto_core::{HttpClient, Region};
use rusoto_health::AWSHealthClient;
use rusoto_sts::{StsAssumeRoleSessionCredentialsProvider, StsClient};
use tracing::debug;

use crate::error::MaintenanceNotifierError;
use crate::health_event_client::{Describe, HealthEventClient};

/// Turns a role ARN into a health client scoped to that role's account.
#[async_trait]
pub trait Delegate: Send + Sync {
    async fn delegate(&self, role: &str) -> Result<Box<dyn Describe>, MaintenanceNotifierError>;
}

pub struct StsDelegator {
    sts: StsClient,
    health_region: Region,
    session_name: String,
}

#[async_trait]
impl Delegate for StsDelegator {
    async fn delegate(&self, role: &str) -> Result<Box<dyn Describe>, MaintenanceNotifierError> {
        let provider = StsAssumeRoleSessionCredentialsProvider::new(
            self.sts.clone(),
            role.to_string(),
            self.session_name.clone(),
            None,
            None,
            None,
            None,
        );
        // Assume eagerly so a bad role fails here rather than on the first health call.
        let credentials = provider
            .credentials()
            .await
            .map_err(|source| MaintenanceNotifierError::Delegation {
                role: role.to_string(),
                source,
            })?;
        debug!(role, expires_at = ?credentials.expires_at(), "assumed role");

        let credentials = StaticProvider::new(
            credentials.aws_access_key_id().to_string(),
            credentials.aws_secret_access_key().to_string(),
            credentials.token().clone(),
            None,
        );
        let client = AWSHealthClient::new_with(
            HttpClient::new()?,
            credentials,
            self.health_region.clone(),
        );
        Ok(Box::new(HealthEventClient::new_with_client(client)))
    }
}

impl StsDelegator {
    pub fn new_with_client(sts: StsClient, health_region: Region, session_name: String) -> Self {
        StsDelegator {
            sts,
            health_region,
            session_name,
        }
    }
}
