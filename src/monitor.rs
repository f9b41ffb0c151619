use chrono::{DateTime, Utc};
use tracing::{debug, error, info, info_span, Instrument};

use crate::config::{Config, CountMode};
use crate::delegator::Delegate;
use crate::error::MaintenanceNotifierError;
use crate::metric::MetricValue;
use crate::mackerel_client::Publish;
use crate::target::{MaintenanceRequest, TargetAccount};

/// Returned once every target has been attempted, whatever failed.
pub const SUCCESS: &str = "ok";

#[derive(Debug, Clone, PartialEq)]
pub struct MonitorOptions {
    pub metric_prefix: String,
    pub count_mode: CountMode,
}

impl From<&Config> for MonitorOptions {
    fn from(config: &Config) -> Self {
        MonitorOptions {
            metric_prefix: config.metric_prefix.clone(),
            count_mode: config.count_mode,
        }
    }
}

pub struct MaintenanceMonitor<D, P> {
    delegator: D,
    publisher: P,
    options: MonitorOptions,
}

impl<D, P> MaintenanceMonitor<D, P>
where
    D: Delegate,
    P: Publish,
{
    pub fn new(delegator: D, publisher: P, options: MonitorOptions) -> Self {
        MaintenanceMonitor {
            delegator,
            publisher,
            options,
        }
    }

    /// Reports every target in turn. `now` is the single timestamp shared by
    /// all published values of this invocation.
    pub async fn report(&self, request: &MaintenanceRequest, now: DateTime<Utc>) -> &'static str {
        for target in &request.target_list {
            let span = info_span!("target", service = %target.service, name = %target.name);
            match self.report_target(target, now).instrument(span.clone()).await {
                Ok(value) => span.in_scope(|| {
                    info!(metric = %value.name, value = value.value, "published maintenance count")
                }),
                Err(error) => span.in_scope(|| error!(%error, "skipping target")),
            }
        }
        SUCCESS
    }

    async fn report_target(
        &self,
        target: &TargetAccount,
        now: DateTime<Utc>,
    ) -> Result<MetricValue, MaintenanceNotifierError> {
        let health = self.delegator.delegate(&target.role).await?;
        let events = health.describe_all_events().await?;

        let count = match self.options.count_mode {
            CountMode::Events => events.len(),
            // an empty ARN filter is rejected by the provider
            CountMode::AffectedEntities if events.is_empty() => 0,
            CountMode::AffectedEntities => health
                .describe_all_affected_entities(&events)
                .await?
                .iter()
                .filter(|entity| {
                    let unknown = entity.is_unknown();
                    if unknown {
                        debug!(event_arn = ?entity.event_arn, "ignoring entity with unknown status");
                    }
                    !unknown
                })
                .count(),
        };

        let value = MetricValue::new(
            &self.options.metric_prefix,
            &target.name,
            now,
            u64::try_from(count).unwrap_or(u64::MAX),
        );
        self.publisher
            .post_service_metric_values(&target.service, std::slice::from_ref(&value))
            .await?;
        Ok(value)
    }
}
