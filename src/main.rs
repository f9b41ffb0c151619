mod config;
mod delegator;
mod error;
mod health_event_client;
mod mackerel_client;
mod metric;
mod monitor;
mod target;

use anyhow::Context;
use chrono::Utc;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use rusoto_core::Region;
use rusoto_sts::StsClient;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::delegator::StsDelegator;
use crate::mackerel_client::MackerelClient;
use crate::monitor::{MaintenanceMonitor, MonitorOptions};
use crate::target::MaintenanceRequest;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(false)
        .without_time()
        .json()
        .init();

    let config = Config::from_env().context("failed to load configuration")?;
    let monitor = MaintenanceMonitor::new(
        StsDelegator::new_with_client(
            StsClient::new(Region::default()),
            config.health_region.clone(),
            config.role_session_name.clone(),
        ),
        MackerelClient::new_with_client(
            reqwest::Client::new(),
            config.mackerel_api_base.clone(),
            config.api_key.clone(),
        ),
        MonitorOptions::from(&config),
    );

    let monitor = &monitor;
    run(service_fn(move |event: LambdaEvent<MaintenanceRequest>| async move {
        let now = Utc::now();
        Ok::<String, Error>(monitor.report(&event.payload, now).await.to_string())
    }))
    .await
}
