use crate::error::MaintenanceNotifierError;
use rusoto_core::Region;
use std::collections::HashMap;
use std::str::FromStr;

const API_KEY: &str = "APIKEY";
const MACKEREL_API_BASE: &str = "MACKEREL_API_BASE";
const HEALTH_REGION: &str = "HEALTH_REGION";
const COUNT_MODE: &str = "COUNT_MODE";
const METRIC_PREFIX: &str = "METRIC_PREFIX";
const ROLE_SESSION_NAME: &str = "ROLE_SESSION_NAME";

pub const DEFAULT_MACKEREL_API_BASE: &str = "https://api.mackerelio.com";
pub const DEFAULT_METRIC_PREFIX: &str = "monitor-maintenance";
pub const DEFAULT_ROLE_SESSION_NAME: &str = "maintenance-notifier";

/// What a target's published value counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMode {
    /// Open and upcoming scheduled-change events.
    Events,
    /// Resources affected by those events, excluding unknown ones.
    AffectedEntities,
}

impl Default for CountMode {
    fn default() -> Self {
        CountMode::AffectedEntities
    }
}

impl FromStr for CountMode {
    type Err = MaintenanceNotifierError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "events" => Ok(CountMode::Events),
            "affected-entities" => Ok(CountMode::AffectedEntities),
            _ => Err(MaintenanceNotifierError::InvalidEnvironment {
                name: COUNT_MODE,
                value: value.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_key: String,
    pub mackerel_api_base: String,
    pub health_region: Region,
    pub count_mode: CountMode,
    pub metric_prefix: String,
    pub role_session_name: String,
}

impl Config {
    pub fn from_env() -> Result<Self, MaintenanceNotifierError> {
        Self::from_vars(std::env::vars().collect())
    }

    fn from_vars(vars: HashMap<String, String>) -> Result<Self, MaintenanceNotifierError> {
        let lookup = |name: &str| vars.get(name).filter(|value| !value.is_empty());

        let api_key = vars
            .get(API_KEY)
            .ok_or(MaintenanceNotifierError::MissingEnvironment(API_KEY))?;
        if api_key.trim().is_empty() {
            return Err(MaintenanceNotifierError::InvalidEnvironment {
                name: API_KEY,
                value: api_key.clone(),
            });
        }

        let health_region = match lookup(HEALTH_REGION) {
            Some(region) => Region::from_str(region).map_err(|_| {
                MaintenanceNotifierError::InvalidEnvironment {
                    name: HEALTH_REGION,
                    value: region.clone(),
                }
            })?,
            None => Region::UsEast1,
        };

        let count_mode = lookup(COUNT_MODE)
            .map(|mode| mode.parse())
            .transpose()?
            .unwrap_or_default();

        Ok(Config {
            api_key: api_key.clone(),
            mackerel_api_base: lookup(MACKEREL_API_BASE)
                .map_or(DEFAULT_MACKEREL_API_BASE, |base| base.as_str())
                .to_string(),
            health_region,
            count_mode,
            metric_prefix: lookup(METRIC_PREFIX)
                .map_or(DEFAULT_METRIC_PREFIX, |prefix| prefix.as_str())
                .to_string(),
            role_session_name: lookup(ROLE_SESSION_NAME)
                .map_or(DEFAULT_ROLE_SESSION_NAME, |name| name.as_str())
                .to_string(),
        })
    }
}
