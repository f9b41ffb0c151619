use serde::Deserialize;

/// Invocation payload: `{"TargetList": [{"Service", "Name", "Role"}, ...]}`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MaintenanceRequest {
    #[serde(rename = "TargetList", default)]
    pub target_list: Vec<TargetAccount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TargetAccount {
    /// Mackerel service that receives the metric.
    #[serde(rename = "Service")]
    pub service: String,
    #[serde(rename = "Name")]
    pub name: String,
    /// ARN of the role assumed in the monitored account.
    #[serde(rename = "Role")]
    pub role: String,
}
