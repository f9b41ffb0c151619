use async_trait::async_trait;
use rusoto_health::{
    AWSHealth, AWSHealthClient, DescribeAffectedEntitiesRequest, DescribeEventsRequest,
    EntityFilter, EventFilter,
};
use tracing::debug;

use crate::error::MaintenanceNotifierError;

const EVENT_STATUS_CODES: [&str; 2] = ["open", "upcoming"];
const EVENT_TYPE_CATEGORY: &str = "scheduledChange";
const UNKNOWN: &str = "UNKNOWN";
/// DescribeAffectedEntities accepts at most this many event ARNs per request.
const MAX_EVENT_ARNS_PER_REQUEST: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct HealthEvent {
    pub arn: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AffectedEntity {
    pub event_arn: Option<String>,
    pub entity_value: Option<String>,
    pub status_code: Option<String>,
}

impl AffectedEntity {
    /// Health reports resources it cannot attribute with an `UNKNOWN` status
    /// or with `UNKNOWN` in place of the resource identifier.
    pub fn is_unknown(&self) -> bool {
        self.status_code.as_deref() == Some(UNKNOWN) || self.entity_value.as_deref() == Some(UNKNOWN)
    }
}

pub struct HealthEventClient {
    client: AWSHealthClient,
}

#[async_trait]
pub trait Describe: Send + Sync {
    /// Every open or upcoming scheduled-change event, across all pages.
    async fn describe_all_events(&self) -> Result<Vec<HealthEvent>, MaintenanceNotifierError>;

    /// Every entity affected by `events`, across all pages.
    async fn describe_all_affected_entities(
        &self,
        events: &[HealthEvent],
    ) -> Result<Vec<AffectedEntity>, MaintenanceNotifierError>;
}

#[async_trait]
impl Describe for HealthEventClient {
    async fn describe_all_events(&self) -> Result<Vec<HealthEvent>, MaintenanceNotifierError> {
        let mut health_events = Vec::<HealthEvent>::new();
        let mut next_token: Option<String> = None;
        loop {
            let request = DescribeEventsRequest {
                filter: Some(scheduled_change_filter()),
                next_token: next_token.take(),
                ..DescribeEventsRequest::default()
            };
            let result = self.client.describe_events(request).await?;

            let events = result.events.unwrap_or_default();
            debug!(count = events.len(), "described events page");
            for event in events {
                match event.arn {
                    Some(arn) => health_events.push(HealthEvent { arn }),
                    None => debug!("skipping event without arn"),
                }
            }

            next_token = result.next_token.filter(|token| !token.is_empty());
            if next_token.is_none() {
                break;
            }
        }
        Ok(health_events)
    }

    async fn describe_all_affected_entities(
        &self,
        events: &[HealthEvent],
    ) -> Result<Vec<AffectedEntity>, MaintenanceNotifierError> {
        let mut affected_entities = Vec::<AffectedEntity>::new();
        for batch in events.chunks(MAX_EVENT_ARNS_PER_REQUEST) {
            let event_arns: Vec<String> = batch.iter().map(|event| event.arn.clone()).collect();
            let mut next_token: Option<String> = None;
            loop {
                let request = DescribeAffectedEntitiesRequest {
                    filter: EntityFilter {
                        event_arns: event_arns.clone(),
                        ..EntityFilter::default()
                    },
                    next_token: next_token.take(),
                    ..DescribeAffectedEntitiesRequest::default()
                };
                let result = self.client.describe_affected_entities(request).await?;

                let entities = result.entities.unwrap_or_default();
                debug!(count = entities.len(), "described affected entities page");
                affected_entities.extend(entities.into_iter().map(|entity| AffectedEntity {
                    event_arn: entity.event_arn,
                    entity_value: entity.entity_value,
                    status_code: entity.status_code,
                }));

                next_token = result.next_token.filter(|token| !token.is_empty());
                if next_token.is_none() {
                    break;
                }
            }
        }
        Ok(affected_entities)
    }
}

impl HealthEventClient {
    pub fn new_with_client(client: AWSHealthClient) -> Self {
        HealthEventClient { client }
    }
}

fn scheduled_change_filter() -> EventFilter {
    EventFilter {
        event_status_codes: Some(
            EVENT_STATUS_CODES
                .iter()
                .map(|status| status.to_string())
                .collect(),
        ),
        event_type_categories: Some(vec![EVENT_TYPE_CATEGORY.to_string()]),
        ..EventFilter::default()
    }
}

#[cfg(test)]
mod tests {
    use crate::error::MaintenanceNotifierError;
    use crate::health_event_client::{AffectedEntity, Describe, HealthEvent, HealthEventClient};
    use rusoto_core::Region;
    use rusoto_health::AWSHealthClient;
    use rusoto_core::signature::{SignedRequest, SignedRequestPayload};
    use rusoto_mock::{MockCredentialsProvider, MockRequestDispatcher, MultipleMockRequestDispatcher};
    use serde_json::{json, Value};

    fn client_with_pages(pages: Vec<MockRequestDispatcher>) -> HealthEventClient {
        HealthEventClient::new_with_client(AWSHealthClient::new_with(
            MultipleMockRequestDispatcher::new(pages),
            MockCredentialsProvider,
            Region::UsEast1,
        ))
    }

    fn page(body: &str) -> MockRequestDispatcher {
        MockRequestDispatcher::default().with_body(body)
    }

    fn request_body(request: &SignedRequest) -> Value {
        match request.payload {
            Some(SignedRequestPayload::Buffer(ref buffer)) => serde_json::from_slice(buffer).unwrap(),
            _ => panic!("expected a buffered json payload"),
        }
    }

    fn expect_next_token(expected: Option<&'static str>) -> impl Fn(&SignedRequest) + Send + Sync + 'static {
        move |request: &SignedRequest| {
            let body = request_body(request);
            assert_eq!(body.get("nextToken").and_then(Value::as_str), expected);
        }
    }

    fn expect_event_arns(expected: Vec<String>) -> impl Fn(&SignedRequest) + Send + Sync + 'static {
        move |request: &SignedRequest| {
            let body = request_body(request);
            assert_eq!(body["filter"]["eventArns"], json!(expected));
        }
    }

    fn events(count: usize) -> Vec<HealthEvent> {
        (0..count)
            .map(|index| HealthEvent {
                arn: format!("arn:aws:health:us-east-1::event/EC2/AWS_EC2_INSTANCE_RETIREMENT_SCHEDULED/{}", index),
            })
            .collect()
    }

    #[test]
    fn test_is_unknown() {
        let entity = |value: &str, status: &str| AffectedEntity {
            event_arn: None,
            entity_value: Some(value.to_string()),
            status_code: Some(status.to_string()),
        };

        assert!(entity("i-1234567890abcdef0", "UNKNOWN").is_unknown());
        assert!(entity("UNKNOWN", "IMPAIRED").is_unknown());
        assert!(!entity("i-1234567890abcdef0", "IMPAIRED").is_unknown());
        assert!(!AffectedEntity {
            event_arn: None,
            entity_value: None,
            status_code: None,
        }
        .is_unknown());
    }

    #[tokio::test]
    async fn test_describe_all_events() {
        let client = client_with_pages(vec![
            page(r#"{"events": [{"arn": "arn:event/1"}, {"arn": "arn:event/2"}], "nextToken": "page-2"}"#)
                .with_request_checker(expect_next_token(None)),
            page(r#"{"events": [{"arn": "arn:event/3"}, {"eventTypeCode": "AWS_EC2_MAINTENANCE_SCHEDULED"}]}"#)
                .with_request_checker(expect_next_token(Some("page-2"))),
        ]);

        let result = client.describe_all_events().await;

        assert_eq!(
            result.unwrap(),
            vec![
                HealthEvent {
                    arn: "arn:event/1".to_string()
                },
                HealthEvent {
                    arn: "arn:event/2".to_string()
                },
                HealthEvent {
                    arn: "arn:event/3".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_describe_all_events_empty() {
        let client = client_with_pages(vec![page(r#"{"events": []}"#)]);
        let result = client.describe_all_events().await;
        assert!(result.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_describe_all_events_error() {
        let client = HealthEventClient::new_with_client(AWSHealthClient::new_with(
            MockRequestDispatcher::with_status(400).with_body(
                r#"{"__type": "InvalidPaginationToken", "message": "Invalid pagination token"}"#,
            ),
            MockCredentialsProvider,
            Region::UsEast1,
        ));

        let result = client.describe_all_events().await;

        assert!(matches!(
            result,
            Err(MaintenanceNotifierError::DescribeEvents(_))
        ));
    }

    #[tokio::test]
    async fn test_describe_all_affected_entities() {
        let client = client_with_pages(vec![
            page(r#"{"entities": [{"eventArn": "arn:event/1", "entityValue": "i-1234567890abcdef0", "statusCode": "IMPAIRED"}], "nextToken": "page-2"}"#)
                .with_request_checker(expect_next_token(None)),
            page(r#"{"entities": [{"eventArn": "arn:event/1", "entityValue": "UNKNOWN", "statusCode": "UNKNOWN"}]}"#)
                .with_request_checker(expect_next_token(Some("page-2"))),
        ]);

        let result = client.describe_all_affected_entities(&events(1)).await;

        assert_eq!(
            result.unwrap(),
            vec![
                AffectedEntity {
                    event_arn: Some("arn:event/1".to_string()),
                    entity_value: Some("i-1234567890abcdef0".to_string()),
                    status_code: Some("IMPAIRED".to_string()),
                },
                AffectedEntity {
                    event_arn: Some("arn:event/1".to_string()),
                    entity_value: Some("UNKNOWN".to_string()),
                    status_code: Some("UNKNOWN".to_string()),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_describe_all_affected_entities_in_batches() {
        // eleven events need two requests, one per batch of ten
        let events = events(11);
        let arns: Vec<String> = events.iter().map(|event| event.arn.clone()).collect();
        let client = client_with_pages(vec![
            page(r#"{"entities": [{"eventArn": "arn:event/0", "entityValue": "vol-0", "statusCode": "IMPAIRED"}]}"#)
                .with_request_checker(expect_event_arns(arns[..10].to_vec())),
            page(r#"{"entities": [{"eventArn": "arn:event/10", "entityValue": "vol-10", "statusCode": "PENDING"}]}"#)
                .with_request_checker(expect_event_arns(arns[10..].to_vec())),
        ]);

        let result = client.describe_all_affected_entities(&events).await;

        let values: Vec<Option<String>> = result
            .unwrap()
            .into_iter()
            .map(|entity| entity.entity_value)
            .collect();
        assert_eq!(values, vec![Some("vol-0".to_string()), Some("vol-10".to_string())]);
    }

    #[tokio::test]
    async fn test_describe_all_affected_entities_error() {
        let client = HealthEventClient::new_with_client(AWSHealthClient::new_with(
            MockRequestDispatcher::with_status(400).with_body(
                r#"{"__type": "UnsupportedLocale", "message": "Unsupported locale"}"#,
            ),
            MockCredentialsProvider,
            Region::UsEast1,
        ));

        let result = client.describe_all_affected_entities(&events(1)).await;

        assert!(matches!(
            result,
            Err(MaintenanceNotifierError::DescribeAffectedEntities(_))
        ));
    }
}
