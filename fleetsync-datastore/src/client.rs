//! Cloud Datastore REST client (`projects/{project}:runQuery`).
//!
//! Also works against the Datastore emulator: point [`DatastoreClient::with_endpoint`]
//! at `http://$DATASTORE_EMULATOR_HOST` and use anonymous credentials.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use fleetsync_core::Credentials;

use crate::error::FetchError;
use crate::fetcher::{RawItem, RecordSource};

pub const DATASTORE_ENDPOINT: &str = "https://datastore.googleapis.com";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `moreResults` value that means another page is waiting.
const NOT_FINISHED: &str = "NOT_FINISHED";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunQueryRequest<'a> {
    partition_id: PartitionId<'a>,
    query: Query<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PartitionId<'a> {
    project_id: &'a str,
    namespace_id: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Query<'a> {
    kind: [KindExpression<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    start_cursor: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct KindExpression<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct RunQueryResponse {
    batch: QueryResultBatch,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResultBatch {
    #[serde(default)]
    entity_results: Vec<EntityResult>,
    end_cursor: Option<String>,
    #[serde(default)]
    more_results: String,
}

#[derive(Debug, Deserialize)]
struct EntityResult {
    entity: Entity,
}

#[derive(Debug, Deserialize)]
struct Entity {
    key: Option<Key>,
    #[serde(default)]
    properties: BTreeMap<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Key {
    #[serde(default)]
    path: Vec<PathElement>,
}

#[derive(Debug, Deserialize)]
struct PathElement {
    name: Option<String>,
}

/// A Datastore property value. Only scalar kinds are rendered; arrays,
/// embedded entities, blobs and nulls count as absent.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Value {
    string_value: Option<String>,
    integer_value: Option<String>,
    double_value: Option<f64>,
    boolean_value: Option<bool>,
    timestamp_value: Option<String>,
}

impl Value {
    fn render(self) -> Option<String> {
        self.string_value
            .or(self.integer_value)
            .or_else(|| self.double_value.map(|d| d.to_string()))
            .or_else(|| self.boolean_value.map(|b| b.to_string()))
            .or(self.timestamp_value)
    }
}

impl From<Entity> for RawItem {
    fn from(entity: Entity) -> Self {
        let key_name = entity
            .key
            .and_then(|key| key.path.into_iter().last())
            .and_then(|element| element.name);
        let properties = entity
            .properties
            .into_iter()
            .filter_map(|(name, value)| value.render().map(|v| (name, v)))
            .collect();
        RawItem {
            key_name,
            properties,
        }
    }
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Blocking Datastore client. Call from `spawn_blocking` in async contexts.
pub struct DatastoreClient {
    agent: ureq::Agent,
    endpoint: String,
    project_id: String,
    credentials: Arc<Credentials>,
}

impl DatastoreClient {
    /// Client for the production Datastore endpoint.
    pub fn new(project_id: impl Into<String>, credentials: Arc<Credentials>) -> Self {
        Self::with_endpoint(DATASTORE_ENDPOINT, project_id, credentials)
    }

    /// Client for an arbitrary endpoint (e.g. the emulator).
    pub fn with_endpoint(
        endpoint: impl Into<String>,
        project_id: impl Into<String>,
        credentials: Arc<Credentials>,
    ) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(REQUEST_TIMEOUT).build();
        Self {
            agent,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            project_id: project_id.into(),
            credentials,
        }
    }

    fn run_query_url(&self) -> String {
        format!("{}/v1/projects/{}:runQuery", self.endpoint, self.project_id)
    }

    fn run_query(&self, request: &RunQueryRequest<'_>) -> Result<QueryResultBatch, FetchError> {
        let url = self.run_query_url();
        let mut call = self.agent.post(&url);
        if let Some(header) = self.credentials.authorization()? {
            call = call.set("Authorization", &header);
        }
        let response: RunQueryResponse = call
            .send_json(request)
            .map_err(|e| FetchError::from_ureq(&url, e))?
            .into_json()?;
        Ok(response.batch)
    }
}

impl RecordSource for DatastoreClient {
    fn query(&self, namespace: &str, kind: &str) -> Result<Vec<RawItem>, FetchError> {
        let mut items = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let request = RunQueryRequest {
                partition_id: PartitionId {
                    project_id: &self.project_id,
                    namespace_id: namespace,
                },
                query: Query {
                    kind: [KindExpression { name: kind }],
                    start_cursor: cursor.as_deref(),
                },
            };
            let batch = self.run_query(&request)?;
            let pages_done = batch.more_results != NOT_FINISHED;
            items.extend(batch.entity_results.into_iter().map(|r| RawItem::from(r.entity)));

            match batch.end_cursor {
                Some(next) if !pages_done && cursor.as_deref() != Some(next.as_str()) => {
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        tracing::debug!(namespace, kind, entities = items.len(), "datastore query finished");
        Ok(items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
      "batch": {
        "entityResultType": "FULL",
        "entityResults": [
          {
            "entity": {
              "key": {
                "partitionId": {"projectId": "mlab-oti", "namespaceId": "scraper"},
                "path": [{"kind": "rsync_url", "name": "rsync://mlab1.lga03/ndt"}]
              },
              "properties": {
                "contact": {"stringValue": "ops@example.org"},
                "maxrawfilemtimearchived": {"integerValue": "1490745600"},
                "errorsincelastsuccessful": {"nullValue": null},
                "lastcollectionattempt": {"timestampValue": "2017-03-29T01:02:03Z"}
              }
            },
            "version": "17"
          },
          {
            "entity": {
              "key": {"path": [{"kind": "rsync_url", "id": "5629499534213120"}]},
              "properties": {}
            }
          }
        ],
        "endCursor": "CiQSHmoJ",
        "moreResults": "NO_MORE_RESULTS"
      }
    }"#;

    #[test]
    fn response_decodes_into_raw_items() {
        let response: RunQueryResponse = serde_json::from_str(SAMPLE).expect("decode");
        assert_eq!(response.batch.more_results, "NO_MORE_RESULTS");
        let items: Vec<RawItem> = response
            .batch
            .entity_results
            .into_iter()
            .map(|r| RawItem::from(r.entity))
            .collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].key_name.as_deref(), Some("rsync://mlab1.lga03/ndt"));
        assert_eq!(items[0].properties["contact"], "ops@example.org");
        assert_eq!(items[0].properties["maxrawfilemtimearchived"], "1490745600");
        assert_eq!(
            items[0].properties["lastcollectionattempt"],
            "2017-03-29T01:02:03Z"
        );
        assert!(!items[0].properties.contains_key("errorsincelastsuccessful"));
        assert_eq!(items[1].key_name, None);
    }

    #[test]
    fn scalar_values_render_as_strings() {
        let v = Value {
            double_value: Some(2.5),
            ..Value::default()
        };
        assert_eq!(v.render().as_deref(), Some("2.5"));
        let v = Value {
            boolean_value: Some(false),
            ..Value::default()
        };
        assert_eq!(v.render().as_deref(), Some("false"));
        assert_eq!(Value::default().render(), None);
    }

    #[test]
    fn request_body_names_namespace_and_kind() {
        let request = RunQueryRequest {
            partition_id: PartitionId {
                project_id: "mlab-oti",
                namespace_id: "scraper",
            },
            query: Query {
                kind: [KindExpression { name: "rsync_url" }],
                start_cursor: None,
            },
        };
        let json = serde_json::to_value(&request).expect("encode");
        assert_eq!(json["partitionId"]["namespaceId"], "scraper");
        assert_eq!(json["partitionId"]["projectId"], "mlab-oti");
        assert_eq!(json["query"]["kind"][0]["name"], "rsync_url");
        assert!(json["query"].get("startCursor").is_none());
    }

    #[test]
    fn endpoint_trailing_slash_is_trimmed() {
        let client = DatastoreClient::with_endpoint(
            "http://localhost:8081/",
            "demo",
            Arc::new(Credentials::Anonymous),
        );
        assert_eq!(
            client.run_query_url(),
            "http://localhost:8081/v1/projects/demo:runQuery"
        );
    }
}
