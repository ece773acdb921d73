use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::PanelError;

pub const STATUS_SUCCEEDED: &str = "succeeded";
pub const STATUS_COMPLETED: &str = "COMPLETED";
pub const STATUS_ARCHIVED: &str = "ARCHIVED";

/// Poll creation fields as typed into the dispatch form.
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub target_user: String,
    pub poll_name: String,
    pub choices: String,
    pub selectable_count: u32,
    pub duration_minutes: i64,
    pub preferred_internal_id: String,
}

impl Default for FormDraft {
    fn default() -> Self {
        Self {
            target_user: String::new(),
            poll_name: String::new(),
            choices: "Option 1, Option 2, Option 3".to_string(),
            selectable_count: 1,
            duration_minutes: 60,
            preferred_internal_id: String::new(),
        }
    }
}

/// Payload of `dispatch_new_poll`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DispatchRequest {
    pub target_user_session_id: String,
    pub poll_name: String,
    pub choices: Vec<String>,
    pub selectable_count: u32,
    pub duration_minutes: Option<i64>,
    pub preferred_internal_id: Option<String>,
}

/// Reply of `dispatch_new_poll`. Every field is optional and loosely typed, so
/// any JSON object decodes; only `status == "succeeded"` means success.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchResponse {
    #[serde(default, deserialize_with = "loose_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub message: Option<String>,
    #[serde(default)]
    pub whatsapp_poll_id: Option<Value>,
    #[serde(default)]
    pub internal_poll_group_id: Option<Value>,
    #[serde(default)]
    pub details: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    AllSummaries,
    AggregatedResults,
    Responses,
}

/// Payload of `get_poll_data` in its three modes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PollDataRequest {
    Summaries {
        data_type: DataType,
        page: u32,
        limit: u32,
    },
    ForPoll {
        internal_poll_group_id: String,
        data_type: DataType,
    },
}

impl PollDataRequest {
    pub fn summaries(page: u32, limit: u32) -> Self {
        PollDataRequest::Summaries {
            data_type: DataType::AllSummaries,
            page,
            limit,
        }
    }

    pub fn aggregated_results(id: &str) -> Self {
        PollDataRequest::ForPoll {
            internal_poll_group_id: id.to_string(),
            data_type: DataType::AggregatedResults,
        }
    }

    pub fn responses(id: &str) -> Self {
        PollDataRequest::ForPoll {
            internal_poll_group_id: id.to_string(),
            data_type: DataType::Responses,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CrudOperation {
    Archive,
    UpdateStatus,
    Delete,
}

impl CrudOperation {
    pub fn success_message(self) -> &'static str {
        match self {
            CrudOperation::Archive => "Poll archived.",
            CrudOperation::UpdateStatus => "Poll marked completed.",
            CrudOperation::Delete => "Poll deleted.",
        }
    }

    pub fn failure_prefix(self) -> &'static str {
        match self {
            CrudOperation::Archive => "Archive failed",
            CrudOperation::UpdateStatus => "Failed",
            CrudOperation::Delete => "Delete failed",
        }
    }
}

/// Payload of `manage_poll_crud`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrudRequest {
    pub operation: CrudOperation,
    pub internal_poll_group_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CrudResponse {
    #[serde(default, deserialize_with = "loose_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub message: Option<String>,
}

impl CrudResponse {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCEEDED)
    }
}

impl DispatchResponse {
    pub fn succeeded(&self) -> bool {
        self.status.as_deref() == Some(STATUS_SUCCEEDED)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PollSummary {
    #[serde(default, deserialize_with = "id_as_string")]
    pub internal_poll_group_id: String,
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub choices: Value,
    #[serde(default)]
    pub options: Value,
}

impl PollSummary {
    /// "Mark as Completed" is only offered for polls that are still running.
    pub fn can_complete(&self) -> bool {
        let status = self.status.as_deref().unwrap_or("").to_uppercase();
        status != STATUS_COMPLETED && status != STATUS_ARCHIVED
    }

    pub fn title(&self) -> String {
        format!(
            "{} (ID: {}, Status: {})",
            self.name.as_deref().unwrap_or("N/A"),
            self.internal_poll_group_id,
            self.status.as_deref().unwrap_or("N/A")
        )
    }
}

/// One page of poll summaries as returned by `get_poll_data`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PollsPage {
    pub items: Vec<PollSummary>,
    #[serde(default = "one", deserialize_with = "count_or_one")]
    pub total_pages: u32,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_items: u64,
    #[serde(default = "one", deserialize_with = "count_or_one")]
    pub page: u32,
    #[serde(default = "ten", deserialize_with = "count_or_ten")]
    pub limit: u32,
}

fn one() -> u32 {
    1
}

fn ten() -> u32 {
    10
}

impl Default for PollsPage {
    /// The page shown when a list load fails.
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total_pages: 1,
            total_items: 0,
            page: 1,
            limit: 10,
        }
    }
}

impl PollsPage {
    pub fn decode(mut value: Value) -> Result<Self, PanelError> {
        let malformed = |expected, payload| PanelError::MalformedResponse {
            action: crate::network::GET_POLL_DATA,
            expected,
            payload,
        };
        if value.get("items").is_none() {
            return Err(malformed("missing `items`", value));
        }
        // a present but empty answer
        if value["items"].is_null() {
            value["items"] = Value::Array(Vec::new());
        }
        serde_json::from_value(value.clone())
            .map_err(|_| malformed("`items` is not a list of poll summaries", value))
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty() && self.total_items == 0
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollDefinition {
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub expires_at: Option<String>,
    #[serde(default)]
    pub choices: Value,
    #[serde(default)]
    pub options: Value,
}

/// Aggregated results for one poll.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PollDetail {
    pub definition: PollDefinition,
    #[serde(default, deserialize_with = "loose_string")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "count_or_zero")]
    pub total_responses: u64,
    #[serde(default, deserialize_with = "map_or_empty")]
    pub counts: Map<String, Value>,
}

impl PollDetail {
    pub fn decode(value: Value) -> Result<Self, PanelError> {
        let malformed = |payload| PanelError::MalformedResponse {
            action: crate::network::GET_POLL_DATA,
            expected: "missing `definition`",
            payload,
        };
        if !value.as_object().is_some_and(|m| m.contains_key("definition")) {
            return Err(malformed(value));
        }
        serde_json::from_value(value.clone()).map_err(|_| malformed(value))
    }
}

/// One row of the vote table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteRow {
    pub option: String,
    pub votes: u64,
}

fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    // some backends hand out numeric group ids
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    })
}

/// Strings pass through, `null` is absent, anything else keeps its JSON text.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Null => None,
        Value::String(s) => Some(s),
        other => Some(other.to_string()),
    })
}

fn loose_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn count_or_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(loose_count(&Value::deserialize(deserializer)?).unwrap_or(0))
}

fn count_or_one<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(loose_count(&value).and_then(|n| u32::try_from(n).ok()).unwrap_or_else(one))
}

fn count_or_ten<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(loose_count(&value).and_then(|n| u32::try_from(n).ok()).unwrap_or_else(ten))
}

fn map_or_empty<'de, D>(deserializer: D) -> Result<Map<String, Value>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

/// Renders an id-ish JSON value the way it reads in a message.
pub fn plain(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => "None".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn summaries_request_shape() {
        let payload = serde_json::to_value(PollDataRequest::summaries(2, 10)).unwrap();
        assert_eq!(payload, json!({"data_type": "all_summaries", "page": 2, "limit": 10}));
    }

    #[test]
    fn per_poll_request_shape() {
        let payload = serde_json::to_value(PollDataRequest::responses("g1")).unwrap();
        assert_eq!(payload, json!({"internal_poll_group_id": "g1", "data_type": "responses"}));
    }

    #[test]
    fn crud_request_omits_new_status_unless_set() {
        let archive = CrudRequest {
            operation: CrudOperation::Archive,
            internal_poll_group_id: "g1".into(),
            new_status: None,
        };
        assert_eq!(
            serde_json::to_value(&archive).unwrap(),
            json!({"operation": "archive", "internal_poll_group_id": "g1"})
        );
    }

    #[test]
    fn page_without_items_is_malformed() {
        let err = PollsPage::decode(json!({"total_pages": 3})).unwrap_err();
        assert!(matches!(err, PanelError::MalformedResponse { expected: "missing `items`", .. }));
        assert!(PollsPage::decode(json!([])).is_err());
    }

    #[test]
    fn page_defaults_missing_counters() {
        let page = PollsPage::decode(json!({"items": [{"internal_poll_group_id": 7}]})).unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.limit, 10);
        assert_eq!(page.items[0].internal_poll_group_id, "7");
        assert!(!page.is_empty());
    }

    #[test]
    fn page_tolerates_loosely_typed_fields() {
        let page = PollsPage::decode(json!({
            "items": [{"internal_poll_group_id": "g1", "created_at": 1760000000, "expires_at": null, "name": "Lunch?"}],
            "total_pages": null,
            "total_items": "4",
            "page": 1,
            "limit": null,
        }))
        .unwrap();
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].created_at.as_deref(), Some("1760000000"));
        assert!(page.items[0].expires_at.is_none());
        assert_eq!((page.total_pages, page.total_items, page.limit), (1, 4, 10));
    }

    #[test]
    fn null_items_is_an_empty_page() {
        let page = PollsPage::decode(json!({"items": null, "total_items": 0})).unwrap();
        assert!(page.is_empty());
    }

    #[test]
    fn items_that_are_not_polls_say_so() {
        let err = PollsPage::decode(json!({"items": "nope"})).unwrap_err();
        assert!(err.to_string().contains("`items` is not a list of poll summaries"));
        assert!(!err.to_string().contains("missing"));
    }

    #[test]
    fn null_counts_and_total_still_render() {
        let detail = PollDetail::decode(json!({
            "definition": {"name": "Lunch?"},
            "total_responses": null,
            "counts": null,
        }))
        .unwrap();
        assert_eq!(detail.definition.name.as_deref(), Some("Lunch?"));
        assert_eq!(detail.total_responses, 0);
        assert!(detail.counts.is_empty());
    }

    #[test]
    fn replies_decode_whatever_the_message_type() {
        let crud: CrudResponse = serde_json::from_value(json!({"status": "succeeded", "message": 1})).unwrap();
        assert!(crud.succeeded());
        assert_eq!(crud.message.as_deref(), Some("1"));
        let dispatch: DispatchResponse =
            serde_json::from_value(json!({"status": "succeeded", "message": {"info": "queued"}})).unwrap();
        assert!(dispatch.succeeded());
        assert_eq!(dispatch.message.as_deref(), Some(r#"{"info":"queued"}"#));
    }

    #[test]
    fn completed_and_archived_cannot_complete() {
        let mut poll: PollSummary =
            serde_json::from_value(json!({"internal_poll_group_id": "g", "status": "completed"})).unwrap();
        assert!(!poll.can_complete());
        poll.status = Some("ARCHIVED".into());
        assert!(!poll.can_complete());
        poll.status = Some("ACTIVE".into());
        assert!(poll.can_complete());
        poll.status = None;
        assert!(poll.can_complete());
    }

    #[test]
    fn detail_needs_definition() {
        let err = PollDetail::decode(json!({"status": "ACTIVE"})).unwrap_err();
        assert_eq!(err.details(), Some(&json!({"status": "ACTIVE"})));
    }

    #[test]
    fn title_falls_back_to_na() {
        let poll: PollSummary = serde_json::from_value(json!({"internal_poll_group_id": "g9"})).unwrap();
        assert_eq!(poll.title(), "N/A (ID: g9, Status: N/A)");
    }
}
