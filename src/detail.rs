use std::collections::HashSet;

use log::{debug, warn};
use serde_json::Value;

use crate::error::PanelError;
use crate::models::{PollDataRequest, PollDetail, VoteRow};
use crate::network::{ActionGateway, GET_POLL_DATA};

pub const NO_VOTES: &str = "No responses yet or no countable choices.";

/// Fetches results for the selected poll. Nothing here is cached: results move
/// while a poll is open, so every render asks again.
#[derive(Debug, Default)]
pub struct DetailViewer {
    raw_toggles: HashSet<String>,
}

impl DetailViewer {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn view_details<G: ActionGateway>(&self, gateway: &G, id: &str) -> Result<PollDetail, PanelError> {
        let payload = serde_json::to_value(PollDataRequest::aggregated_results(id))
            .map_err(|e| PanelError::remote(e.to_string(), None))?;
        let value = gateway.exec(GET_POLL_DATA, payload).await?;
        PollDetail::decode(value).map_err(|err| {
            warn!("could not load details for poll {}", id);
            PanelError::RemoteFailure {
                message: format!("Could not load details for poll ID: {}", id),
                details: err.details().cloned(),
            }
        })
    }

    /// Raw response list for a poll, as the backend sent it.
    pub async fn raw_responses<G: ActionGateway>(&self, gateway: &G, id: &str) -> Result<Value, PanelError> {
        let payload = serde_json::to_value(PollDataRequest::responses(id))
            .map_err(|e| PanelError::remote(e.to_string(), None))?;
        let value = gateway.exec(GET_POLL_DATA, payload).await?;
        debug!("raw responses for {}: {}", id, value);
        Ok(if is_blank(&value) { Value::Array(Vec::new()) } else { value })
    }

    pub fn raw_enabled(&self, id: &str) -> bool {
        self.raw_toggles.contains(id)
    }

    /// Flips the raw-responses toggle for one poll and returns the new state.
    pub fn toggle_raw(&mut self, id: &str) -> bool {
        if self.raw_toggles.remove(id) {
            false
        } else {
            self.raw_toggles.insert(id.to_string());
            true
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Vote rows in the order the backend listed the options.
pub fn vote_table(detail: &PollDetail) -> Vec<VoteRow> {
    detail
        .counts
        .iter()
        .map(|(option, count)| VoteRow {
            option: option.clone(),
            votes: count
                .as_u64()
                .or_else(|| count.as_f64().map(|f| f.max(0.0) as u64))
                .unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::testing::FakeGateway;
    use serde_json::json;

    fn detail_json(counts: Value) -> Value {
        json!({
            "definition": {
                "name": "Lunch?",
                "expires_at": "2026-10-20T12:00:00Z",
                "choices": ["Pizza", "Sushi"],
                "options": {"1": "Pizza", "2": "Sushi"},
            },
            "status": "ACTIVE",
            "total_responses": 4,
            "counts": counts,
        })
    }

    #[tokio::test]
    async fn details_are_fetched_on_every_call() {
        let gateway = FakeGateway::new()
            .reply(detail_json(json!({"Pizza": 3, "Sushi": 1})))
            .reply(detail_json(json!({"Pizza": 4, "Sushi": 1})));
        let viewer = DetailViewer::new();

        let first = viewer.view_details(&gateway, "g1").await.unwrap();
        let second = viewer.view_details(&gateway, "g1").await.unwrap();

        assert_eq!(vote_table(&first)[0].votes, 3);
        assert_eq!(vote_table(&second)[0].votes, 4);
        assert_eq!(gateway.call_count(), 2);
        assert_eq!(
            gateway.calls()[0].1,
            json!({"internal_poll_group_id": "g1", "data_type": "aggregated_results"})
        );
    }

    #[tokio::test]
    async fn vote_table_follows_mapping_order() {
        let gateway = FakeGateway::new().reply(detail_json(json!({"Sushi": 1, "Pizza": 3})));
        let detail = DetailViewer::new().view_details(&gateway, "g1").await.unwrap();
        assert_eq!(
            vote_table(&detail),
            vec![
                VoteRow { option: "Sushi".into(), votes: 1 },
                VoteRow { option: "Pizza".into(), votes: 3 },
            ]
        );
        assert_eq!(detail.total_responses, 4);
    }

    #[tokio::test]
    async fn missing_counts_give_an_empty_table() {
        let mut value = detail_json(json!({}));
        value.as_object_mut().unwrap().remove("counts");
        let gateway = FakeGateway::new().reply(value);
        let detail = DetailViewer::new().view_details(&gateway, "g1").await.unwrap();
        assert!(vote_table(&detail).is_empty());
    }

    #[tokio::test]
    async fn null_counts_and_total_render_the_empty_state() {
        let gateway = FakeGateway::new().reply(json!({
            "definition": {"name": "Lunch?"},
            "total_responses": null,
            "counts": null,
        }));
        let detail = DetailViewer::new().view_details(&gateway, "g1").await.unwrap();
        assert_eq!(detail.total_responses, 0);
        assert!(vote_table(&detail).is_empty());
    }

    #[tokio::test]
    async fn missing_definition_keeps_partial_payload() {
        let gateway = FakeGateway::new().reply(json!({"status": "error", "message": "unknown poll"}));
        let err = DetailViewer::new().view_details(&gateway, "nope").await.unwrap_err();
        assert_eq!(err.to_string(), "Could not load details for poll ID: nope");
        assert_eq!(err.details().unwrap()["message"], "unknown poll");
    }

    #[tokio::test]
    async fn raw_responses_are_passed_through() {
        let raw = json!([{"voter": "+1777", "selected": ["Pizza"]}]);
        let gateway = FakeGateway::new().reply(raw.clone()).reply(Value::Null);
        let viewer = DetailViewer::new();

        assert_eq!(viewer.raw_responses(&gateway, "g1").await.unwrap(), raw);
        assert_eq!(viewer.raw_responses(&gateway, "g1").await.unwrap(), json!([]));
        assert_eq!(gateway.calls()[0].1["data_type"], "responses");
    }

    #[test]
    fn raw_toggle_is_per_poll() {
        let mut viewer = DetailViewer::new();
        assert!(viewer.toggle_raw("g1"));
        assert!(viewer.raw_enabled("g1"));
        assert!(!viewer.raw_enabled("g2"));
        assert!(!viewer.toggle_raw("g1"));
        assert!(!viewer.raw_enabled("g1"));
    }
}
