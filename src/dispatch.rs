use log::{info, warn};
use serde_json::Value;

use crate::error::PanelError;
use crate::models::{DispatchRequest, DispatchResponse, FormDraft, plain};
use crate::network::{ActionGateway, DISPATCH_NEW_POLL};
use crate::polls::PollsCache;

/// What the backend said about a dispatched poll.
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchOutcome {
    pub whatsapp_poll_id: String,
    pub internal_poll_group_id: String,
    pub raw: Value,
}

impl DispatchOutcome {
    pub fn message(&self) -> String {
        format!(
            "Poll dispatch initiated! WA ID: {}, Internal Group ID: {}",
            self.whatsapp_poll_id, self.internal_poll_group_id
        )
    }
}

/// Splits the comma-separated choices, trims each one and drops the empties.
pub fn parse_choices(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Checks the draft and turns it into the `dispatch_new_poll` payload.
pub fn build_request(draft: &FormDraft) -> Result<DispatchRequest, PanelError> {
    if [&draft.target_user, &draft.poll_name, &draft.choices]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err(PanelError::Validation(
            "Target User, Poll Name, and Choices are required.".into(),
        ));
    }

    let choices = parse_choices(&draft.choices);
    if choices.is_empty() {
        return Err(PanelError::Validation(
            "Please provide at least one poll choice.".into(),
        ));
    }

    let preferred = draft.preferred_internal_id.trim();
    Ok(DispatchRequest {
        target_user_session_id: draft.target_user.trim().to_string(),
        poll_name: draft.poll_name.trim().to_string(),
        choices,
        selectable_count: draft.selectable_count.max(1),
        duration_minutes: (draft.duration_minutes > 0).then_some(draft.duration_minutes),
        preferred_internal_id: (!preferred.is_empty()).then(|| preferred.to_string()),
    })
}

/// Validates the draft, sends it, and on success drops the cached poll list.
///
/// A validation error returns before anything goes over the wire. A failed
/// dispatch leaves the cache alone.
pub async fn submit<G: ActionGateway>(
    gateway: &G,
    draft: &FormDraft,
    cache: &mut PollsCache,
) -> Result<DispatchOutcome, PanelError> {
    let request = build_request(draft)?;
    let payload = serde_json::to_value(&request).map_err(|e| PanelError::remote(e.to_string(), None))?;

    info!("dispatching poll {:?} to {}", request.poll_name, request.target_user_session_id);
    let raw = gateway.exec(DISPATCH_NEW_POLL, payload).await?;

    if !raw.is_object() {
        warn!("dispatch_new_poll returned a non-object: {}", raw);
        return Err(PanelError::MalformedResponse {
            action: DISPATCH_NEW_POLL,
            expected: "missing `status`",
            payload: raw,
        });
    }
    let response: DispatchResponse = serde_json::from_value(raw.clone()).unwrap_or_default();

    if response.succeeded() {
        let outcome = DispatchOutcome {
            whatsapp_poll_id: plain(response.whatsapp_poll_id.as_ref()),
            internal_poll_group_id: plain(response.internal_poll_group_id.as_ref()),
            raw,
        };
        info!("{}", outcome.message());
        cache.invalidate();
        Ok(outcome)
    } else {
        let message = response.message.unwrap_or_else(|| "Unknown error".into());
        warn!("dispatch failed: {}", message);
        Err(PanelError::RemoteFailure {
            message: format!("Failed to dispatch poll: {}", message),
            // the whole reply, `details` included, goes next to the message
            details: Some(raw),
        })
    }
}
