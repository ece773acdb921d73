use std::future::Future;

use log::debug;
use serde_json::Value;
use thiserror::Error;

use crate::config::Settings;

pub const DISPATCH_NEW_POLL: &str = "dispatch_new_poll";
pub const GET_POLL_DATA: &str = "get_poll_data";
pub const MANAGE_POLL_CRUD: &str = "manage_poll_crud";

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("request to action walker failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("action walker answered HTTP {code}: {body}")]
    Status { code: u16, body: String },
    #[error("action walker returned invalid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Executes a named server-side action with a JSON payload and hands back the
/// JSON result. Every poll operation goes through this one call.
pub trait ActionGateway {
    fn exec(
        &self,
        action_name: &str,
        payload: Value,
    ) -> impl Future<Output = Result<Value, GatewayError>> + Send;
}

/// Talks to the action walker over HTTP.
pub struct HttpGateway {
    client: reqwest::Client,
    endpoint: String,
    agent_id: String,
    module_root: String,
    api_token: Option<String>,
}

impl HttpGateway {
    pub fn new(settings: &Settings) -> Self {
        let endpoint = format!(
            "{}/{}",
            settings.base_url.trim_end_matches('/'),
            settings.walker_endpoint.trim_start_matches('/')
        );
        Self {
            client: reqwest::Client::new(),
            endpoint,
            agent_id: settings.agent_id.clone(),
            module_root: settings.module_root.clone(),
            api_token: settings.api_token.clone().filter(|t| !t.is_empty()),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl ActionGateway for HttpGateway {
    async fn exec(&self, action_name: &str, payload: Value) -> Result<Value, GatewayError> {
        let args = serde_json::to_string(&payload)?;
        debug!("exec {} args={}", action_name, args);

        let form = [
            ("agent_id", self.agent_id.as_str()),
            ("module_root", self.module_root.as_str()),
            ("walker", action_name),
            ("args", args.as_str()),
        ];
        let mut request = self.client.post(&self.endpoint).form(&form);
        if let Some(token) = &self.api_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(GatewayError::Status {
                code: status.as_u16(),
                body,
            });
        }
        debug!("exec {} -> {}", action_name, body);

        // the walker answers an empty body when the action produced nothing
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&body)?)
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn settings(base_url: &str, endpoint: &str) -> Settings {
        Settings {
            base_url: base_url.into(),
            walker_endpoint: endpoint.into(),
            agent_id: "agent-1".into(),
            module_root: "actions/poll_manager".into(),
            api_token: Some(String::new()),
            page_limit: 10,
            log_file: None,
            action: BTreeMap::new(),
        }
    }

    #[test]
    fn endpoint_joins_without_double_slashes() {
        let gw = HttpGateway::new(&settings("http://localhost:8000/", "/action/walker"));
        assert_eq!(gw.endpoint(), "http://localhost:8000/action/walker");
    }

    #[test]
    fn empty_token_is_not_sent() {
        let gw = HttpGateway::new(&settings("http://localhost:8000", "action/walker"));
        assert!(gw.api_token.is_none());
    }
}
