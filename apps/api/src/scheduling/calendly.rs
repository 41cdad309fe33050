//! Calendly REST provider.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::Value;

use crate::scheduling::{SchedulingError, SchedulingProvider};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

pub struct CalendlyProvider {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl CalendlyProvider {
    pub fn new(base_url: impl Into<String>, token: Option<String>) -> Result<Self, SchedulingError> {
        Ok(Self {
            client: Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    async fn get(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, SchedulingError> {
        let token = self
            .token
            .as_deref()
            .ok_or(SchedulingError::MissingCredential)?;

        let response = self
            .client
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(token)
            .query(query)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(SchedulingError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(SchedulingError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl SchedulingProvider for CalendlyProvider {
    async fn current_user_uri(&self) -> Result<String, SchedulingError> {
        let body = self.get("/users/me", &[]).await?;
        parse_user_uri(&body)
    }

    async fn event_type_link(&self, user_uri: &str) -> Result<String, SchedulingError> {
        let body = self.get("/event_types", &[("user", user_uri)]).await?;
        parse_scheduling_url(&body)
    }
}

fn parse_user_uri(body: &Value) -> Result<String, SchedulingError> {
    body.pointer("/resource/uri")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(SchedulingError::MissingField("resource.uri"))
}

fn parse_scheduling_url(body: &Value) -> Result<String, SchedulingError> {
    body.pointer("/collection/0/scheduling_url")
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or(SchedulingError::MissingField("collection[0].scheduling_url"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_user_uri() {
        let body = json!({"resource": {"uri": "https://api.calendly.com/users/ABC", "name": "HR"}});
        assert_eq!(parse_user_uri(&body).unwrap(), "https://api.calendly.com/users/ABC");
        assert!(matches!(
            parse_user_uri(&json!({})),
            Err(SchedulingError::MissingField("resource.uri"))
        ));
    }

    #[test]
    fn test_parse_first_event_type() {
        let body = json!({"collection": [
            {"scheduling_url": "https://calendly.com/acme/30min"},
            {"scheduling_url": "https://calendly.com/acme/60min"}
        ]});
        assert_eq!(
            parse_scheduling_url(&body).unwrap(),
            "https://calendly.com/acme/30min"
        );
        assert!(parse_scheduling_url(&json!({"collection": []})).is_err());
    }

    #[tokio::test]
    async fn test_missing_token_short_circuits() {
        let provider = CalendlyProvider::new("http://127.0.0.1:9", None).unwrap();
        assert!(matches!(
            provider.current_user_uri().await,
            Err(SchedulingError::MissingCredential)
        ));
    }
}
