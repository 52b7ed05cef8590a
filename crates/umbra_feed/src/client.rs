use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Map, Value};
use std::time::Duration;
use tokio::sync::RwLock;
use umbra_core::config::FeedConfig;
use umbra_core::{FeedClient, FeedError, Stimulus, StimulusView};
use url::Url;

use crate::session::SessionFile;

/// Appended to the text when the bridge cannot attach a native quote.
pub const STATUS_URL_PREFIX: &str = "https://x.com/i/status/";

/// Post id reported when the bridge accepted a post but its reply carried no id.
pub const UNCONFIRMED_POST_ID: &str = "unconfirmed";

/// Account the current session belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionInfo {
    pub screen_name: String,
    pub user_id: Option<String>,
}

/// Feed client speaking JSON to a platform bridge.
///
/// Every call makes sure a session exists first. A 401/403 mid-session
/// triggers one re-login and one replay of the request.
pub struct HttpFeedClient {
    client: Client,
    base_url: Url,
    session_file: SessionFile,
    session: RwLock<Option<SessionInfo>>,
}

fn transport(e: reqwest::Error) -> FeedError {
    FeedError::Transient(format!("Bridge request failed: {}", e))
}

fn classify(status: StatusCode, body: &str) -> FeedError {
    let snippet: String = body.chars().take(200).collect();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            FeedError::Auth(format!("Bridge rejected session ({}): {}", status, snippet))
        }
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            FeedError::Transient(format!("Bridge throttled ({}): {}", status, snippet))
        }
        s if s.is_server_error() => FeedError::Transient(format!("Bridge error ({}): {}", status, snippet)),
        _ => FeedError::Rejected(format!("Bridge refused request ({}): {}", status, snippet)),
    }
}

/// Empty body reads as `null`.
fn parse_body(body: &str) -> Result<Value, FeedError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(body)
        .map_err(|e| FeedError::Malformed(format!("Bridge returned invalid JSON: {}", e)))
}

/// Array of posts, or `{"posts": [...]}`; `null` reads as empty.
fn post_list(value: Value) -> Result<Vec<Value>, FeedError> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => Ok(items),
        Value::Object(mut map) => match map.remove("posts") {
            Some(Value::Array(items)) => Ok(items),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(FeedError::Malformed(format!("Unexpected posts field: {}", other))),
        },
        other => Err(FeedError::Malformed(format!("Expected a list of posts, got {}", other))),
    }
}

impl HttpFeedClient {
    pub fn new(config: &FeedConfig) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(&config.base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            session_file: SessionFile::new(&config.session_path),
            session: RwLock::new(None),
        })
    }

    pub async fn session(&self) -> Option<SessionInfo> {
        self.session.read().await.clone()
    }

    fn endpoint(&self, path: &str) -> Result<Url, FeedError> {
        self.base_url
            .join(path)
            .map_err(|e| FeedError::Malformed(format!("Bad endpoint {}: {}", path, e)))
    }

    /// Raw body of a successful response.
    async fn send(&self, request: RequestBuilder) -> Result<String, FeedError> {
        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        let body = response.text().await.map_err(transport)?;
        if !status.is_success() {
            return Err(classify(status, &body));
        }
        Ok(body)
    }

    async fn ensure_session(&self) -> Result<(), FeedError> {
        if self.session.read().await.is_some() {
            return Ok(());
        }
        self.login().await
    }

    /// Run a request under a live session, re-authenticating once on 401/403.
    async fn call<F>(&self, build: F) -> Result<String, FeedError>
    where
        F: Fn() -> Result<RequestBuilder, FeedError>,
    {
        self.ensure_session().await?;
        match self.send(build()?).await {
            Err(FeedError::Auth(reason)) => {
                tracing::warn!("Session rejected ({}), logging in again", reason);
                *self.session.write().await = None;
                self.login().await?;
                self.send(build()?).await
            }
            other => other,
        }
    }

    /// Once the bridge has accepted the post it is live, so an unreadable
    /// reply still counts as published.
    async fn create_post(&self, body: Value) -> Result<String, FeedError> {
        let url = self.endpoint("posts")?;
        let reply = self
            .call(|| Ok(self.client.post(url.clone()).json(&body)))
            .await?;
        let id = match parse_body(&reply) {
            Ok(Value::Object(map)) => map.get_id(),
            _ => None,
        };
        Ok(id.unwrap_or_else(|| {
            let snippet: String = reply.chars().take(200).collect();
            tracing::warn!("Post accepted but reply carries no id: {}", snippet);
            UNCONFIRMED_POST_ID.to_string()
        }))
    }
}

#[async_trait]
impl FeedClient for HttpFeedClient {
    async fn login(&self) -> Result<(), FeedError> {
        let cookies = self.session_file.load().await?;
        tracing::info!("Loading session from {}", self.session_file.path().display());

        let url = self.endpoint("session")?;
        let reply = self
            .send(self.client.post(url).json(&json!({ "cookies": cookies })))
            .await?;
        let mut reply = match parse_body(&reply)? {
            Value::Object(map) => map,
            _ => Map::new(),
        };

        let screen_name = reply
            .get("screen_name")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let info = SessionInfo {
            screen_name,
            user_id: reply.get_id(),
        };
        tracing::info!(user_id = ?info.user_id, "Logged in as @{}", info.screen_name);

        // The bridge may hand back refreshed cookies
        if let Some(fresh) = reply.remove("cookies").filter(|c| !c.is_null()) {
            if let Err(e) = self.session_file.save(&fresh).await {
                tracing::warn!("Failed to save refreshed session: {}", e);
            }
        }

        *self.session.write().await = Some(info);
        Ok(())
    }

    async fn latest_post(&self, account: &str) -> Result<Option<Stimulus>, FeedError> {
        let url = self.endpoint("posts")?;
        let body = self
            .call(|| {
                Ok(self
                    .client
                    .get(url.clone())
                    .query(&[("author", account), ("limit", "1")]))
            })
            .await?;
        Ok(post_list(parse_body(&body)?)?.into_iter().next().map(Stimulus::host))
    }

    async fn pending_mentions(&self, limit: usize) -> Result<Vec<Stimulus>, FeedError> {
        let url = self.endpoint("mentions")?;
        let limit = limit.to_string();
        let body = self
            .call(|| Ok(self.client.get(url.clone()).query(&[("limit", limit.as_str())])))
            .await?;
        Ok(post_list(parse_body(&body)?)?.into_iter().map(Stimulus::mention).collect())
    }

    async fn publish(
        &self,
        text: &str,
        reply_to: Option<&str>,
        quote_of: Option<&str>,
    ) -> Result<String, FeedError> {
        let preview: String = text.chars().take(30).collect();
        match (quote_of, reply_to) {
            (Some(quoted), _) => {
                tracing::info!("Publishing quote of {}: {}...", quoted, preview);
                match self.create_post(json!({ "text": text, "quote_of": quoted })).await {
                    Err(FeedError::Rejected(reason)) => {
                        tracing::warn!("Native quote refused ({}), posting link instead", reason);
                        let linked = format!("{} {}{}", text, STATUS_URL_PREFIX, quoted);
                        self.create_post(json!({ "text": linked })).await
                    }
                    other => other,
                }
            }
            (None, Some(parent)) => {
                tracing::info!("Publishing reply to {}: {}...", parent, preview);
                self.create_post(json!({ "text": text, "reply_to": parent })).await
            }
            (None, None) => {
                tracing::info!("Publishing new post: {}...", preview);
                self.create_post(json!({ "text": text })).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_statuses() {
        assert!(matches!(classify(StatusCode::UNAUTHORIZED, ""), FeedError::Auth(_)));
        assert!(matches!(classify(StatusCode::FORBIDDEN, ""), FeedError::Auth(_)));
        assert!(classify(StatusCode::TOO_MANY_REQUESTS, "").is_transient());
        assert!(classify(StatusCode::BAD_GATEWAY, "").is_transient());
        assert!(matches!(classify(StatusCode::BAD_REQUEST, ""), FeedError::Rejected(_)));
        assert!(matches!(classify(StatusCode::UNPROCESSABLE_ENTITY, ""), FeedError::Rejected(_)));
    }

    #[test]
    fn test_parse_body() {
        assert_eq!(parse_body("  ").unwrap(), Value::Null);
        assert_eq!(parse_body(r#"{"id": 1}"#).unwrap(), json!({"id": 1}));
        assert!(matches!(parse_body("<html>"), Err(FeedError::Malformed(_))));
    }

    #[test]
    fn test_post_list_shapes() {
        assert!(post_list(Value::Null).unwrap().is_empty());
        assert_eq!(post_list(json!([{"id": "1"}])).unwrap().len(), 1);
        assert_eq!(post_list(json!({"posts": [{"id": "1"}, {"id": "2"}]})).unwrap().len(), 2);
        assert!(post_list(json!({"posts": null})).unwrap().is_empty());
        assert!(post_list(json!("nope")).is_err());
    }

    #[test]
    fn test_base_url_gets_trailing_slash() {
        let config = FeedConfig {
            base_url: "http://127.0.0.1:8787/bridge".to_string(),
            ..FeedConfig::default()
        };
        let client = HttpFeedClient::new(&config).unwrap();
        assert_eq!(client.endpoint("posts").unwrap().as_str(), "http://127.0.0.1:8787/bridge/posts");
    }
}
