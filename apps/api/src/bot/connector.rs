//! Outbound calls to the bot connector service.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::schema::{
    Activity, ConversationParameters, ConversationResourceResponse, ResourceResponse,
    TeamsChannelAccount,
};

const TOKEN_URL: &str = "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token";
const TOKEN_SCOPE: &str = "https://api.botframework.com/.default";
/// Tokens are refreshed this long before they expire.
const TOKEN_REFRESH_MARGIN: Duration = Duration::from_secs(300);

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Connector error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Token request failed (status {status}): {message}")]
    Token { status: u16, message: String },
}

#[async_trait]
pub trait BotConnector: Send + Sync {
    async fn send_to_conversation(
        &self,
        service_url: &str,
        conversation_id: &str,
        activity: &Activity,
    ) -> Result<ResourceResponse, ConnectorError>;

    async fn update_activity(
        &self,
        service_url: &str,
        conversation_id: &str,
        activity_id: &str,
        activity: &Activity,
    ) -> Result<(), ConnectorError>;

    async fn create_conversation(
        &self,
        service_url: &str,
        parameters: &ConversationParameters,
    ) -> Result<ConversationResourceResponse, ConnectorError>;

    async fn get_team_members(
        &self,
        service_url: &str,
        team_id: &str,
    ) -> Result<Vec<TeamsChannelAccount>, ConnectorError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: u64,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

/// REST client for the connector API, authenticated with the bot's app
/// credentials.
pub struct ConnectorClient {
    client: Client,
    app_id: String,
    app_password: String,
    token: Mutex<Option<CachedToken>>,
}

impl ConnectorClient {
    pub fn new(app_id: String, app_password: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            app_id,
            app_password,
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> Result<String, ConnectorError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        debug!("Requesting bot connector token");
        let response = self
            .client
            .post(TOKEN_URL)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.app_id.as_str()),
                ("client_secret", self.app_password.as_str()),
                ("scope", TOKEN_SCOPE),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!("Token request failed with {status}");
            return Err(ConnectorError::Token {
                status: status.as_u16(),
                message,
            });
        }

        let token: TokenResponse = response.json().await?;
        let lifetime = Duration::from_secs(token.expires_in).saturating_sub(TOKEN_REFRESH_MARGIN);
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            refresh_at: Instant::now() + lifetime,
        });
        Ok(token.access_token)
    }
}

fn conversations_url(service_url: &str) -> String {
    format!("{}/v3/conversations", service_url.trim_end_matches('/'))
}

fn encode(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

async fn check(response: Response) -> Result<Response, ConnectorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!("Connector returned {status}: {message}");
    Err(ConnectorError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl BotConnector for ConnectorClient {
    async fn send_to_conversation(
        &self,
        service_url: &str,
        conversation_id: &str,
        activity: &Activity,
    ) -> Result<ResourceResponse, ConnectorError> {
        let url = format!(
            "{}/{}/activities",
            conversations_url(service_url),
            encode(conversation_id)
        );
        let response = self
            .client
            .post(url)
            .bearer_auth(self.access_token().await?)
            .json(activity)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn update_activity(
        &self,
        service_url: &str,
        conversation_id: &str,
        activity_id: &str,
        activity: &Activity,
    ) -> Result<(), ConnectorError> {
        let url = format!(
            "{}/{}/activities/{}",
            conversations_url(service_url),
            encode(conversation_id),
            encode(activity_id)
        );
        let response = self
            .client
            .put(url)
            .bearer_auth(self.access_token().await?)
            .json(activity)
            .send()
            .await?;
        check(response).await?;
        Ok(())
    }

    async fn create_conversation(
        &self,
        service_url: &str,
        parameters: &ConversationParameters,
    ) -> Result<ConversationResourceResponse, ConnectorError> {
        let response = self
            .client
            .post(conversations_url(service_url))
            .bearer_auth(self.access_token().await?)
            .json(parameters)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn get_team_members(
        &self,
        service_url: &str,
        team_id: &str,
    ) -> Result<Vec<TeamsChannelAccount>, ConnectorError> {
        let url = format!("{}/{}/members", conversations_url(service_url), encode(team_id));
        let response = self
            .client
            .get(url)
            .bearer_auth(self.access_token().await?)
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }
}
