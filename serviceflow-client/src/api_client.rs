//! API client layer for the REST and WebSocket connections.
//!
//! Both halves are plain owned values built from config - no module-level
//! singletons - so tests and parallel sessions can hold independent
//! instances with independent lifecycles.

use crate::config::{ClientConfig, ReconnectConfig};
use reqwest::header::{HeaderMap, HeaderValue};
use serviceflow_api::types::{ApiErrorBody, MoveCardRequest, RawBoardSnapshot};
use serviceflow_core::CardId;
use std::time::Duration;
use tokio_tungstenite::tungstenite;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

#[derive(Debug, thiserror::Error)]
pub enum ApiClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("WebSocket error: {0}")]
    WebSocket(Box<tungstenite::Error>),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Move rejected (HTTP {status}): {}", .message.as_deref().unwrap_or("no detail"))]
    Rejected {
        status: u16,
        message: Option<String>,
    },
    #[error("Unexpected response: {0}")]
    InvalidResponse(String),
    #[error("Config error: {0}")]
    Config(String),
}

impl From<tungstenite::Error> for ApiClientError {
    fn from(err: tungstenite::Error) -> Self {
        Self::WebSocket(Box::new(err))
    }
}

impl ApiClientError {
    /// A handshake rejection that retrying cannot fix (bad credentials),
    /// as opposed to a transiently unreachable channel.
    pub fn is_terminal_handshake(&self) -> bool {
        match self {
            ApiClientError::WebSocket(err) => match err.as_ref() {
                tungstenite::Error::Http(response) => {
                    let status = response.status();
                    status == 401 || status == 403
                }
                _ => false,
            },
            _ => false,
        }
    }
}

#[derive(Clone)]
pub struct ApiClient {
    rest: RestClient,
    ws: WsClient,
}

impl ApiClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let rest = RestClient::new(config)?;
        let ws = WsClient::new(config);
        Ok(Self { rest, ws })
    }

    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    pub fn ws(&self) -> &WsClient {
        &self.ws
    }
}

#[derive(Clone)]
pub struct RestClient {
    client: reqwest::Client,
    base_url: String,
    auth_header: HeaderMap,
}

impl RestClient {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiClientError> {
        let timeout = Duration::from_millis(config.request_timeout_ms);
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let auth_header = build_auth_headers(config.auth_token.as_deref())?;
        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            auth_header,
        })
    }

    /// Fetch the authoritative board snapshot.
    pub async fn fetch_board(&self) -> Result<RawBoardSnapshot, ApiClientError> {
        let url = format!("{}/api/customers/admin/workflow/", self.base_url);
        let response = self
            .client
            .get(url)
            .headers(self.auth_header.clone())
            .send()
            .await?;
        self.parse_response(response).await
    }

    /// Ask the backend to relocate one card. The success body is ignored
    /// beyond status; a failure body's `error` text is carried in the error.
    pub async fn move_card(
        &self,
        card_id: &CardId,
        request: &MoveCardRequest,
    ) -> Result<(), ApiClientError> {
        let url = format!(
            "{}/api/customers/admin/workflow/{}/move_card/",
            self.base_url, card_id
        );
        let response = self
            .client
            .post(url)
            .headers(self.auth_header.clone())
            .json(request)
            .send()
            .await?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorBody>(&text)
            .ok()
            .and_then(|body| body.text().map(str::to_string));
        Err(ApiClientError::Rejected {
            status: status.as_u16(),
            message,
        })
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, ApiClientError> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json::<T>().await?)
        } else {
            let text = response.text().await?;
            if let Ok(body) = serde_json::from_str::<ApiErrorBody>(&text) {
                if let Some(message) = body.text() {
                    return Err(ApiClientError::InvalidResponse(format!(
                        "HTTP {}: {}",
                        status.as_u16(),
                        message
                    )));
                }
            }
            Err(ApiClientError::InvalidResponse(format!(
                "HTTP {}: {}",
                status.as_u16(),
                text
            )))
        }
    }
}

#[derive(Clone)]
pub struct WsClient {
    endpoint: String,
    namespace: String,
    token: Option<String>,
    reconnect: ReconnectConfig,
    heartbeat_interval_ms: u64,
    fallback_poll_interval_ms: u64,
}

impl WsClient {
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            endpoint: config.ws_endpoint.trim_end_matches('/').to_string(),
            namespace: config.board_namespace.clone(),
            token: config.auth_token.clone(),
            reconnect: config.reconnect.clone(),
            heartbeat_interval_ms: config.heartbeat_interval_ms,
            fallback_poll_interval_ms: config.fallback_poll_interval_ms,
        }
    }

    /// Open one subscription to the board namespace.
    pub async fn connect(
        &self,
    ) -> Result<WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>, ApiClientError> {
        let (stream, _) = tokio_tungstenite::connect_async(self.url()).await?;
        Ok(stream)
    }

    /// Subscription URL: namespace path plus the auth token as a query
    /// parameter, which is how the backend authenticates channel clients.
    pub fn url(&self) -> String {
        let mut url = format!("{}/{}/", self.endpoint, self.namespace);
        if let Some(token) = &self.token {
            url.push_str("?token=");
            url.push_str(&urlencoding::encode(token));
        }
        url
    }

    pub fn reconnect_config(&self) -> &ReconnectConfig {
        &self.reconnect
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn fallback_poll_interval(&self) -> Duration {
        Duration::from_millis(self.fallback_poll_interval_ms)
    }
}

fn build_auth_headers(token: Option<&str>) -> Result<HeaderMap, ApiClientError> {
    let mut headers = HeaderMap::new();
    if let Some(token) = token {
        let value = format!("Bearer {}", token);
        headers.insert(
            reqwest::header::AUTHORIZATION,
            HeaderValue::from_str(&value).map_err(|e| ApiClientError::Config(e.to_string()))?,
        );
    }
    Ok(headers)
}
