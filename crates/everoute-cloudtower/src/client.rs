//! Cloudtower transport
//!
//! [`CloudtowerApi`] is the seam between the provider and the network: two
//! raw primitives, one per Cloudtower API surface. [`HttpCloudtower`] talks
//! to a real server; tests plug in an in-memory implementation.

use crate::error::{CloudtowerError, Result};
use crate::graphql::{self, Document};
use async_trait::async_trait;
use everoute_config::{Credentials, ResolvedConfig};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Response header carrying the id of the task a mutation started
pub const TASK_ID_HEADER: &str = "x-task-id";

/// A GraphQL request body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphqlRequest {
    pub query: &'static str,
    #[serde(rename = "operationName")]
    pub operation_name: &'static str,
    pub variables: Value,
}

impl GraphqlRequest {
    pub fn new(document: Document, variables: Value) -> Self {
        Self {
            query: document.query,
            operation_name: document.operation_name,
            variables,
        }
    }
}

/// The `data` of a successful GraphQL call plus the task it started, if any
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphqlResponse {
    pub data: Value,
    pub task_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphqlEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphqlErrorItem>,
}

#[derive(Debug, Deserialize)]
struct GraphqlErrorItem {
    message: String,
}

/// Raw Cloudtower calls
#[async_trait]
pub trait CloudtowerApi: Send + Sync {
    /// POST a document to the GraphQL endpoint
    async fn graphql(&self, request: &GraphqlRequest) -> Result<GraphqlResponse>;

    /// POST `body` to a REST endpoint, e.g. `get-clusters`
    async fn rest(&self, endpoint: &str, body: &Value) -> Result<Value>;
}

/// HTTP implementation of [`CloudtowerApi`]
pub struct HttpCloudtower {
    client: reqwest::Client,
    graphql_url: String,
    rest_url: String,
    token: String,
}

impl HttpCloudtower {
    /// Build a client with an already issued token
    pub fn with_token(base_url: &str, token: impl Into<String>) -> Self {
        let base_url = base_url.trim_end_matches('/');
        Self {
            client: reqwest::Client::new(),
            graphql_url: format!("{}/api/", base_url),
            rest_url: format!("{}/v2/api", base_url),
            token: token.into(),
        }
    }

    /// Build a client from resolved settings, logging in unless a token is configured
    pub async fn connect(config: &ResolvedConfig) -> Result<Self> {
        let base_url = config.base_url();
        match &config.credentials {
            Credentials::Token(token) => {
                tracing::debug!("Using configured token for {}", base_url);
                Ok(Self::with_token(&base_url, token.clone()))
            }
            Credentials::Login { username, password } => {
                let mut client = Self::with_token(&base_url, String::new());
                client.token = client.login(username, password).await?;
                tracing::info!("Logged in to {} as {}", base_url, username);
                Ok(client)
            }
        }
    }

    async fn login(&self, username: &str, password: &str) -> Result<String> {
        let request = GraphqlRequest::new(
            graphql::LOGIN,
            json!({
                "data": {
                    "username": username,
                    "password": password,
                    "source": "LOCAL",
                }
            }),
        );
        let response = self
            .graphql(&request)
            .await
            .map_err(|e| CloudtowerError::LoginFailed(e.to_string()))?;

        response
            .data
            .pointer("/login/token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CloudtowerError::LoginFailed("no token in login response".to_string()))
    }

    fn authorized(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.token.is_empty() {
            builder
        } else {
            // Cloudtower expects the raw token, no scheme prefix
            builder.header(reqwest::header::AUTHORIZATION, &self.token)
        }
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(CloudtowerError::Status {
        status: status.as_u16(),
        body,
    })
}

#[async_trait]
impl CloudtowerApi for HttpCloudtower {
    async fn graphql(&self, request: &GraphqlRequest) -> Result<GraphqlResponse> {
        tracing::debug!("GraphQL {}", request.operation_name);

        let response = self
            .authorized(self.client.post(&self.graphql_url))
            .json(request)
            .send()
            .await?;
        let response = check_status(response).await?;

        let task_id = response
            .headers()
            .get(TASK_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);

        let envelope: GraphqlEnvelope = response.json().await?;
        if !envelope.errors.is_empty() {
            return Err(CloudtowerError::Graphql(
                envelope.errors.into_iter().map(|e| e.message).collect(),
            ));
        }

        Ok(GraphqlResponse {
            data: envelope.data.unwrap_or(Value::Null),
            task_id,
        })
    }

    async fn rest(&self, endpoint: &str, body: &Value) -> Result<Value> {
        let url = format!("{}/{}", self.rest_url, endpoint);
        tracing::debug!("POST {}", url);

        let response = self
            .authorized(self.client.post(&url))
            .json(body)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }
}
