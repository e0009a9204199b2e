//! Hosted auth/data service client (Supabase REST: GoTrue auth + PostgREST tables).
//!
//! The service owns storage and auth semantics. This module only shuttles
//! requests: no token refresh, expiry or local persistence.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::ClientError;
use crate::config::SupabaseConfig;
use crate::models::history::{HistoryRecord, NewHistoryRecord};

const AUTH_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
}

/// A signed-in user and the bearer token the service issued for them.
#[derive(Clone, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    pub user: User,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("access_token", &"<redacted>")
            .field("user", &self.user)
            .finish()
    }
}

/// Auth state transitions published by the service client.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(AuthSession),
    SignedOut,
    UserUpdated(User),
}

#[async_trait]
pub trait AuthService: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), ClientError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ClientError>;

    async fn sign_out(&self, session: &AuthSession) -> Result<(), ClientError>;

    /// The user behind `session`, or `None` when signed out or the token is no
    /// longer accepted. A rejected token also publishes `AuthEvent::SignedOut`.
    async fn get_current_user(&self, session: Option<&AuthSession>) -> Result<Option<User>, ClientError>;

    /// Subscribes to auth state changes. Each receiver sees every event sent after it subscribed.
    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert_history(
        &self,
        session: &AuthSession,
        record: &NewHistoryRecord,
    ) -> Result<(), ClientError>;

    /// The signed-in user's records, newest first.
    async fn list_history(&self, session: &AuthSession) -> Result<Vec<HistoryRecord>, ClientError>;
}

/// Column ordering for `query_rows`.
#[derive(Debug, Clone, Copy)]
pub struct OrderBy<'a> {
    pub column: &'a str,
    pub ascending: bool,
}

impl OrderBy<'_> {
    fn to_param(self) -> String {
        let direction = if self.ascending { "asc" } else { "desc" };
        format!("{}.{direction}", self.column)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    user: User,
}

/// GoTrue error bodies vary by endpoint and version.
#[derive(Debug, Default, Deserialize)]
struct ServiceErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
    error: Option<String>,
}

impl ServiceErrorBody {
    fn into_message(self) -> Option<String> {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .or(self.error)
    }
}

pub struct SupabaseClient {
    client: Client,
    url: String,
    anon_key: String,
    history_table: String,
    events: broadcast::Sender<AuthEvent>,
}

impl SupabaseClient {
    pub fn new(config: &SupabaseConfig, history_table: &str) -> Self {
        let (events, _) = broadcast::channel(AUTH_EVENT_CAPACITY);
        Self {
            client: Client::new(),
            url: config.url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            history_table: history_table.to_string(),
            events,
        }
    }

    /// POST /rest/v1/{table}
    pub async fn insert_row<T: Serialize + Sync>(
        &self,
        session: &AuthSession,
        table: &str,
        record: &T,
    ) -> Result<(), ClientError> {
        let response = self
            .authorized(self.client.post(self.rest_url(table)), session)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;
        data_success(response).await?;
        debug!(table, "Inserted row");
        Ok(())
    }

    /// GET /rest/v1/{table}?select=*&order={column}.{direction}
    pub async fn query_rows<T: DeserializeOwned>(
        &self,
        session: &AuthSession,
        table: &str,
        order_by: OrderBy<'_>,
    ) -> Result<Vec<T>, ClientError> {
        let response = self
            .authorized(self.client.get(self.rest_url(table)), session)
            .query(&[("select", "*".to_string()), ("order", order_by.to_param())])
            .send()
            .await?;
        Ok(data_success(response).await?.json().await?)
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.url)
    }

    fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.url)
    }

    fn anonymous(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.header("apikey", &self.anon_key)
    }

    fn authorized(&self, builder: RequestBuilder, session: &AuthSession) -> RequestBuilder {
        self.anonymous(builder).bearer_auth(&session.access_token)
    }

    /// POST /auth/v1/logout
    async fn logout(&self, session: &AuthSession) -> Result<(), ClientError> {
        let response = self
            .authorized(self.client.post(self.auth_url("logout")), session)
            .send()
            .await?;
        auth_success(response).await?;
        Ok(())
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl AuthService for SupabaseClient {
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), ClientError> {
        let response = self
            .anonymous(self.client.post(self.auth_url("signup")))
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        auth_success(response).await?;
        info!("Registered new account");
        Ok(())
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, ClientError> {
        let response = self
            .anonymous(self.client.post(self.auth_url("token")))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await?;
        let token: TokenResponse = auth_success(response).await?.json().await?;

        let session = AuthSession {
            access_token: token.access_token,
            user: token.user,
        };
        info!(user_id = %session.user.id, "Signed in");
        self.publish(AuthEvent::SignedIn(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self, session: &AuthSession) -> Result<(), ClientError> {
        let result = self.logout(session).await;

        // Local state is cleared even when the service call fails.
        self.publish(AuthEvent::SignedOut);
        result
    }

    async fn get_current_user(&self, session: Option<&AuthSession>) -> Result<Option<User>, ClientError> {
        let Some(session) = session else {
            return Ok(None);
        };
        let response = self
            .authorized(self.client.get(self.auth_url("user")), session)
            .send()
            .await?;
        if matches!(response.status().as_u16(), 401 | 403) {
            info!(user_id = %session.user.id, "Session token rejected");
            self.publish(AuthEvent::SignedOut);
            return Ok(None);
        }
        let user: User = auth_success(response).await?.json().await?;
        if user != session.user {
            self.publish(AuthEvent::UserUpdated(user.clone()));
        }
        Ok(Some(user))
    }

    fn on_auth_state_change(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }
}

#[async_trait]
impl HistoryStore for SupabaseClient {
    async fn insert_history(
        &self,
        session: &AuthSession,
        record: &NewHistoryRecord,
    ) -> Result<(), ClientError> {
        self.insert_row(session, &self.history_table, &[record]).await
    }

    async fn list_history(&self, session: &AuthSession) -> Result<Vec<HistoryRecord>, ClientError> {
        self.query_rows(
            session,
            &self.history_table,
            OrderBy {
                column: "created_at",
                ascending: false,
            },
        )
        .await
    }
}

async fn auth_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Auth(service_message(status.as_u16(), &body)))
}

async fn data_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ClientError::Data {
        status: status.as_u16(),
        message: service_message(status.as_u16(), &body),
    })
}

fn service_message(status: u16, body: &str) -> String {
    serde_json::from_str::<ServiceErrorBody>(body)
        .ok()
        .and_then(ServiceErrorBody::into_message)
        .unwrap_or_else(|| format!("Request failed with status {status}"))
}
