// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! Suggestion service client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{ApprovalState, NewSuggestion, Result, Suggestion, SuggestionError};

/// Operations offered by the suggestion service.
#[async_trait]
pub trait SuggestionService: Send + Sync {
    /// Register a forum post as a suggestion. Returns the new id.
    async fn add(&self, suggestion: &NewSuggestion) -> Result<u64>;

    /// Change the state of a suggestion.
    async fn update_state(&self, id: u64, state: ApprovalState) -> Result<Suggestion>;

    /// Delete a suggestion.
    async fn delete(&self, id: u64) -> Result<()>;

    /// Fetch one suggestion by id.
    async fn get(&self, id: u64) -> Result<Suggestion>;

    /// All suggestions by one author.
    async fn by_author(&self, user_id: &str) -> Result<Vec<Suggestion>>;

    /// The suggestion created from a forum post.
    async fn by_message(&self, message_id: &str) -> Result<Suggestion>;
}

/// HTTP client for the suggestion service.
///
/// Mutating requests carry the shared secret as `pass` in the JSON body.
pub struct HttpSuggestionService {
    client: Client,
    base_url: String,
    auth: String,
}

impl HttpSuggestionService {
    /// Create a client for the service at `host`.
    pub fn new(host: &str, auth: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| SuggestionError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base_url: format!("{}/suggestions", host.trim_end_matches('/')),
            auth: auth.into(),
        })
    }

    async fn request<B, T>(&self, method: Method, path: &str, body: Option<&B>) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.base_url, path);
        let mut request = self.client.request(method.clone(), &url);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| SuggestionError::Transport(e.to_string()))?;

        let status = response.status();
        debug!(method = %method, path = %path, status = status.as_u16(), "Suggestion service call");
        if status == StatusCode::NOT_FOUND {
            return Err(SuggestionError::NotFound);
        }
        if !status.is_success() {
            return Err(SuggestionError::Failed {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| SuggestionError::Transport(e.to_string()))?;
        // Endpoints without a meaningful body answer with nothing at all.
        let bytes: &[u8] = if bytes.is_empty() { b"null" } else { &bytes };
        serde_json::from_slice(bytes).map_err(|e| SuggestionError::Decode(e.to_string()))
    }

    fn authed<'a, T: Serialize>(&'a self, body: &'a T) -> Authed<'a, T> {
        Authed {
            pass: &self.auth,
            body,
        }
    }
}

#[async_trait]
impl SuggestionService for HttpSuggestionService {
    #[instrument(skip(self, suggestion), fields(thread_id = %suggestion.thread_id))]
    async fn add(&self, suggestion: &NewSuggestion) -> Result<u64> {
        self.request(Method::POST, "add", Some(&self.authed(suggestion)))
            .await
    }

    #[instrument(skip(self))]
    async fn update_state(&self, id: u64, state: ApprovalState) -> Result<Suggestion> {
        let body = StateUpdate {
            state_id: state.wire_id(),
        };
        let record: UpdatedRecord = self
            .request(Method::PATCH, &id.to_string(), Some(&self.authed(&body)))
            .await?;
        record.try_into()
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: u64) -> Result<()> {
        // The body of a delete is the bare secret.
        let _: serde_json::Value = self
            .request(Method::DELETE, &id.to_string(), Some(&self.auth))
            .await?;
        Ok(())
    }

    async fn get(&self, id: u64) -> Result<Suggestion> {
        let record: FetchedRecord = self
            .request::<(), _>(Method::GET, &id.to_string(), None)
            .await?;
        record.try_into()
    }

    async fn by_author(&self, user_id: &str) -> Result<Vec<Suggestion>> {
        let records: Option<Vec<FetchedRecord>> = self
            .request::<(), _>(Method::GET, &format!("by_author/{user_id}"), None)
            .await?;
        records
            .unwrap_or_default()
            .into_iter()
            .map(Suggestion::try_from)
            .collect()
    }

    async fn by_message(&self, message_id: &str) -> Result<Suggestion> {
        let record: FetchedRecord = self
            .request::<(), _>(Method::GET, &format!("by_message/{message_id}"), None)
            .await?;
        record.try_into()
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Serialize)]
struct Authed<'a, T> {
    pass: &'a str,
    #[serde(flatten)]
    body: &'a T,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct StateUpdate {
    state_id: u64,
}

/// Suggestion as returned by the fetch endpoints (0-based state).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct FetchedRecord {
    id: u64,
    author_id: String,
    message_id: String,
    state: u64,
}

impl TryFrom<FetchedRecord> for Suggestion {
    type Error = SuggestionError;

    fn try_from(record: FetchedRecord) -> Result<Self> {
        let state = ApprovalState::from_index(record.state)
            .ok_or_else(|| SuggestionError::Decode(format!("unknown state {}", record.state)))?;
        Ok(Self {
            id: record.id,
            author_id: record.author_id,
            message_id: record.message_id,
            state,
        })
    }
}

/// Suggestion as returned by an update (1-based state id).
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatedRecord {
    id: u64,
    author_id: String,
    message_id: String,
    state: StateRef,
}

#[derive(Deserialize)]
struct StateRef {
    id: u64,
}

impl TryFrom<UpdatedRecord> for Suggestion {
    type Error = SuggestionError;

    fn try_from(record: UpdatedRecord) -> Result<Self> {
        let state = ApprovalState::from_wire_id(record.state.id).ok_or_else(|| {
            SuggestionError::Decode(format!("unknown state id {}", record.state.id))
        })?;
        Ok(Self {
            id: record.id,
            author_id: record.author_id,
            message_id: record.message_id,
            state,
        })
    }
}
