//! # ib-store-supabase Implementation
//!
//! This module implements the data mapping between the hosted PostgREST
//! interface and the `ib-core` domain models. All query execution and
//! ordering is delegated to the backend: the adapter only shapes
//! requests and deserializes rows.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use configs::Settings;
use ib_core::error::{AppError, Result};
use ib_core::models::{NewReply, NewThread, Reply, Thread, ThreadSummary};
use ib_core::traits::BoardStore;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Deserialize;

pub struct SupabaseStore {
    http: reqwest::Client,
    rest_url: String,
    api_key: String,
}

// Wire representation of a thread row; `replies` carries the embedded
// aggregate from `select=*,replies(count)` on listing queries.
#[derive(Debug, Deserialize)]
struct ThreadRow {
    id: i64,
    title: String,
    content: String,
    user_id: Option<String>,
    created_at: DateTime<Utc>,
    #[serde(default)]
    replies: Vec<CountRow>,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Debug, Deserialize)]
struct ReplyRow {
    id: i64,
    thread_id: i64,
    content: String,
    user_id: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ThreadRow> for Thread {
    fn from(row: ThreadRow) -> Self {
        Thread {
            id: row.id,
            title: row.title,
            content: row.content,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

impl From<ThreadRow> for ThreadSummary {
    fn from(row: ThreadRow) -> Self {
        let reply_count = row.replies.first().map(|c| c.count).unwrap_or(0);
        ThreadSummary {
            id: row.id,
            title: row.title,
            content: row.content,
            user_id: row.user_id,
            created_at: row.created_at,
            reply_count,
        }
    }
}

impl From<ReplyRow> for Reply {
    fn from(row: ReplyRow) -> Self {
        Reply {
            id: row.id,
            thread_id: row.thread_id,
            content: row.content,
            user_id: row.user_id,
            created_at: row.created_at,
        }
    }
}

fn upstream(err: reqwest::Error) -> AppError {
    AppError::Upstream(err.to_string())
}

impl SupabaseStore {
    pub fn new(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(upstream)?;
        Ok(Self {
            http,
            rest_url: format!(
                "{}/rest/v1",
                settings.supabase_url.trim_end_matches('/')
            ),
            api_key: settings.supabase_anon_key.expose_secret().to_string(),
        })
    }

    fn get(&self, table: &str) -> reqwest::RequestBuilder {
        self.http
            .get(format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
    }

    fn post(&self, table: &str) -> reqwest::RequestBuilder {
        self.http
            .post(format!("{}/{}", self.rest_url, table))
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            // We want the created rows back, not a bare 201.
            .header("Prefer", "return=representation")
    }

    async fn send<T: DeserializeOwned>(&self, req: reqwest::RequestBuilder) -> Result<T> {
        let response = req.send().await.map_err(upstream)?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(%status, %body, "datastore call failed");
            return Err(AppError::Upstream(format!(
                "datastore returned {status}: {body}"
            )));
        }
        response.json::<T>().await.map_err(upstream)
    }
}

#[async_trait]
impl BoardStore for SupabaseStore {
    /// Board listing: every thread, newest first, with its embedded
    /// reply count.
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>> {
        let rows: Vec<ThreadRow> = self
            .send(self.get("threads").query(&[
                ("select", "*,replies(count)"),
                ("order", "created_at.desc"),
            ]))
            .await?;
        Ok(rows.into_iter().map(ThreadSummary::from).collect())
    }

    async fn get_thread(&self, id: i64) -> Result<Option<Thread>> {
        let id_filter = format!("eq.{id}");
        let rows: Vec<ThreadRow> = self
            .send(self.get("threads").query(&[
                ("select", "*"),
                ("id", id_filter.as_str()),
                ("limit", "1"),
            ]))
            .await?;
        Ok(rows.into_iter().next().map(Thread::from))
    }

    async fn create_thread(&self, new: NewThread) -> Result<Vec<Thread>> {
        // PostgREST bulk-insert shape: a one-element array.
        let rows: Vec<ThreadRow> = self
            .send(self.post("threads").json(&vec![new]))
            .await?;
        Ok(rows.into_iter().map(Thread::from).collect())
    }

    /// Replies of one thread, ascending by creation time. Ordering is
    /// the datastore's, not ours.
    async fn list_replies(&self, thread_id: i64) -> Result<Vec<Reply>> {
        let thread_filter = format!("eq.{thread_id}");
        let rows: Vec<ReplyRow> = self
            .send(self.get("replies").query(&[
                ("select", "*"),
                ("thread_id", thread_filter.as_str()),
                ("order", "created_at.asc"),
            ]))
            .await?;
        Ok(rows.into_iter().map(Reply::from).collect())
    }

    async fn create_reply(&self, new: NewReply) -> Result<Vec<Reply>> {
        let rows: Vec<ReplyRow> = self
            .send(self.post("replies").json(&vec![new]))
            .await?;
        Ok(rows.into_iter().map(Reply::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_row_maps_embedded_count() {
        let row: ThreadRow = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "タイトル",
            "content": "本文",
            "user_id": null,
            "created_at": "2024-05-01T12:00:00+00:00",
            "replies": [{"count": 4}]
        }))
        .unwrap();
        let summary = ThreadSummary::from(row);
        assert_eq!(summary.reply_count, 4);
    }

    #[test]
    fn missing_count_embedding_defaults_to_zero() {
        let row: ThreadRow = serde_json::from_value(serde_json::json!({
            "id": 7,
            "title": "タイトル",
            "content": "本文",
            "user_id": "ID:xy98zw",
            "created_at": "2024-05-01T12:00:00Z"
        }))
        .unwrap();
        assert_eq!(ThreadSummary::from(row).reply_count, 0);
    }
}
