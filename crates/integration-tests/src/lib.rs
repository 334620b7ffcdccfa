//! Shared fixtures for whole-router tests: an in-memory `BoardStore`
//! with the same ordering contract as the hosted backend, plus settings
//! and router builders.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use configs::{Environment, Settings};
use ib_api::AppState;
use ib_core::error::Result;
use ib_core::models::{NewReply, NewThread, Reply, Thread, ThreadSummary};
use ib_core::traits::BoardStore;
use secrecy::SecretString;

/// In-memory stand-in for the hosted datastore. Assigns sequential ids
/// and strictly increasing timestamps, and serves reads in the order
/// the real backend's queries would (threads newest first, replies
/// ascending).
#[derive(Default)]
pub struct StubStore {
    threads: Mutex<Vec<Thread>>,
    replies: Mutex<Vec<Reply>>,
    next_id: AtomicI64,
    ticks: AtomicI64,
}

impl StubStore {
    pub fn new() -> Self {
        Self {
            next_id: AtomicI64::new(1),
            ..Self::default()
        }
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    fn next_timestamp(&self) -> DateTime<Utc> {
        let tick = self.ticks.fetch_add(1, Ordering::SeqCst);
        Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap() + Duration::seconds(tick)
    }

    /// Inserts a reply with an explicit timestamp, bypassing the write
    /// path; lets tests hand the store out-of-order rows.
    pub fn insert_reply_at(&self, thread_id: i64, content: &str, created_at: DateTime<Utc>) {
        let reply = Reply {
            id: self.next_id(),
            thread_id,
            content: content.to_string(),
            user_id: None,
            created_at,
        };
        self.replies.lock().unwrap().push(reply);
    }
}

#[async_trait]
impl BoardStore for StubStore {
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>> {
        let replies = self.replies.lock().unwrap();
        let mut threads: Vec<ThreadSummary> = self
            .threads
            .lock()
            .unwrap()
            .iter()
            .map(|thread| ThreadSummary {
                id: thread.id,
                title: thread.title.clone(),
                content: thread.content.clone(),
                user_id: thread.user_id.clone(),
                created_at: thread.created_at,
                reply_count: replies.iter().filter(|r| r.thread_id == thread.id).count() as i64,
            })
            .collect();
        threads.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(threads)
    }

    async fn get_thread(&self, id: i64) -> Result<Option<Thread>> {
        Ok(self
            .threads
            .lock()
            .unwrap()
            .iter()
            .find(|t| t.id == id)
            .cloned())
    }

    async fn create_thread(&self, new: NewThread) -> Result<Vec<Thread>> {
        let thread = Thread {
            id: self.next_id(),
            title: new.title,
            content: new.content,
            user_id: Some(new.user_id),
            created_at: self.next_timestamp(),
        };
        self.threads.lock().unwrap().push(thread.clone());
        Ok(vec![thread])
    }

    async fn list_replies(&self, thread_id: i64) -> Result<Vec<Reply>> {
        let mut replies: Vec<Reply> = self
            .replies
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.thread_id == thread_id)
            .cloned()
            .collect();
        replies.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(replies)
    }

    async fn create_reply(&self, new: NewReply) -> Result<Vec<Reply>> {
        let reply = Reply {
            id: self.next_id(),
            thread_id: new.thread_id,
            content: new.content,
            user_id: Some(new.user_id),
            created_at: self.next_timestamp(),
        };
        self.replies.lock().unwrap().push(reply.clone());
        Ok(vec![reply])
    }
}

pub fn settings(environment: Environment, enforce_csrf: Option<bool>) -> Settings {
    Settings {
        supabase_url: "https://example.supabase.co".into(),
        supabase_anon_key: SecretString::from("anon-key".to_string()),
        csrf_secret: SecretString::from("integration-secret".to_string()),
        environment,
        port: 0,
        allowed_origin: "http://localhost:3000".into(),
        static_dir: "../ib-ui/static".into(),
        rate_limit_max: 1000,
        rate_limit_window_secs: 900,
        enforce_csrf,
        board_title: "リアルタイムちゃんねる".into(),
        board_comment: "新世代の掲示板".into(),
    }
}

/// A router over a fresh stub store; the store handle stays available
/// for direct seeding and inspection.
pub fn app(settings: Settings) -> (axum::Router, Arc<StubStore>) {
    let store = Arc::new(StubStore::new());
    let state = AppState::new(store.clone(), settings);
    (ib_api::router(state), store)
}
