//! Shared fixtures for handler unit tests: a mocked `BoardStore` and a
//! ready-made `AppState`.

use std::sync::Arc;

use async_trait::async_trait;
use configs::{Environment, Settings};
use ib_core::error::Result;
use ib_core::models::{NewReply, NewThread, Reply, Thread, ThreadSummary};
use ib_core::traits::BoardStore;
use secrecy::SecretString;

mockall::mock! {
    pub Store {}

    #[async_trait]
    impl BoardStore for Store {
        async fn list_threads(&self) -> Result<Vec<ThreadSummary>>;
        async fn get_thread(&self, id: i64) -> Result<Option<Thread>>;
        async fn create_thread(&self, new: NewThread) -> Result<Vec<Thread>>;
        async fn list_replies(&self, thread_id: i64) -> Result<Vec<Reply>>;
        async fn create_reply(&self, new: NewReply) -> Result<Vec<Reply>>;
    }
}

pub(crate) fn test_settings() -> Settings {
    Settings {
        supabase_url: "https://example.supabase.co".into(),
        supabase_anon_key: SecretString::from("anon-key".to_string()),
        csrf_secret: SecretString::from("csrf-secret".to_string()),
        environment: Environment::Development,
        port: 0,
        allowed_origin: "http://localhost:3000".into(),
        static_dir: "static".into(),
        rate_limit_max: 1000,
        rate_limit_window_secs: 900,
        enforce_csrf: None,
        board_title: "テスト板".into(),
        board_comment: "テスト用".into(),
    }
}

pub(crate) fn state_with(store: MockStore) -> crate::AppState {
    crate::AppState::new(Arc::new(store), test_settings())
}

pub(crate) fn sample_thread(id: i64) -> Thread {
    use chrono::{TimeZone, Utc};
    Thread {
        id,
        title: "質問スレ".into(),
        content: "First >>999 post".into(),
        user_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
    }
}

pub(crate) fn sample_reply(id: i64, thread_id: i64) -> Reply {
    use chrono::{TimeZone, Utc};
    Reply {
        id,
        thread_id,
        content: "それな >>1".into(),
        user_id: Some("ID:ab12cd".into()),
        created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 5, 0).unwrap(),
    }
}
