//! Seeds the board with a few sample threads and replies, going through
//! the same validation path the HTTP surface uses. Intended for local
//! development against a fresh datastore.

use configs::Settings;
use ib_core::models::{NewReply, NewThread};
use ib_core::sanitize::{self, Field};
use ib_core::traits::BoardStore;
use ib_store_supabase::SupabaseStore;
use tracing_subscriber::EnvFilter;

const SAMPLE_THREADS: &[(&str, &str)] = &[
    (
        "雑談スレ",
        "とりあえず立てた\n好きに書き込んでくれ",
    ),
    (
        "Rustについて語るスレ",
        "所有権の話から始めよう",
    ),
];

const SAMPLE_REPLIES: &[&str] = &[">>1 乙", "テスト書き込みです"];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = Settings::load()?;
    let store = SupabaseStore::new(&settings)?;

    for (title, content) in SAMPLE_THREADS {
        let new = NewThread {
            title: sanitize::clean(title, Field::Title)?,
            content: sanitize::clean(content, Field::Content)?,
            user_id: "ID:seed00".to_string(),
        };
        let created = store.create_thread(new).await?;
        let Some(thread) = created.first() else {
            anyhow::bail!("datastore returned no created thread row");
        };
        tracing::info!(id = thread.id, title, "seeded thread");

        for content in SAMPLE_REPLIES {
            let reply = NewReply {
                thread_id: thread.id,
                content: sanitize::clean(content, Field::Content)?,
                user_id: "ID:seed00".to_string(),
            };
            store.create_reply(reply).await?;
        }
        tracing::info!(id = thread.id, replies = SAMPLE_REPLIES.len(), "seeded replies");
    }

    Ok(())
}
