//! # Core Traits (Ports)
//!
//! Any datastore adapter must implement these traits to be used by the
//! binary. The hosted-backend adapter lives in `ib-store-supabase`;
//! tests substitute in-memory implementations.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{NewReply, NewThread, Reply, Thread, ThreadSummary};

/// Data persistence contract for threads and replies.
///
/// Ordering guarantees (listing newest-first, replies ascending by
/// creation time) are part of this contract and are delegated to the
/// datastore's query execution; implementations perform no local
/// locking or retry.
#[async_trait]
pub trait BoardStore: Send + Sync {
    // Thread Operations
    /// All threads, newest first, each with its derived reply count.
    async fn list_threads(&self) -> Result<Vec<ThreadSummary>>;
    /// A single thread by id, or `None` when the id does not resolve.
    async fn get_thread(&self, id: i64) -> Result<Option<Thread>>;
    /// Insert one thread; returns the created record(s) as stored.
    async fn create_thread(&self, new: NewThread) -> Result<Vec<Thread>>;

    // Reply Operations
    /// All replies of a thread, ascending by creation time.
    async fn list_replies(&self, thread_id: i64) -> Result<Vec<Reply>>;
    /// Insert one reply; returns the created record(s) as stored.
    async fn create_reply(&self, new: NewReply) -> Result<Vec<Reply>>;
}
