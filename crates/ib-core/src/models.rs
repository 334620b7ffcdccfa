//! # Domain Models
//!
//! These structs represent the core entities of ita-board. Identifiers are
//! assigned by the hosted datastore (bigint sequences), so they arrive as
//! `i64` and are never minted locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default display label substituted when a poster supplies no name.
pub const ANONYMOUS: &str = "名無しさん";

/// A top-level discussion post with title + body. Immutable once created:
/// the system defines no edit or delete operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Thread {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Client-chosen display label; not a security boundary.
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A Thread as it appears in board-level listings, carrying the derived
/// reply count the datastore embeds into the listing query.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadSummary {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reply_count: i64,
}

/// A response attached to a thread, ordered by creation time ascending.
///
/// Post numbers are derived, not stored: the thread body occupies position
/// 1 and replies occupy 2..N in creation order. They stay contiguous
/// because deletion is unsupported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: i64,
    pub thread_id: i64,
    pub content: String,
    pub user_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Payload for a validated thread insert. Fields are already cleaned by
/// `sanitize::clean` before this struct is built.
#[derive(Debug, Clone, Serialize)]
pub struct NewThread {
    pub title: String,
    pub content: String,
    pub user_id: String,
}

/// Payload for a validated reply insert.
#[derive(Debug, Clone, Serialize)]
pub struct NewReply {
    pub thread_id: i64,
    pub content: String,
    pub user_id: String,
}

/// The display label for a post: the stored label, or the anonymous
/// placeholder when none was set.
pub fn display_label(user_id: &Option<String>) -> &str {
    match user_id {
        Some(label) if !label.is_empty() => label,
        _ => ANONYMOUS,
    }
}
