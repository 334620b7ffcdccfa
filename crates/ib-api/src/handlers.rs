//! # ib-api Handlers
//!
//! This module coordinates the flow between HTTP requests and the core
//! sanitization/store contracts: parse input, clean it, call the
//! datastore, map results and errors onto responses.

use askama::Template;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use cookie::{Cookie, SameSite};
use ib_core::error::AppError;
use ib_core::models::{NewReply, NewThread, Reply, Thread, ThreadSummary, ANONYMOUS};
use ib_core::sanitize::{self, Field};
use ib_ui::IndexTemplate;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::csrf::CSRF_COOKIE;
use crate::AppState;

/// Response-side wrapper: gives `AppError` an HTTP shape without the
/// core crate knowing about axum.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self.0 {
            AppError::ValidationError(reason) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": reason })),
            )
                .into_response(),
            AppError::CsrfError(detail) => {
                tracing::warn!(%detail, "rejected forged request");
                (
                    StatusCode::FORBIDDEN,
                    Json(json!({ "error": "Invalid CSRF token" })),
                )
                    .into_response()
            }
            AppError::NotFound(kind, id) => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": format!("{kind}が見つかりません (ID: {id})") })),
            )
                .into_response(),
            // The ceiling predates routing, so the body stays plain text
            // for legacy readers too.
            AppError::RateLimitExceeded(key) => {
                tracing::warn!(%key, "rate ceiling exceeded");
                (
                    StatusCode::TOO_MANY_REQUESTS,
                    "リクエストが多すぎます。しばらくしてから再試行してください。",
                )
                    .into_response()
            }
            AppError::Upstream(detail) => {
                tracing::error!(%detail, "datastore call failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({
                        "error": "データベース処理に失敗しました",
                        "details": detail,
                    })),
                )
                    .into_response()
            }
        }
    }
}

/// The browser client's shell page.
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let page = IndexTemplate {
        board_title: &state.settings.board_title,
        board_comment: &state.settings.board_comment,
    };
    let html = page
        .render()
        .map_err(|e| AppError::Upstream(format!("template render failed: {e}")))?;
    Ok(Html(html))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigResponse {
    supabase_url: String,
    supabase_anon_key: String,
    environment: String,
}

/// Connection settings the browser client needs to open its realtime
/// channel. The anon key is the datastore's public key by design.
pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    use secrecy::ExposeSecret;
    Json(ConfigResponse {
        supabase_url: state.settings.supabase_url.clone(),
        supabase_anon_key: state.settings.supabase_anon_key.expose_secret().to_string(),
        environment: state.settings.environment.as_str().to_string(),
    })
}

/// Issues a double-submit token: the same value goes into an HttpOnly
/// cookie and the JSON body; writes must echo it back in a header.
pub async fn csrf_token(State(state): State<AppState>) -> Result<Response, ApiError> {
    let token = state.csrf.issue()?;
    let cookie = Cookie::build((CSRF_COOKIE, token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(state.settings.environment.is_production())
        .build();
    Ok((
        [(header::SET_COOKIE, cookie.to_string())],
        Json(json!({ "csrfToken": token })),
    )
        .into_response())
}

pub async fn list_threads(
    State(state): State<AppState>,
) -> Result<Json<Vec<ThreadSummary>>, ApiError> {
    Ok(Json(state.store.list_threads().await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateThreadInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub user_id: Option<String>,
}

pub async fn create_thread(
    State(state): State<AppState>,
    Json(input): Json<CreateThreadInput>,
) -> Result<(StatusCode, Json<Vec<Thread>>), ApiError> {
    let title_raw = input.title.as_deref().map(str::trim).unwrap_or_default();
    let content_raw = input.content.as_deref().map(str::trim).unwrap_or_default();
    if title_raw.is_empty() || content_raw.is_empty() {
        return Err(AppError::ValidationError("タイトルと本文は必須です".into()).into());
    }

    let new = NewThread {
        title: sanitize::clean(title_raw, Field::Title)?,
        content: sanitize::clean(content_raw, Field::Content)?,
        user_id: clean_label(input.user_id.as_deref())?,
    };
    let created = state.store.create_thread(new).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[derive(Debug, Deserialize)]
pub struct RepliesQuery {
    pub thread_id: Option<i64>,
}

pub async fn list_replies(
    State(state): State<AppState>,
    Query(query): Query<RepliesQuery>,
) -> Result<Json<Vec<Reply>>, ApiError> {
    let thread_id = query
        .thread_id
        .ok_or_else(|| AppError::ValidationError("スレッドIDが必要です".into()))?;
    Ok(Json(state.store.list_replies(thread_id).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateReplyInput {
    pub thread_id: Option<i64>,
    pub content: Option<String>,
    pub user_id: Option<String>,
}

pub async fn create_reply(
    State(state): State<AppState>,
    Json(input): Json<CreateReplyInput>,
) -> Result<Json<Vec<Reply>>, ApiError> {
    let content_raw = input.content.as_deref().map(str::trim).unwrap_or_default();
    let thread_id = input
        .thread_id
        .filter(|_| !content_raw.is_empty())
        .ok_or_else(|| AppError::ValidationError("スレッドIDと本文は必須です".into()))?;

    let new = NewReply {
        thread_id,
        content: sanitize::clean(content_raw, Field::Content)?,
        user_id: clean_label(input.user_id.as_deref())?,
    };
    let created = state.store.create_reply(new).await?;
    Ok(Json(created))
}

// Display labels go through the same gate as everything else; an absent
// or blank label becomes the anonymous placeholder.
fn clean_label(label: Option<&str>) -> ib_core::error::Result<String> {
    match label.map(str::trim) {
        Some(label) if !label.is_empty() => sanitize::clean(label, Field::Label),
        _ => Ok(ANONYMOUS.to_string()),
    }
}
