//! # Legacy export endpoints
//!
//! `subject.txt`, `{id}.dat` and `SETTING.TXT` for external BBS reader
//! clients. These bypass the browser client entirely: bodies are
//! Shift_JIS, and errors are plain text (never JSON) so old readers can
//! still display them.

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use ib_core::error::AppError;
use ib_core::legacy::{self, SHIFT_JIS_CONTENT_TYPE};

use crate::AppState;

/// GET `/subject.txt` — the board-level listing export.
pub async fn subject_txt(State(state): State<AppState>) -> Response {
    match state.store.list_threads().await {
        Ok(summaries) => legacy_body(legacy::to_shift_jis(&legacy::subject_txt(&summaries))),
        Err(err) => legacy_failure(err),
    }
}

/// GET `/{id}.dat` — one thread with its replies in reader format.
pub async fn thread_dat(State(state): State<AppState>, Path(file): Path<String>) -> Response {
    let Some(id) = file
        .strip_suffix(".dat")
        .and_then(|stem| stem.parse::<i64>().ok())
    else {
        return legacy_error(StatusCode::NOT_FOUND);
    };

    match export_dat(&state, id).await {
        Ok(body) => legacy_body(body),
        Err(err) => legacy_failure(err),
    }
}

/// GET `/SETTING.TXT` — the board descriptor legacy readers fetch once.
pub async fn setting_txt(State(state): State<AppState>) -> Response {
    legacy_body(legacy::to_shift_jis(&legacy::setting_txt(
        &state.settings.board_title,
        &state.settings.board_comment,
    )))
}

async fn export_dat(state: &AppState, id: i64) -> ib_core::error::Result<Vec<u8>> {
    let thread = state
        .store
        .get_thread(id)
        .await?
        .ok_or_else(|| AppError::NotFound("スレッド".into(), id.to_string()))?;
    let replies = state.store.list_replies(id).await?;
    Ok(legacy::to_shift_jis(&legacy::thread_dat(&thread, &replies)))
}

fn legacy_body(body: Vec<u8>) -> Response {
    (
        [(header::CONTENT_TYPE, SHIFT_JIS_CONTENT_TYPE)],
        body,
    )
        .into_response()
}

fn legacy_failure(err: AppError) -> Response {
    match err {
        AppError::NotFound(..) => legacy_error(StatusCode::NOT_FOUND),
        err => {
            tracing::error!(error = %err, "legacy export failed");
            legacy_error(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

// Generic plain-text error body; detail never leaks to legacy readers.
fn legacy_error(status: StatusCode) -> Response {
    (
        status,
        [(header::CONTENT_TYPE, SHIFT_JIS_CONTENT_TYPE)],
        legacy::to_shift_jis("エラーが発生しました"),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{sample_reply, sample_thread, state_with, MockStore};
    use ib_core::error::AppError;

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let (text, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&bytes);
        assert!(!had_errors, "body must be valid Shift_JIS");
        text.into_owned()
    }

    #[tokio::test]
    async fn dat_export_declares_shift_jis_and_preserves_anchors() {
        let mut store = MockStore::new();
        store
            .expect_get_thread()
            .returning(|id| Ok(Some(sample_thread(id))));
        store
            .expect_list_replies()
            .returning(|id| Ok(vec![sample_reply(1, id)]));
        let state = state_with(store);

        let response = thread_dat(State(state), Path("10.dat".into())).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            SHIFT_JIS_CONTENT_TYPE
        );

        let text = body_text(response).await;
        let lines: Vec<&str> = text.split_terminator('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("First >>999 post"));
        assert!(lines[0].ends_with("<>質問スレ"));
        assert!(lines[1].ends_with("<>"), "reply line has empty title field");
        assert!(lines[1].contains(">>1"));
    }

    #[tokio::test]
    async fn missing_thread_yields_plain_text_404() {
        let mut store = MockStore::new();
        store.expect_get_thread().returning(|_| Ok(None));
        let state = state_with(store);

        let response = thread_dat(State(state), Path("42.dat".into())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_text(response).await, "エラーが発生しました");
    }

    #[tokio::test]
    async fn non_dat_names_are_not_found() {
        let state = state_with(MockStore::new());
        let response = thread_dat(State(state), Path("favicon.ico".into())).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn upstream_failure_yields_plain_text_500() {
        let mut store = MockStore::new();
        store
            .expect_list_threads()
            .returning(|| Err(AppError::Upstream("timeout".into())));
        let state = state_with(store);

        let response = subject_txt(State(state)).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_text(response).await, "エラーが発生しました");
    }

    #[tokio::test]
    async fn setting_txt_serves_board_identity() {
        let state = state_with(MockStore::new());
        let response = setting_txt(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("BBS_TITLE=テスト板"));
        assert!(text.contains("BBS_NONAME_NAME=名無しさん"));
    }
}
