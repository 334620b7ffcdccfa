//! # Input Sanitization & Validation
//!
//! Every user-supplied string crosses this module before it reaches the
//! datastore. Two layers: a hard denylist gate that rejects dangerous
//! input outright, and a markup-stripping sanitizer behind it for
//! anything the gate missed.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{AppError, Result};

/// Server-authoritative length bound for thread titles.
pub const MAX_TITLE_LEN: usize = 100;
/// Server-authoritative length bound for thread/reply bodies. The browser
/// client applies a stricter 300-character cap before submission; this
/// bound is the one that decides.
pub const MAX_CONTENT_LEN: usize = 1000;

/// Which field a string is intended for; selects the length bound and the
/// user-facing rejection message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Content,
    /// Display labels get the title bound.
    Label,
}

impl Field {
    fn max_len(self) -> usize {
        match self {
            Field::Title | Field::Label => MAX_TITLE_LEN,
            Field::Content => MAX_CONTENT_LEN,
        }
    }
}

// Fixed denylist: scheme markers, inline event handlers, tag openers.
// Matching is case-insensitive; a hit rejects the input, it is never
// merely stripped.
static DENYLIST: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)javascript:|data:|vbscript:|onload=|onerror=|<script|<iframe|<object|<embed")
        .expect("denylist pattern is valid")
});

// Markup stripper: no tags survive, text content does.
static STRIP_MARKUP: Lazy<ammonia::Builder<'static>> = Lazy::new(|| {
    let mut builder = ammonia::Builder::default();
    builder.tags(HashSet::new());
    builder.generic_attributes(HashSet::new());
    builder
});

/// Accepts or rejects a raw string for the given field.
///
/// Rejection reasons, in check order: empty input, over the length bound,
/// denylist hit. The returned `ValidationError` carries the user-facing
/// message; handlers map it to a 400-class response, never 500.
pub fn validate(input: &str, field: Field) -> Result<()> {
    if input.is_empty() {
        return Err(AppError::ValidationError(match field {
            Field::Title => "タイトルは必須です".into(),
            Field::Content => "本文は必須です".into(),
            Field::Label => "名前が空です".into(),
        }));
    }
    if input.chars().count() > field.max_len() {
        return Err(AppError::ValidationError(format!(
            "{}は{}文字以内にしてください",
            match field {
                Field::Title => "タイトル",
                Field::Content => "本文",
                Field::Label => "名前",
            },
            field.max_len()
        )));
    }
    if DENYLIST.is_match(input) {
        return Err(AppError::ValidationError("無効な入力内容です".into()));
    }
    Ok(())
}

/// Defensive second layer applied only after `validate` passes: strip all
/// markup, then fold the sanitizer's entity escapes back so storage holds
/// plain text. Anchor tokens like `>>12` come through unchanged.
pub fn sanitize(input: &str) -> String {
    let stripped = STRIP_MARKUP.clean(input).to_string();
    html_escape::decode_html_entities(&stripped).into_owned()
}

/// Validate then sanitize; the only path by which user input becomes a
/// storable string.
pub fn clean(input: &str, field: Field) -> Result<String> {
    validate(input, field)?;
    Ok(sanitize(input))
}
