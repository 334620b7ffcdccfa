//! # Legacy Export Formatter
//!
//! Converts threads and replies into the historical 2channel-style
//! `<>`-delimited text artifacts (`subject.txt`, `{id}.dat`,
//! `SETTING.TXT`) consumed by external BBS reader clients, and
//! transcodes them to Shift_JIS for the wire.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{display_label, Reply, Thread, ThreadSummary};

/// Content-Type legacy readers expect on every export response.
pub const SHIFT_JIS_CONTENT_TYPE: &str = "text/plain; charset=Shift_JIS";

// Reply anchors: `>>` followed by one or more digits.
static ANCHOR: Lazy<Regex> = Lazy::new(|| Regex::new(r">>\d+").expect("anchor pattern is valid"));

// Placeholder delimiter for the anchor-preserving escape. U+E000 is
// private-use and cannot survive Shift_JIS transcoding, so it never
// collides with content that matters; any stray occurrence in the input
// is dropped up front.
const PLACEHOLDER_MARK: char = '\u{E000}';

/// HTML-escapes a field while keeping `>>N` reply anchors intact.
///
/// Readers resolve anchors by scanning for the literal `>>N` token, so a
/// naive escape (`&gt;&gt;123`) would corrupt cross-references. Two
/// passes: each anchor match is swapped for a unique placeholder and
/// carried aside, the remainder gets the five-entity escape, then every
/// placeholder is substituted back with its original unescaped text.
///
/// Escaping is not idempotent on non-anchor content: feeding an already
/// escaped string through again double-escapes its entities. Anchors are
/// the exception and survive any number of passes.
pub fn escape_html(unsafe_text: &str) -> String {
    if unsafe_text.is_empty() {
        return String::new();
    }

    let mut anchors: Vec<String> = Vec::new();
    let cleaned: String = unsafe_text
        .chars()
        .filter(|&c| c != PLACEHOLDER_MARK)
        .collect();
    let swapped = ANCHOR.replace_all(&cleaned, |caps: &regex::Captures| {
        anchors.push(caps.get(0).expect("match group 0 always present").as_str().to_owned());
        format!("{PLACEHOLDER_MARK}{}{PLACEHOLDER_MARK}", anchors.len() - 1)
    });

    let mut escaped = swapped
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;");

    for (i, anchor) in anchors.iter().enumerate() {
        escaped = escaped.replace(
            &format!("{PLACEHOLDER_MARK}{i}{PLACEHOLDER_MARK}"),
            anchor,
        );
    }

    escaped
}

/// One board-listing line: `{id}.dat<>{escaped_title} ({reply_count})`.
pub fn subject_line(summary: &ThreadSummary) -> String {
    format!(
        "{}.dat<>{} ({})",
        summary.id,
        escape_html(&summary.title),
        summary.reply_count
    )
}

/// The full `subject.txt` body: listing lines newline-joined, in the
/// order given (callers pass threads newest-first).
pub fn subject_txt(summaries: &[ThreadSummary]) -> String {
    summaries
        .iter()
        .map(subject_line)
        .collect::<Vec<_>>()
        .join("\n")
}

/// The `{id}.dat` body for one thread.
///
/// First line is the thread itself:
/// `{author}<><>{created_at}<>{escaped_content}<>{escaped_title}`;
/// each reply follows in ascending creation order with the trailing
/// title field empty. Every line is newline-terminated.
pub fn thread_dat(thread: &Thread, replies: &[Reply]) -> String {
    let mut out = format!(
        "{}<><>{}<>{}<>{}\n",
        display_label(&thread.user_id),
        thread.created_at.to_rfc3339(),
        escape_html(&thread.content),
        escape_html(&thread.title)
    );
    for reply in replies {
        out.push_str(&format!(
            "{}<><>{}<>{}<>\n",
            display_label(&reply.user_id),
            reply.created_at.to_rfc3339(),
            escape_html(&reply.content)
        ));
    }
    out
}

/// The `SETTING.TXT` board descriptor served to legacy readers.
pub fn setting_txt(board_title: &str, board_comment: &str) -> String {
    format!(
        "BBS_TITLE={board_title}\nBBS_COMMENT={board_comment}\nBBS_NONAME_NAME={}\nSUBREJECT_COUNT=1000\n",
        crate::models::ANONYMOUS
    )
}

/// Transcodes native text into the legacy wire encoding. Characters with
/// no Shift_JIS mapping become numeric character references, which the
/// historical readers tolerate.
pub fn to_shift_jis(text: &str) -> Vec<u8> {
    let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode(text);
    bytes.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn thread(id: i64, title: &str, content: &str) -> Thread {
        Thread {
            id,
            title: title.into(),
            content: content.into(),
            user_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    fn reply(id: i64, thread_id: i64, content: &str, secs: u32) -> Reply {
        Reply {
            id,
            thread_id,
            content: content.into(),
            user_id: Some("ID:ab12cd".into()),
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, secs).unwrap(),
        }
    }

    #[test]
    fn escape_covers_all_five_entities() {
        assert_eq!(
            escape_html(r#"&<>"'"#),
            "&amp;&lt;&gt;&quot;&#x27;"
        );
    }

    #[test]
    fn escape_keeps_anchors_intact() {
        let out = escape_html("Check >>5 and <b>bold</b>");
        assert!(out.contains(">>5"));
        assert!(out.contains("&lt;b&gt;bold&lt;/b&gt;"));
        assert!(!out.contains("&gt;&gt;5"));
    }

    #[test]
    fn escape_survives_anchor_adjacent_to_escaped_markup() {
        // `<>>1`: the `<` escapes, the anchor does not corrupt.
        assert_eq!(escape_html("<>>1"), "&lt;>>1");
    }

    #[test]
    fn escape_handles_multiple_anchors() {
        assert_eq!(
            escape_html(">>1 と >>23 に同意"),
            ">>1 と >>23 に同意"
        );
    }

    #[test]
    fn escape_of_empty_input_is_empty() {
        assert_eq!(escape_html(""), "");
    }

    #[test]
    fn escaping_twice_double_escapes_entities_but_not_anchors() {
        let once = escape_html("a & b >>7");
        let twice = escape_html(&once);
        assert_eq!(once, "a &amp; b >>7");
        assert_eq!(twice, "a &amp;amp; b >>7");
    }

    #[test]
    fn bare_double_angle_without_digits_is_escaped() {
        assert_eq!(escape_html("a >> b"), "a &gt;&gt; b");
    }

    #[test]
    fn subject_lines_join_newest_first() {
        let newest = ThreadSummary {
            id: 2,
            title: "新しいスレ".into(),
            content: String::new(),
            user_id: None,
            created_at: Utc.with_ymd_and_hms(2024, 5, 2, 0, 0, 0).unwrap(),
            reply_count: 3,
        };
        let mut oldest = newest.clone();
        oldest.id = 1;
        oldest.title = "古いスレ".into();
        oldest.reply_count = 0;
        oldest.created_at = Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap();

        let out = subject_txt(&[newest, oldest]);
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], "2.dat<>新しいスレ (3)");
        assert_eq!(lines[1], "1.dat<>古いスレ (0)");
    }

    #[test]
    fn dat_body_layout_matches_reader_expectations() {
        let t = thread(10, "質問スレ", "First >>999 post");
        let rs = vec![reply(1, 10, "回答です", 30)];
        let out = thread_dat(&t, &rs);

        let lines: Vec<&str> = out.split_terminator('\n').collect();
        assert_eq!(lines.len(), 2);
        assert!(out.ends_with('\n'));

        let fields: Vec<&str> = lines[0].split("<>").collect();
        assert_eq!(fields.len(), 5);
        assert_eq!(fields[0], crate::models::ANONYMOUS);
        assert_eq!(fields[1], "");
        assert_eq!(fields[3], "First >>999 post");
        assert_eq!(fields[4], "質問スレ");

        let reply_fields: Vec<&str> = lines[1].split("<>").collect();
        assert_eq!(reply_fields.len(), 5);
        assert_eq!(reply_fields[0], "ID:ab12cd");
        assert_eq!(reply_fields[4], "", "reply trailing title field is empty");
    }

    #[test]
    fn shift_jis_roundtrip_for_japanese_text() {
        let bytes = to_shift_jis("名無しさん");
        assert_ne!(bytes, "名無しさん".as_bytes(), "must not be UTF-8");
        let (decoded, _, had_errors) = encoding_rs::SHIFT_JIS.decode(&bytes);
        assert!(!had_errors);
        assert_eq!(decoded, "名無しさん");
    }

    #[test]
    fn setting_txt_carries_board_identity() {
        let out = setting_txt("リアルタイムちゃんねる", "新世代の掲示板");
        assert!(out.contains("BBS_TITLE=リアルタイムちゃんねる\n"));
        assert!(out.contains("BBS_NONAME_NAME=名無しさん\n"));
    }
}
