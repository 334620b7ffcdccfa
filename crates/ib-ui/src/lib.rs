//! # ib-ui
//!
//! The browser-facing shell: an askama template that boots the static
//! client in `static/`. All rendering of board data happens
//! client-side; the shell only carries the board identity.

use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate<'a> {
    pub board_title: &'a str,
    pub board_comment: &'a str,
}
