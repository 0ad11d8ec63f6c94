// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
//! Speech-friendly text normalization
//!
//! Output contains only lowercase ASCII letters, digits and single spaces,
//! so a text-to-speech engine reads words instead of punctuation and does not
//! spell out all-caps words letter by letter.

use regex::Regex;
use std::sync::OnceLock;

static NON_SPEAKABLE: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();

fn non_speakable() -> &'static Regex {
    NON_SPEAKABLE.get_or_init(|| Regex::new(r"[^A-Za-z0-9\s]").unwrap())
}

fn whitespace_run() -> &'static Regex {
    WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Join recognized fragments with single spaces, in order, then normalize
pub fn normalize_fragments<S: AsRef<str>>(fragments: &[S]) -> String {
    let raw = fragments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(" ");
    normalize_text(&raw)
}

/// Strip everything but ASCII letters, digits and whitespace, collapse
/// whitespace to single spaces, trim, and lower-case
pub fn normalize_text(raw: &str) -> String {
    let stripped = non_speakable().replace_all(raw, "");
    let collapsed = whitespace_run().replace_all(&stripped, " ");
    collapsed.trim().to_lowercase()
}
