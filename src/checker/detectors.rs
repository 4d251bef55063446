//! Per-site detectors run at node-open events.
//!
//! Each detector peeks ahead of the reader, repairs the state buffer so
//! reading can continue past the fault, and records the issue. A detector
//! only fires once per site: its threshold remembers the highest position
//! already examined, because open events repeat when nested contexts begin
//! at one spot.

use super::oracle::{self, QuotedEnd};
use super::{
    AT_SIGN_START, BRACKET_STRING, NO_END_QUOTE, Session, UNESCAPED_QUOTE, threshold_allows,
};
use crate::issue::Level;
use crate::scanner::{ScanState, hex_escape_width, is_simple_escape};
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

/// An unquoted `{{ variable }}` substitution at the start of a token.
static TEMPLATE: LazyLock<Regex> = LazyLock::new(|| pattern(r"\A\{\{\s*\w+\s*\}\}"));

/// A bracketed, quote-free group: `[like this]`.
static BRACKET_GROUP: LazyLock<Regex> = LazyLock::new(|| pattern(r"\A\[[^'\x22\[\]\n]*\]"));

/// Anchor names that read like HTML entities: `&amp;`, `&#38;`, `&#x26;`.
static ENTITY: LazyLock<Regex> =
    LazyLock::new(|| pattern(r"\A((#\d+)|(#x[0-9a-fA-F]+)|(\w+));\z"));

fn pattern(source: &str) -> Regex {
    #[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
    let compiled = Regex::new(source).expect("static pattern must compile");
    compiled
}

/// First position at or after `from` holding neither blank nor line break.
pub(in crate::checker) fn find_next_non_space(input: &str, from: usize) -> Option<usize> {
    input
        .as_bytes()
        .iter()
        .enumerate()
        .skip(from)
        .find(|(_, byte)| !matches!(**byte, b' ' | b'\t' | b'\r' | b'\n'))
        .map(|(index, _)| index)
}

pub(in crate::checker) fn anchor_looks_like_entity(anchor: &str) -> bool {
    ENTITY.is_match(anchor)
}

/// Whether text following a closing quote confirms the string really ended
/// there: end of input, or optional blanks before `:`, `,`, `]`, `}`, a
/// line break, or a comment.
fn ends_cleanly(rest: &str) -> bool {
    for byte in rest.bytes() {
        match byte {
            b':' | b',' | b']' | b'}' | b'\n' | b'#' => return true,
            b' ' | b'\t' | b'\r' => {}
            _ => return false,
        }
    }
    true
}

impl Session<'_> {
    /// Quoted-scalar malformations: unescaped inner quotes, missing end
    /// quotes, and (for double quotes) invalid escape sequences.
    #[expect(
        clippy::indexing_slicing,
        clippy::string_slice,
        reason = "the dispatcher found the quote inside the buffer and the oracle stays within it"
    )]
    pub(in crate::checker) fn check_quoted_scalar(
        &mut self,
        state: &mut ScanState<'_>,
        token_start: usize,
    ) {
        if !threshold_allows(self.thresholds.quoted, token_start) {
            return;
        }
        self.thresholds.quoted = Some(token_start);
        let quote = state.input().as_bytes()[token_start];
        let guessing = quote == b'"';
        let indent = state.line_indent();
        let mut from = token_start + 1;
        let mut unescaped_count = 0usize;
        let closing;
        loop {
            match oracle::guess_quoted_end(state.input(), quote, from, guessing, indent) {
                QuotedEnd::Exact(None) => {
                    // Unterminated single-quoted scalar; the reader will
                    // report it with its own mark.
                    return;
                }
                QuotedEnd::Exact(Some(position)) => {
                    if ends_cleanly(&state.input()[position + 1..]) {
                        closing = position;
                        break;
                    }
                    debug!(position, "escaping unescaped inner quote");
                    let mark = self.mark_in(state.buffer(), position);
                    let issue = self.push_issue(Level::Error, UNESCAPED_QUOTE, mark);
                    let escape = if quote == b'"' { "\\" } else { "'" };
                    self.splice_both(state, position, 0, escape);
                    self.promote_when_fixing(issue);
                    unescaped_count += 1;
                    from = position + 2;
                }
                QuotedEnd::Guess(position) => {
                    debug!(position, unescaped_count, "closing unterminated string");
                    let mark = self.mark_in(state.buffer(), position);
                    let issue = self.push_issue(Level::Error, NO_END_QUOTE, mark);
                    if unescaped_count % 2 == 1 {
                        // An odd count means the opening quote was probably
                        // one of a paired set of inner quotes; open a fresh
                        // string and escape the original.
                        self.splice_both(state, token_start, 0, "\"\\");
                        self.splice_both(state, position + 2, 0, "\"");
                        closing = position + 2;
                    } else {
                        self.splice_both(state, position, 0, "\"");
                        closing = position;
                    }
                    self.promote_when_fixing(issue);
                    break;
                }
            }
        }
        if quote == b'"' {
            self.validate_escape_sequences(state, token_start, closing);
        }
    }

    /// Scan a double-quoted range for invalid escape sequences, deleting
    /// the offending backslashes so the text reads as typed.
    #[expect(
        clippy::indexing_slicing,
        clippy::string_slice,
        reason = "the scan is bounded by the closing quote"
    )]
    fn validate_escape_sequences(
        &mut self,
        state: &mut ScanState<'_>,
        token_start: usize,
        closing: usize,
    ) {
        let mut index = token_start + 1;
        let mut limit = closing;
        while index < limit {
            if state.input().as_bytes()[index] != b'\\' {
                index += 1;
                continue;
            }
            let Some(escaped) = state.input()[index + 1..].chars().next() else {
                break;
            };
            if matches!(escaped, '\n' | '\r') || u8::try_from(escaped).is_ok_and(is_simple_escape) {
                index += 2;
                continue;
            }
            if let Some(width) = u8::try_from(escaped).ok().and_then(hex_escape_width) {
                let end = (index + 2 + width).min(limit);
                let digits = &state.input().as_bytes()[index + 2..end];
                if digits.len() == width && digits.iter().all(|digit| digit.is_ascii_hexdigit()) {
                    index += 2 + width;
                    continue;
                }
            }
            let mark = self.mark_in(state.buffer(), index);
            let issue = self.push_issue(
                Level::Error,
                format!("Invalid escape sequence: \"\\{escaped}\""),
                mark,
            );
            self.splice_both(state, index, 1, "");
            self.promote_when_fixing(issue);
            limit -= 1;
            index += 1;
        }
    }

    /// An unquoted `{{ variable }}` substitution; YAML reads it as nested
    /// flow mappings, which is never what a template author meant.
    #[expect(clippy::string_slice, reason = "token_start lies inside the buffer")]
    pub(in crate::checker) fn check_template_substitution(
        &mut self,
        state: &mut ScanState<'_>,
        token_start: usize,
    ) {
        if !threshold_allows(self.thresholds.template, token_start) {
            return;
        }
        let Some(found) = TEMPLATE.find(&state.input()[token_start..]) else {
            return;
        };
        self.thresholds.template = Some(token_start);
        debug!(position = token_start, "quoting template substitution");
        let mark = self.mark_in(state.buffer(), token_start);
        let span = found.end();
        let reason = format!(
            "Did you mean to substitute a variable? It must be quoted: '{}'",
            found.as_str()
        );
        let issue = self.push_issue(Level::Warning, reason, mark);
        self.splice_both(state, token_start, 0, "'");
        self.splice_both(state, token_start + span + 1, 0, "'");
        self.promote_when_fixing(issue);
    }

    /// `@` opens the token; reserved in YAML, and nearly always the start
    /// of a string the author forgot to quote.
    pub(in crate::checker) fn check_at_sign(&mut self, state: &mut ScanState<'_>, token_start: usize) {
        if !threshold_allows(self.thresholds.at_sign, token_start) {
            return;
        }
        self.thresholds.at_sign = Some(token_start);
        debug!(position = token_start, "quoting token opened with '@'");
        let mark = self.mark_in(state.buffer(), token_start);
        let issue = self.push_issue(Level::Warning, AT_SIGN_START, mark);
        self.quote_span(state, token_start);
        self.promote_when_fixing(issue);
    }

    /// A `[group]` followed by more text: prose wearing flow-sequence
    /// clothes.
    #[expect(clippy::string_slice, reason = "token_start and the match end lie inside the buffer")]
    pub(in crate::checker) fn check_string_bracket(
        &mut self,
        state: &mut ScanState<'_>,
        token_start: usize,
    ) {
        if !threshold_allows(self.thresholds.bracket, token_start) {
            return;
        }
        let Some(found) = BRACKET_GROUP.find(&state.input()[token_start..]) else {
            return;
        };
        if ends_cleanly(&state.input()[token_start + found.end()..]) {
            return;
        }
        self.thresholds.bracket = Some(token_start);
        debug!(position = token_start, "quoting bracketed string");
        let mark = self.mark_in(state.buffer(), token_start);
        let issue = self.push_issue(Level::Error, BRACKET_STRING, mark);
        self.quote_span(state, token_start);
        self.promote_when_fixing(issue);
    }

    /// Wrap the plain-scalar span starting at `token_start` in double
    /// quotes, escaping any double quotes already inside it.
    #[expect(clippy::indexing_slicing, reason = "the span end is bounded by the buffer")]
    fn quote_span(&mut self, state: &mut ScanState<'_>, token_start: usize) {
        let mut end = oracle::guess_plain_end(state.input(), token_start, state.line_indent());
        while end > token_start
            && matches!(state.input().as_bytes()[end - 1], b' ' | b'\t')
        {
            end -= 1;
        }
        let mut index = token_start;
        while index < end {
            if state.input().as_bytes()[index] == b'"' {
                self.splice_both(state, index, 0, "\\");
                end += 1;
                index += 2;
            } else {
                index += 1;
            }
        }
        self.splice_both(state, token_start, 0, "\"");
        end += 1;
        self.splice_both(state, end, 0, "\"");
    }
}
