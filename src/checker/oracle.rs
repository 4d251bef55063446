//! Guessing where a malformed scalar probably ends.
//!
//! These scans run ahead of the reader over text that may be broken, so
//! they answer in probabilities: an [`QuotedEnd::Exact`] hit is a real
//! quote character, an [`QuotedEnd::Guess`] is the place the author most
//! likely meant the string to stop.

/// Outcome of a quoted-scalar boundary scan.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(in crate::checker) enum QuotedEnd {
    /// Position of a real, unescaped quote character; `None` when the input
    /// ran out without one (only reported when guessing is off).
    Exact(Option<usize>),
    /// The scalar probably ends here even though no quote closes it.
    Guess(usize),
}

/// Find the likely end of a quoted scalar opened with `quote`.
///
/// `start` points just past the opening quote. With `guess` set, a line
/// break followed by something shaped like a fresh token (at the scalar's
/// indent or less) is reported as the probable end, and exhaustion yields
/// `Guess(len)`; without it the scan only ever reports real quotes.
#[expect(clippy::indexing_slicing, reason = "the cursor is bounded by the byte length")]
pub(in crate::checker) fn guess_quoted_end(
    input: &str,
    quote: u8,
    start: usize,
    guess: bool,
    indent: isize,
) -> QuotedEnd {
    let bytes = input.as_bytes();
    let mut index = start;
    while index < bytes.len() {
        let b = bytes[index];
        if b == quote {
            if quote == b'\'' {
                if bytes.get(index + 1) == Some(&b'\'') {
                    // Doubled quote, the single-quoted escape form.
                    index += 2;
                    continue;
                }
                return QuotedEnd::Exact(Some(index));
            }
            if trailing_backslashes(bytes, start, index) % 2 == 0 {
                return QuotedEnd::Exact(Some(index));
            }
        } else if b == b'\n'
            && guess
            && line_is_probable_token(input, index + 1, indent)
        {
            return QuotedEnd::Guess(index);
        }
        index += 1;
    }
    if guess {
        QuotedEnd::Guess(bytes.len())
    } else {
        QuotedEnd::Exact(None)
    }
}

#[expect(clippy::indexing_slicing, reason = "the cursor never backs up past start")]
fn trailing_backslashes(bytes: &[u8], start: usize, position: usize) -> usize {
    let mut count = 0;
    let mut cursor = position;
    while cursor > start && bytes[cursor - 1] == b'\\' {
        count += 1;
        cursor -= 1;
    }
    count
}

/// Whether the line starting at `line_start` looks like the beginning of a
/// fresh token: a sequence dash, a `key:` pair, or nothing at all, indented
/// no deeper than the scalar under scrutiny.
#[expect(clippy::indexing_slicing, reason = "every index is length-checked first")]
fn line_is_probable_token(input: &str, line_start: usize, indent: isize) -> bool {
    let bytes = input.as_bytes();
    let mut index = line_start;
    while index < bytes.len() && matches!(bytes[index], b' ' | b'\t') {
        index += 1;
    }
    let line_indent = isize::try_from(index - line_start).unwrap_or(isize::MAX);
    if line_indent > indent {
        return false;
    }
    match bytes.get(index) {
        None | Some(b'\n' | b'\r') => true,
        Some(b'-') => matches!(bytes.get(index + 1), Some(b' ' | b'\t' | b'\n' | b'\r')),
        Some(_) => {
            let word_start = index;
            while index < bytes.len() && (bytes[index].is_ascii_alphanumeric() || bytes[index] == b'_')
            {
                index += 1;
            }
            if index == word_start {
                return false;
            }
            while index < bytes.len() && matches!(bytes[index], b' ' | b'\t') {
                index += 1;
            }
            if bytes.get(index) != Some(&b':') {
                return false;
            }
            matches!(bytes.get(index + 1), Some(b' ' | b'\t' | b'\n' | b'\r'))
        }
    }
}

/// Find the end of a plain (unquoted) scalar starting at `start`.
///
/// The scalar ends at the first `: `, ` #`, or line break; a line break
/// only ends it tentatively, since a following line indented deeper than
/// `indent` continues the scalar.
#[expect(clippy::indexing_slicing, reason = "the cursor is bounded by the byte length")]
pub(in crate::checker) fn guess_plain_end(input: &str, start: usize, indent: isize) -> usize {
    let bytes = input.as_bytes();
    let mut index = start;
    while index < bytes.len() {
        let b = bytes[index];
        if b == b':' && matches!(bytes.get(index + 1), Some(b' ' | b'\t' | b'\n' | b'\r')) {
            return index;
        }
        if matches!(b, b' ' | b'\t') && bytes.get(index + 1) == Some(&b'#') {
            return index;
        }
        if matches!(b, b'\n' | b'\r') {
            let mut next = index + 1;
            if b == b'\r' && bytes.get(next) == Some(&b'\n') {
                next += 1;
            }
            let mut continuation_indent = 0isize;
            while bytes.get(next) == Some(&b' ') {
                continuation_indent += 1;
                next += 1;
            }
            if continuation_indent >= indent + 1 && next < bytes.len() {
                // Indented continuation line; keep scanning from its content.
                index = next;
                continue;
            }
            return index;
        }
        index += 1;
    }
    bytes.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("it's here", 0, Some(2))]
    #[case("doubled '' then end' x", 0, Some(19))]
    #[case("no end at all", 0, None)]
    fn single_quote_scan_is_exact(
        #[case] input: &str,
        #[case] start: usize,
        #[case] expected: Option<usize>,
    ) {
        assert_eq!(
            guess_quoted_end(input, b'\'', start, false, 0),
            QuotedEnd::Exact(expected)
        );
    }

    #[test]
    fn double_quote_scan_skips_escaped_quotes() {
        let input = r#"say \"hi\" now" rest"#;
        assert_eq!(
            guess_quoted_end(input, b'"', 0, false, 0),
            QuotedEnd::Exact(Some(14))
        );
    }

    #[test]
    fn guessing_stops_at_a_fresh_key_line() {
        let input = "Didn't close\nnext_key: \"ok\"";
        assert_eq!(guess_quoted_end(input, b'"', 0, true, 0), QuotedEnd::Guess(12));
    }

    #[test]
    fn guessing_ignores_indented_prose_lines() {
        let input = "first line\n  just prose \"quoted\" later";
        // The prose line is no fresh token, so the scan runs on to the quote.
        assert_eq!(
            guess_quoted_end(input, b'"', 0, true, 0),
            QuotedEnd::Exact(Some(24))
        );
    }

    #[test]
    fn guessing_exhausts_to_input_length() {
        let input = "still open and indented prose only";
        assert_eq!(
            guess_quoted_end(input, b'"', 0, true, 0),
            QuotedEnd::Guess(input.len())
        );
    }

    #[rstest]
    #[case("plain value", 0, 11)]
    #[case("value: rest", 0, 5)]
    #[case("value # comment", 0, 5)]
    #[case("line one\nnot indented", 0, 8)]
    fn plain_end_stops_at_terminators(
        #[case] input: &str,
        #[case] indent: isize,
        #[case] expected: usize,
    ) {
        assert_eq!(guess_plain_end(input, 0, indent), expected);
    }

    #[test]
    fn plain_end_follows_indented_continuations() {
        let input = "first words\n  continued here\nnext: 1";
        assert_eq!(guess_plain_end(input, 0, 0), 28);
    }
}
