//! Pre-parse scan for code points YAML forbids outright.
//!
//! YAML 1.2 excludes most C0 and C1 controls, DEL, and the two
//! permanently-unassigned code points from its printable set. Unpaired
//! surrogates are excluded too, but a Rust `str` cannot contain them, so
//! only the representable set is checked here.

/// Whether `ch` falls outside the YAML 1.2 printable character set.
pub(in crate::checker) const fn is_non_printable(ch: char) -> bool {
    matches!(
        ch,
        '\u{00}'..='\u{08}'
            | '\u{0B}'
            | '\u{0C}'
            | '\u{0E}'..='\u{1F}'
            | '\u{7F}'..='\u{84}'
            | '\u{86}'..='\u{9F}'
            | '\u{FFFE}'
            | '\u{FFFF}'
    )
}

/// First non-printable character at or after `from`, with its byte offset.
#[expect(clippy::string_slice, reason = "the search resumes from a character boundary")]
pub(in crate::checker) fn find_non_printable(text: &str, from: usize) -> Option<(usize, char)> {
    text[from..]
        .char_indices()
        .find(|(_, ch)| is_non_printable(*ch))
        .map(|(offset, ch)| (from + offset, ch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case('\u{08}', true)]
    #[case('\u{0B}', true)]
    #[case('\u{7F}', true)]
    #[case('\u{9F}', true)]
    #[case('\u{FFFE}', true)]
    #[case('\t', false)]
    #[case('\n', false)]
    #[case('\u{85}', false)]
    #[case('\u{A0}', false)]
    #[case('é', false)]
    #[case('\u{10000}', false)]
    fn printable_set_boundaries(#[case] ch: char, #[case] rejected: bool) {
        assert_eq!(is_non_printable(ch), rejected, "{ch:?}");
    }

    #[test]
    fn scan_reports_offset_and_character() {
        let text = "ok\u{08}rest";
        assert_eq!(find_non_printable(text, 0), Some((2, '\u{08}')));
        assert_eq!(find_non_printable(text, 3), None);
    }
}
