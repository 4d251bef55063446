//! Separating YAML front-matter from a Markdown body.
//!
//! A front-matter block is delimited by `---` divider lines. The opening
//! divider is optional: text before the first divider is treated as
//! front-matter only when it plausibly looks like YAML (blank lines and
//! comments followed by a `key:` line). [`split`] and [`join`] round-trip
//! any document whose front-matter is absent or opens at the first byte.

use regex::Regex;
use std::sync::LazyLock;

/// Leading region that looks like YAML: an optional divider, any number of
/// blank or comment lines, then something shaped like a mapping key.
static YAML_ISH: LazyLock<Regex> = LazyLock::new(|| pattern(r"\A(---\n)?(\s*(#.*)?\n)*\s*[^#\s:]+:"));

/// Compile a statically known-good pattern.
fn pattern(source: &str) -> Regex {
    #[expect(clippy::expect_used, reason = "patterns are compile-time constants")]
    let compiled = Regex::new(source).expect("static pattern must compile");
    compiled
}

/// Whether the line starting at `start` is a `---` divider (trailing
/// whitespace allowed), returning the offset just past its newline.
#[expect(clippy::string_slice, reason = "line offsets come from the newline scan")]
fn divider_end(text: &str, start: usize) -> Option<usize> {
    let line_end = text[start..]
        .find('\n')
        .map_or(text.len(), |offset| start + offset);
    let body = text[start..line_end].trim_end_matches(['\r', ' ', '\t']);
    (body == "---").then(|| (line_end + 1).min(text.len()))
}

/// Offsets of every line start in `text`.
fn line_starts(text: &str) -> impl Iterator<Item = usize> + '_ {
    std::iter::once(0).chain(
        text.bytes()
            .enumerate()
            .filter(|(_, byte)| *byte == b'\n')
            .map(|(index, _)| index + 1)
            .filter(|start| *start < text.len()),
    )
}

/// Split a page into its YAML front-matter and the Markdown remainder.
///
/// The returned front-matter keeps its opening `---` line (when present) so
/// marks reported against it line up with the page; the closing divider
/// belongs to neither half. When no front-matter is found the first element
/// is empty and the second is the whole page.
#[must_use]
#[expect(clippy::string_slice, reason = "divider offsets sit on line boundaries")]
pub fn split(page: &str) -> (&str, &str) {
    let mut dividers = line_starts(page).filter_map(|start| {
        divider_end(page, start).map(|end| (start, end))
    });
    let Some((first_start, first_end)) = dividers.next() else {
        return ("", page);
    };
    if first_start == 0 {
        // Canonical fenced block: everything up to the closer is ours.
        return dividers.next().map_or((page, ""), |(close_start, close_end)| {
            (&page[..close_start], &page[close_end..])
        });
    }
    // The opening divider is optional; only claim the leading region when it
    // actually looks like YAML.
    if YAML_ISH.is_match(&page[..first_start]) {
        (&page[..first_start], &page[first_end..])
    } else {
        ("", page)
    }
}

/// Reassemble a page from its front-matter and Markdown body.
///
/// An empty `meta` yields the body untouched; otherwise `meta` gains an
/// opening `---` line if it lacks one and is closed with a divider before
/// the body.
#[must_use]
pub fn join(meta: &str, markdown: &str) -> String {
    if meta.is_empty() {
        return markdown.to_owned();
    }
    let mut page = String::with_capacity(meta.len() + markdown.len() + 8);
    if !meta.starts_with("---\n") && !meta.starts_with("---\r\n") {
        page.push_str("---\n");
    }
    page.push_str(meta);
    page.push_str("---\n");
    page.push_str(markdown);
    page
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use rstest::rstest;

    #[test]
    fn fenced_block_is_extracted() {
        let page = "---\ntitle: hi\n---\n# Heading\n";
        let (meta, body) = split(page);
        assert_eq!(meta, "---\ntitle: hi\n");
        assert_eq!(body, "# Heading\n");
    }

    #[test]
    fn page_without_divider_has_no_front_matter() {
        let page = "# Just markdown\n\nbody text\n";
        assert_eq!(split(page), ("", page));
    }

    #[test]
    fn unclosed_fence_claims_whole_page() {
        let page = "---\ntitle: hi\nbody: text\n";
        assert_eq!(split(page), (page, ""));
    }

    #[test]
    fn optional_opening_divider_requires_yaml_shape() {
        let yaml_ish = "title: hi\n---\nbody\n";
        let (meta, body) = split(yaml_ish);
        assert_eq!(meta, "title: hi\n");
        assert_eq!(body, "body\n");

        let prose = "Some heading text\n---\nbody\n";
        assert_eq!(split(prose), ("", prose));
    }

    #[test]
    fn comment_lines_may_precede_the_first_key() {
        let page = "# note\n\ntitle: hi\n---\nbody\n";
        let (meta, body) = split(page);
        assert_eq!(meta, "# note\n\ntitle: hi\n");
        assert_eq!(body, "body\n");
    }

    #[rstest]
    #[case("")]
    #[case("plain body, no dividers\n")]
    #[case("---\na: 1\n---\nbody\n")]
    #[case("---\na: 1\nb: 2\n---\n")]
    #[case("---\n---\nbody starts empty\n")]
    fn split_then_join_round_trips(#[case] page: &str) -> Result<()> {
        let (meta, body) = split(page);
        let rejoined = join(meta, body);
        ensure!(rejoined == page, "round trip changed the page: {rejoined:?}");
        Ok(())
    }

    #[test]
    fn join_supplies_missing_opening_divider() {
        assert_eq!(join("a: 1\n", "body\n"), "---\na: 1\n---\nbody\n");
        assert_eq!(join("", "body\n"), "body\n");
    }
}
