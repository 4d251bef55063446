//! The intent-aware YAML checker.
//!
//! [`check`] drives the structural reader over a mutable *state buffer*,
//! watching every node boundary for the handful of mistakes humans actually
//! make: stray quotes inside quoted strings, strings that never close,
//! unquoted template substitutions, scalars opening with reserved
//! characters, and under-indented continuation lines. Each detector
//! repairs the state buffer just enough for reading to continue past the
//! fault, records an [`Issue`] pointing at the original source, and, when
//! fixing is on, mirrors the repair into a second, user-visible *fixed
//! buffer*. The two buffers drift independently, so each keeps its own
//! [`SourceEditor`] edit history for position translation.
//!
//! Syntax faults never surface as `Err`: they become issues. The reader's
//! own errors are position-tagged and recorded the same way when no
//! detector got there first.

mod detectors;
mod invariants;
mod oracle;

use crate::editor::SourceEditor;
use crate::issue::{Issue, Level, Mark};
use crate::scanner::{
    self, NodeEvent, NodeKind, ScanError, ScanSink, ScanState, ScanWarning, WarningKind,
};
use tracing::debug;

/// Reason reported for a quote character sitting unescaped inside a quoted
/// scalar.
pub const UNESCAPED_QUOTE: &str = "unescaped quote in quoted string";
/// Reason reported for a double-quoted scalar with no closing quote.
pub const NO_END_QUOTE: &str = "quoted string has no end quote";
/// Reason reported for a scalar starting with the reserved `@` indicator.
pub const AT_SIGN_START: &str = "'@' cannot start any token";
/// Reason reported for a bracketed group that reads like prose, not a flow
/// sequence.
pub const BRACKET_STRING: &str =
    "'[' cannot start a string; quote the value to keep the brackets";
/// Reason substituted for indentation errors on lines mixing spaces and
/// tabs.
pub const MIXED_INDENTATION: &str = "line is indented with mixed spaces and tabs";

/// Options accepted by [`check`].
#[derive(Clone, Debug)]
pub struct CheckOptions {
    /// Produce a repaired copy of the source alongside the issues.
    pub fix: bool,
    /// Delete non-printable characters from the fixed output (they are
    /// always removed from the parsing buffer, which cannot hold them).
    pub remove_invalid_characters: bool,
    /// Buffer name attached to every mark, usually a file path.
    pub name: Option<String>,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            fix: false,
            remove_invalid_characters: true,
            name: None,
        }
    }
}

/// Outcome of a [`check`] call.
#[derive(Clone, Debug)]
pub struct CheckReport {
    /// Everything found, in scan order, with marks into the original text.
    pub issues: Vec<Issue>,
    /// The repaired source; present exactly when fixing was requested.
    pub fixed: Option<String>,
}

impl CheckReport {
    /// Count of issues still at [`Level::Error`].
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|issue| issue.level.is_error())
            .count()
    }
}

/// Check `text` for YAML faults, optionally producing a repaired copy.
///
/// Syntax faults of any kind are reported as issues, never as errors; the
/// call itself cannot fail.
#[must_use]
pub fn check(text: &str, options: &CheckOptions) -> CheckReport {
    let mut state_buffer = SourceEditor::new(text);
    let mut session = Session::new(options);
    session.scrub_non_printables(&mut state_buffer);
    if let Err(fault) = scanner::scan(&mut state_buffer, &mut session) {
        session.record_scan_error(&state_buffer, &fault);
    }
    debug!(
        issues = session.issues.len(),
        fixing = options.fix,
        "check complete"
    );
    CheckReport {
        issues: session.issues,
        fixed: session.fixed.map(SourceEditor::into_value),
    }
}

/// Monotonic high-water marks, one per detector, preventing duplicate
/// diagnostics when node-open events repeat at one site.
#[derive(Debug, Default)]
struct Thresholds {
    quoted: Option<usize>,
    template: Option<usize>,
    at_sign: Option<usize>,
    bracket: Option<usize>,
    entity: Option<usize>,
}

fn threshold_allows(threshold: Option<usize>, position: usize) -> bool {
    threshold.is_none_or(|highest| position > highest)
}

/// Bookkeeping pushed at every node `open`, popped at its `close`.
#[derive(Clone, Copy, Debug, Default)]
struct OpenFrame {
    /// Indent of the line the node opened on, in the state buffer.
    token_indent: isize,
    /// Line of the node's first token, in the original source.
    open_line: usize,
    /// Byte offset of the node's first token, in the original source.
    open_position: usize,
}

/// A deficient-indentation warning waiting for its scalar to close.
#[derive(Clone, Copy, Debug)]
struct PendingWarning {
    issue: usize,
    original_position: usize,
}

/// One in-flight `check` call: buffers, issues, and detector state.
struct Session<'o> {
    options: &'o CheckOptions,
    fixed: Option<SourceEditor>,
    issues: Vec<Issue>,
    thresholds: Thresholds,
    frames: Vec<OpenFrame>,
    pending_deficient: Vec<PendingWarning>,
}

impl<'o> Session<'o> {
    fn new(options: &'o CheckOptions) -> Self {
        Self {
            options,
            fixed: None,
            issues: Vec::new(),
            thresholds: Thresholds::default(),
            frames: Vec::new(),
            pending_deficient: Vec::new(),
        }
    }

    fn mark_in(&self, buffer: &SourceEditor, position: usize) -> Mark {
        buffer.mark(position, self.options.name.as_deref())
    }

    fn push_issue(&mut self, level: Level, reason: impl Into<String>, mark: Mark) -> usize {
        self.issues.push(Issue::new(level, reason, mark));
        self.issues.len() - 1
    }

    /// Promote an issue to [`Level::Fixed`] when its repair reached the
    /// fixed buffer.
    #[expect(clippy::indexing_slicing, reason = "issue indices are handed out by push_issue")]
    fn promote_when_fixing(&mut self, issue: usize) {
        if self.fixed.is_some() {
            self.issues[issue].level = Level::Fixed;
        }
    }

    /// Splice the state buffer and mirror the edit into the fixed buffer.
    ///
    /// The two buffers drift apart, so the site is translated through the
    /// state map back to the original source and forward into the fixed
    /// map.
    fn splice_both(
        &mut self,
        state: &mut ScanState<'_>,
        position: usize,
        remove: usize,
        insert: &str,
    ) {
        let original = state.buffer().original_position(position);
        state.splice(position, remove, insert);
        if let Some(fixed) = self.fixed.as_mut() {
            let fixed_position = fixed.current_position(original);
            fixed.splice(fixed_position, remove, insert);
        }
    }

    /// Delete every non-printable character before the reader ever runs.
    ///
    /// The state buffer always loses them (the reader cannot tolerate
    /// them); the fixed buffer only when the options ask for it.
    fn scrub_non_printables(&mut self, state_buffer: &mut SourceEditor) {
        if self.options.fix {
            self.fixed = Some(SourceEditor::new(state_buffer.original()));
        }
        let mut search_from = 0;
        while let Some((position, ch)) = invariants::find_non_printable(state_buffer.value(), search_from)
        {
            let mark = self.mark_in(state_buffer, position);
            let original_position = mark.position;
            let issue = self.push_issue(
                Level::Error,
                format!(
                    "The non-printable character #x{:x} is not allowed in YAML",
                    u32::from(ch)
                ),
                mark,
            );
            state_buffer.splice(position, ch.len_utf8(), "");
            if self.options.remove_invalid_characters {
                if let Some(fixed) = self.fixed.as_mut() {
                    let fixed_position = fixed.current_position(original_position);
                    fixed.splice(fixed_position, ch.len_utf8(), "");
                }
                self.promote_when_fixing(issue);
            }
            search_from = position;
        }
    }

    /// Record a terminating reader error as an issue.
    ///
    /// Indentation complaints on lines mixing spaces and tabs are reworded
    /// to say so; errors landing on an `@` are dropped, that site has
    /// already been reported by the leading-`@` detector.
    fn record_scan_error(&mut self, state_buffer: &SourceEditor, fault: &ScanError) {
        if state_buffer.value().as_bytes().get(fault.position) == Some(&b'@') {
            return;
        }
        let mark = self.mark_in(state_buffer, fault.position);
        let indentation_fault = fault.reason.starts_with("bad indentation")
            || fault.reason.starts_with("tab characters");
        let reason = if indentation_fault
            && line_mixes_spaces_and_tabs(state_buffer.original(), mark.position)
        {
            MIXED_INDENTATION.to_owned()
        } else {
            fault.reason.clone()
        };
        self.push_issue(Level::Error, reason, mark);
    }

    /// Pad under-indented continuation lines of the scalar that just
    /// closed, two spaces past the scalar's own line indent.
    #[expect(
        clippy::indexing_slicing,
        clippy::string_slice,
        reason = "issue indices come from push_issue and warning positions translate into the fixed buffer"
    )]
    fn settle_deficient_indentation(&mut self, frame: OpenFrame) {
        if self.pending_deficient.is_empty() {
            return;
        }
        let pending = std::mem::take(&mut self.pending_deficient);
        let Some(fixed) = self.fixed.as_mut() else {
            return;
        };
        for entry in pending {
            if self.issues[entry.issue].mark.line <= frame.open_line {
                continue;
            }
            let fixed_position = fixed.current_position(entry.original_position);
            let line_start = fixed.value()[..fixed_position]
                .rfind('\n')
                .map_or(0, |newline| newline + 1);
            let indent = isize::try_from(fixed_position - line_start).unwrap_or(isize::MAX);
            let target = frame.token_indent + 2;
            if indent < target {
                let missing = usize::try_from(target - indent).unwrap_or(0);
                fixed.splice(line_start, 0, &" ".repeat(missing));
                self.issues[entry.issue].level = Level::Fixed;
            }
        }
    }

    fn check_entity_anchor(&mut self, frame: OpenFrame, state: &ScanState<'_>, anchor: &str) {
        if !threshold_allows(self.thresholds.entity, frame.open_position) {
            return;
        }
        if !detectors::anchor_looks_like_entity(anchor) {
            return;
        }
        self.thresholds.entity = Some(frame.open_position);
        let mark = Mark::in_source(
            state.buffer().original(),
            frame.open_position,
            self.options.name.as_deref(),
        );
        self.push_issue(
            Level::Warning,
            format!("'&{anchor}' looks like an HTML entity; quote this value if it is meant to be text"),
            mark,
        );
    }
}

impl ScanSink for Session<'_> {
    #[expect(
        clippy::indexing_slicing,
        reason = "find_next_non_space returned an in-bounds offset"
    )]
    fn open(&mut self, state: &mut ScanState<'_>) {
        let token_start = detectors::find_next_non_space(state.input(), state.position());
        let anchor_point = token_start.unwrap_or_else(|| state.position());
        let open_mark = state.buffer().mark(anchor_point, None);
        self.frames.push(OpenFrame {
            token_indent: state.line_indent(),
            open_line: open_mark.line,
            open_position: open_mark.position,
        });
        let Some(start) = token_start else {
            return;
        };
        match state.input().as_bytes()[start] {
            b'\'' | b'"' => self.check_quoted_scalar(state, start),
            b'{' => self.check_template_substitution(state, start),
            b'@' => self.check_at_sign(state, start),
            b'[' => self.check_string_bracket(state, start),
            _ => {}
        }
    }

    fn close(&mut self, state: &mut ScanState<'_>, node: &NodeEvent) {
        let frame = self.frames.pop().unwrap_or_default();
        if let Some(anchor) = node.anchor.as_deref() {
            self.check_entity_anchor(frame, state, anchor);
        }
        if node.kind == Some(NodeKind::Scalar) {
            self.settle_deficient_indentation(frame);
        }
    }

    fn warning(&mut self, state: &ScanState<'_>, warning: ScanWarning) {
        match warning.kind {
            WarningKind::DeficientIndentation => {
                let mark = self.mark_in(state.buffer(), warning.position);
                let original_position = mark.position;
                let issue = self.push_issue(Level::Warning, warning.kind.to_string(), mark);
                self.pending_deficient.push(PendingWarning {
                    issue,
                    original_position,
                });
            }
        }
    }
}

/// Whether the leading whitespace of the line containing `position` mixes
/// spaces and tabs.
#[expect(
    clippy::indexing_slicing,
    clippy::string_slice,
    reason = "the position is clamped before the line scan"
)]
fn line_mixes_spaces_and_tabs(text: &str, position: usize) -> bool {
    let clamped = position.min(text.len());
    let line_start = text[..clamped]
        .rfind('\n')
        .map_or(0, |newline| newline + 1);
    let mut saw_space = false;
    let mut saw_tab = false;
    for byte in &text.as_bytes()[line_start..] {
        match byte {
            b' ' => saw_space = true,
            b'\t' => saw_tab = true,
            _ => break,
        }
    }
    saw_space && saw_tab
}
