//! The recursive-descent reader behind [`scan`](super::scan).
//!
//! Structure follows the classic loader shape: a document loop over
//! `compose_node`, which seeks, reads node properties, and dispatches to the
//! block/flow readers. The reader works byte-wise; a zero byte stands for
//! end of input, which is safe because the checker strips non-printable
//! characters (NUL included) from the state buffer before scanning.

use super::{NodeEvent, NodeKind, ScanError, ScanSink, ScanState, ScanWarning, WarningKind};

/// Composition context, deciding which readers are allowed and how indent
/// limits propagate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Context {
    BlockOut,
    BlockIn,
    FlowOut,
    FlowIn,
}

const fn is_eol(byte: u8) -> bool {
    matches!(byte, b'\n' | b'\r')
}

const fn is_white(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t')
}

const fn is_ws_or_eol(byte: u8) -> bool {
    is_white(byte) || is_eol(byte)
}

const fn is_flow_indicator(byte: u8) -> bool {
    matches!(byte, b',' | b'[' | b']' | b'{' | b'}')
}

/// Escape characters valid after a backslash in a double-quoted scalar.
pub(crate) const fn is_simple_escape(byte: u8) -> bool {
    matches!(
        byte,
        b'0' | b'a'
            | b'b'
            | b't'
            | b'\t'
            | b'n'
            | b'v'
            | b'f'
            | b'r'
            | b'e'
            | b' '
            | b'"'
            | b'/'
            | b'\\'
            | b'N'
            | b'_'
            | b'L'
            | b'P'
    )
}

/// Number of hex digits expected after `\x`, `\u`, or `\U`.
pub(crate) const fn hex_escape_width(byte: u8) -> Option<usize> {
    match byte {
        b'x' => Some(2),
        b'u' => Some(4),
        b'U' => Some(8),
        _ => None,
    }
}

const fn indent_status_of(line_indent: isize, parent_indent: isize) -> i8 {
    if line_indent > parent_indent {
        1
    } else if line_indent < parent_indent {
        -1
    } else {
        0
    }
}

pub(super) struct Scanner<'b, 's> {
    state: ScanState<'b>,
    sink: &'s mut dyn ScanSink,
}

impl<'b, 's> Scanner<'b, 's> {
    pub(super) fn new(state: ScanState<'b>, sink: &'s mut dyn ScanSink) -> Self {
        Self { state, sink }
    }

    fn at(&self, position: usize) -> u8 {
        self.state
            .buffer
            .value()
            .as_bytes()
            .get(position)
            .copied()
            .unwrap_or(0)
    }

    fn cur(&self) -> u8 {
        self.at(self.state.position)
    }

    fn column(&self) -> isize {
        isize::try_from(self.state.position - self.state.line_start).unwrap_or(isize::MAX)
    }

    fn error(&self, reason: &str) -> ScanError {
        ScanError {
            reason: reason.to_owned(),
            position: self.state.position,
        }
    }

    fn warn(&mut self, kind: WarningKind, position: usize) {
        let warning = ScanWarning { kind, position };
        self.sink.warning(&self.state, warning);
    }

    /// Scan every document in the stream.
    pub(super) fn scan_stream(&mut self) -> Result<(), ScanError> {
        loop {
            self.skip_separation_space(true, -1);
            if self.cur() == 0 {
                return Ok(());
            }
            self.read_document()?;
        }
    }

    fn read_document(&mut self) -> Result<(), ScanError> {
        // Directive lines are skipped wholesale; nothing downstream needs
        // %YAML or %TAG semantics.
        while self.cur() == b'%' {
            while self.cur() != 0 && !is_eol(self.cur()) {
                self.state.position += 1;
            }
            self.skip_separation_space(true, -1);
        }
        if self.state.line_indent == 0 && self.cur() == b'-' && self.test_document_separator() {
            self.state.position += 3;
            self.skip_separation_space(true, -1);
        }
        if self.cur() == 0 {
            return Ok(());
        }
        let parent_indent = self.state.line_indent - 1;
        self.compose_node(parent_indent, Context::BlockOut, false, true)?;
        self.skip_separation_space(true, -1);
        if self.state.position == self.state.line_start && self.test_document_separator() {
            if self.cur() == b'.' {
                self.state.position += 3;
                self.skip_separation_space(true, -1);
            }
            return Ok(());
        }
        if self.state.position < self.state.buffer.value().len() {
            return Err(self.error("end of the stream or a document separator is expected"));
        }
        Ok(())
    }

    /// Skip spaces, comments, and line breaks; count the breaks crossed.
    ///
    /// With `check_indent >= 0` a line landed on with less indentation than
    /// requested raises a deficient-indentation warning, the recovery path
    /// for under-indented multiline scalars.
    fn skip_separation_space(&mut self, allow_comments: bool, check_indent: isize) -> usize {
        let mut line_breaks = 0usize;
        loop {
            let mut b = self.cur();
            while is_white(b) {
                if b == b'\t' && self.state.first_tab_in_line.is_none() {
                    self.state.first_tab_in_line = Some(self.state.position);
                }
                self.state.position += 1;
                b = self.cur();
            }
            if allow_comments && b == b'#' {
                while b != 0 && !is_eol(b) {
                    self.state.position += 1;
                    b = self.cur();
                }
            }
            if is_eol(b) {
                self.read_line_break();
                line_breaks += 1;
                self.state.line_indent = 0;
                while self.cur() == b' ' {
                    self.state.line_indent += 1;
                    self.state.position += 1;
                }
            } else {
                break;
            }
        }
        if check_indent >= 0 && line_breaks > 0 && self.state.line_indent < check_indent {
            self.warn(WarningKind::DeficientIndentation, self.state.position);
        }
        line_breaks
    }

    fn read_line_break(&mut self) {
        let b = self.cur();
        if b == b'\r' {
            self.state.position += 1;
            if self.cur() == b'\n' {
                self.state.position += 1;
            }
        } else if b == b'\n' {
            self.state.position += 1;
        }
        self.state.line += 1;
        self.state.line_start = self.state.position;
        self.state.first_tab_in_line = None;
    }

    fn test_document_separator(&self) -> bool {
        let p = self.state.position;
        let marker = self.at(p);
        if (marker == b'-' || marker == b'.') && self.at(p + 1) == marker && self.at(p + 2) == marker
        {
            let after = self.at(p + 3);
            return after == 0 || is_ws_or_eol(after);
        }
        false
    }

    /// Compose one node: fire `open`, seek if allowed, read properties, try
    /// the readers in order, fire `close`.
    fn compose_node(
        &mut self,
        parent_indent: isize,
        context: Context,
        allow_to_seek: bool,
        allow_compact: bool,
    ) -> Result<bool, ScanError> {
        self.state.kind = None;
        self.state.anchor = None;
        self.state.tag = None;
        self.sink.open(&mut self.state);

        let block_context = matches!(context, Context::BlockOut | Context::BlockIn);
        let allow_block_styles = block_context;
        let mut allow_block_collections = block_context;
        let mut at_new_line = false;
        let mut indent_status = 1i8;

        if allow_to_seek && self.skip_separation_space(true, -1) > 0 {
            at_new_line = true;
            indent_status = indent_status_of(self.state.line_indent, parent_indent);
        }
        if indent_status == 1 {
            loop {
                let saw_property = if self.read_tag_property()? {
                    true
                } else {
                    self.read_anchor_property()?
                };
                if !saw_property {
                    break;
                }
                if self.skip_separation_space(true, -1) > 0 {
                    at_new_line = true;
                    allow_block_collections = allow_block_styles;
                    indent_status = indent_status_of(self.state.line_indent, parent_indent);
                } else {
                    allow_block_collections = false;
                }
            }
        }
        if allow_block_collections {
            allow_block_collections = at_new_line || allow_compact;
        }

        let mut has_content = false;
        if indent_status == 1 || context == Context::BlockOut {
            let flow_indent = if matches!(context, Context::FlowIn | Context::FlowOut) {
                parent_indent
            } else {
                parent_indent + 1
            };
            let block_indent = self.column();
            if indent_status == 1 {
                let block_collection = allow_block_collections
                    && (self.read_block_sequence(block_indent)?
                        || self.read_block_mapping(block_indent, flow_indent)?);
                if block_collection || self.read_flow_collection(flow_indent)? {
                    has_content = true;
                } else if (allow_block_styles && self.read_block_scalar(flow_indent)?)
                    || self.read_single_quoted(flow_indent)?
                    || self.read_double_quoted(flow_indent)?
                {
                    has_content = true;
                } else if self.read_alias()? {
                    has_content = true;
                } else {
                    has_content = self.read_plain_scalar(flow_indent, context == Context::FlowIn);
                }
            } else if indent_status == 0 {
                has_content = allow_block_collections && self.read_block_sequence(block_indent)?;
            }
        }

        let event = NodeEvent {
            kind: self.state.kind,
            anchor: self.state.anchor.clone(),
            tag: self.state.tag.clone(),
        };
        self.sink.close(&mut self.state, &event);
        Ok(has_content || self.state.anchor.is_some() || self.state.tag.is_some())
    }

    #[expect(
        clippy::string_slice,
        reason = "the property span was scanned byte by byte over ASCII delimiters"
    )]
    fn read_tag_property(&mut self) -> Result<bool, ScanError> {
        if self.cur() != b'!' {
            return Ok(false);
        }
        let start = self.state.position;
        self.state.position += 1;
        if self.cur() == b'<' {
            self.state.position += 1;
            loop {
                let b = self.cur();
                if b == b'>' {
                    self.state.position += 1;
                    break;
                }
                if b == 0 || is_eol(b) {
                    return Err(self.error("unexpected end of the stream within a verbatim tag"));
                }
                self.state.position += 1;
            }
        } else {
            loop {
                let b = self.cur();
                if b == 0 || is_ws_or_eol(b) || is_flow_indicator(b) {
                    break;
                }
                self.state.position += 1;
            }
        }
        let text = self.state.buffer.value()[start..self.state.position].to_owned();
        self.state.tag = Some(text);
        Ok(true)
    }

    #[expect(
        clippy::string_slice,
        reason = "the name span was scanned byte by byte over ASCII delimiters"
    )]
    fn read_anchor_property(&mut self) -> Result<bool, ScanError> {
        if self.cur() != b'&' {
            return Ok(false);
        }
        self.state.position += 1;
        let start = self.state.position;
        loop {
            let b = self.cur();
            if b == 0 || is_ws_or_eol(b) || is_flow_indicator(b) {
                break;
            }
            self.state.position += 1;
        }
        if self.state.position == start {
            return Err(self.error("name of an anchor node must contain at least one character"));
        }
        let name = self.state.buffer.value()[start..self.state.position].to_owned();
        self.state.anchor = Some(name);
        Ok(true)
    }

    fn read_alias(&mut self) -> Result<bool, ScanError> {
        if self.cur() != b'*' {
            return Ok(false);
        }
        self.state.position += 1;
        let start = self.state.position;
        loop {
            let b = self.cur();
            if b == 0 || is_ws_or_eol(b) || is_flow_indicator(b) {
                break;
            }
            self.state.position += 1;
        }
        if self.state.position == start {
            return Err(self.error("name of an alias node must contain at least one character"));
        }
        self.state.kind = Some(NodeKind::Alias);
        Ok(true)
    }

    fn read_block_sequence(&mut self, node_indent: isize) -> Result<bool, ScanError> {
        if let Some(tab) = self.state.first_tab_in_line {
            self.state.position = tab;
            return Err(self.error("tab characters must not be used in indentation"));
        }
        // Entry composes reset the node properties; keep ours for `close`.
        let saved_tag = self.state.tag.clone();
        let saved_anchor = self.state.anchor.clone();
        let mut detected = false;
        loop {
            if self.cur() != b'-' {
                break;
            }
            let following = self.at(self.state.position + 1);
            if following != 0 && !is_ws_or_eol(following) {
                break;
            }
            detected = true;
            self.state.position += 1;
            if self.skip_separation_space(true, -1) > 0 && self.state.line_indent <= node_indent {
                // Empty entry; the next line owns whatever comes after.
                continue;
            }
            let current_line = self.state.line;
            self.compose_node(node_indent, Context::BlockIn, false, true)?;
            self.skip_separation_space(true, -1);
            let b = self.cur();
            if (self.state.line == current_line || self.state.line_indent > node_indent) && b != 0 {
                return Err(self.error("bad indentation of a sequence entry"));
            }
            if self.state.line_indent < node_indent {
                break;
            }
        }
        if detected {
            self.state.tag = saved_tag;
            self.state.anchor = saved_anchor;
            self.state.kind = Some(NodeKind::Sequence);
        }
        Ok(detected)
    }

    fn read_block_mapping(
        &mut self,
        node_indent: isize,
        flow_indent: isize,
    ) -> Result<bool, ScanError> {
        // Key composes reset the node properties; keep ours for `close`.
        let saved_tag = self.state.tag.clone();
        let saved_anchor = self.state.anchor.clone();
        let mut detected = false;
        let mut at_explicit_key = false;
        loop {
            let b = self.cur();
            if b == 0 {
                break;
            }
            if !at_explicit_key && let Some(tab) = self.state.first_tab_in_line {
                self.state.position = tab;
                return Err(self.error("tab characters must not be used in indentation"));
            }
            let following = self.at(self.state.position + 1);
            let current_line = self.state.line;
            let allow_compact;
            if (b == b'?' || b == b':') && (following == 0 || is_ws_or_eol(following)) {
                if b == b'?' {
                    detected = true;
                    at_explicit_key = true;
                    allow_compact = true;
                } else if at_explicit_key {
                    at_explicit_key = false;
                    allow_compact = true;
                } else {
                    return Err(self.error(
                        "incomplete explicit mapping pair; a key node is missed; \
                         or followed by a non-tabulated empty line",
                    ));
                }
                self.state.position += 1;
            } else {
                if !self.compose_node(flow_indent, Context::FlowOut, false, true)? {
                    break;
                }
                if self.state.line == current_line {
                    let mut separator = self.cur();
                    while is_white(separator) {
                        self.state.position += 1;
                        separator = self.cur();
                    }
                    if separator == b':' {
                        self.state.position += 1;
                        let after = self.cur();
                        if after != 0 && !is_ws_or_eol(after) {
                            return Err(self.error(
                                "a whitespace character is expected after the key-value \
                                 separator within a block mapping",
                            ));
                        }
                        detected = true;
                        at_explicit_key = false;
                        allow_compact = false;
                    } else if detected {
                        return Err(
                            self.error("can not read an implicit mapping pair; a colon is missed")
                        );
                    } else {
                        // A lone scalar at this level; keep the composed node.
                        self.state.tag = saved_tag;
                        self.state.anchor = saved_anchor;
                        return Ok(true);
                    }
                } else if detected {
                    return Err(self.error(
                        "can not read a block mapping entry; \
                         a multiline key may not be an implicit key",
                    ));
                } else {
                    self.state.tag = saved_tag;
                    self.state.anchor = saved_anchor;
                    return Ok(true);
                }
            }
            if self.state.line == current_line || self.state.line_indent > node_indent {
                self.compose_node(node_indent, Context::BlockOut, true, allow_compact)?;
            }
            self.skip_separation_space(true, -1);
            let after_pair = self.cur();
            if self.state.line_indent > node_indent && after_pair != 0 {
                return Err(self.error("bad indentation of a mapping entry"));
            }
            if self.state.line_indent < node_indent {
                break;
            }
        }
        if detected {
            self.state.tag = saved_tag;
            self.state.anchor = saved_anchor;
            self.state.kind = Some(NodeKind::Mapping);
        }
        Ok(detected)
    }

    fn read_flow_collection(&mut self, node_indent: isize) -> Result<bool, ScanError> {
        let (terminator, kind) = match self.cur() {
            b'[' => (b']', NodeKind::Sequence),
            b'{' => (b'}', NodeKind::Mapping),
            _ => return Ok(false),
        };
        // Entry composes reset the node properties; keep ours for `close`.
        let saved_tag = self.state.tag.clone();
        let saved_anchor = self.state.anchor.clone();
        self.state.position += 1;
        self.skip_separation_space(true, node_indent);
        let mut read_next = true;
        loop {
            let b = self.cur();
            if b == 0 {
                return Err(self.error("unexpected end of the stream within a flow collection"));
            }
            if b == terminator {
                self.state.position += 1;
                self.state.tag = saved_tag;
                self.state.anchor = saved_anchor;
                self.state.kind = Some(kind);
                return Ok(true);
            }
            if !read_next {
                return Err(self.error("missed comma between flow collection entries"));
            }
            if b == b',' {
                return Err(self.error("expected the node content, but found ','"));
            }
            if b == b'?' && is_ws_or_eol(self.at(self.state.position + 1)) {
                self.state.position += 1;
                self.skip_separation_space(true, node_indent);
            }
            self.compose_node(node_indent, Context::FlowIn, false, true)?;
            self.skip_separation_space(true, node_indent);
            if self.cur() == b':' {
                self.state.position += 1;
                self.skip_separation_space(true, node_indent);
                self.compose_node(node_indent, Context::FlowIn, false, true)?;
                self.skip_separation_space(true, node_indent);
            }
            if self.cur() == b',' {
                read_next = true;
                self.state.position += 1;
                self.skip_separation_space(true, node_indent);
            } else {
                read_next = false;
            }
        }
    }

    fn read_block_scalar(&mut self, node_indent: isize) -> Result<bool, ScanError> {
        let indicator = self.cur();
        if indicator != b'|' && indicator != b'>' {
            return Ok(false);
        }
        self.state.kind = Some(NodeKind::Scalar);
        self.state.position += 1;
        let mut text_indent: isize = -1;
        loop {
            let b = self.cur();
            if b == b'+' || b == b'-' {
                self.state.position += 1;
            } else if b.is_ascii_digit() {
                if b == b'0' {
                    return Err(self.error(
                        "bad explicit indentation width of a block scalar; \
                         it cannot be less than one",
                    ));
                }
                text_indent = node_indent + isize::from(b - b'0') - 1;
                self.state.position += 1;
            } else {
                break;
            }
        }
        // Rest of the header line: trailing blanks and an optional comment.
        loop {
            let b = self.cur();
            if is_white(b) {
                self.state.position += 1;
            } else if b == b'#' {
                while self.cur() != 0 && !is_eol(self.cur()) {
                    self.state.position += 1;
                }
            } else {
                break;
            }
        }
        // Body: more-indented lines belong to the scalar, blank lines pass
        // through, the first dedented content line ends it.
        loop {
            if !is_eol(self.cur()) {
                break;
            }
            self.read_line_break();
            self.state.line_indent = 0;
            while self.cur() == b' ' {
                self.state.line_indent += 1;
                self.state.position += 1;
            }
            let b = self.cur();
            if b == 0 {
                break;
            }
            if is_eol(b) {
                continue;
            }
            if text_indent < 0 && self.state.line_indent > node_indent {
                text_indent = self.state.line_indent;
            }
            if self.state.line_indent < text_indent.max(node_indent + 1) {
                break;
            }
            while self.cur() != 0 && !is_eol(self.cur()) {
                self.state.position += 1;
            }
        }
        Ok(true)
    }

    fn read_single_quoted(&mut self, node_indent: isize) -> Result<bool, ScanError> {
        if self.cur() != b'\'' {
            return Ok(false);
        }
        self.state.kind = Some(NodeKind::Scalar);
        self.state.position += 1;
        loop {
            let b = self.cur();
            if b == 0 {
                return Err(
                    self.error("unexpected end of the stream within a single quoted scalar")
                );
            }
            if b == b'\'' {
                self.state.position += 1;
                if self.cur() == b'\'' {
                    // Doubled quote, the single-quoted escape form.
                    self.state.position += 1;
                } else {
                    return Ok(true);
                }
            } else if is_eol(b) {
                self.skip_separation_space(false, node_indent);
            } else if self.state.position == self.state.line_start && self.test_document_separator()
            {
                return Err(
                    self.error("unexpected end of the document within a single quoted scalar")
                );
            } else {
                self.state.position += 1;
            }
        }
    }

    fn read_double_quoted(&mut self, node_indent: isize) -> Result<bool, ScanError> {
        if self.cur() != b'"' {
            return Ok(false);
        }
        self.state.kind = Some(NodeKind::Scalar);
        self.state.position += 1;
        loop {
            let b = self.cur();
            if b == 0 {
                return Err(
                    self.error("unexpected end of the stream within a double quoted scalar")
                );
            }
            if b == b'"' {
                self.state.position += 1;
                return Ok(true);
            }
            if b == b'\\' {
                self.state.position += 1;
                let escaped = self.cur();
                if is_eol(escaped) {
                    self.skip_separation_space(false, node_indent);
                } else if escaped != 0 && is_simple_escape(escaped) {
                    self.state.position += 1;
                } else if let Some(width) = hex_escape_width(escaped) {
                    self.state.position += 1;
                    for _ in 0..width {
                        if !self.cur().is_ascii_hexdigit() {
                            return Err(self.error("expected hexadecimal character"));
                        }
                        self.state.position += 1;
                    }
                } else {
                    return Err(self.error("unknown escape sequence in a double quoted scalar"));
                }
            } else if is_eol(b) {
                self.skip_separation_space(false, node_indent);
            } else if self.state.position == self.state.line_start && self.test_document_separator()
            {
                return Err(
                    self.error("unexpected end of the document within a double quoted scalar")
                );
            } else {
                self.state.position += 1;
            }
        }
    }

    fn read_plain_scalar(&mut self, node_indent: isize, within_flow: bool) -> bool {
        let first = self.cur();
        if first == 0
            || is_ws_or_eol(first)
            || is_flow_indicator(first)
            || matches!(
                first,
                b'#' | b'&' | b'*' | b'!' | b'|' | b'>' | b'\'' | b'"' | b'%' | b'@' | b'`'
            )
        {
            return false;
        }
        if first == b'?' || first == b'-' {
            let following = self.at(self.state.position + 1);
            if following == 0
                || is_ws_or_eol(following)
                || (within_flow && is_flow_indicator(following))
            {
                return false;
            }
        }
        let mut has_content = false;
        let mut capture_end = self.state.position;
        loop {
            let b = self.cur();
            if b == 0 {
                break;
            }
            if b == b':' {
                let following = self.at(self.state.position + 1);
                if following == 0
                    || is_ws_or_eol(following)
                    || (within_flow && is_flow_indicator(following))
                {
                    break;
                }
            } else if b == b'#' {
                let preceding = if self.state.position == 0 {
                    0
                } else {
                    self.at(self.state.position - 1)
                };
                if is_ws_or_eol(preceding) {
                    break;
                }
            } else if (self.state.position == self.state.line_start
                && self.test_document_separator())
                || (within_flow && is_flow_indicator(b))
            {
                break;
            } else if is_eol(b) {
                let saved_line = self.state.line;
                let saved_line_start = self.state.line_start;
                let saved_indent = self.state.line_indent;
                self.skip_separation_space(false, -1);
                if self.state.line_indent >= node_indent && self.cur() != 0 {
                    continue;
                }
                // The next line is no continuation; the scalar ended with
                // its last content byte.
                self.state.position = capture_end;
                self.state.line = saved_line;
                self.state.line_start = saved_line_start;
                self.state.line_indent = saved_indent;
                break;
            }
            if !is_white(b) {
                has_content = true;
                capture_end = self.state.position + 1;
            }
            self.state.position += 1;
        }
        if has_content {
            self.state.kind = Some(NodeKind::Scalar);
        }
        has_content
    }
}
