//! Event-emitting structural YAML reader.
//!
//! The scanner walks a YAML stream and reports node boundaries to a
//! [`ScanSink`] instead of building values: `open` fires when the reader is
//! about to compose a node, `close` fires when it finishes one. The buffer
//! lives in a [`crate::editor::SourceEditor`] and stays **mutable during
//! `open`**: a sink may splice text at or after the read position and the
//! reader continues over the rewritten input. This is the seam the checker
//! uses to repair a fault before the reader would trip over it.
//!
//! The reader resolves no tags, keeps no anchor table, and composes no
//! values. Syntax faults are [`ScanError`]s, always tagged with a buffer
//! position; recoverable oddities (under-indented continuation lines inside
//! a flow scalar) are delivered through [`ScanSink::warning`].

mod reader;

pub(crate) use reader::{hex_escape_width, is_simple_escape};

use crate::editor::SourceEditor;
use std::fmt;
use thiserror::Error;

/// Structural kind of a composed node.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// A flow or block scalar.
    Scalar,
    /// A block or flow sequence.
    Sequence,
    /// A block or flow mapping.
    Mapping,
    /// An `*alias` reference.
    Alias,
}

/// Snapshot of a node delivered with a `close` event.
#[derive(Clone, Debug)]
pub struct NodeEvent {
    /// What the node turned out to be, or `None` for an empty node.
    pub kind: Option<NodeKind>,
    /// `&name` anchor attached to the node, without the `&`.
    pub anchor: Option<String>,
    /// `!tag` property attached to the node, as written.
    pub tag: Option<String>,
}

/// Kinds of recoverable faults the reader can report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WarningKind {
    /// A continuation line of a multiline scalar is indented less than the
    /// scalar requires.
    DeficientIndentation,
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeficientIndentation => f.write_str("deficient indentation"),
        }
    }
}

/// A recoverable fault, tagged with the buffer position it was seen at.
#[derive(Clone, Copy, Debug)]
pub struct ScanWarning {
    /// What went wrong.
    pub kind: WarningKind,
    /// Byte offset into the current state buffer.
    pub position: usize,
}

/// A fatal syntax fault. Scanning stops at the first one.
#[derive(Clone, Debug, Error)]
#[error("{reason}")]
pub struct ScanError {
    /// Human-readable description, phrased like the fault the author made.
    pub reason: String,
    /// Byte offset into the current state buffer.
    pub position: usize,
}

/// Receiver for scan events.
///
/// `open` fires before the reader seeks to and composes a node, `close`
/// after; the two always pair up on successful paths, and `open` may fire
/// several times at one site when nested contexts begin there.
pub trait ScanSink {
    /// The reader is about to compose a node. The sink may splice the
    /// buffer at or after [`ScanState::position`].
    fn open(&mut self, state: &mut ScanState<'_>);
    /// The reader finished composing a node.
    fn close(&mut self, state: &mut ScanState<'_>, node: &NodeEvent);
    /// A recoverable fault was seen and scanning continues.
    fn warning(&mut self, state: &ScanState<'_>, warning: ScanWarning);
}

/// Mutable cursor over the state buffer, shared with the sink during events.
pub struct ScanState<'b> {
    pub(in crate::scanner) buffer: &'b mut SourceEditor,
    pub(in crate::scanner) position: usize,
    pub(in crate::scanner) line: usize,
    pub(in crate::scanner) line_start: usize,
    pub(in crate::scanner) line_indent: isize,
    pub(in crate::scanner) first_tab_in_line: Option<usize>,
    pub(in crate::scanner) kind: Option<NodeKind>,
    pub(in crate::scanner) anchor: Option<String>,
    pub(in crate::scanner) tag: Option<String>,
}

impl<'b> ScanState<'b> {
    fn new(buffer: &'b mut SourceEditor) -> Self {
        Self {
            buffer,
            position: 0,
            line: 0,
            line_start: 0,
            line_indent: 0,
            first_tab_in_line: None,
            kind: None,
            anchor: None,
            tag: None,
        }
    }

    /// The buffer in its current, possibly repaired, form.
    #[must_use]
    pub fn input(&self) -> &str {
        self.buffer.value()
    }

    /// Byte offset the reader will continue from.
    #[must_use]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Indentation of the line the reader is on, in spaces.
    #[must_use]
    pub const fn line_indent(&self) -> isize {
        self.line_indent
    }

    /// Read access to the buffer's edit history for position translation.
    #[must_use]
    pub fn buffer(&self) -> &SourceEditor {
        self.buffer
    }

    /// Splice the buffer, keeping the reader's cursor valid.
    ///
    /// Splices must not touch text the reader has already consumed; callers
    /// only rewrite at or after [`Self::position`].
    ///
    /// # Panics
    ///
    /// Panics if the replaced range runs past the end of the buffer or
    /// splits a multi-byte character, and, in debug builds, if `position`
    /// is behind the read position.
    pub fn splice(&mut self, position: usize, remove: usize, insert: &str) {
        debug_assert!(
            position >= self.position,
            "splice at {position} behind read position {}",
            self.position
        );
        self.buffer.splice(position, remove, insert);
    }
}

/// Scan `buffer` from the start, delivering events to `sink`.
///
/// # Errors
///
/// Returns the first [`ScanError`] encountered; everything scanned before
/// it has already been delivered to the sink.
pub fn scan(buffer: &mut SourceEditor, sink: &mut dyn ScanSink) -> Result<(), ScanError> {
    let state = ScanState::new(buffer);
    reader::Scanner::new(state, sink).scan_stream()
}
