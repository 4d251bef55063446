//! In-place string editing with bidirectional position translation.
//!
//! [`SourceEditor`] owns a buffer that is spliced repeatedly while a check
//! session runs, and remembers enough about every splice to translate byte
//! positions between the original text and the current buffer in either
//! direction. The checker keeps two editors per session: one for the state
//! buffer the scanner reads from, one for the user-visible fixed output.
//!
//! The edit list is kept sorted by current position. Each stored edit
//! carries the *accumulated* displacement contributed by every splice at or
//! before its position, which makes both translations a single ordered walk
//! over the list.

use crate::issue::Mark;

/// One recorded splice site.
///
/// `size` is cumulative: it equals the total growth (or shrinkage, when
/// negative) of the buffer caused by all splices at or before `position`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Edit {
    /// Byte offset into the current buffer.
    position: usize,
    /// Accumulated displacement of positions at or after `position`.
    size: isize,
}

/// A mutable string that tracks its own edit history.
#[derive(Clone, Debug)]
pub struct SourceEditor {
    original: String,
    value: String,
    edits: Vec<Edit>,
}

impl SourceEditor {
    /// Start editing a copy of `text`.
    #[must_use]
    pub fn new(text: &str) -> Self {
        Self {
            original: text.to_owned(),
            value: text.to_owned(),
            edits: Vec::new(),
        }
    }

    /// The text as originally supplied.
    #[must_use]
    pub fn original(&self) -> &str {
        &self.original
    }

    /// The text with every splice applied.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Consume the editor, returning the edited text.
    #[must_use]
    pub fn into_value(self) -> String {
        self.value
    }

    /// Replace `remove` bytes at `position` in the current buffer with
    /// `insert`.
    ///
    /// `position` and `remove` are in current-buffer coordinates and must lie
    /// on character boundaries. Edits overlapped by the removed range are
    /// absorbed into the new edit; edits further right are shifted by the
    /// length delta.
    ///
    /// # Panics
    ///
    /// Panics if `position + remove` runs past the end of the buffer or if
    /// either end of the replaced range falls inside a multi-byte character.
    #[expect(
        clippy::indexing_slicing,
        reason = "edit indices come from the bounded walks just above them"
    )]
    pub fn splice(&mut self, position: usize, remove: usize, insert: &str) {
        let end = position + remove;
        self.value.replace_range(position..end, insert);
        let delta = isize::try_from(insert.len()).unwrap_or(isize::MAX)
            - isize::try_from(remove).unwrap_or(isize::MAX);
        if delta == 0 {
            return;
        }

        let mut new_size = delta;
        let mut index = 0;
        while index < self.edits.len() && self.edits[index].position < position {
            new_size = self.edits[index].size + delta;
            index += 1;
        }
        // Absorb edits whose site falls inside the removed range, plus any
        // edit recorded at exactly this position.
        let mut absorbed_end = index;
        while absorbed_end < self.edits.len()
            && (self.edits[absorbed_end].position < end
                || self.edits[absorbed_end].position == position)
        {
            new_size = self.edits[absorbed_end].size + delta;
            absorbed_end += 1;
        }
        self.edits.drain(index..absorbed_end);
        for edit in &mut self.edits[index..] {
            edit.position = edit.position.saturating_add_signed(delta);
            edit.size += delta;
        }
        self.edits.insert(index, Edit { position, size: new_size });
    }

    /// Translate a current-buffer position back to the original buffer.
    #[must_use]
    pub fn original_position(&self, position: usize) -> usize {
        let offset = self
            .edits
            .iter()
            .rev()
            .find(|edit| edit.position <= position)
            .map_or(0, |edit| edit.size);
        position.saturating_add_signed(-offset)
    }

    /// Translate an original-buffer position to the current buffer.
    ///
    /// The walk starts from the nearest preceding edit and then re-absorbs
    /// any later edits whose site has shifted to or before the translated
    /// position; a splice recorded late in original order can sit earlier in
    /// current order once prior splices have grown the buffer.
    #[must_use]
    pub fn current_position(&self, original_position: usize) -> usize {
        let mut translated = original_position;
        for edit in &self.edits {
            if edit.position > translated {
                break;
            }
            translated = edit
                .position
                .max(original_position.saturating_add_signed(edit.size));
        }
        translated
    }

    /// Build a [`Mark`] in the original buffer for a current-buffer position.
    #[must_use]
    pub fn mark(&self, position: usize, name: Option<&str>) -> Mark {
        Mark::in_source(&self.original, self.original_position(position), name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{Result, ensure};
    use rstest::rstest;

    #[test]
    fn splice_updates_value() {
        let mut editor = SourceEditor::new("abcdef");
        editor.splice(2, 1, "XY");
        assert_eq!(editor.value(), "abXYdef");
        assert_eq!(editor.original(), "abcdef");
    }

    #[test]
    fn insertion_shifts_later_positions() -> Result<()> {
        let mut editor = SourceEditor::new("abc");
        editor.splice(1, 0, "XY");
        ensure!(editor.value() == "aXYbc", "value: {}", editor.value());
        ensure!(editor.current_position(1) == 3, "b must move right");
        ensure!(editor.original_position(3) == 1, "and back again");
        ensure!(editor.current_position(0) == 0, "prefix is untouched");
        Ok(())
    }

    #[test]
    fn out_of_order_splices_compose() -> Result<()> {
        let mut editor = SourceEditor::new("abcdef");
        editor.splice(4, 0, "XX");
        editor.splice(1, 0, "Y");
        ensure!(editor.value() == "aYbcdXXef", "value: {}", editor.value());
        // 'e' sat at 4 originally and at 7 now; the translation must absorb
        // both edits even though the second was recorded first.
        ensure!(editor.current_position(4) == 7, "e moved by both splices");
        ensure!(editor.original_position(7) == 4, "round trip");
        Ok(())
    }

    #[test]
    fn removal_absorbs_overlapped_edits() -> Result<()> {
        let mut editor = SourceEditor::new("abcdef");
        editor.splice(2, 0, "XX");
        editor.splice(1, 4, "");
        ensure!(editor.value() == "adef", "value: {}", editor.value());
        ensure!(editor.original_position(1) == 3, "d maps back past the hole");
        Ok(())
    }

    #[test]
    fn deleted_positions_collapse_to_splice_site() {
        let mut editor = SourceEditor::new("abcdef");
        editor.splice(1, 2, "");
        assert_eq!(editor.value(), "adef");
        assert_eq!(editor.current_position(1), 1);
        assert_eq!(editor.current_position(2), 1);
        assert_eq!(editor.current_position(3), 1);
        assert_eq!(editor.current_position(4), 2);
    }

    #[rstest]
    #[case(&[(3, 0, "!"), (0, 0, "??"), (8, 0, ".")])]
    #[case(&[(0, 0, "a"), (1, 0, "b"), (2, 0, "c")])]
    #[case(&[(5, 0, "--"), (5, 0, "--"), (2, 0, "-")])]
    fn insert_only_round_trip(#[case] splices: &[(usize, usize, &str)]) -> Result<()> {
        let text = "0123456789";
        let mut editor = SourceEditor::new(text);
        for (position, remove, insert) in splices {
            let at = editor.current_position(*position);
            editor.splice(at, *remove, insert);
        }
        for original in 0..=text.len() {
            let current = editor.current_position(original);
            ensure!(
                editor.original_position(current) == original,
                "position {original} did not survive the round trip"
            );
        }
        Ok(())
    }

    #[test]
    fn mark_points_into_original() {
        let mut editor = SourceEditor::new("a: b\nc: d\n");
        editor.splice(3, 0, "!!");
        let mark = editor.mark(8, Some("t.yaml"));
        assert_eq!(mark.position, 6);
        assert_eq!(mark.line, 1);
        assert_eq!(mark.column, 1);
    }
}
