use crate::kind::FileKind;

/// A host editor view column, 1-based, assigned left to right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ViewColumn(pub u8);

/// Editor grid shape for one playground, derived from how many of the three
/// editable kinds are present. Never persisted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorLayout {
    /// One editor plus the preview: two columns side by side.
    Single,
    /// Two editors stacked on the left, preview on the right.
    Split,
    /// Three editors and the preview in a two-by-two grid.
    Grid,
}

impl EditorLayout {
    /// Select a layout for the given set of present editor kinds. Manifest
    /// files never occupy an editor slot.
    #[must_use]
    pub fn for_present_kinds(kinds: &[FileKind]) -> Self {
        let editors = Self::editor_order()
            .iter()
            .filter(|kind| kinds.contains(kind))
            .count();

        match editors {
            0 | 1 => Self::Single,
            2 => Self::Split,
            _ => Self::Grid,
        }
    }

    /// Fixed left-to-right opening order for editors.
    #[must_use]
    pub fn editor_order() -> [FileKind; 3] {
        [FileKind::Markup, FileKind::Script, FileKind::Stylesheet]
    }

    /// Column for the nth opened editor (0-based slot index).
    #[must_use]
    pub fn editor_column(self, slot: usize) -> ViewColumn {
        ViewColumn(u8::try_from(slot).unwrap_or(u8::MAX).saturating_add(1))
    }

    /// Column the preview surface lands in: the first slot no editor used.
    #[must_use]
    pub fn preview_column(self, open_editors: usize) -> ViewColumn {
        self.editor_column(open_editors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_by_presence_count() {
        assert_eq!(
            EditorLayout::for_present_kinds(&[FileKind::Markup]),
            EditorLayout::Single
        );
        assert_eq!(
            EditorLayout::for_present_kinds(&[FileKind::Markup, FileKind::Script]),
            EditorLayout::Split
        );
        assert_eq!(
            EditorLayout::for_present_kinds(&[
                FileKind::Markup,
                FileKind::Script,
                FileKind::Stylesheet
            ]),
            EditorLayout::Grid
        );
    }

    #[test]
    fn test_manifest_does_not_take_a_slot() {
        assert_eq!(
            EditorLayout::for_present_kinds(&[FileKind::Manifest, FileKind::Script]),
            EditorLayout::Single
        );
    }

    #[test]
    fn test_columns_follow_role_order() {
        let layout = EditorLayout::Grid;
        assert_eq!(layout.editor_column(0), ViewColumn(1));
        assert_eq!(layout.editor_column(1), ViewColumn(2));
        assert_eq!(layout.editor_column(2), ViewColumn(3));
        assert_eq!(layout.preview_column(3), ViewColumn(4));
    }
}
