use notes_types::NoteItemDto;

/// One line of a note. Siblings are ordered by `position` (see `notes::positions`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteItem {
    pub id: String,
    pub note_id: String,
    pub content: String,
    pub is_checked: bool,
    pub indents: i64,
    pub position: i64,
    pub last_modified: i64,
}

impl From<NoteItem> for NoteItemDto {
    fn from(item: NoteItem) -> Self {
        Self {
            id: item.id,
            note_id: item.note_id,
            text: item.content,
            checked: item.is_checked,
            indent: item.indents,
            position: item.position,
            last_modified: item.last_modified,
        }
    }
}
