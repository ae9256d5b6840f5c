use notes_types::NoteDto;

/// A note owned by a user. `content` is the raw content JSON (see `notes::content`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: String,
    pub user_id: String,
    pub folder_id: Option<String>,
    pub title: String,
    pub content: String,
    pub last_modified: i64,
}

impl From<Note> for NoteDto {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            user_id: note.user_id,
            folder_id: note.folder_id,
            title: note.title,
            content: note.content,
            last_modified: note.last_modified,
        }
    }
}
