/// Row of the `note_references` table: `parent_note_id` embeds `referenced_note_id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteReference {
    pub id: String,
    pub parent_note_id: String,
    pub referenced_note_id: String,
    pub position: i64,
    pub created_at: i64,
}
