use notes_types::FolderDto;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folder {
    pub id: String,
    pub user_id: String,
    pub name: String,
    /// Derived from the notes table at read time
    pub note_count: i64,
    pub last_modified: i64,
}

impl From<Folder> for FolderDto {
    fn from(folder: Folder) -> Self {
        Self {
            id: folder.id,
            name: folder.name,
            note_count: folder.note_count,
            last_modified: folder.last_modified,
        }
    }
}
