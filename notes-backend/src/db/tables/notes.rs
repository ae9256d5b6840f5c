//! Note database operations (CRUD and copy-by-value)

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{now_millis, Database, DbResult};
use crate::models::Note;
use crate::notes::content;

const NOTE_COLUMNS: &str = "id, user_id, folder_id, title, content, last_modified";

/// Suffix appended to the title of a copied note when no title is given
pub const COPY_TITLE_SUFFIX: &str = " (copy)";

fn row_to_note(row: &Row) -> rusqlite::Result<Note> {
    Ok(Note {
        id: row.get(0)?,
        user_id: row.get(1)?,
        folder_id: row.get(2)?,
        title: row.get(3)?,
        content: row.get(4)?,
        last_modified: row.get(5)?,
    })
}

/// Fetch a note scoped to its owner. Notes of other users read as missing.
pub(crate) fn select_note(conn: &Connection, note_id: &str, user_id: &str) -> rusqlite::Result<Option<Note>> {
    conn.query_row(
        &format!("SELECT {} FROM notes WHERE id = ?1 AND user_id = ?2", NOTE_COLUMNS),
        params![note_id, user_id],
        row_to_note,
    )
    .optional()
}

fn insert_note(
    conn: &Connection,
    user_id: &str,
    title: &str,
    content: &str,
    folder_id: Option<&str>,
) -> rusqlite::Result<Note> {
    let note = Note {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        folder_id: folder_id.map(|s| s.to_string()),
        title: title.to_string(),
        content: content.to_string(),
        last_modified: now_millis(),
    };
    conn.execute(
        "INSERT INTO notes (id, user_id, folder_id, title, content, last_modified)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![note.id, note.user_id, note.folder_id, note.title, note.content, note.last_modified],
    )?;
    Ok(note)
}

pub(crate) fn write_note_content(conn: &Connection, note_id: &str, content: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE notes SET content = ?1, last_modified = ?2 WHERE id = ?3",
        params![content, now_millis(), note_id],
    )
}

impl Database {
    /// All notes of a user, most recently modified first
    pub fn list_notes(&self, user_id: &str) -> DbResult<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes WHERE user_id = ?1 ORDER BY last_modified DESC, id",
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map([user_id], row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    pub fn list_notes_in_folder(&self, user_id: &str, folder_id: &str) -> DbResult<Vec<Note>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM notes WHERE user_id = ?1 AND folder_id = ?2 ORDER BY last_modified DESC, id",
            NOTE_COLUMNS
        ))?;
        let notes = stmt
            .query_map(params![user_id, folder_id], row_to_note)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(notes)
    }

    pub fn get_note(&self, note_id: &str, user_id: &str) -> DbResult<Option<Note>> {
        let conn = self.conn()?;
        Ok(select_note(&conn, note_id, user_id)?)
    }

    pub fn create_note(
        &self,
        user_id: &str,
        title: &str,
        content: &str,
        folder_id: Option<&str>,
    ) -> DbResult<Note> {
        let conn = self.conn()?;
        Ok(insert_note(&conn, user_id, title, content, folder_id)?)
    }

    /// Replace title and content. `folder_id` of `None` keeps the current folder.
    /// Returns false when the note does not exist for this user.
    pub fn update_note(
        &self,
        note_id: &str,
        user_id: &str,
        title: &str,
        content: &str,
        folder_id: Option<&str>,
    ) -> DbResult<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE notes SET title = ?1, content = ?2, folder_id = COALESCE(?3, folder_id), last_modified = ?4
             WHERE id = ?5 AND user_id = ?6",
            params![title, content, folder_id, now_millis(), note_id, user_id],
        )?;
        Ok(updated > 0)
    }

    /// Delete a note with its items and outgoing references. References other
    /// notes hold to it stay behind and expand to a placeholder.
    pub fn delete_note(&self, note_id: &str, user_id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND user_id = ?2",
            params![note_id, user_id],
        )?;
        Ok(deleted > 0)
    }

    /// Copy a note by value: new id, same content, items and references
    /// duplicated under fresh ids. `None` when the source does not exist.
    pub fn copy_note(
        &self,
        source_note_id: &str,
        user_id: &str,
        new_title: Option<&str>,
    ) -> DbResult<Option<Note>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(source) = select_note(&tx, source_note_id, user_id)? else {
            return Ok(None);
        };

        let title = match new_title {
            Some(title) => title.to_string(),
            None => format!("{}{}", source.title, COPY_TITLE_SUFFIX),
        };
        let mut copy = insert_note(&tx, user_id, &title, &source.content, source.folder_id.as_deref())?;

        let items = copy_rows(
            &tx,
            "SELECT id FROM note_items WHERE note_id = ?1",
            "INSERT INTO note_items (id, note_id, content, is_checked, indents, position, last_modified)
             SELECT ?1, ?2, content, is_checked, indents, position, last_modified FROM note_items WHERE id = ?3",
            &source.id,
            &copy.id,
        )?;
        let references = copy_rows(
            &tx,
            "SELECT id FROM note_references WHERE parent_note_id = ?1",
            "INSERT INTO note_references (id, parent_note_id, referenced_note_id, position, created_at)
             SELECT ?1, ?2, referenced_note_id, position, created_at FROM note_references WHERE id = ?3",
            &source.id,
            &copy.id,
        )?;

        // Reference lines carry the id of their reference row
        match content::rename_reference_ids(&copy.content, &references) {
            Ok(Some(updated)) => {
                write_note_content(&tx, &copy.id, &updated)?;
                copy.content = updated;
            }
            Ok(None) => {}
            Err(e) => log::warn!("Copied note {} keeps the source's reference line ids: {}", copy.id, e),
        }

        tx.commit()?;
        log::info!(
            "Copied note {} to {} ({} items, {} references)",
            source.id,
            copy.id,
            items.len(),
            references.len()
        );
        Ok(Some(copy))
    }
}

/// Duplicate the child rows selected by `select_ids` under `new_parent`,
/// giving every copy a fresh id. Returns `(old id, new id)` pairs.
fn copy_rows(
    conn: &Connection,
    select_ids: &str,
    insert_copy: &str,
    old_parent: &str,
    new_parent: &str,
) -> rusqlite::Result<Vec<(String, String)>> {
    let ids = {
        let mut stmt = conn.prepare(select_ids)?;
        let ids = stmt
            .query_map([old_parent], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids
    };
    let mut insert = conn.prepare(insert_copy)?;
    let mut pairs = Vec::with_capacity(ids.len());
    for id in ids {
        let new_id = uuid::Uuid::new_v4().to_string();
        insert.execute(params![new_id, new_parent, id])?;
        pairs.push((id, new_id));
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::COPY_TITLE_SUFFIX;
    use crate::db::Database;

    const LINES: &str = r#"{"lines":[{"id":"a","text":"Milk","checked":false}]}"#;

    #[test]
    fn test_notes_are_scoped_by_user() {
        let db = Database::open_in_memory().unwrap();
        let note = db.create_note("user1", "Mine", LINES, None).unwrap();

        assert!(db.get_note(&note.id, "user1").unwrap().is_some());
        assert!(db.get_note(&note.id, "user2").unwrap().is_none());
        assert!(!db.update_note(&note.id, "user2", "Stolen", "{}", None).unwrap());
        assert!(!db.delete_note(&note.id, "user2").unwrap());
        assert!(db.list_notes("user2").unwrap().is_empty());
    }

    #[test]
    fn test_update_note_keeps_folder_when_omitted() {
        let db = Database::open_in_memory().unwrap();
        let folder = db.create_folder("user1", "Home").unwrap();
        let note = db.create_note("user1", "Chores", LINES, Some(&folder.id)).unwrap();

        assert!(db.update_note(&note.id, "user1", "Chores!", r#"{"freeText":"x"}"#, None).unwrap());
        let updated = db.get_note(&note.id, "user1").unwrap().unwrap();
        assert_eq!(updated.title, "Chores!");
        assert_eq!(updated.content, r#"{"freeText":"x"}"#);
        assert_eq!(updated.folder_id.as_deref(), Some(folder.id.as_str()));
        assert!(updated.last_modified >= note.last_modified);
    }

    #[test]
    fn test_copy_note_duplicates_content_with_new_id() {
        let db = Database::open_in_memory().unwrap();
        let source = db.create_note("user1", "Groceries", LINES, None).unwrap();

        let copy = db.copy_note(&source.id, "user1", None).unwrap().unwrap();
        assert_ne!(copy.id, source.id);
        assert_eq!(copy.content, source.content);
        assert_eq!(copy.title, format!("Groceries{}", COPY_TITLE_SUFFIX));

        let named = db.copy_note(&source.id, "user1", Some("Weekend")).unwrap().unwrap();
        assert_eq!(named.title, "Weekend");
    }

    #[test]
    fn test_copy_is_decoupled_from_source() {
        let db = Database::open_in_memory().unwrap();
        let source = db.create_note("user1", "Packing", LINES, None).unwrap();
        let source_item = db.create_note_item(&source.id, "Socks", false, 0, None).unwrap();

        let copy = db.copy_note(&source.id, "user1", None).unwrap().unwrap();
        let copied_items = db.list_note_items(&copy.id).unwrap();
        assert_eq!(copied_items.len(), 1);
        assert_ne!(copied_items[0].id, source_item.id);
        assert_eq!(copied_items[0].content, "Socks");
        assert_eq!(copied_items[0].position, source_item.position);

        db.update_note(&source.id, "user1", "Packing", r#"{"freeText":"changed"}"#, None)
            .unwrap();
        db.update_note_item(&source.id, &source_item.id, Some("Shoes"), None, None)
            .unwrap();

        let copy_after = db.get_note(&copy.id, "user1").unwrap().unwrap();
        assert_eq!(copy_after.content, LINES);
        assert_eq!(db.list_note_items(&copy.id).unwrap()[0].content, "Socks");
    }

    #[test]
    fn test_copy_missing_or_foreign_note() {
        let db = Database::open_in_memory().unwrap();
        let note = db.create_note("user1", "Private", LINES, None).unwrap();
        assert!(db.copy_note("missing", "user1", None).unwrap().is_none());
        assert!(db.copy_note(&note.id, "user2", None).unwrap().is_none());
    }

    #[test]
    fn test_delete_note_cascades_to_items_and_outgoing_references() {
        let db = Database::open_in_memory().unwrap();
        let parent = db.create_note("user1", "Parent", LINES, None).unwrap();
        let child = db.create_note("user1", "Child", LINES, None).unwrap();
        db.create_note_item(&parent.id, "one", false, 0, None).unwrap();
        db.create_reference(&parent.id, &child.id, "user1", 0).unwrap().unwrap();

        assert!(db.delete_note(&parent.id, "user1").unwrap());
        assert!(db.list_note_items(&parent.id).unwrap().is_empty());
        assert!(db.list_referencing_note_ids(&child.id).unwrap().is_empty());
    }

    #[test]
    fn test_copy_rewires_reference_lines() {
        let db = Database::open_in_memory().unwrap();
        let parent = db.create_note("user1", "Parent", LINES, None).unwrap();
        let child = db.create_note("user1", "Child", LINES, None).unwrap();
        let ref_id = db.create_reference(&parent.id, &child.id, "user1", 0).unwrap().unwrap();

        let copy = db.copy_note(&parent.id, "user1", None).unwrap().unwrap();
        let copied_refs = db.list_references(&copy.id).unwrap();
        assert_eq!(copied_refs.len(), 1);
        assert_ne!(copied_refs[0].id, ref_id);
        assert!(copy.content.contains(&copied_refs[0].id));
        assert!(!copy.content.contains(&ref_id));

        // Dropping the copy's reference leaves the source untouched
        assert!(db.delete_reference(&copy.id, &copied_refs[0].id).unwrap());
        assert_eq!(db.list_referenced_note_ids(&parent.id).unwrap(), vec![child.id.clone()]);
        assert!(db.get_note(&parent.id, "user1").unwrap().unwrap().content.contains(&ref_id));
    }
}
