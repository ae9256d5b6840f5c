//! Note reference database operations
//!
//! A reference row records that one note embeds another. The parent's
//! content carries a matching reference line (same id) used for expansion.

use rusqlite::{params, Connection, OptionalExtension};

use super::notes::{select_note, write_note_content};
use crate::db::{now_millis, Database, DbError, DbResult};
use crate::models::{Note, NoteReference};
use crate::notes::{content, expand};

impl Database {
    /// Create a reference from `parent_note_id` to `referenced_note_id` and
    /// append a reference line to the parent's content.
    ///
    /// `None` when either note is missing for this user. Content that cannot
    /// be parsed is left untouched; the reference row is still recorded.
    pub fn create_reference(
        &self,
        parent_note_id: &str,
        referenced_note_id: &str,
        user_id: &str,
        position: i64,
    ) -> DbResult<Option<String>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let Some(parent) = select_note(&tx, parent_note_id, user_id)? else {
            return Ok(None);
        };
        let Some(referenced) = select_note(&tx, referenced_note_id, user_id)? else {
            return Ok(None);
        };

        let reference_id = uuid::Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO note_references (id, parent_note_id, referenced_note_id, position, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![reference_id, parent.id, referenced.id, position, now_millis()],
        )?;

        match content::append_reference(&parent.content, &reference_id, &referenced.id, &referenced.title) {
            Ok(updated) => {
                write_note_content(&tx, &parent.id, &updated)?;
            }
            Err(e) => {
                log::warn!(
                    "[REFERENCES] Recorded reference {} but could not rewrite content of note {}: {}",
                    reference_id,
                    parent.id,
                    e
                );
            }
        }

        tx.commit()?;
        Ok(Some(reference_id))
    }

    /// References held by a note, ordered by position
    pub fn list_references(&self, parent_note_id: &str) -> DbResult<Vec<NoteReference>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, parent_note_id, referenced_note_id, position, created_at
             FROM note_references
             WHERE parent_note_id = ?1
             ORDER BY position ASC, created_at ASC",
        )?;
        let references = stmt
            .query_map([parent_note_id], |row| {
                Ok(NoteReference {
                    id: row.get(0)?,
                    parent_note_id: row.get(1)?,
                    referenced_note_id: row.get(2)?,
                    position: row.get(3)?,
                    created_at: row.get(4)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(references)
    }

    /// Ids of the notes a note references, ordered by position
    pub fn list_referenced_note_ids(&self, parent_note_id: &str) -> DbResult<Vec<String>> {
        Ok(self
            .list_references(parent_note_id)?
            .into_iter()
            .map(|r| r.referenced_note_id)
            .collect())
    }

    /// Ids of the notes that reference `note_id`
    pub fn list_referencing_note_ids(&self, note_id: &str) -> DbResult<Vec<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT DISTINCT parent_note_id FROM note_references
             WHERE referenced_note_id = ?1
             ORDER BY parent_note_id",
        )?;
        let ids = stmt
            .query_map([note_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(ids)
    }

    /// Delete one reference of a note and its reference line
    pub fn delete_reference(&self, parent_note_id: &str, reference_id: &str) -> DbResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM note_references WHERE id = ?1 AND parent_note_id = ?2",
            params![reference_id, parent_note_id],
        )?;
        if deleted > 0 {
            strip_reference_lines(&tx, parent_note_id, &[reference_id.to_string()])?;
        }
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Delete every reference a note holds, with their reference lines
    pub fn delete_references_from_note(&self, parent_note_id: &str) -> DbResult<usize> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let ids = {
            let mut stmt = tx.prepare("SELECT id FROM note_references WHERE parent_note_id = ?1")?;
            let ids = stmt
                .query_map([parent_note_id], |row| row.get::<_, String>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            ids
        };
        let deleted = tx.execute(
            "DELETE FROM note_references WHERE parent_note_id = ?1",
            [parent_note_id],
        )?;
        strip_reference_lines(&tx, parent_note_id, &ids)?;

        tx.commit()?;
        Ok(deleted)
    }

    /// The note with its reference lines expanded one level.
    ///
    /// `None` only when the note itself is missing. Any failure while
    /// expanding degrades to returning the note unexpanded.
    pub fn get_note_with_expanded_references(&self, note_id: &str, user_id: &str) -> DbResult<Option<Note>> {
        let conn = self.conn()?;
        let Some(mut note) = select_note(&conn, note_id, user_id)? else {
            return Ok(None);
        };

        let expanded = expand::expand_content(&note.content, |referenced_id| {
            select_note(&conn, referenced_id, user_id).map_err(DbError::from)
        });

        match expanded {
            Ok(Some(content)) => note.content = content,
            Ok(None) => {}
            Err(e) => {
                log::warn!("[REFERENCES] Returning note {} unexpanded: {}", note.id, e);
            }
        }
        Ok(Some(note))
    }
}

/// Remove reference lines from a note's content. Unparseable content is left alone.
fn strip_reference_lines(conn: &Connection, note_id: &str, reference_ids: &[String]) -> rusqlite::Result<()> {
    if reference_ids.is_empty() {
        return Ok(());
    }

    let raw: Option<String> = conn
        .query_row("SELECT content FROM notes WHERE id = ?1", [note_id], |row| row.get(0))
        .optional()?;
    let Some(raw) = raw else {
        return Ok(());
    };

    match content::remove_lines(&raw, reference_ids) {
        Ok(Some(updated)) => {
            write_note_content(conn, note_id, &updated)?;
        }
        Ok(None) => {}
        Err(e) => log::warn!("[REFERENCES] Left content of note {} as is: {}", note_id, e),
    }
    Ok(())
}
