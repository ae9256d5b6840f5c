//! Note item database operations
//!
//! Items are ordered by their sparse `position` key. New keys come from
//! `notes::positions`; when a computed key collides with a sibling the
//! UNIQUE(note_id, position) index rejects the write, the siblings are
//! renormalized and the placement is retried once.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::sqlite::is_unique_violation;
use crate::db::{now_millis, Database, DbError, DbResult};
use crate::models::NoteItem;
use crate::notes::positions;

const ITEM_COLUMNS: &str = "id, note_id, content, is_checked, indents, position, last_modified";

fn row_to_item(row: &Row) -> rusqlite::Result<NoteItem> {
    Ok(NoteItem {
        id: row.get(0)?,
        note_id: row.get(1)?,
        content: row.get(2)?,
        is_checked: row.get::<_, i64>(3)? != 0,
        indents: row.get(4)?,
        position: row.get(5)?,
        last_modified: row.get(6)?,
    })
}

fn select_items(conn: &Connection, note_id: &str) -> rusqlite::Result<Vec<NoteItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM note_items WHERE note_id = ?1 ORDER BY position ASC",
        ITEM_COLUMNS
    ))?;
    let items = stmt
        .query_map([note_id], row_to_item)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(items)
}

fn select_item(conn: &Connection, note_id: &str, item_id: &str) -> rusqlite::Result<Option<NoteItem>> {
    conn.query_row(
        &format!("SELECT {} FROM note_items WHERE id = ?1 AND note_id = ?2", ITEM_COLUMNS),
        params![item_id, note_id],
        row_to_item,
    )
    .optional()
}

/// Ascending sibling keys, leaving out `exclude` (the row being moved)
fn sibling_positions(conn: &Connection, note_id: &str, exclude: Option<&str>) -> rusqlite::Result<Vec<i64>> {
    let mut stmt = conn.prepare(
        "SELECT position FROM note_items
         WHERE note_id = ?1 AND (?2 IS NULL OR id != ?2)
         ORDER BY position ASC",
    )?;
    let keys = stmt
        .query_map(params![note_id, exclude], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(keys)
}

/// Respace every item of a note to `GAP, 2*GAP, ...` keeping display order.
///
/// Runs in two passes: temporary negative keys first, so no intermediate
/// state can trip the UNIQUE index.
fn renormalize(conn: &Connection, note_id: &str) -> rusqlite::Result<usize> {
    let ids = {
        let mut stmt = conn.prepare("SELECT id FROM note_items WHERE note_id = ?1 ORDER BY position ASC")?;
        let ids = stmt
            .query_map([note_id], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        ids
    };

    let mut update = conn.prepare("UPDATE note_items SET position = ?1 WHERE id = ?2")?;
    for (i, id) in ids.iter().enumerate() {
        update.execute(params![-(i as i64 + 1), id])?;
    }
    for (key, id) in positions::normalized_positions(ids.len()).into_iter().zip(&ids) {
        update.execute(params![key, id])?;
    }

    log::debug!("[NOTE_ITEMS] Renormalized {} items of note {}", ids.len(), note_id);
    Ok(ids.len())
}

/// Compute a key for `index` among the siblings and hand it to `write`.
///
/// On a collision (or when keys are exhausted) the siblings are
/// renormalized and the key recomputed once. A second failure is
/// `PositionsExhausted`.
fn place_with_retry<F>(
    conn: &Connection,
    note_id: &str,
    exclude: Option<&str>,
    index: usize,
    mut write: F,
) -> DbResult<i64>
where
    F: FnMut(i64) -> rusqlite::Result<()>,
{
    for attempt in 0..2 {
        let siblings = sibling_positions(conn, note_id, exclude)?;
        if let Some(key) = positions::position_for_index(&siblings, index) {
            match write(key) {
                Ok(()) => return Ok(key),
                Err(e) if is_unique_violation(&e) => {
                    log::debug!(
                        "[NOTE_ITEMS] Position {} taken in note {} (attempt {})",
                        key,
                        note_id,
                        attempt + 1
                    );
                }
                Err(e) => return Err(e.into()),
            }
        }
        if attempt == 0 {
            renormalize(conn, note_id)?;
        }
    }

    log::warn!("[NOTE_ITEMS] No free position in note {} after renormalizing", note_id);
    Err(DbError::PositionsExhausted {
        note_id: note_id.to_string(),
    })
}

fn touch_note(conn: &Connection, note_id: &str) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE notes SET last_modified = ?1 WHERE id = ?2",
        params![now_millis(), note_id],
    )
}

impl Database {
    /// Items of a note in display order
    pub fn list_note_items(&self, note_id: &str) -> DbResult<Vec<NoteItem>> {
        let conn = self.conn()?;
        Ok(select_items(&conn, note_id)?)
    }

    pub fn get_note_item(&self, note_id: &str, item_id: &str) -> DbResult<Option<NoteItem>> {
        let conn = self.conn()?;
        Ok(select_item(&conn, note_id, item_id)?)
    }

    /// Insert an item at `index` (clamped), or append when `index` is `None`.
    pub fn create_note_item(
        &self,
        note_id: &str,
        text: &str,
        checked: bool,
        indent: i64,
        index: Option<usize>,
    ) -> DbResult<NoteItem> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let id = uuid::Uuid::new_v4().to_string();
        let now = now_millis();
        let index = index.unwrap_or(usize::MAX);

        let position = place_with_retry(&tx, note_id, None, index, |key| {
            tx.execute(
                "INSERT INTO note_items (id, note_id, content, is_checked, indents, position, last_modified)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![id, note_id, text, checked as i64, indent, key, now],
            )
            .map(|_| ())
        })?;
        touch_note(&tx, note_id)?;

        tx.commit()?;
        Ok(NoteItem {
            id,
            note_id: note_id.to_string(),
            content: text.to_string(),
            is_checked: checked,
            indents: indent,
            position,
            last_modified: now,
        })
    }

    /// Partial update; `None` fields keep their value. `None` when the item is missing.
    pub fn update_note_item(
        &self,
        note_id: &str,
        item_id: &str,
        text: Option<&str>,
        checked: Option<bool>,
        indent: Option<i64>,
    ) -> DbResult<Option<NoteItem>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE note_items
             SET content = COALESCE(?1, content),
                 is_checked = COALESCE(?2, is_checked),
                 indents = COALESCE(?3, indents),
                 last_modified = ?4
             WHERE id = ?5 AND note_id = ?6",
            params![text, checked.map(|c| c as i64), indent, now_millis(), item_id, note_id],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        touch_note(&tx, note_id)?;
        let item = select_item(&tx, note_id, item_id)?;

        tx.commit()?;
        Ok(item)
    }

    pub fn delete_note_item(&self, note_id: &str, item_id: &str) -> DbResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let deleted = tx.execute(
            "DELETE FROM note_items WHERE id = ?1 AND note_id = ?2",
            params![item_id, note_id],
        )?;
        if deleted > 0 {
            touch_note(&tx, note_id)?;
        }
        tx.commit()?;
        Ok(deleted > 0)
    }

    /// Move an item so it ends up at `to_index` in display order (clamped).
    pub fn move_note_item(&self, note_id: &str, item_id: &str, to_index: usize) -> DbResult<Option<NoteItem>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        if select_item(&tx, note_id, item_id)?.is_none() {
            return Ok(None);
        }

        let now = now_millis();
        place_with_retry(&tx, note_id, Some(item_id), to_index, |key| {
            tx.execute(
                "UPDATE note_items SET position = ?1, last_modified = ?2 WHERE id = ?3",
                params![key, now, item_id],
            )
            .map(|_| ())
        })?;
        touch_note(&tx, note_id)?;
        let item = select_item(&tx, note_id, item_id)?;

        tx.commit()?;
        Ok(item)
    }

    /// Respace all keys of a note evenly and return the items in order.
    pub fn normalize_note_items(&self, note_id: &str) -> DbResult<Vec<NoteItem>> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        renormalize(&tx, note_id)?;
        let items = select_items(&tx, note_id)?;
        tx.commit()?;
        Ok(items)
    }
}
