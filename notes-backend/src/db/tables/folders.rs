//! Folder database operations

use rusqlite::{params, OptionalExtension, Row};

use crate::db::{now_millis, Database, DbResult};
use crate::models::Folder;

const FOLDER_SELECT: &str = "SELECT f.id, f.user_id, f.name,
        (SELECT COUNT(*) FROM notes n WHERE n.folder_id = f.id) AS note_count,
        f.last_modified
     FROM folders f";

fn row_to_folder(row: &Row) -> rusqlite::Result<Folder> {
    Ok(Folder {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        note_count: row.get(3)?,
        last_modified: row.get(4)?,
    })
}

impl Database {
    pub fn create_folder(&self, user_id: &str, name: &str) -> DbResult<Folder> {
        let conn = self.conn()?;
        let folder = Folder {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            note_count: 0,
            last_modified: now_millis(),
        };
        conn.execute(
            "INSERT INTO folders (id, user_id, name, last_modified) VALUES (?1, ?2, ?3, ?4)",
            params![folder.id, folder.user_id, folder.name, folder.last_modified],
        )?;
        Ok(folder)
    }

    pub fn get_folder(&self, folder_id: &str, user_id: &str) -> DbResult<Option<Folder>> {
        let conn = self.conn()?;
        let folder = conn
            .query_row(
                &format!("{} WHERE f.id = ?1 AND f.user_id = ?2", FOLDER_SELECT),
                params![folder_id, user_id],
                row_to_folder,
            )
            .optional()?;
        Ok(folder)
    }

    /// Folders of a user, most recently modified first
    pub fn list_folders(&self, user_id: &str) -> DbResult<Vec<Folder>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{} WHERE f.user_id = ?1 ORDER BY f.last_modified DESC, f.id",
            FOLDER_SELECT
        ))?;
        let folders = stmt
            .query_map([user_id], row_to_folder)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(folders)
    }

    /// Rename a folder. Returns false when it does not exist for this user.
    pub fn update_folder(&self, folder_id: &str, user_id: &str, name: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE folders SET name = ?1, last_modified = ?2 WHERE id = ?3 AND user_id = ?4",
            params![name, now_millis(), folder_id, user_id],
        )?;
        Ok(updated > 0)
    }

    /// Delete a folder. Its notes stay, with no folder.
    pub fn delete_folder(&self, folder_id: &str, user_id: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let deleted = conn.execute(
            "DELETE FROM folders WHERE id = ?1 AND user_id = ?2",
            params![folder_id, user_id],
        )?;
        if deleted > 0 {
            log::info!("[FOLDERS] Deleted folder {} of user {}", folder_id, user_id);
        }
        Ok(deleted > 0)
    }
}
