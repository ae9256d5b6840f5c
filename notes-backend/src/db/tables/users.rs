//! User database operations

use rusqlite::{params, OptionalExtension, Row};

use crate::db::{now_millis, Database, DbResult};
use crate::models::User;

fn row_to_user(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl Database {
    pub fn create_user(&self, username: &str, email: &str) -> DbResult<User> {
        let conn = self.conn()?;
        let user = User {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            created_at: now_millis(),
        };
        conn.execute(
            "INSERT INTO users (id, username, email, created_at) VALUES (?1, ?2, ?3, ?4)",
            params![user.id, user.username, user.email, user.created_at],
        )?;
        Ok(user)
    }

    pub fn get_user(&self, user_id: &str) -> DbResult<Option<User>> {
        let conn = self.conn()?;
        let user = conn
            .query_row(
                "SELECT id, username, email, created_at FROM users WHERE id = ?1",
                [user_id],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }

    pub fn list_users(&self) -> DbResult<Vec<User>> {
        let conn = self.conn()?;
        let mut stmt =
            conn.prepare("SELECT id, username, email, created_at FROM users ORDER BY created_at, id")?;
        let users = stmt
            .query_map([], row_to_user)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(users)
    }

    /// Returns false when the user does not exist
    pub fn update_user(&self, user_id: &str, username: &str, email: &str) -> DbResult<bool> {
        let conn = self.conn()?;
        let updated = conn.execute(
            "UPDATE users SET username = ?1, email = ?2 WHERE id = ?3",
            params![username, email, user_id],
        )?;
        Ok(updated > 0)
    }

    /// Delete a user together with everything they own
    pub fn delete_user(&self, user_id: &str) -> DbResult<bool> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // Items and outgoing references go with their notes (ON DELETE CASCADE)
        let notes = tx.execute("DELETE FROM notes WHERE user_id = ?1", [user_id])?;
        let folders = tx.execute("DELETE FROM folders WHERE user_id = ?1", [user_id])?;
        let deleted = tx.execute("DELETE FROM users WHERE id = ?1", [user_id])?;
        tx.commit()?;

        if deleted > 0 {
            log::info!(
                "Deleted user {} ({} notes, {} folders)",
                user_id,
                notes,
                folders
            );
        }
        Ok(deleted > 0)
    }
}
