pub mod sqlite;
pub mod tables;

pub use sqlite::{now_millis, Database, DbConn, DbError, DbResult};
