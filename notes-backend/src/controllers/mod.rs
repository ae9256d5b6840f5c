pub mod folders;
pub mod health;
pub mod note_items;
pub mod note_references;
pub mod notes;
pub mod users;

use actix_web::{error::InternalError, web, HttpResponse};

use crate::error::ApiError;
use crate::models::Note;
use crate::AppState;

/// JSON extractor settings shared by every route: any body that fails to
/// deserialize becomes a plain-text 400.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::debug!("[API] Rejected request body: {}", err);
        InternalError::from_response(
            err,
            HttpResponse::BadRequest()
                .content_type("text/plain; charset=utf-8")
                .body("Invalid request body"),
        )
        .into()
    })
}

/// Register every route of the service
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config());
    cfg.configure(health::config_routes)
        .configure(users::config)
        .configure(notes::config)
        .configure(note_references::config)
        .configure(note_items::config)
        .configure(folders::config);
}

/// The note, or 404 when it does not exist for this user
pub(crate) fn require_note(state: &AppState, note_id: &str, user_id: &str) -> Result<Note, ApiError> {
    state
        .db
        .get_note(note_id, user_id)?
        .ok_or_else(|| ApiError::not_found("Note not found"))
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;
    use std::time::Instant;

    use actix_web::web;

    use crate::config::Config;
    use crate::db::Database;
    use crate::AppState;

    /// App state over a fresh in-memory database
    pub fn state() -> web::Data<AppState> {
        let db = Database::open_in_memory().expect("in-memory database");
        web::Data::new(AppState {
            db: Arc::new(db),
            config: Config::default(),
            started_at: Instant::now(),
        })
    }
}
