//! Note CRUD and copy, scoped by owning user.
//!
//! A note owned by another user answers exactly like a missing one.

use actix_web::{web, HttpResponse};
use notes_types::{CopyNoteRequest, CreateNoteRequest, MessageResponse, NoteDto, UpdateNoteRequest};

use super::require_note;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Reject a folder id that does not belong to the user
fn check_folder(state: &AppState, user_id: &str, folder_id: Option<&str>) -> ApiResult<()> {
    if let Some(folder_id) = folder_id {
        if state.db.get_folder(folder_id, user_id)?.is_none() {
            return Err(ApiError::bad_request("Folder not found"));
        }
    }
    Ok(())
}

async fn list_notes(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let notes: Vec<NoteDto> = state.db.list_notes(&path)?.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(notes))
}

async fn create_note(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateNoteRequest>,
) -> ApiResult<HttpResponse> {
    let user_id = path.into_inner();
    let folder_id = body.folder_id.as_deref();
    check_folder(&state, &user_id, folder_id)?;

    let note = state.db.create_note(&user_id, &body.title, &body.content, folder_id)?;
    Ok(HttpResponse::Created().json(NoteDto::from(note)))
}

async fn get_note(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    let note = require_note(&state, &note_id, &user_id)?;
    Ok(HttpResponse::Ok().json(NoteDto::from(note)))
}

async fn update_note(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateNoteRequest>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    let folder_id = body.folder_id.as_deref();
    check_folder(&state, &user_id, folder_id)?;

    if !state
        .db
        .update_note(&note_id, &user_id, &body.title, &body.content, folder_id)?
    {
        return Err(ApiError::not_found("Note not found"));
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new("Note updated successfully")))
}

async fn delete_note(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    if !state.db.delete_note(&note_id, &user_id)? {
        return Err(ApiError::not_found("Note not found"));
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new("Note deleted successfully")))
}

/// The body is optional; an empty body copies with the default title.
async fn copy_note(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Bytes,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();

    let request: CopyNoteRequest = if body.iter().all(u8::is_ascii_whitespace) {
        CopyNoteRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| ApiError::bad_request("Invalid request body"))?
    };

    let copy = state
        .db
        .copy_note(&note_id, &user_id, request.new_title.as_deref())?
        .ok_or_else(|| ApiError::not_found("Note not found"))?;
    Ok(HttpResponse::Created().json(NoteDto::from(copy)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users/{user_id}/notes")
            .route(web::get().to(list_notes))
            .route(web::post().to(create_note)),
    );
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}")
            .route(web::get().to(get_note))
            .route(web::put().to(update_note))
            .route(web::delete().to(delete_note)),
    );
    cfg.service(web::resource("/users/{user_id}/notes/{note_id}/copy").route(web::post().to(copy_note)));
}
