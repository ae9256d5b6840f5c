//! Note-to-note references and the expanded read view

use actix_web::{web, HttpResponse};
use notes_types::{
    CreateReferenceRequest, MessageResponse, NoteDto, ReferenceCreatedResponse, ReferencedByResponse,
    ReferencesResponse,
};

use super::require_note;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

async fn create_reference(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<CreateReferenceRequest>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    if body.referenced_note_id == note_id {
        return Err(ApiError::bad_request("A note cannot reference itself"));
    }

    let reference_id = state
        .db
        .create_reference(&note_id, &body.referenced_note_id, &user_id, body.position)?
        .ok_or_else(|| ApiError::bad_request("Parent or referenced note not found"))?;

    log::info!(
        "[REFERENCES] Note {} now references {} ({})",
        note_id,
        body.referenced_note_id,
        reference_id
    );
    Ok(HttpResponse::Created().json(ReferenceCreatedResponse { reference_id }))
}

async fn get_expanded_note(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    let note = state
        .db
        .get_note_with_expanded_references(&note_id, &user_id)?
        .ok_or_else(|| ApiError::not_found("Note not found"))?;
    Ok(HttpResponse::Ok().json(NoteDto::from(note)))
}

async fn list_references(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    let referenced_note_ids = state.db.list_referenced_note_ids(&note_id)?;
    Ok(HttpResponse::Ok().json(ReferencesResponse { referenced_note_ids }))
}

async fn list_referenced_by(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    let referenced_by_note_ids = state.db.list_referencing_note_ids(&note_id)?;
    Ok(HttpResponse::Ok().json(ReferencedByResponse { referenced_by_note_ids }))
}

async fn delete_all_references(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    let deleted = state.db.delete_references_from_note(&note_id)?;
    Ok(HttpResponse::Ok().json(MessageResponse::new(format!("Deleted {} references", deleted))))
}

async fn delete_reference(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id, reference_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    if !state.db.delete_reference(&note_id, &reference_id)? {
        return Err(ApiError::not_found("Reference not found"));
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new("Reference deleted successfully")))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/reference").route(web::post().to(create_reference)),
    );
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/expanded").route(web::get().to(get_expanded_note)),
    );
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/references")
            .route(web::get().to(list_references))
            .route(web::delete().to(delete_all_references)),
    );
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/references/{reference_id}")
            .route(web::delete().to(delete_reference)),
    );
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/referenced-by").route(web::get().to(list_referenced_by)),
    );
}
