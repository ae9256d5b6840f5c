//! Folders group a user's notes

use actix_web::{web, HttpResponse};
use notes_types::{CreateFolderRequest, FolderDto, MessageResponse, NoteDto, UpdateFolderRequest};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn check_name(name: &str) -> ApiResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Folder name must not be empty"));
    }
    Ok(name)
}

async fn list_folders(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let folders: Vec<FolderDto> = state.db.list_folders(&path)?.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(folders))
}

async fn create_folder(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<CreateFolderRequest>,
) -> ApiResult<HttpResponse> {
    let name = check_name(&body.name)?;
    let folder = state.db.create_folder(&path, name)?;
    Ok(HttpResponse::Created().json(FolderDto::from(folder)))
}

async fn get_folder(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, folder_id) = path.into_inner();
    let folder = state
        .db
        .get_folder(&folder_id, &user_id)?
        .ok_or_else(|| ApiError::not_found("Folder not found"))?;
    Ok(HttpResponse::Ok().json(FolderDto::from(folder)))
}

async fn update_folder(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<UpdateFolderRequest>,
) -> ApiResult<HttpResponse> {
    let (user_id, folder_id) = path.into_inner();
    let name = check_name(&body.name)?;
    if !state.db.update_folder(&folder_id, &user_id, name)? {
        return Err(ApiError::not_found("Folder not found"));
    }
    let folder = state
        .db
        .get_folder(&folder_id, &user_id)?
        .ok_or_else(|| ApiError::not_found("Folder not found"))?;
    Ok(HttpResponse::Ok().json(FolderDto::from(folder)))
}

async fn delete_folder(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, folder_id) = path.into_inner();
    if !state.db.delete_folder(&folder_id, &user_id)? {
        return Err(ApiError::not_found("Folder not found"));
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new("Folder deleted successfully")))
}

async fn list_folder_notes(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, folder_id) = path.into_inner();
    if state.db.get_folder(&folder_id, &user_id)?.is_none() {
        return Err(ApiError::not_found("Folder not found"));
    }
    let notes: Vec<NoteDto> = state
        .db
        .list_notes_in_folder(&user_id, &folder_id)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(HttpResponse::Ok().json(notes))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users/{user_id}/folders")
            .route(web::get().to(list_folders))
            .route(web::post().to(create_folder)),
    );
    cfg.service(
        web::resource("/users/{user_id}/folders/{folder_id}")
            .route(web::get().to(get_folder))
            .route(web::put().to(update_folder))
            .route(web::delete().to(delete_folder)),
    );
    cfg.service(
        web::resource("/users/{user_id}/folders/{folder_id}/notes").route(web::get().to(list_folder_notes)),
    );
}
