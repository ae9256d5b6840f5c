//! User accounts

use actix_web::{web, HttpResponse};
use notes_types::{CreateUserRequest, MessageResponse, UpdateUserRequest, UserDto};

use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn validate(username: &str, email: &str) -> ApiResult<()> {
    if username.trim().is_empty() {
        return Err(ApiError::bad_request("Username must not be empty"));
    }
    if email.trim().is_empty() {
        return Err(ApiError::bad_request("Email must not be empty"));
    }
    Ok(())
}

async fn list_users(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let users: Vec<UserDto> = state.db.list_users()?.into_iter().map(Into::into).collect();
    Ok(HttpResponse::Ok().json(users))
}

async fn create_user(
    state: web::Data<AppState>,
    body: web::Json<CreateUserRequest>,
) -> ApiResult<HttpResponse> {
    validate(&body.username, &body.email)?;
    let user = state.db.create_user(body.username.trim(), body.email.trim())?;
    log::info!("[USERS] Created user {}", user.id);
    Ok(HttpResponse::Created().json(UserDto::from(user)))
}

async fn get_user(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let user = state
        .db
        .get_user(&path)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

async fn update_user(
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<UpdateUserRequest>,
) -> ApiResult<HttpResponse> {
    validate(&body.username, &body.email)?;
    if !state.db.update_user(&path, body.username.trim(), body.email.trim())? {
        return Err(ApiError::not_found("User not found"));
    }
    let user = state
        .db
        .get_user(&path)?
        .ok_or_else(|| ApiError::not_found("User not found"))?;
    Ok(HttpResponse::Ok().json(UserDto::from(user)))
}

async fn delete_user(state: web::Data<AppState>, path: web::Path<String>) -> ApiResult<HttpResponse> {
    if !state.db.delete_user(&path)? {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new("User deleted successfully")))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users")
            .route(web::get().to(list_users))
            .route(web::post().to(create_user)),
    );
    cfg.service(
        web::resource("/users/{user_id}")
            .route(web::get().to(get_user))
            .route(web::put().to(update_user))
            .route(web::delete().to(delete_user)),
    );
}
