//! Note items (ordered lines with sparse position keys)

use actix_web::{web, HttpResponse};
use notes_types::{
    CreateNoteItemRequest, MessageResponse, MoveNoteItemRequest, NoteItemDto, UpdateNoteItemRequest,
};

use super::require_note;
use crate::error::{ApiError, ApiResult};
use crate::AppState;

fn check_indent(indent: i64) -> ApiResult<()> {
    if indent < 0 {
        return Err(ApiError::bad_request("Indent must not be negative"));
    }
    Ok(())
}

fn to_dtos(items: Vec<crate::models::NoteItem>) -> Vec<NoteItemDto> {
    items.into_iter().map(Into::into).collect()
}

async fn list_items(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    Ok(HttpResponse::Ok().json(to_dtos(state.db.list_note_items(&note_id)?)))
}

async fn create_item(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
    body: web::Json<CreateNoteItemRequest>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    check_indent(body.indent)?;

    let item = state
        .db
        .create_note_item(&note_id, &body.text, body.checked, body.indent, body.index)?;
    Ok(HttpResponse::Created().json(NoteItemDto::from(item)))
}

async fn update_item(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    body: web::Json<UpdateNoteItemRequest>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id, item_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    if let Some(indent) = body.indent {
        check_indent(indent)?;
    }

    let item = state
        .db
        .update_note_item(&note_id, &item_id, body.text.as_deref(), body.checked, body.indent)?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    Ok(HttpResponse::Ok().json(NoteItemDto::from(item)))
}

async fn delete_item(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id, item_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    if !state.db.delete_note_item(&note_id, &item_id)? {
        return Err(ApiError::not_found("Item not found"));
    }
    Ok(HttpResponse::Ok().json(MessageResponse::new("Item deleted successfully")))
}

async fn move_item(
    state: web::Data<AppState>,
    path: web::Path<(String, String, String)>,
    body: web::Json<MoveNoteItemRequest>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id, item_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;

    let item = state
        .db
        .move_note_item(&note_id, &item_id, body.to_index)?
        .ok_or_else(|| ApiError::not_found("Item not found"))?;
    Ok(HttpResponse::Ok().json(NoteItemDto::from(item)))
}

async fn normalize_items(
    state: web::Data<AppState>,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    let (user_id, note_id) = path.into_inner();
    require_note(&state, &note_id, &user_id)?;
    Ok(HttpResponse::Ok().json(to_dtos(state.db.normalize_note_items(&note_id)?)))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/items")
            .route(web::get().to(list_items))
            .route(web::post().to(create_item)),
    );
    // Registered before the item resource so "normalize" is not taken for an item id
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/items/normalize").route(web::post().to(normalize_items)),
    );
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/items/{item_id}")
            .route(web::put().to(update_item))
            .route(web::delete().to(delete_item)),
    );
    cfg.service(
        web::resource("/users/{user_id}/notes/{note_id}/items/{item_id}/move").route(web::post().to(move_item)),
    );
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test, App};
    use notes_types::NoteItemDto;

    use crate::controllers::{self, test_support};
    use crate::notes::positions::POSITION_GAP;

    #[actix_web::test]
    async fn test_items_ordering_over_http() {
        let state = test_support::state();
        let note = state.db.create_note("u1", "Packing", r#"{"lines":[]}"#, None).unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(controllers::configure)).await;
        let base = format!("/users/u1/notes/{}/items", note.id);

        let mut created = Vec::new();
        for (text, index) in [("socks", None), ("shirt", None), ("passport", Some(0))] {
            let req = test::TestRequest::post()
                .uri(&base)
                .set_json(serde_json::json!({"text": text, "index": index}))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
            let item: NoteItemDto = test::read_body_json(resp).await;
            created.push(item);
        }

        let req = test::TestRequest::post()
            .uri(&format!("{}/{}/move", base, created[0].id))
            .set_json(serde_json::json!({"toIndex": 2}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

        let req = test::TestRequest::get().uri(&base).to_request();
        let items: Vec<NoteItemDto> = test::call_and_read_body_json(&app, req).await;
        let texts: Vec<&str> = items.iter().map(|i| i.text.as_str()).collect();
        assert_eq!(texts, vec!["passport", "shirt", "socks"]);

        let req = test::TestRequest::post().uri(&format!("{}/normalize", base)).to_request();
        let items: Vec<NoteItemDto> = test::call_and_read_body_json(&app, req).await;
        let keys: Vec<i64> = items.iter().map(|i| i.position).collect();
        assert_eq!(keys, vec![POSITION_GAP, 2 * POSITION_GAP, 3 * POSITION_GAP]);
    }

    #[actix_web::test]
    async fn test_item_update_delete_and_errors() {
        let state = test_support::state();
        let note = state.db.create_note("u1", "Todo", r#"{"lines":[]}"#, None).unwrap();
        let item = state.db.create_note_item(&note.id, "call mum", false, 0, None).unwrap();
        let app = test::init_service(App::new().app_data(state.clone()).configure(controllers::configure)).await;
        let item_uri = format!("/users/u1/notes/{}/items/{}", note.id, item.id);

        let req = test::TestRequest::put()
            .uri(&item_uri)
            .set_json(serde_json::json!({"checked": true}))
            .to_request();
        let updated: NoteItemDto = test::call_and_read_body_json(&app, req).await;
        assert!(updated.checked);
        assert_eq!(updated.text, "call mum");

        let req = test::TestRequest::put()
            .uri(&item_uri)
            .set_json(serde_json::json!({"indent": -1}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        // Items of someone else's note are invisible
        let req = test::TestRequest::get()
            .uri(&format!("/users/u2/notes/{}/items", note.id))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::delete().uri(&item_uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
        let req = test::TestRequest::delete().uri(&item_uri).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
