use actix_multipart::form::MultipartForm;
use actix_web::{get, http::StatusCode, post, web, HttpResponse, Responder};

use crate::entities::image::{ImageUploadForm, SizeQuery};
use crate::entities::user::User;
use crate::errors::AppError;
use crate::handlers::json_error::json_error;
use crate::repositories::user::UserRepository;
use crate::use_cases::extractors::{AuthClaims, MaybeClaims};
use crate::AppState;

/// Loads the user row behind the authenticated claims; the tier id on it
/// drives both enumeration and upload permissions.
async fn current_user(state: &web::Data<AppState>, claims: &AuthClaims) -> Result<User, HttpResponse> {
    let user_id = claims
        .user_id()
        .map_err(|_| json_error(StatusCode::BAD_REQUEST, "Bad request", "Invalid user ID in claims"))?;

    match state.auth_handler.user_repo.get_user_by_id(&user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(json_error(StatusCode::UNAUTHORIZED, "Unauthorized", "Unknown user")),
        Err(e) => {
            tracing::error!("Failed to load user {}: {}", user_id, e);
            Err(e.to_http_response())
        }
    }
}

#[get("/images")]
pub async fn list_images(
    state: web::Data<AppState>,
    claims: AuthClaims,
) -> impl Responder {
    let user = match current_user(&state, &claims).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    match state.image_service.links_for(&user).await {
        Ok(links) => HttpResponse::Ok().json(links),
        Err(e) => e.to_http_response(),
    }
}

#[post("/images")]
pub async fn upload_image(
    state: web::Data<AppState>,
    claims: AuthClaims,
    MultipartForm(form): MultipartForm<ImageUploadForm>,
) -> impl Responder {
    let user = match current_user(&state, &claims).await {
        Ok(user) => user,
        Err(response) => return response,
    };

    let bytes = match tokio::fs::read(form.img.file.path()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::error!("Failed to read uploaded temp file: {}", e);
            return AppError::InternalError(e.to_string()).to_http_response();
        }
    };

    let content_type = form.img.content_type.as_ref().map(|mime| mime.to_string());
    let exp_after = form.exp_after.map(|text| text.0);

    let record = match state
        .image_service
        .upload(bytes, content_type.as_deref(), exp_after, &user)
        .await
    {
        Ok(record) => record,
        Err(e) => return e.to_http_response(),
    };

    match state
        .image_service
        .links_for_image(&record, &user.account_tier_id)
        .await
    {
        Ok(links) => HttpResponse::Created().json(links),
        Err(e) => e.to_http_response(),
    }
}

#[get("/images/{filename}")]
pub async fn get_image(
    state: web::Data<AppState>,
    path: web::Path<String>,
    query: web::Query<SizeQuery>,
    claims: MaybeClaims,
) -> impl Responder {
    let filename = path.into_inner();

    match state
        .image_service
        .resolve(&filename, query.size.as_deref(), claims.user_id())
        .await
    {
        Ok(rendered) => HttpResponse::Ok()
            .content_type(rendered.kind.mime())
            .body(rendered.bytes),
        Err(e) => e.to_http_response(),
    }
}
