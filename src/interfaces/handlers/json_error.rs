use actix_web::{http::StatusCode, HttpResponse};

pub fn json_error(status: StatusCode, error: &str, details: &str) -> HttpResponse {
    HttpResponse::build(status).json(serde_json::json!({
        "error": error,
        "details": details
    }))
}

/// Default service for unmatched routes.
pub async fn not_found() -> HttpResponse {
    json_error(StatusCode::NOT_FOUND, "Not found", "The requested resource does not exist")
}
