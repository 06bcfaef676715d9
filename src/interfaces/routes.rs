use actix_web::web;

use crate::handlers::auth::{login, refresh_token, signup};
use crate::handlers::home::home;
use crate::handlers::images::{get_image, list_images, upload_image};
use crate::handlers::json_error::not_found;
use crate::handlers::system::health_check;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api/v1")
            .service(signup)
            .service(login)
            .service(refresh_token)
            .service(list_images)
            .service(upload_image)
            .service(get_image)
            .service(
                web::scope("/admin")
                    .service(health_check)
            )
    );

    cfg.default_service(web::route().to(not_found));
}
