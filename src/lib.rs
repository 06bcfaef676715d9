mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;

pub use domain::{entities, formats, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{auth, db, media, storage};

use auth::jwt::JwtService;
use repositories::sqlx_repo::{SqlxImageRepo, SqlxTierRepo, SqlxUserRepo};
use storage::FsImageStore;
use use_cases::auth::AuthHandler;
use use_cases::images::ImageService;

pub struct AppState {
    pub auth_handler: AppAuthHandler,
    pub image_service: AppImageService,
}

pub type AppAuthHandler = AuthHandler<SqlxUserRepo, JwtService>;
pub type AppImageService = ImageService<SqlxImageRepo, SqlxTierRepo, FsImageStore>;

impl AppState {
    pub fn new(config: &settings::AppConfig, pool: sqlx::PgPool) -> Self {
        let jwt_service = JwtService::new(config);
        let user_repo = SqlxUserRepo::new(pool.clone());
        let auth_handler = AuthHandler::new(user_repo, jwt_service);

        let image_service = ImageService::new(
            SqlxImageRepo::new(pool.clone()),
            SqlxTierRepo::new(pool),
            FsImageStore::new(&config.storage_root),
            config.expiry_bounds(),
        );

        AppState {
            auth_handler,
            image_service,
        }
    }
}
