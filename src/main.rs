use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware::NormalizePath, web};
use recipe_api::application::auth_service::AuthService;
use recipe_api::application::recipe_service::RecipeService;
use recipe_api::data::image_store::FsImageStore;
use recipe_api::data::memory::InMemoryCatalog;
use recipe_api::data::user_repository::InMemoryUserRepository;
use recipe_api::infrastructure::config::AppConfig;
use recipe_api::infrastructure::logging::init_logging;
use recipe_api::presentation::handlers::AppState;
use recipe_api::presentation::middleware::{
    JwtAuthMiddleware, RequestIdMiddleware, TimingMiddleware,
};
use recipe_api::presentation::routes;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_logging();
    info!("Logging initialized");

    let config = AppConfig::from_env();
    info!(bind_addr = %config.bind_addr, media_root = %config.media_root, "Configuration loaded");

    let catalog = Arc::new(InMemoryCatalog::new());
    let images = Arc::new(FsImageStore::new(config.media_root.clone()));
    let users = Arc::new(InMemoryUserRepository::new());

    let recipes = RecipeService::new(catalog, images);
    let auth = Arc::new(AuthService::new(users, config.jwt_secret.clone()));
    let state = web::Data::new(AppState { recipes, auth });
    info!("Application state initialized");

    let jwt_secret = config.jwt_secret.clone();
    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(JwtAuthMiddleware::new(jwt_secret.clone()))
            .wrap(TimingMiddleware)
            .wrap(RequestIdMiddleware)
            .wrap(Cors::permissive())
            .wrap(NormalizePath::trim())
            .configure(routes::configure)
    });

    info!(address = %config.bind_addr, "Starting HTTP server");
    server.bind(config.bind_addr)?.run().await
}
