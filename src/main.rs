use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use std::sync::Arc;
use tryst_server::{
    blobs::MemoryBlobStore,
    config, error, logging, routes,
    security::jwt::TokenSigner,
    services::SessionService,
    state::AppState,
    store::Store,
    websocket::ConnectionRegistry,
};

#[tokio::main]
async fn main() -> Result<(), error::AppError> {
    logging::init_tracing();
    let cfg = Arc::new(config::Config::from_env()?);

    let store = Arc::new(Store::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let registry = ConnectionRegistry::new();

    let signer = TokenSigner::new(&cfg.jwt_secret);
    let sessions = Arc::new(SessionService::new(
        store.clone(),
        signer,
        chrono::Duration::minutes(cfg.token_ttl_minutes),
        cfg.max_sessions_per_user,
    ));

    let state = AppState {
        store,
        blobs,
        registry,
        sessions,
        config: cfg.clone(),
    };

    let bind_addr = format!("{}:{}", cfg.host, cfg.port);
    tracing::info!(%bind_addr, "starting tryst-server");

    let app_state = state.clone();
    let cors_origins = cfg.cors_origins.clone();
    HttpServer::new(move || {
        let cors = if cors_origins.is_empty() {
            Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        } else {
            cors_origins
                .iter()
                .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
                .allow_any_method()
                .allow_any_header()
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::Data::new(app_state.clone()))
            .service(routes::auth::register)
            .service(routes::auth::login)
            .service(routes::users::get_profile)
            .service(routes::users::get_all_users)
            .service(routes::users::logout)
            .service(routes::users::update_personal_info)
            .service(routes::users::reset_password)
            .service(routes::users::upload_profile_image)
            .service(routes::users::get_profile_image)
            .service(routes::matches::add_match)
            .service(routes::matches::get_matches)
            .service(routes::messages::send_message)
            .service(routes::messages::get_thread)
            .service(routes::messages::get_correspondents)
            .service(routes::media::get_chat_media)
            .service(routes::wsroute::chat_ws)
            .route("/health", web::get().to(|| async { "OK" }))
    })
    .bind(&bind_addr)
    .map_err(|e| error::AppError::StartServer(format!("bind: {e}")))?
    .run()
    .await
    .map_err(|e| error::AppError::StartServer(format!("run: {e}")))
}
