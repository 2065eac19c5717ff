use actix_web::web;
use crate::web::handlers;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error))
        .service(
            web::scope("/api")
                .route("/llama-chat", web::post().to(handlers::llama_chat))
        )
        .route("/", web::get().to(handlers::index))
        .route("/health", web::get().to(handlers::health_check));
}
