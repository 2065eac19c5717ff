use actix_web::{web, App, HttpServer, web::Data};
use actix_files as fs;
use dotenv::dotenv;
use log::{info, error};
use tera::Tera;

use weavehelp::chat::ChatService;
use weavehelp::config::AppConfig;
use weavehelp::retrieval::{LlamaCloudIndex, RetrieverManager};
use weavehelp::web::{handlers, routes};
use weavehelp::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize environment
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting WeaveHelp");

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // The retriever connects lazily on the first chat request
    let top_k = config.llama_cloud.similarity_top_k;
    let retrievers = RetrieverManager::new(LlamaCloudIndex::new(config.llama_cloud));

    // Initialize template engine
    let mut tera = match Tera::new("templates/**/*") {
        Ok(t) => t,
        Err(e) => {
            error!("Template parsing error: {}", e);
            std::process::exit(1);
        }
    };
    tera.autoescape_on(vec![".html"]);

    let app_state = Data::new(AppState {
        tera,
        chat: ChatService::new(retrievers, top_k),
    });

    info!("Listening on {}:{}", config.host, config.port);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(routes::configure)
            .service(fs::Files::new("/static", "./static"))
            .default_service(web::to(handlers::not_found))
    })
    .bind((config.host.as_str(), config.port))?
    .run()
    .await
}
