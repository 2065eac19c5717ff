pub mod chat;
pub mod config;
pub mod errors;
pub mod retrieval;
pub mod web;

use tera::Tera;

use chat::ChatService;

// App state structure
pub struct AppState {
    pub tera: Tera,
    pub chat: ChatService,
}
