use actix_web::{error, http::StatusCode, web, HttpRequest, HttpResponse, Responder};
use log::{error, info};
use serde_json::json;
use tera::Context;
use uuid::Uuid;

use crate::errors::ChatError;
use crate::web::models::{ChatRequest, ChatResponse, ErrorResponse};
use crate::AppState;

const DEFAULT_SUGGESTIONS: [&str; 3] = [
    "How do I access the employee handbook?",
    "What training programs are available?",
    "Who do I contact for IT support?",
];

// Index page handler
pub async fn index(data: web::Data<AppState>) -> impl Responder {
    let mut context = Context::new();
    context.insert("suggestions", &DEFAULT_SUGGESTIONS);
    match data.tera.render("index.html", &context) {
        Ok(html) => HttpResponse::Ok().content_type("text/html").body(html),
        Err(e) => {
            error!("Template error: {}", e);
            HttpResponse::InternalServerError().body("Template error")
        }
    }
}

// Health check endpoint
pub async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

// Policy question endpoint
pub async fn llama_chat(
    data: web::Data<AppState>,
    req: web::Json<ChatRequest>,
) -> impl Responder {
    let request_id = Uuid::new_v4();
    let req = req.into_inner();

    info!(
        "Chat request {} (thread: {})",
        request_id,
        req.thread_id.as_deref().unwrap_or("none")
    );

    match data.chat.handle(req.prompt.as_deref()).await {
        Ok(response) => {
            info!("Chat request {} answered ({} characters)", request_id, response.len());
            HttpResponse::Ok().json(ChatResponse { response })
        }
        Err(e) => {
            error!("Chat request {} failed: {}", request_id, e);
            error_response(&e)
        }
    }
}

pub fn status_for(err: &ChatError) -> StatusCode {
    match err {
        ChatError::MissingPrompt => StatusCode::BAD_REQUEST,
        ChatError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ChatError::Initialization(_)
        | ChatError::ConnectionInterrupted(_)
        | ChatError::Upstream(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn error_response(err: &ChatError) -> HttpResponse {
    let body = match err {
        ChatError::MissingPrompt => ErrorResponse::new("Prompt is required"),
        ChatError::Initialization(_) => ErrorResponse::with_details(
            "Failed to initialize Llama service. Please try again later.",
            "Service initialization error",
        ),
        ChatError::Timeout => ErrorResponse::with_details(
            "Request timed out. Please try again.",
            "The request took too long to complete.",
        ),
        ChatError::ConnectionInterrupted(_) => ErrorResponse::with_details(
            "Connection to Llama service was interrupted. Please try again.",
            "The connection was closed unexpectedly. This might be due to network issues.",
        ),
        ChatError::Upstream(detail) => ErrorResponse::with_details(
            "Failed to get response from Llama service. Please try again later.",
            detail.clone(),
        ),
    };
    HttpResponse::build(status_for(err)).json(body)
}

/// Turns body parse failures into the JSON error shape.
pub fn json_error(err: error::JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    let body = ErrorResponse::with_details("Invalid request body", err.to_string());
    error::InternalError::from_response(err, HttpResponse::BadRequest().json(body)).into()
}

pub async fn not_found() -> impl Responder {
    HttpResponse::NotFound().json(ErrorResponse::new("Not found"))
}
