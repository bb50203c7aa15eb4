use actix_web::web;

pub mod actions;
pub mod health;
pub mod realtime;
pub mod rooms;

/// Configure application routes for the server and for in-process tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    // Room lifecycle: /api/rooms/**
    cfg.service(web::scope("/api/rooms").configure(rooms::configure_routes));

    // Websocket fallbacks: /api/pitches, /api/votes
    cfg.service(web::scope("/api").configure(actions::configure_routes));

    // Health check: /health
    cfg.service(web::scope("/health").configure(health::configure_routes));

    // Realtime upgrade: /ws
    cfg.service(web::scope("/ws").configure(realtime::configure_routes));
}
