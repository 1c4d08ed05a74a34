use actix_web::web;

pub mod health;
pub mod internal;
pub mod matchmaking;
pub mod realtime;
pub mod rooms;

/// Configure application routes for the server and for tests.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/health").configure(health::configure_routes));
    cfg.service(
        web::scope("/api/rooms")
            .configure(rooms::configure_routes)
            .configure(realtime::configure_routes),
    );
    cfg.service(web::scope("/api/matchmaking").configure(matchmaking::configure_routes));
    cfg.service(web::scope("/api/internal").configure(internal::configure_routes));
}
