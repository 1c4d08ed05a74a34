use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use backend::routes;
use backend::state::security_config::SecurityConfig;
use backend::telemetry;
use backend::AppState;

fn cors_middleware() -> Cors {
    match std::env::var("FRONTEND_ORIGIN") {
        Ok(origin) => Cors::default()
            .allowed_origin(&origin)
            .allow_any_method()
            .allow_any_header()
            .supports_credentials()
            .max_age(3600),
        Err(_) => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    telemetry::init_tracing();

    // Environment variables come from the runtime environment; no
    // dotenv loading here.
    let host = std::env::var("BACKEND_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("BACKEND_PORT")
        .unwrap_or_else(|_| "3001".to_string())
        .parse::<u16>()
        .unwrap_or_else(|_| {
            eprintln!("BACKEND_PORT must be a valid port number");
            std::process::exit(1);
        });

    let jwt = match std::env::var("BACKEND_JWT_SECRET") {
        Ok(jwt) => jwt,
        Err(_) => {
            eprintln!("BACKEND_JWT_SECRET must be set");
            std::process::exit(1);
        }
    };
    let security = SecurityConfig::new(jwt.as_bytes());

    let database_url = match std::env::var("DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("DATABASE_URL must be set");
            std::process::exit(1);
        }
    };
    let db = match sea_orm::Database::connect(&database_url).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Failed to connect to the database: {e}");
            std::process::exit(1);
        }
    };

    let data = web::Data::new(AppState::new(db, security));
    tracing::info!(%host, port, "starting server");

    HttpServer::new(move || {
        App::new()
            .wrap(cors_middleware())
            .app_data(data.clone())
            .configure(routes::configure)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
