use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Compress, App, HttpServer};
use tracing::{info, Level};
use tracing_actix_web::TracingLogger;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi; // bring trait into scope for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use reelhub::openapi::ApiDoc;
use reelhub::storage::build_video_store;
use reelhub::{config, AppState, SecurityHeaders};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Environment variables must be set externally (shell, systemd, Docker).
    // Load .env automatically only in debug builds.
    if cfg!(debug_assertions) {
        let _ = dotenv::dotenv();
    }

    validate_env_vars();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .init();

    info!("Bootstrapping ReelHub server");
    info!(
        "Frontend URL: {}",
        std::env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string())
    );

    #[cfg(all(feature = "inmem-store", not(feature = "mongo-store")))]
    let repo: Arc<dyn reelhub::repo::Repo> = {
        info!("Using in-memory repository backend");
        Arc::new(reelhub::repo::inmem::InMemRepo::new())
    };

    #[cfg(feature = "mongo-store")]
    let repo: Arc<dyn reelhub::repo::Repo> = {
        let uri = std::env::var("MONGODB_URI")
            .expect("MONGODB_URI must be set for mongo-store");
        let db_name =
            std::env::var("MONGODB_DB").unwrap_or_else(|_| "reelhub".to_string());
        let mongo = reelhub::repo::mongo::MongoRepo::connect(&uri, &db_name)
            .await
            .expect("Failed to connect to MongoDB");
        info!("Using MongoDB repository backend (db: {db_name})");
        Arc::new(mongo)
    };

    let openapi = ApiDoc::openapi();
    let video_store = build_video_store();
    info!("OpenAPI spec generated");

    let server = HttpServer::new(move || {
        let cors = {
            let mut c = Cors::default()
                // local dev frontends (Vite and CRA defaults)
                .allowed_origin("http://localhost:5173")
                .allowed_origin("http://127.0.0.1:5173")
                .allowed_origin("http://localhost:3000")
                .allowed_origin("http://127.0.0.1:3000")
                .allow_any_header()
                .allowed_methods(["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
                .supports_credentials()
                .max_age(3600);
            if let Ok(front) = std::env::var("FRONTEND_URL") {
                c = c.allowed_origin(&front);
            }
            c
        };

        App::new()
            .wrap(TracingLogger::default())
            .wrap(Compress::default())
            .wrap(SecurityHeaders::from_env())
            .wrap(cors)
            .configure(config)
            .service(SwaggerUi::new("/docs").url("/docs/openapi.json", openapi.clone()))
            .app_data(actix_web::web::Data::new(AppState {
                repo: repo.clone(),
                video_store: video_store.clone(),
            }))
    })
    .bind(("0.0.0.0", 8080))?;

    info!("Listening on http://0.0.0.0:8080");

    server.run().await
}

/// Validate that required environment variables are set
fn validate_env_vars() {
    use std::env;

    let required = vec!["JWT_SECRET"];

    let mut missing = Vec::new();
    for var in required {
        if env::var(var).is_err() {
            missing.push(var);
        }
    }

    if !missing.is_empty() {
        eprintln!("Missing required environment variables: {missing:?}");
        eprintln!("Please copy .env.example to .env and configure it");
        std::process::exit(1);
    }

    if let Ok(secret) = env::var("JWT_SECRET") {
        if secret.len() < 32 {
            eprintln!("JWT_SECRET must be at least 32 characters long for security");
            std::process::exit(1);
        }
    }

    #[cfg(feature = "mongo-store")]
    if env::var("MONGODB_URI").is_err() {
        eprintln!("Warning: MONGODB_URI not set; startup will fail before binding");
    }
}
