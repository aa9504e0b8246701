use std::net::SocketAddr;
use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use generly::config::{Config, ResetPolicy, UrlStrategy};
use generly::db;
use generly::middleware::rate_limit;
use generly::routes::{self, ApiDoc};
use generly::services::generation::GenerationService;
use generly::services::quota::QuotaLedger;
use generly::services::reputation::ReputationService;
use generly::services::storage::ObjectStorageService;

#[tokio::main]
async fn main() {
    // Carica variabili da .env
    dotenvy::dotenv().ok();

    // Inizializza logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "generly=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Carica configurazione
    let config = Config::from_env();

    // Inizializza database SQLite
    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:generly.db?mode=rwc".to_string());

    tracing::info!("Connessione al database: {}", database_url);

    let db_pool = match db::init_db(&database_url).await {
        Ok(pool) => {
            tracing::info!("Database SQLite inizializzato");
            pool
        }
        Err(e) => {
            tracing::error!("Errore inizializzazione database: {}", e);
            std::process::exit(1);
        }
    };

    // Servizi esterni: reputazione IP, storage, backend di generazione
    let reputation = Arc::new(ReputationService::new(
        config.reputation_url.clone(),
        config.reputation_token.clone(),
    ));

    let storage = ObjectStorageService::new(
        config.storage_url.clone(),
        config.storage_bucket.clone(),
        config.storage_key.clone(),
        config.storage_public_url.clone(),
    );

    let generation = Arc::new(GenerationService::new(
        config.backend_url.clone(),
        config.session_cookie.clone(),
        config.model_type.clone(),
        config.url_strategy,
        storage,
    ));

    // Registro quote con la politica di reset configurata
    let ledger = QuotaLedger::new(db_pool.clone(), config.reset_policy, config.free_daily_limit);

    // Crea rate limiter di processo
    let rate_limiter = rate_limit::create_rate_limiter(config.rate_limit_per_minute);

    // CORS layer
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // API routes con middleware
    let api_routes = routes::create_router(db_pool, ledger, reputation, generation).layer(
        middleware::from_fn(move |req, next| {
            let limiter = rate_limiter.clone();
            async move { rate_limit::rate_limit_middleware(limiter, req, next).await }
        }),
    );

    // Costruisci router completo con Swagger
    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Avvia server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("Indirizzo non valido");

    tracing::info!("========================================");
    tracing::info!("  Generly API v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("========================================");
    tracing::info!("Server: http://{}", addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui/", addr);
    tracing::info!("----------------------------------------");
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /           - Liveness");
    tracing::info!("  GET  /prompt     - Genera immagine (prompt, ip, id)");
    tracing::info!("  GET  /add        - Upgrade a PAID (id)");
    tracing::info!("  GET  /check/:id  - Tier dell'identity");
    tracing::info!("  GET  /info/:id   - Record completo");
    tracing::info!("  GET  /ban/:id    - Banna l'identity");
    tracing::info!("----------------------------------------");
    tracing::info!(
        "Quota FREE: {} richieste, reset {}",
        config.free_daily_limit,
        match config.reset_policy {
            ResetPolicy::CalendarDay => "a mezzanotte UTC",
            ResetPolicy::Rolling24h => "dopo 24 ore",
        }
    );
    tracing::info!(
        "Strategia URL: {}",
        match config.url_strategy {
            UrlStrategy::Passthrough => "passthrough (CDN del backend)",
            UrlStrategy::Rehost => "rehost (storage del servizio)",
        }
    );
    tracing::info!("Backend generazione: {}", config.backend_url);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
