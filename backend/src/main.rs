//! Agricultural Advisory Platform - Backend Server
//!
//! Irrigation, fertilizer and disease advice for registered farms, plus a
//! daily batch of weather, crop-stage and soil advisories per farm.

use axum::{routing::get, Router};
use sqlx::postgres::PgPoolOptions;
use std::{net::SocketAddr, sync::Arc, time::Duration};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod external;
mod handlers;
mod routes;
mod services;
mod store;

pub use config::Config;

use external::{DiseaseClassifier, HttpDiseaseClassifier, WeatherClient, WeatherProvider};
use services::{DiseaseAdvisor, FertilizerAdvisor};
use store::PgStore;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: PgStore,
    pub config: Arc<Config>,
    pub weather: Arc<dyn WeatherProvider>,
    /// `None` when the fertilizer model could not be loaded at all
    pub fertilizer: Option<Arc<FertilizerAdvisor>>,
    pub disease: Arc<DiseaseAdvisor>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agri_server=debug,tower_http=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::load()?;

    tracing::info!("Starting Agricultural Advisory Server");
    tracing::info!("Environment: {}", config.environment);

    // Create database connection pool
    tracing::info!("Connecting to database...");
    let db_pool = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(&config.database.url)
        .await?;

    tracing::info!("Database connection established");

    // Run migrations in development
    if config.environment == "development" {
        tracing::info!("Running database migrations...");
        sqlx::migrate!("./migrations").run(&db_pool).await?;
        tracing::info!("Migrations completed");
    }

    // External collaborators and advisors
    let weather = WeatherClient::new(&config.weather)?;

    let fertilizer = match FertilizerAdvisor::from_config(&config.models) {
        Ok(advisor) => Some(Arc::new(advisor)),
        Err(e) => {
            tracing::error!(error = %e, "Fertilizer advisor unavailable, serving static advice");
            None
        }
    };

    let classifier = HttpDiseaseClassifier::from_config(&config.models)?
        .map(|client| Arc::new(client) as Arc<dyn DiseaseClassifier>);
    if classifier.is_none() {
        tracing::warn!("Disease classifier not configured, detections will be reported as unknown");
    }
    let disease = DiseaseAdvisor::new(classifier, &config.storage.upload_dir);

    // Create application state
    let state = AppState {
        store: PgStore::new(db_pool),
        config: Arc::new(config.clone()),
        weather: Arc::new(weather),
        fertilizer,
        disease: Arc::new(disease),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Create the application router with all routes and middleware
fn create_app(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(root))
        .route("/health", get(handlers::health_check))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Root endpoint
async fn root() -> &'static str {
    "Agricultural Advisory Platform API v1.0"
}
