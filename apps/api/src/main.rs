//! Rolegate API composition root.

#![forbid(unsafe_code)]

mod dto;
mod error;
mod handlers;
mod state;

use std::env;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use rolegate_application::{
    AssignmentService, ProfileService, TerritoryLookupService, TransitionSerializer,
};
use rolegate_core::AppError;
use rolegate_infrastructure::{
    PostgresAssignmentRepository, PostgresEntityDirectory, PostgresPolicyRepository,
    PostgresProfileRepository, PostgresRecordStore,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let migrate_only = env::args().nth(1).as_deref() == Some("migrate");

    let database_url = required_env("DATABASE_URL")?;
    let api_host = env::var("API_HOST").unwrap_or_else(|_| "127.0.0.1".to_owned());
    let api_port = env::var("API_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3001);

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&database_url)
        .await
        .map_err(|error| AppError::Internal(format!("failed to connect to database: {error}")))?;

    sqlx::migrate!("../../crates/infrastructure/migrations")
        .run(&pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to run migrations: {error}")))?;

    if migrate_only {
        info!("database migrations applied successfully");
        return Ok(());
    }

    let assignment_repository = Arc::new(PostgresAssignmentRepository::new(pool.clone()));
    let profile_repository = Arc::new(PostgresProfileRepository::new(pool.clone()));
    let policy_repository = Arc::new(PostgresPolicyRepository::new(pool.clone()));
    let record_store = Arc::new(PostgresRecordStore::new(pool.clone()));
    let entity_directory = Arc::new(PostgresEntityDirectory::new(pool.clone()));
    let serializer = Arc::new(TransitionSerializer::new());

    let app_state = AppState {
        assignment_service: AssignmentService::new(
            assignment_repository.clone(),
            profile_repository.clone(),
            policy_repository.clone(),
            record_store.clone(),
            entity_directory.clone(),
            serializer.clone(),
        ),
        profile_service: ProfileService::new(
            assignment_repository,
            profile_repository,
            record_store.clone(),
            serializer,
        ),
        territory_lookup_service: TerritoryLookupService::new(
            policy_repository.clone(),
            entity_directory.clone(),
        ),
        policy_admin_repository: policy_repository,
        directory_admin_repository: entity_directory,
        record_store,
    };

    let app = Router::new()
        .route("/health", get(handlers::health_handler))
        .route(
            "/api/assignments",
            get(handlers::list_assignments_handler).post(handlers::create_assignment_handler),
        )
        .route(
            "/api/assignments/{id}",
            get(handlers::get_assignment_handler),
        )
        .route(
            "/api/assignments/{id}/validate",
            post(handlers::validate_assignment_handler),
        )
        .route(
            "/api/assignments/{id}/activate",
            post(handlers::activate_assignment_handler),
        )
        .route(
            "/api/assignments/{id}/retract",
            post(handlers::retract_assignment_handler),
        )
        .route(
            "/api/profiles",
            get(handlers::list_profiles_handler).post(handlers::create_profile_handler),
        )
        .route("/api/profiles/{id}", get(handlers::get_profile_handler))
        .route(
            "/api/profiles/{id}/validate",
            post(handlers::validate_profile_handler),
        )
        .route(
            "/api/profiles/{id}/activate",
            post(handlers::activate_profile_handler),
        )
        .route(
            "/api/profiles/{id}/retract",
            post(handlers::retract_profile_handler),
        )
        .route("/api/policies", get(handlers::list_policies_handler))
        .route("/api/policies/{role}", put(handlers::save_policy_handler))
        .route(
            "/api/directory/schema/{entity_type}",
            put(handlers::declare_link_fields_handler),
        )
        .route(
            "/api/directory/{entity_type}/{entity_id}",
            put(handlers::upsert_entity_handler),
        )
        .route("/api/records", get(handlers::list_records_handler))
        .route("/api/territories", get(handlers::lookup_territories_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    let host = IpAddr::from_str(&api_host)
        .map_err(|error| AppError::Internal(format!("invalid API_HOST '{api_host}': {error}")))?;
    let address = SocketAddr::from((host, api_port));

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind listener: {error}")))?;

    info!(%address, "rolegate-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("api server error: {error}")))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

fn required_env(name: &str) -> Result<String, AppError> {
    env::var(name).map_err(|_| AppError::Validation(format!("{name} is required")))
}
