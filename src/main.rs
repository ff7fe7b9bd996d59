use std::net::SocketAddr;

use axum::middleware;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use car_rental_backend::{
    config::Config,
    db,
    entities::user::UserRole,
    handlers::auth::register_user,
    middleware::rate_limit::{create_global_governor, log_request},
    routes, AppError, AppState,
};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "car_rental_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env().expect("Invalid configuration");
    tracing::info!("Starting server at {}", config.server_addr());

    // Connect to database
    let db = db::connect(&config)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Connected to database");

    // Run migrations
    migration::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    tracing::info!("Migrations complete");

    let state = AppState::new(db, config.clone());

    seed_admin(&state).await;

    let app = routes::create_router(state)
        .expect("Failed to build router")
        .layer(middleware::from_fn(log_request))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(create_global_governor().expect("Invalid global rate limit"));

    // Start server with socket address for rate limiting
    let addr: SocketAddr = config.server_addr().parse().expect("Invalid address");
    let listener = TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Failed to start server");
}

/// Seed the admin account from ADMIN_EMAIL / ADMIN_PASSWORD if it doesn't exist
async fn seed_admin(state: &AppState) {
    let (Some(email), Some(password)) = (&state.config.admin_email, &state.config.admin_password)
    else {
        tracing::debug!("No admin credentials configured, skipping seed");
        return;
    };

    match register_user(
        state.store.as_ref(),
        email,
        password,
        Some("Admin".to_string()),
        UserRole::Admin,
    )
    .await
    {
        Ok(_) => tracing::info!("Admin account created: {}", email),
        Err(AppError::Conflict(_)) => tracing::debug!("Admin account already exists"),
        Err(e) => panic!("Failed to create admin: {}", e),
    }
}
