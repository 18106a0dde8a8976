//! Motorline Chat server entry point.

use std::sync::Arc;

use http::HeaderValue;
use sqlx::postgres::PgPoolOptions;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;

use motorline_chat::adapters::auth::HsSessionValidator;
use motorline_chat::adapters::http::chat::{chat_router, ChatAppState};
use motorline_chat::adapters::http::middleware::auth_middleware;
use motorline_chat::adapters::postgres::{PostgresChatStore, PostgresListingReader};
use motorline_chat::adapters::websocket::{
    websocket_router, ChatGateway, ChatGatewayState, InMemoryConnectionRegistry, RoomManager,
};
use motorline_chat::application::chat::ChatService;
use motorline_chat::config::AppConfig;
use motorline_chat::ports::SessionValidator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.server.log_level)),
        )
        .init();

    info!("Starting Motorline chat service");

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    info!("Database connection established");

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        info!("Migrations applied");
    }

    // Wire adapters to the service and gateway.
    let store = Arc::new(PostgresChatStore::new(pool.clone()));
    let listings = Arc::new(PostgresListingReader::new(pool));
    let sessions: Arc<dyn SessionValidator> =
        Arc::new(HsSessionValidator::new(&config.auth.jwt_secret));

    let chat = Arc::new(ChatService::new(store, listings));
    let rooms = Arc::new(RoomManager::new());
    let registry = Arc::new(InMemoryConnectionRegistry::new());
    let gateway = Arc::new(ChatGateway::new(chat.clone(), rooms, registry));

    let api = chat_router()
        .layer(axum::middleware::from_fn_with_state(
            sessions.clone(),
            auth_middleware,
        ))
        .with_state(ChatAppState::new(chat));

    let ws = websocket_router().with_state(ChatGatewayState::new(gateway, sessions));

    let cors = if config.is_production() {
        let origins: Vec<HeaderValue> = config
            .server
            .cors_origins_list()
            .into_iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();
        CorsLayer::new().allow_origin(AllowOrigin::list(origins))
    } else {
        CorsLayer::permissive()
    };

    let app = api.merge(ws).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .into_inner(),
    );

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting graceful shutdown"),
        _ = terminate => info!("Received terminate signal, starting graceful shutdown"),
    }
}
