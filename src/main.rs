use std::sync::{Arc, Mutex};

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use roomdesk::config::AppConfig;
use roomdesk::db;
use roomdesk::handlers;
use roomdesk::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/organizations",
            post(handlers::orgs::create_organization),
        )
        .route(
            "/api/organizations/:id/hours",
            get(handlers::orgs::get_hours).put(handlers::orgs::update_hours),
        )
        .route(
            "/api/rooms",
            post(handlers::rooms::create_room).get(handlers::rooms::list_rooms),
        )
        .route(
            "/api/rooms/:id/deactivate",
            post(handlers::rooms::deactivate_room),
        )
        .route("/api/rooms/:id/timetable", get(handlers::rooms::timetable))
        .route("/api/rooms/:id/conflicts", get(handlers::rooms::conflicts))
        .route(
            "/api/bookings",
            post(handlers::bookings::create).get(handlers::bookings::list),
        )
        .route("/api/bookings/:id", get(handlers::bookings::get))
        .route("/api/bookings/:id/confirm", post(handlers::bookings::confirm))
        .route("/api/bookings/:id/cancel", post(handlers::bookings::cancel))
        .route(
            "/api/bookings/:id/complete",
            post(handlers::bookings::complete),
        )
        .route("/api/bookings/:id/no-show", post(handlers::bookings::no_show))
        .route(
            "/api/bookings/:id/reschedule",
            post(handlers::bookings::reschedule),
        )
        .route(
            "/api/bookings/:id/payment",
            post(handlers::bookings::update_payment),
        )
        .route(
            "/api/conflicts/resolve",
            post(handlers::bookings::resolve_conflicts),
        )
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
