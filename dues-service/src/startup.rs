//! Application startup and lifecycle management.

use axum::middleware::from_fn;
use axum::{
    routing::{delete, get, post, put},
    Router,
};
use mongodb::{options::ClientOptions, Client};
use secrecy::ExposeSecret;
use service_core::error::AppError;
use service_core::middleware::{
    metrics::metrics_middleware, request_id::request_id_middleware,
};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::handlers;
use crate::services::{
    init_metrics, ActivityLogger, AnnouncementService, DueRepository, SnapshotService,
    TicketService,
};

/// Hard ceiling on request handling, over and above per-store-call
/// deadlines.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: mongodb::Database,
    pub config: Config,
    pub repository: DueRepository,
    pub snapshots: SnapshotService,
    pub tickets: TicketService,
    pub announcements: AnnouncementService,
    pub activity: ActivityLogger,
}

/// Application container for managing server lifecycle.
pub struct Application {
    port: u16,
    listener: TcpListener,
    router: Router,
    db: mongodb::Database,
}

impl Application {
    /// Build the application with the given configuration.
    pub async fn build(config: Config) -> Result<Self, AppError> {
        init_metrics();

        let mut client_options = ClientOptions::parse(config.database.url.expose_secret())
            .await
            .map_err(|e| {
                tracing::error!("Failed to parse MongoDB connection string: {}", e);
                AppError::DatabaseError(e.into())
            })?;
        client_options.app_name = Some(config.service_name.clone());

        let client = Client::with_options(client_options).map_err(|e| {
            tracing::error!("Failed to create MongoDB client: {}", e);
            AppError::DatabaseError(e.into())
        })?;
        let db = client.database(&config.database.db_name);

        let op_timeout = Duration::from_secs(config.database.op_timeout_secs);
        let repository = DueRepository::new(&db, op_timeout);
        repository.init_indexes().await.map_err(|e| {
            tracing::error!("Failed to initialize database indexes: {}", e);
            e
        })?;

        let state = AppState {
            snapshots: SnapshotService::new(repository.clone()),
            tickets: TicketService::new(&db, op_timeout),
            announcements: AnnouncementService::new(&db, op_timeout),
            activity: ActivityLogger::spawn(&db),
            repository,
            db: db.clone(),
            config: config.clone(),
        };

        let router = Router::new()
            .route("/health", get(handlers::health_check))
            .route("/ready", get(handlers::readiness_check))
            .route("/metrics", get(handlers::metrics_endpoint))
            // Due lifecycle
            .route(
                "/dues",
                post(handlers::dues::create_due).get(handlers::dues::list_dues),
            )
            .route("/dues/paid", get(handlers::dues::list_paid))
            .route("/dues/:id", delete(handlers::dues::delete_due))
            .route("/dues/:id/paid", post(handlers::dues::mark_paid))
            // Submissions
            .route(
                "/dues/:id/submissions",
                post(handlers::submissions::submit_payment)
                    .get(handlers::submissions::list_submissions),
            )
            .route(
                "/submissions/preview",
                post(handlers::submissions::preview_submission),
            )
            // Dashboards
            .route("/snapshot", get(handlers::snapshot::get_snapshot))
            .route("/admin/stats", get(handlers::snapshot::admin_stats))
            // Tickets
            .route(
                "/tickets",
                post(handlers::tickets::create_ticket).get(handlers::tickets::list_tickets),
            )
            .route("/tickets/:id/close", post(handlers::tickets::close_ticket))
            // Announcements
            .route(
                "/announcements",
                post(handlers::announcements::create_announcement)
                    .get(handlers::announcements::list_announcements),
            )
            .route(
                "/announcements/:id",
                put(handlers::announcements::update_announcement)
                    .delete(handlers::announcements::delete_announcement),
            )
            .layer(from_fn(metrics_middleware))
            .layer(from_fn(request_id_middleware))
            .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
            .layer(
                TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
                    let request_id = request
                        .headers()
                        .get("x-request-id")
                        .and_then(|value| value.to_str().ok())
                        .unwrap_or("-");

                    tracing::info_span!(
                        "http_request",
                        request_id = %request_id,
                        method = %request.method(),
                        uri = %request.uri(),
                        version = ?request.version(),
                        actor = tracing::field::Empty,
                    )
                }),
            )
            .with_state(state);

        // Port 0 binds a random free port for tests.
        let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
        let listener = TcpListener::bind(addr).await.map_err(|e| {
            tracing::error!("Failed to bind listener to {}: {}", addr, e);
            AppError::from(e)
        })?;
        let port = listener.local_addr()?.port();

        tracing::info!("dues-service listening on port {}", port);

        Ok(Self {
            port,
            listener,
            router,
            db,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn db(&self) -> &mongodb::Database {
        &self.db
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        axum::serve(self.listener, self.router).await
    }
}
