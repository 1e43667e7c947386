//! # mediactl: image uploads for site storage and team profiles
//!
//! `mediactl` is a small server-rendered web application for managing the images a website
//! serves. It has two surfaces:
//!
//! - **Storage** (`/storage`): standalone images. Users upload a file, the service stores it in
//!   blob storage under a random name, and the public URI is recorded in PostgreSQL so the image
//!   can be listed and deleted later.
//! - **Team** (`/team`): team member profiles. Each profile owns exactly one photo kept in the
//!   same blob storage; editing a profile with a new photo replaces the old blob.
//!
//! ## Architecture
//!
//! The HTTP layer is built on [Axum](https://github.com/tokio-rs/axum) and renders HTML with
//! minijinja templates embedded in the binary. Requests are authenticated by a trusted header set
//! by the reverse proxy in front of the service ([`auth`]); every mutating form carries an
//! anti-forgery token.
//!
//! Upload and delete orchestration lives in [`images`]. It talks to two stores through traits:
//! [`blob::BlobStorage`] for image bytes (S3-compatible, local directory, or memory) and
//! [`images::MetadataStore`] for rows (PostgreSQL through the repositories in [`db`]).
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use mediactl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = mediactl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     mediactl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod api;
pub mod auth;
pub mod blob;
pub mod config;
pub mod db;
pub mod errors;
pub mod images;
pub mod telemetry;
mod types;
pub mod views;

#[cfg(test)]
pub mod test_utils;

use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    response::Redirect,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
use sqlx::{PgPool, postgres::PgPoolOptions};
use tokio::net::TcpListener;
use tower_http::{
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info};

use crate::{
    api::handlers::{storage, team},
    config::PoolSettings,
    images::{ImageService, PgMetadataStore},
    views::Views,
};
pub use config::Config;
pub use types::{ImageKind, StorageEntryId, TeamMemberId};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .images(image_service)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub images: ImageService,
    #[builder(default = Arc::new(Views::new()))]
    pub views: Arc<Views>,
}

/// Get the mediactl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn pool_options(settings: &PoolSettings) -> PgPoolOptions {
    let seconds = |s: u64| (s > 0).then(|| Duration::from_secs(s));

    PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(seconds(settings.idle_timeout_secs))
        .max_lifetime(seconds(settings.max_lifetime_secs))
}

/// Connect to the metadata database and run pending migrations
async fn setup_database(config: &Config) -> anyhow::Result<PgPool> {
    let pool = pool_options(&config.database.pool).connect(&config.database.url).await?;
    migrator().run(&pool).await?;
    info!("Database ready, migrations applied");
    Ok(pool)
}

/// Build the main application router
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let upload_limit = DefaultBodyLimit::max(state.config.images.max_upload_size);

    let storage_routes = Router::new()
        .route("/storage", get(storage::list_images))
        .route(
            "/storage/upload",
            get(storage::upload_form).post(storage::upload_image).layer(upload_limit),
        )
        .route("/storage/delete", post(storage::delete_image));

    let team_routes = Router::new()
        .route("/team", get(team::list_members))
        .route("/team/{id}", get(team::member_details))
        .route("/team/create", get(team::create_form).post(team::create_member).layer(upload_limit))
        .route("/team/edit/{id}", get(team::edit_form).post(team::edit_member).layer(upload_limit))
        .route("/team/delete/{id}", post(team::delete_member));

    let mut router = Router::new()
        .route("/", get(|| async { Redirect::to("/team") }))
        .route("/healthz", get(|| async { "OK" }))
        .merge(storage_routes)
        .merge(team_routes)
        .with_state(state.clone());

    // The local backend's files are served by us; other backends serve their own URIs
    if let Some(path) = state.config.blob_storage.local_path() {
        debug!("Serving local blobs from {}", path.display());
        router = router.nest_service("/blobs", ServeDir::new(path));
    }

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// A configured application ready to serve.
///
/// 1. **Create**: [`Application::new`] connects to the database, runs migrations and opens the
///    configured blob storage
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: when the shutdown future resolves, in-flight requests finish and the pool is
///    closed
pub struct Application {
    router: Router,
    config: Config,
    pool: PgPool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting mediactl with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;
        Self::new_with_pool(config, pool).await
    }

    /// Create an application on an existing, migrated pool
    pub async fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let blobs = blob::create_blob_storage(&config.blob_storage).await?;
        let metadata = Arc::new(PgMetadataStore::new(pool.clone()));
        let images = ImageService::new(&config, blobs, metadata);

        let state = AppState::builder().config(config.clone()).images(images).build();
        let router = build_router(&state)?;

        Ok(Self { router, config, pool })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "mediactl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
