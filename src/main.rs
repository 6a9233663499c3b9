use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::MatchedPath;
use dotenvy::dotenv;
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use arbor::application::ports::node_repository::NodeRepository;
use arbor::application::ports::settings_repository::SettingsRepository;
use arbor::bootstrap::app_context::{AppContext, AppServices};
use arbor::bootstrap::config::{Config, StoreBackend};
use arbor::infrastructure::db::PgPool;
use arbor::infrastructure::db::repositories::node_repository_sqlx::SqlxNodeRepository;
use arbor::infrastructure::db::repositories::settings_repository_sqlx::SqlxSettingsRepository;
use arbor::infrastructure::memory::node_repository_memory::InMemoryNodeRepository;
use arbor::infrastructure::memory::settings_repository_memory::InMemorySettingsRepository;

fn build_cors(cfg: &Config) -> CorsLayer {
    let base = CorsLayer::new()
        .allow_methods([
            http::Method::GET,
            http::Method::POST,
            http::Method::PUT,
            http::Method::DELETE,
            http::Method::PATCH,
            http::Method::OPTIONS,
        ])
        .allow_headers([http::header::CONTENT_TYPE, http::header::AUTHORIZATION]);
    match cfg.frontend_url.as_deref().map(HeaderValue::from_str) {
        Some(Ok(origin)) => base.allow_origin(origin).allow_credentials(true),
        // Production requires FRONTEND_URL (enforced in Config); an unparsable one denies all
        _ if cfg.is_production => {
            base.allow_origin(AllowOrigin::exact(HeaderValue::from_static("http://invalid")))
        }
        // Development convenience
        _ => base
            .allow_origin(AllowOrigin::mirror_request())
            .allow_credentials(true),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "arbor=debug,axum=info,tower_http=info".into()),
        )
        .init();

    let cfg = Config::from_env()?;
    info!(
        api_port = cfg.api_port,
        backend = ?cfg.store_backend,
        production = cfg.is_production,
        "Starting Arbor backend"
    );

    let master_secret = cfg.resolve_master_secret()?;

    let (node_repo, settings_repo, pool): (
        Arc<dyn NodeRepository>,
        Arc<dyn SettingsRepository>,
        Option<PgPool>,
    ) = match cfg.store_backend {
        StoreBackend::Postgres => {
            let pool =
                arbor::infrastructure::db::connect_pool(&cfg.database_url, cfg.db_max_connections)
                    .await?;
            arbor::infrastructure::db::migrate(&pool).await?;
            (
                Arc::new(SqlxNodeRepository::new(pool.clone())),
                Arc::new(SqlxSettingsRepository::new(pool.clone(), master_secret)),
                Some(pool),
            )
        }
        StoreBackend::Memory => {
            tracing::warn!(backend = "memory", "store_not_persistent");
            (
                Arc::new(InMemoryNodeRepository::new()),
                Arc::new(InMemorySettingsRepository::new(master_secret)),
                None,
            )
        }
    };

    let services = AppServices::new(node_repo, settings_repo, pool);
    let ctx = AppContext::new(cfg.clone(), services);

    let app = arbor::presentation::http::router(ctx)
        .layer(build_cors(&cfg))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &http::Request<_>| {
                let method = req.method().clone();
                let uri = req.uri().clone();
                let matched = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|p| p.as_str().to_string())
                    .unwrap_or_default();
                tracing::info_span!("http", %method, %uri, matched_path = %matched)
            }),
        );

    let api_addr = SocketAddr::from(([0, 0, 0, 0], cfg.api_port));
    info!(%api_addr, "HTTP API listening");
    let listener = tokio::net::TcpListener::bind(api_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("HTTP API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = ?e, "shutdown_signal_failed");
    }
}
