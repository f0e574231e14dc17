use std::net::SocketAddr;

use axum::Router;
use common::utils::logging::init_logging_default;
use dotenvy::dotenv;
use migration::MigratorTrait;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use service::storage::StorageSigner;

use crate::routes::{self, auth};

/// Initialize logging via shared common utils
fn init_logging() {
    init_logging_default();
}

fn build_cors() -> CorsLayer {
    CorsLayer::very_permissive()
}

fn load_config() -> configs::AppConfig {
    match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(err = %e, "config.toml not usable, falling back to environment");
            let mut cfg = configs::AppConfig::default();
            cfg.database.normalize_from_env();
            cfg.site.normalize_from_env();
            cfg.storage.normalize_from_env();
            cfg.notify.normalize_from_env();
            cfg
        }
    }
}

/// Public entry: build the app and run the HTTP server
pub async fn run() -> anyhow::Result<()> {
    dotenv().ok();
    init_logging();

    let cfg = load_config();
    let addr: SocketAddr = format!("{}:{}", cfg.server.host, cfg.server.port).parse()?;

    // DB connection + schema
    let db = models::db::connect().await?;
    migration::Migrator::up(&db, None).await?;

    // JWT secret
    let jwt_secret =
        std::env::var("JWT_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());
    let storage_signer = StorageSigner::new(
        &cfg.storage.base_url,
        &cfg.storage.signing_secret,
        cfg.storage.url_ttl_secs,
    );
    let state = auth::ServerState {
        db,
        auth: auth::ServerAuthConfig { jwt_secret },
        site: cfg.site.clone(),
        storage_signer,
        lead_webhook_url: cfg.notify.lead_webhook_url.clone(),
    };

    // Build router
    let app: Router = routes::build_router(build_cors(), state);

    // Bind and serve
    info!(%addr, "starting referral platform server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
