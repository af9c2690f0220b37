use std::net::IpAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{DefaultBodyLimit, Request};
use axum::routing::{get, post};
use axum::{Router, ServiceExt};
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod archive;
mod config;
mod download;
mod error;
mod html;
mod listing;
mod paths;
mod upload;

use config::Config;

/// Shared handler state; the configuration is immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let mut config = Config::load()?;
    config.prepare_dirs()?;
    let bind = config.bind;

    info!(
        root = %config.root_dir.display(),
        uploads = %config.upload_dir.display(),
        "serving directories"
    );

    let state = AppState {
        config: Arc::new(config),
    };
    // Trailing slashes are trimmed before routing, so /browse/ hits /browse.
    let app = NormalizePathLayer::trim_trailing_slash().layer(router(state));

    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("binding {bind}"))?;
    info!("listening on http://{bind}");
    if let Some(ip) = local_ip() {
        info!("reachable on the LAN at http://{}:{}", ip, bind.port());
    }

    axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
        .await
        .context("server error")?;
    Ok(())
}

fn router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(listing::browse_root))
        .route("/browse", get(listing::browse_root))
        .route("/browse/{*path}", get(listing::browse))
        .route("/upload", post(upload::upload))
        .route("/download/{*path}", get(download::download))
        .route("/download_directory/{*path}", get(archive::download_directory))
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("{}=info,tower_http=info", env!("CARGO_CRATE_NAME")).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Best-effort LAN address discovery: a connected UDP socket picks the
/// default route's source address without sending any packets.
fn local_ip() -> Option<IpAddr> {
    let socket = std::net::UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    match socket.local_addr().ok()?.ip() {
        IpAddr::V4(ip) if !ip.is_loopback() && !ip.is_unspecified() => Some(IpAddr::V4(ip)),
        _ => None,
    }
}
