//! PDF editing server
//!
//! REST endpoints over `pdfedit-core`, one multipart upload in and one
//! document (or ZIP archive) out per request:
//!
//! - Merge, split, reorder and rotate pages
//! - Text and image watermarks, highlight annotations
//! - Password protection, unlocking, metadata stripping, compression
//! - Style-preserving text replacement
//!
//! ## Middleware
//!
//! - Rate limiting per client IP via tower-governor
//! - Open CORS for browser clients
//! - Request tracing and an upload size limit

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::anyhow;
use axum::extract::DefaultBodyLimit;
use clap::Parser;
use tower::ServiceBuilder;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod api;
mod error;
mod form;

/// Command-line arguments for the PDF editing server
#[derive(Parser, Debug)]
#[command(name = "pdfedit-api")]
#[command(about = "HTTP API for PDF editing operations")]
struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "8000")]
    port: u16,

    /// Host address to bind to
    #[arg(long, env = "PDFEDIT_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Largest accepted request body, in megabytes
    #[arg(long, env = "PDFEDIT_MAX_UPLOAD_MB", default_value = "100")]
    max_upload_mb: usize,

    /// Rate limit: requests per second per IP
    #[arg(long, env = "PDFEDIT_RATE_LIMIT", default_value = "10")]
    rate_limit: u32,

    /// Enable verbose logging
    #[arg(short, long, env = "PDFEDIT_VERBOSE")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();

    let log_level = if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive(log_level.into())
                .add_directive("tower_http=debug".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting pdfedit-api on {}:{}", args.host, args.port);

    let governor_conf = Arc::new(
        GovernorConfigBuilder::default()
            .per_second(args.rate_limit.max(1).into())
            .burst_size(args.rate_limit.max(1) * 2)
            .finish()
            .ok_or_else(|| anyhow!("Invalid rate limit {}", args.rate_limit))?,
    );

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = api::routes()
        .layer(DefaultBodyLimit::max(args.max_upload_mb * 1024 * 1024))
        .layer(GovernorLayer {
            config: governor_conf,
        })
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        );

    let addr: SocketAddr = format!("{}:{}", args.host, args.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on http://{}", addr);
    info!("Rate limit: {} requests/second per IP", args.rate_limit);
    info!("Upload limit: {} MB", args.max_upload_mb);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
