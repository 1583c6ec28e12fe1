//! Development Server for Waves
//!
//! Serves the host page and the compute module artifact with the headers
//! `WebAssembly.instantiate()` and module scripts expect.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use axum::{
    body::Body,
    http::{header, HeaderValue, Request, StatusCode},
    response::Response,
    routing::get_service,
    Router,
};
use clap::Parser;
use tower_http::services::ServeDir;

#[derive(Parser, Debug)]
#[command(name = "dev-server")]
#[command(about = "Serve the Waves host page for local development")]
struct Cli {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Host to bind to
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Directory holding index.html and the wasm/ artifacts
    #[arg(short, long, env = "WAVES_WEB_DIR", default_value = "web")]
    root: PathBuf,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    if !cli.root.is_dir() {
        bail!("web root {} is not a directory", cli.root.display());
    }

    let addr: SocketAddr = format!("{}:{}", cli.host, cli.port)
        .parse()
        .with_context(|| format!("invalid bind address {}:{}", cli.host, cli.port))?;

    let artifact = cli.root.join("wasm").join("waves_bg.wasm");
    if !artifact.is_file() {
        tracing::warn!(
            path = %artifact.display(),
            "compute module artifact not found - bootstrap() will fail with artifact_missing"
        );
    }

    let app = router(cli.root.clone());

    tracing::info!(root = %cli.root.display(), "serving http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(root: PathBuf) -> Router {
    let serve_dir = ServeDir::new(root).precompressed_gzip().precompressed_br();

    Router::new()
        .fallback_service(get_service(serve_dir).handle_error(|err| async move {
            tracing::error!(error = %err, "static file error");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        }))
        .layer(axum::middleware::from_fn(add_headers))
}

/// Content type for a request path, by extension
fn content_type_for(path: &str) -> Option<&'static str> {
    let extension = path.rsplit_once('.').map(|(_, ext)| ext)?;
    match extension {
        "js" | "mjs" => Some("application/javascript; charset=utf-8"),
        "wasm" => Some("application/wasm"),
        "css" => Some("text/css; charset=utf-8"),
        "html" => Some("text/html; charset=utf-8"),
        "json" => Some("application/json; charset=utf-8"),
        _ => None,
    }
}

/// Add isolation headers and fix MIME types
async fn add_headers(request: Request<Body>, next: axum::middleware::Next) -> Response<Body> {
    let path = request.uri().path().to_string();

    let mut response = next.run(request).await;
    tracing::debug!(%path, status = %response.status(), "request");

    let is_success = response.status().is_success();
    let headers = response.headers_mut();
    headers.insert(
        "Cross-Origin-Opener-Policy",
        HeaderValue::from_static("same-origin"),
    );
    headers.insert(
        "Cross-Origin-Embedder-Policy",
        HeaderValue::from_static("require-corp"),
    );

    // instantiateStreaming() and module scripts reject other MIME types
    if is_success {
        if let Some(content_type) = content_type_for(&path) {
            headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }

    response
}
