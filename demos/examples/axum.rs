//! Axum Integration Example
//!
//! Serves a small single-page app and answers crawlers with prerendered
//! snapshots kept in an in-memory cache for an hour.
//!
//! Run:
//!   cargo run -p prerender-demos --example axum
//!
//! Configuration comes from the YAML file named by `PRERENDER_CONFIG` when
//! set, then from `PRERENDER_SERVICE_URL` and `PRERENDER_TOKEN`.
//!
//! Try it:
//!   curl -v http://localhost:3000/products/42                         # Application
//!   curl -v -A Googlebot http://localhost:3000/products/42            # Snapshot (MISS, then HIT)
//!   curl -v http://localhost:3000/products/42?_escaped_fragment_=x    # Snapshot
//!   curl -v -A Googlebot http://localhost:3000/app.js                 # Static asset, application
//!   curl -v -A Googlebot http://localhost:3000/admin                  # Blacklisted, application

use std::convert::Infallible;
use std::error::Error;
use std::time::Duration;

use axum::{Router, error_handling::HandleErrorLayer, extract::Path, response::Html, routing::get};
use http::StatusCode;
use prerender::{Config, ConfigFile};
use prerender_moka::MokaSnapshotCache;
use prerender_tower::{PrerenderLayer, PrerenderServiceError};
use tower::ServiceBuilder;

const SHELL: &str = r#"<!doctype html>
<html>
  <head><title>Shop</title></head>
  <body><div id="root"></div><script src="/app.js"></script></body>
</html>"#;

async fn shell() -> Html<&'static str> {
    Html(SHELL)
}

async fn product(Path(id): Path<u32>) -> Html<&'static str> {
    tracing::info!(id, "Serving application shell");
    Html(SHELL)
}

async fn script() -> &'static str {
    "document.getElementById('root').textContent = 'Hello';"
}

async fn render_failed(err: PrerenderServiceError<Infallible>) -> (StatusCode, String) {
    tracing::warn!(error = %err, "Snapshot could not be delivered");
    (StatusCode::BAD_GATEWAY, err.to_string())
}

fn load_config() -> Result<Config, Box<dyn Error>> {
    let builder = match std::env::var("PRERENDER_CONFIG") {
        Ok(path) => ConfigFile::from_yaml(&std::fs::read_to_string(path)?)?.into_builder(),
        Err(_) => Config::builder().blacklist("^/admin"),
    };
    Ok(builder.with_env().build()?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("info,prerender=debug,prerender_core=debug,prerender_tower=debug")
        .init();

    let cache = MokaSnapshotCache::builder()
        .max_entries(10_000)
        .ttl(Duration::from_secs(3600))
        .build();

    let prerender = PrerenderLayer::builder()
        .config(load_config()?)
        .cache(cache)
        .build();

    let app = Router::new()
        .route("/", get(shell))
        .route("/products/{id}", get(product))
        .route("/admin", get(shell))
        .route("/app.js", get(script))
        .layer(
            ServiceBuilder::new()
                .layer(HandleErrorLayer::new(render_failed))
                .layer(prerender),
        );

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    tracing::info!("Listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;
    Ok(())
}
