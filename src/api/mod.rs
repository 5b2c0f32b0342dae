//! HTTP surface: read endpoint, bus refresh trigger and metrics.
//!
//! - `GET /config` and `GET /config/example` → value of the configured default key
//! - `GET /config/{key}` → value of `key`, `404` when not configured
//! - `POST /bus/refresh` → publish a `ChangeEvent` (`{"keys": [...], "version": n}`)
//! - `GET /metrics` → Prometheus text format

mod handlers;

pub use handlers::*;


use std::convert::Infallible;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;
use warp::Filter;
use warp::Rejection;
use warp::Reply;

use crate::init_metrics;
use crate::ConfigStore;
use crate::LocalBus;
use crate::Result;
use crate::ServerConfig;
use crate::SystemError;

/// Shared state handed to every route
#[derive(Debug, Clone)]
pub struct ApiContext {
    pub store: Arc<ConfigStore>,
    pub bus: LocalBus,
    pub default_key: String,
    pub max_body_bytes: u64,
}

impl ApiContext {
    pub fn new(
        store: Arc<ConfigStore>,
        bus: LocalBus,
        config: &ServerConfig,
    ) -> Self {
        Self {
            store,
            bus,
            default_key: config.default_key.clone(),
            max_body_bytes: config.max_body_bytes,
        }
    }
}

fn with_ctx(ctx: ApiContext) -> impl Filter<Extract = (ApiContext,), Error = Infallible> + Clone {
    warp::any().map(move || ctx.clone())
}

pub fn routes(ctx: ApiContext) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let default_value = warp::path!("config")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .map(|ctx: ApiContext| read_value(&ctx.store, &ctx.default_key));

    let example_value = warp::path!("config" / "example")
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .map(|ctx: ApiContext| read_value(&ctx.store, &ctx.default_key));

    let value = warp::path!("config" / String)
        .and(warp::get())
        .and(with_ctx(ctx.clone()))
        .map(|key: String, ctx: ApiContext| read_value(&ctx.store, &key));

    let refresh = warp::path!("bus" / "refresh")
        .and(warp::post())
        .and(warp::body::content_length_limit(ctx.max_body_bytes))
        .and(warp::body::bytes())
        .and(with_ctx(ctx))
        .map(|body: warp::hyper::body::Bytes, ctx: ApiContext| publish_refresh(&ctx.bus, &body));

    let metrics = warp::path!("metrics")
        .and(warp::get())
        .map(metrics_reply);

    default_value
        .or(example_value)
        .or(value)
        .or(refresh)
        .or(metrics)
}

/// Serves the API until `shutdown` fires.
pub async fn start_server(
    config: &ServerConfig,
    ctx: ApiContext,
    mut shutdown: watch::Receiver<()>,
) -> Result<()> {
    init_metrics();

    let (addr, server) = warp::serve(routes(ctx))
        .try_bind_with_graceful_shutdown(config.listen_address, async move {
            let _ = shutdown.changed().await;
        })
        .map_err(|e| SystemError::Bind(e.to_string()))?;

    info!(%addr, "HTTP server listening");
    server.await;
    info!("HTTP server stopped");
    Ok(())
}
