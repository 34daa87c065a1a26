//! Axum-based RPC server.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::{header, HeaderName, Method};
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use pmp_service::{Campaign, ServiceConfig};
use pmp_types::LotteryId;

use crate::captcha::CaptchaVerifier;
use crate::error::RpcError;
use crate::handlers;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub campaign: Arc<Campaign>,
    pub captcha: CaptchaVerifier,
    /// Admin calls are refused while this is `None`.
    pub admin_secret: Option<String>,
    /// Lottery used by claims that do not name one.
    pub current_lottery_id: Option<LotteryId>,
}

impl AppState {
    pub fn new(campaign: Arc<Campaign>, config: &ServiceConfig) -> Self {
        Self {
            campaign,
            captcha: CaptchaVerifier::from_config(config),
            admin_secret: config
                .admin_secret
                .clone()
                .filter(|secret| !secret.is_empty()),
            current_lottery_id: config.current_lottery_id,
        }
    }
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::AUTHORIZATION,
            HeaderName::from_static("x-client-info"),
            HeaderName::from_static("apikey"),
            header::CONTENT_TYPE,
        ])
}

/// Build the router with every endpoint.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/confess", post(handlers::confess))
        .route(
            "/confessions",
            get(handlers::browse).post(handlers::confession_action),
        )
        .route("/admin", post(handlers::admin))
        .route("/unlock", post(handlers::unlock))
        .route("/contact", post(handlers::contact))
        .route("/health", get(handlers::health))
        .route("/metrics", get(handlers::metrics))
        .layer(cors_layer())
        .with_state(state)
}

pub struct RpcServer {
    pub addr: SocketAddr,
    pub state: AppState,
}

impl RpcServer {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self { addr, state }
    }

    /// Serve until `shutdown` resolves.
    pub async fn start<F>(self, shutdown: F) -> Result<(), RpcError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let app = router(self.state);
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!(addr = %self.addr, "RPC server listening");
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown)
        .await?;
        tracing::info!("RPC server stopped");
        Ok(())
    }
}
