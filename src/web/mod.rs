//! Web 服务器模块
//!
//! HTTP surface of the gateway: `GET /translate` and a liveness page.

pub mod config;
pub mod handlers;
pub mod routes;
pub mod types;

pub use config::*;
pub use handlers::*;
pub use routes::*;
pub use types::*;

use std::sync::Arc;

use axum::http::{header, Method};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use crate::error::GatewayError;

/// Web 服务器
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// 创建新的 Web 服务器
    pub fn new(config: WebConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    /// 启动 Web 服务器，收到 Ctrl-C / SIGTERM 后优雅退出
    pub async fn start(&self) -> Result<(), GatewayError> {
        let app = create_router(self.state.clone());

        let listener = tokio::net::TcpListener::bind(self.config.listen_address())
            .await
            .map_err(|e| GatewayError::Unknown(format!("Failed to bind server: {}", e)))?;

        tracing::info!(
            cache = self.state.pipeline.cache_enabled(),
            "Web server starting at http://{}",
            self.config.listen_address()
        );

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GatewayError::Unknown(format!("Server error: {}", e)))?;

        tracing::info!("Web server stopped");
        Ok(())
    }
}

/// 创建路由器
pub fn create_router(app_state: Arc<AppState>) -> Router {
    create_routes().with_state(app_state).layer(cors_layer())
}

/// 添加CORS支持
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown signal received");
}
