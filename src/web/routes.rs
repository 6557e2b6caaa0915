//! Web 路由定义

use std::sync::Arc;

use axum::{routing::get, Router};

use crate::web::{handlers::*, types::AppState};

/// 创建路由结构
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(index))
        .route("/translate", get(translate))
}
