//! 翻译 API 处理器

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Json, Response},
};

use crate::error::GatewayError;
use crate::pipeline::TranslateQuery;
use crate::web::types::AppState;

/// Response header telling clients whether the body came from the cache.
pub const CACHE_STATUS_HEADER: &str = "x-cache";

/// `GET /translate?q=…&target=…&token=…`
pub async fn translate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    query: Option<Query<TranslateQuery>>,
) -> Result<Response, GatewayError> {
    // a query string axum cannot deserialize is treated like an empty one
    let query = query.map(|Query(query)| query).unwrap_or_default();
    // non-UTF-8 bytes must not hide a blocked keyword
    let user_agent = headers
        .get(header::USER_AGENT)
        .map(|value| String::from_utf8_lossy(value.as_bytes()));

    let result = state.pipeline.handle(query, user_agent.as_deref()).await?;

    let cache_status = if result.cache_hit { "HIT" } else { "MISS" };
    let mut response = Json(result.body).into_response();
    response
        .headers_mut()
        .insert(CACHE_STATUS_HEADER, HeaderValue::from_static(cache_status));
    Ok(response)
}
