//! 页面处理器

/// 主页处理器
pub async fn index() -> &'static str {
    "Hello World"
}
