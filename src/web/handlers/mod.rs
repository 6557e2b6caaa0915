//! Web 路由处理器

pub mod pages;
pub mod translate;

pub use pages::*;
pub use translate::*;
