/// 统一错误处理模块
pub mod error;

/// 配置模块
pub mod config;

/// 功能聚合模块
pub mod features;

/// 组合响应（文件 + JSON 等多个描述按序写入同一响应）
pub mod response;

/// 应用状态聚合模块
pub mod state;

/// 请求 ID 中间件
pub mod request_id;

/// OpenAPI 文档
pub mod openapi;

/// 路由组装
pub mod app;

/// 优雅退出
pub mod shutdown;

// 导出常用类型供外部使用
pub use app::build_app;
pub use config::AppConfig;
pub use error::{AppError, CropError};
pub use shutdown::{Shutdown, ShutdownReason};
pub use state::AppState;
