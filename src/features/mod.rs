/// 图片裁剪
pub mod crop;

/// 健康检查
pub mod health;
