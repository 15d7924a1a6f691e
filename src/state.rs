use std::sync::Arc;
use tokio::sync::Semaphore;

use crate::config::{AppConfig, CropConfig};

/// 聚合的应用共享状态（请求之间只读共享）
#[derive(Clone)]
pub struct AppState {
    /// 裁剪参数（JPEG 质量、上传上限等）
    pub crop: Arc<CropConfig>,
    /// 控制并发裁剪的信号量（限制 CPU 密集型任务数量）
    pub crop_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(crop: CropConfig) -> Self {
        let permits = crop.effective_parallelism();
        Self {
            crop: Arc::new(crop),
            crop_semaphore: Arc::new(Semaphore::new(permits)),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.crop.clone())
    }
}
