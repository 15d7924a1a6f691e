use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// 全局配置单例
static CONFIG: OnceCell<AppConfig> = OnceCell::new();

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "ServerConfig::default_host")]
    pub host: String,
    /// 监听端口
    #[serde(default = "ServerConfig::default_port")]
    pub port: u16,
}

impl ServerConfig {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }
    fn default_port() -> u16 {
        5080
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
        }
    }
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别（未设置 RUST_LOG 时生效）
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }

    /// 生成 EnvFilter 的兜底指令，仅作用于本服务与 tower_http。
    pub fn default_directive(&self) -> String {
        format!("kawaii_crop={0},tower_http={0}", self.level)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// API 配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiConfig {
    /// API 路由前缀（默认为空，即 `/crop` 直接挂在根路径）
    #[serde(default)]
    pub prefix: String,
}

/// 裁剪配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropConfig {
    /// 上传请求体上限（字节）
    #[serde(default = "CropConfig::default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    /// JPEG 输出质量（1-100）
    #[serde(default = "CropConfig::default_jpeg_quality")]
    pub jpeg_quality: u8,
    /// 并发裁剪许可数（0=自动，取 CPU 核心数）
    #[serde(default)]
    pub max_parallel: u32,
}

impl CropConfig {
    fn default_max_upload_bytes() -> usize {
        20 * 1024 * 1024
    }
    fn default_jpeg_quality() -> u8 {
        75
    }

    /// 实际生效的并发许可数
    pub fn effective_parallelism(&self) -> usize {
        match self.max_parallel {
            0 => num_cpus::get().max(1),
            n => n as usize,
        }
    }
}

impl Default for CropConfig {
    fn default() -> Self {
        Self {
            max_upload_bytes: Self::default_max_upload_bytes(),
            jpeg_quality: Self::default_jpeg_quality(),
            max_parallel: 0,
        }
    }
}

/// 优雅退出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// 优雅退出超时时间（秒）
    #[serde(default = "ShutdownConfig::default_timeout")]
    pub timeout_secs: u64,
}

impl ShutdownConfig {
    fn default_timeout() -> u64 {
        30
    }

    /// 获取优雅退出超时时间
    pub fn timeout_duration(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_secs: Self::default_timeout(),
        }
    }
}

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub api: ApiConfig,
    /// 裁剪配置
    #[serde(default)]
    pub crop: CropConfig,
    /// 优雅退出配置
    #[serde(default)]
    pub shutdown: ShutdownConfig,
}

impl AppConfig {
    /// 从配置文件加载配置，支持环境变量覆盖
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Self::get_config_path())
    }

    /// 从指定路径加载配置；文件不存在时只使用默认值与环境变量。
    pub fn load_from(config_path: PathBuf) -> Result<Self, ConfigError> {
        let builder = ConfigBuilder::builder()
            .add_source(File::from(config_path).required(false))
            // 支持环境变量覆盖，例如：APP_CROP__JPEG_QUALITY=90
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        builder.try_deserialize()
    }

    /// 初始化全局配置并返回其 'static 引用
    pub fn init_global() -> Result<&'static AppConfig, ConfigError> {
        let config = Self::load()?;
        CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("配置已经被初始化".to_string()))?;
        CONFIG
            .get()
            .ok_or_else(|| ConfigError::Message("配置初始化失败".to_string()))
    }

    /// 获取配置文件路径（可用 APP_CONFIG 指定）
    pub fn get_config_path() -> PathBuf {
        std::env::var_os("APP_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }

    /// 获取服务器监听地址
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

#[cfg(test)]
mod tests {
    use super::{AppConfig, CropConfig};
    use std::path::PathBuf;

    #[test]
    fn missing_config_file_falls_back_to_defaults() {
        let cfg = AppConfig::load_from(PathBuf::from("definitely-missing-kawaii-crop.toml"))
            .expect("load defaults");
        assert_eq!(cfg.server.port, 5080);
        assert_eq!(cfg.crop.jpeg_quality, 75);
        assert_eq!(cfg.api.prefix, "");
    }

    #[test]
    fn zero_parallelism_means_cpu_count() {
        let crop = CropConfig {
            max_parallel: 0,
            ..CropConfig::default()
        };
        assert!(crop.effective_parallelism() >= 1);

        let crop = CropConfig {
            max_parallel: 3,
            ..CropConfig::default()
        };
        assert_eq!(crop.effective_parallelism(), 3);
    }
}
