use std::future::IntoFuture;

use kawaii_crop::{AppConfig, AppState, Shutdown, build_app};

#[tokio::main]
async fn main() {
    // 先加载配置，以便日志级别可由配置文件决定（RUST_LOG 优先）
    let config = match AppConfig::init_global() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config init failed: {e}");
            std::process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.default_directive().into()),
        )
        .init();
    tracing::info!("配置已加载: {:?}", AppConfig::get_config_path());

    let shutdown = Shutdown::install();

    let state = AppState::from_config(config);
    tracing::info!(
        "裁剪并发许可: {}, JPEG 质量: {}, 上传上限: {} 字节",
        config.crop.effective_parallelism(),
        config.crop.jpeg_quality,
        config.crop.max_upload_bytes
    );
    let app = build_app(config, state);

    let addr = config.server_addr();
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Bind address failed {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server: http://{}", addr);
    tracing::info!("Docs: http://{}/docs", addr);
    tracing::info!("Health: http://{}/health", addr);
    tracing::info!("Crop API: http://{}{}/crop", addr, config.api.prefix);

    let graceful = {
        let shutdown = shutdown.clone();
        axum::serve(listener, app).with_graceful_shutdown(async move {
            let reason = shutdown.triggered().await;
            tracing::info!("接收到退出信号: {:?}，开始优雅关闭HTTP服务器...", reason);
        })
        .into_future()
    };

    // 优雅退出超过配置的时限后直接结束进程
    tokio::select! {
        res = graceful => {
            if let Err(e) = res {
                tracing::error!("服务器运行错误: {}", e);
                std::process::exit(1);
            }
            tracing::info!("服务器已优雅关闭");
        }
        _ = shutdown.deadline(config.shutdown.timeout_duration()) => {
            tracing::warn!("优雅退出超时，强制退出");
            std::process::exit(1);
        }
    }
}
