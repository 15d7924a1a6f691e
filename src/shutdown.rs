//! 优雅退出
//!
//! 监听 SIGINT/SIGTERM（Windows 下为 Ctrl+C），通过 watch 通道把退出原因广播给
//! HTTP 服务器与超时守卫。

use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// 退出原因
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownReason {
    /// 用户中断信号 (Ctrl+C)
    Interrupt,
    /// 终止信号 (SIGTERM)
    Terminate,
    /// 应用主动请求退出
    Application,
}

/// 退出信号句柄，可自由克隆。
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: watch::Sender<Option<ShutdownReason>>,
    rx: watch::Receiver<Option<ShutdownReason>>,
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(None);
        Self { tx, rx }
    }

    /// 创建句柄并在后台监听系统信号。
    pub fn install() -> Self {
        let shutdown = Self::new();
        let trigger = shutdown.clone();
        tokio::spawn(async move {
            let reason = wait_for_os_signal().await;
            trigger.trigger(reason);
        });
        shutdown
    }

    /// 触发退出；只有第一次生效。
    pub fn trigger(&self, reason: ShutdownReason) {
        let first = self.tx.send_if_modified(|current| {
            if current.is_some() {
                return false;
            }
            *current = Some(reason);
            true
        });
        if first {
            info!("触发优雅退出: {:?}", reason);
        }
    }

    pub fn is_triggered(&self) -> bool {
        self.rx.borrow().is_some()
    }

    /// 等待退出信号，返回退出原因。
    pub async fn triggered(&self) -> ShutdownReason {
        let mut rx = self.rx.clone();
        match rx.wait_for(Option::is_some).await {
            Ok(reason) => reason.unwrap_or(ShutdownReason::Application),
            // 发送端不会先于接收端被丢弃（自身持有 tx），这里仅兜底
            Err(_) => ShutdownReason::Application,
        }
    }

    /// 退出信号到达后再等待 `timeout`，用于给优雅退出设定上限。
    pub async fn deadline(&self, timeout: Duration) {
        let reason = self.triggered().await;
        info!("优雅退出超时时间: {}秒（原因: {:?}）", timeout.as_secs(), reason);
        tokio::time::sleep(timeout).await;
        warn!("优雅退出超时");
    }
}

#[cfg(unix)]
async fn wait_for_os_signal() -> ShutdownReason {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(i), Ok(t)) => (i, t),
        (Err(e), _) | (_, Err(e)) => {
            error!("信号处理器启动失败: {}，仅监听 Ctrl+C", e);
            return wait_for_ctrl_c().await;
        }
    };

    tokio::select! {
        _ = sigint.recv() => {
            info!("接收到SIGINT信号 (Ctrl+C)");
            ShutdownReason::Interrupt
        }
        _ = sigterm.recv() => {
            info!("接收到SIGTERM信号");
            ShutdownReason::Terminate
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_os_signal() -> ShutdownReason {
    wait_for_ctrl_c().await
}

async fn wait_for_ctrl_c() -> ShutdownReason {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("接收到 Ctrl+C");
            ShutdownReason::Interrupt
        }
        Err(e) => {
            error!("Ctrl+C 监听失败: {}", e);
            std::future::pending().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Shutdown, ShutdownReason};
    use std::time::Duration;

    #[tokio::test]
    async fn first_trigger_wins() {
        let shutdown = Shutdown::new();
        assert!(!shutdown.is_triggered());

        shutdown.trigger(ShutdownReason::Terminate);
        shutdown.trigger(ShutdownReason::Interrupt);

        assert!(shutdown.is_triggered());
        assert_eq!(shutdown.triggered().await, ShutdownReason::Terminate);
    }

    #[tokio::test]
    async fn waiters_are_woken_by_trigger() {
        let shutdown = Shutdown::new();
        let waiter = {
            let s = shutdown.clone();
            tokio::spawn(async move { s.triggered().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        shutdown.trigger(ShutdownReason::Application);

        let reason = tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter finished in time")
            .expect("join waiter");
        assert_eq!(reason, ShutdownReason::Application);
    }

    #[tokio::test]
    async fn deadline_waits_for_trigger_then_timeout() {
        let shutdown = Shutdown::new();
        let pending = tokio::time::timeout(
            Duration::from_millis(50),
            shutdown.deadline(Duration::from_millis(1)),
        )
        .await;
        assert!(pending.is_err(), "未触发时 deadline 不应结束");

        shutdown.trigger(ShutdownReason::Application);
        tokio::time::timeout(
            Duration::from_secs(1),
            shutdown.deadline(Duration::from_millis(5)),
        )
        .await
        .expect("deadline elapsed after trigger");
    }
}
