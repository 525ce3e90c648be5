// src/logging/mod.rs

pub mod lifecycle_log;
pub mod logger;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

pub use lifecycle_log::{LifecycleEvent, LifecycleRecord};
pub use logger::LifecycleJournal;

/// 初始化全局 tracing 日志，JSON 格式按小时滚动写入 `log_dir`。
/// 返回的 guard 需要一直持有，否则后台写线程会提前退出
pub fn init_tracing(log_dir: &str) -> Result<WorkerGuard, tracing::subscriber::SetGlobalDefaultError> {
    let log_file = rolling::hourly(log_dir, "adsdk_log.json");
    let (non_blocking, guard) = tracing_appender::non_blocking(log_file);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(guard)
}
