// src/error.rs

use thiserror::Error;

pub type AdResult<T> = Result<T, AdError>;

/// 宿主调用 SDK 时可能遇到的错误（配置 / 用法错误，不会自动重试）
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AdError {
    #[error("placement id must be set before loading an ad")]
    MissingPlacementId,

    #[error("`{operation}` is not allowed while the ad is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("invalid auto refresh interval: {0} (must be 0 or a positive number of seconds)")]
    InvalidRefreshInterval(f64),

    #[error("invalid reserve price: {0} (must be a non-negative number)")]
    InvalidReserve(f64),

    #[error("invalid location: {0}")]
    InvalidLocation(String),

    #[error("ad runtime has shut down")]
    RuntimeClosed,

    #[error("Configuration error: {0}")]
    Config(String),
}

/// 广告请求失败原因，由传输层产生，经 `requestFailedWithError` 回调给宿主
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("no ad available for this placement")]
    NoFill,

    #[error("network error: {0}")]
    Network(String),

    #[error("ad request timed out after {0} ms")]
    Timeout(u64),

    #[error("invalid ad response: {0}")]
    InvalidResponse(String),

    #[error("ad server returned status {0}")]
    Server(u16),
}
