// src/lib.rs

//! Banner / 插屏广告 SDK 的核心：纯状态机 (`ad`)、传输层 (`transport`)
//! 以及把两者接到 tokio 上的运行时 (`runtime`)。

pub mod ad;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod runtime;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use ad::{
    AdDelegate, AdProtocol, AdViewState, BannerAdView, BannerAdViewDelegate, InterstitialAd,
    InterstitialState, RootViewController,
};
pub use error::{AdError, AdResult, FetchError};
pub use model::payload::{AdPayload, AdSize, Rect};
pub use model::targeting::{Gender, Location, TargetingContext};
pub use runtime::{BannerHandle, BannerRuntime, BannerStatus};
pub use transport::{AdTransport, HttpTransport};
