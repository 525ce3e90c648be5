pub mod banner_runtime;

pub use banner_runtime::{BannerHandle, BannerRuntime, BannerStatus};
