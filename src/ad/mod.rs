pub mod banner;
pub mod dispatcher;
pub mod fetcher;
pub mod interstitial;
pub mod protocol;
pub mod scheduler;

pub use banner::{AdViewState, BannerAdView, BannerAdViewDelegate};
pub use fetcher::{AdFetcher, FetchOutcome, FetchRequest};
pub use interstitial::{InterstitialAd, InterstitialState};
pub use protocol::{AdDelegate, AdProtocol, RootViewController};
pub use scheduler::{RefreshInterval, RefreshScheduler, RefreshTimer};
