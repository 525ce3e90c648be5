// src/transport/mod.rs

pub mod http;
pub mod mock_server;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ad::fetcher::{FetchOutcome, FetchRequest};
use crate::model::payload::AdSize;
use crate::model::targeting::TargetingContext;

pub use http::HttpTransport;

/// **广告请求传输层**
///
/// 返回的 future 可能在任意时刻完成，完成顺序也不保证与发起顺序一致，
/// 过期结果由 `AdFetcher` 负责过滤。
pub trait AdTransport: Send + Sync {
    fn perform_fetch(&self, request: &FetchRequest) -> BoxFuture<'static, FetchOutcome>;
}

/// 发给广告服务端的请求体
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct AdRequestBody {
    pub request_id: Uuid,
    pub placement_id: String,
    pub ad_size: AdSize,
    pub targeting: TargetingContext,
}

impl From<&FetchRequest> for AdRequestBody {
    fn from(request: &FetchRequest) -> Self {
        Self {
            request_id: request.id,
            placement_id: request.targeting.placement_id().to_string(),
            ad_size: request.ad_size,
            targeting: (*request.targeting).clone(),
        }
    }
}
