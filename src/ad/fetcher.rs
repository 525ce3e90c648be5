// src/ad/fetcher.rs

use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::error::FetchError;
use crate::model::payload::{AdPayload, AdSize};
use crate::model::targeting::TargetingContext;

pub type FetchOutcome = Result<AdPayload, FetchError>;

/// 一次广告请求。`generation` 用来识别并丢弃过期的结果
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub id: Uuid,
    pub generation: u64,
    pub targeting: Arc<TargetingContext>,
    pub ad_size: AdSize,
}

/// **单飞请求管理器**
///
/// 每个广告视图同一时间最多只有一个请求在途。新请求会让旧请求过期，
/// 取消只是推进代数，不会中断传输层，旧结果回来时直接丢弃。
#[derive(Debug, Default)]
pub struct AdFetcher {
    generation: u64,
    in_flight: Option<u64>,
}

impl AdFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fetch(&mut self, targeting: Arc<TargetingContext>, ad_size: AdSize) -> FetchRequest {
        if let Some(previous) = self.in_flight {
            debug!(generation = previous, "superseding in-flight ad request");
        }
        self.generation += 1;
        self.in_flight = Some(self.generation);
        FetchRequest {
            id: Uuid::new_v4(),
            generation: self.generation,
            targeting,
            ad_size,
        }
    }

    /// 返回是否真的有请求被取消
    pub fn cancel(&mut self) -> bool {
        self.generation += 1;
        self.in_flight.take().is_some()
    }

    /// 每个代数的结果只会被接受一次，其余一律视为过期
    pub fn accept(&mut self, generation: u64) -> bool {
        if self.in_flight == Some(generation) {
            self.in_flight = None;
            true
        } else {
            debug!(generation, current = self.generation, "discarding stale ad response");
            false
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.is_some()
    }
}
