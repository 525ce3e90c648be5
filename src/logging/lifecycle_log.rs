// src/logging/lifecycle_log.rs

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// 回调事件类型
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    AdDidReceiveAd,
    RequestFailed,
    AdWasClicked,
    AdWillClose,
    AdDidClose,
    AdWillPresent,
    AdDidPresent,
    AdWillLeaveApplication,
    WillResize,
    DidResize,
}

/// **广告生命周期日志**
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LifecycleRecord {
    pub timestamp: String,      // 记录时间
    pub log_type: String,       // 日志类型，固定为 "ad_lifecycle"
    pub placement_id: String,   // 广告位 ID
    pub event: LifecycleEvent,  // 回调事件
    pub state: String,          // 回调触发时广告所处的状态
    pub detail: Option<String>, // 失败原因、resize 目标尺寸等
}

impl LifecycleRecord {
    pub fn new(placement_id: &str, event: LifecycleEvent, state: &str) -> Self {
        Self {
            timestamp: Utc::now().to_rfc3339(),
            log_type: "ad_lifecycle".to_string(),
            placement_id: placement_id.to_string(),
            event,
            state: state.to_string(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}
