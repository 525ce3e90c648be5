// src/model/payload.rs

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 广告尺寸，{0, 0} 表示 "sizeless"，由服务端决定尺寸
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct AdSize {
    pub width: f64,
    pub height: f64,
}

impl AdSize {
    pub const ZERO: AdSize = AdSize { width: 0.0, height: 0.0 };

    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_sizeless(&self) -> bool {
        self.width <= 0.0 && self.height <= 0.0
    }
}

/// 视图在宿主中的位置与大小
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn size(&self) -> AdSize {
        AdSize::new(self.width, self.height)
    }
}

/// 广告服务端返回的展示内容（对 SDK 来说是不透明的）
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct AdPayload {
    /// 创意内容（HTML 或 URL）
    pub creative: String,
    /// 服务端指定的尺寸，仅对 sizeless 视图生效
    #[serde(default)]
    pub size: Option<AdSize>,
    #[serde(default)]
    pub click_url: Option<String>,
    #[serde(default)]
    pub is_psa: bool,
}

static PSA_PAYLOAD: Lazy<AdPayload> = Lazy::new(|| AdPayload {
    creative: "<html><body>Public Service Announcement</body></html>".to_string(),
    size: None,
    click_url: None,
    is_psa: true,
});

impl AdPayload {
    pub fn new(creative: &str) -> Self {
        Self {
            creative: creative.to_string(),
            size: None,
            click_url: None,
            is_psa: false,
        }
    }

    /// 没有付费广告时用来兜底的公益广告
    pub fn public_service_announcement() -> Self {
        PSA_PAYLOAD.clone()
    }
}
