// src/model/placements.rs

use serde::{Serialize, Deserialize};
use std::convert::TryFrom;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8", into = "u8")]
pub enum AdType {
    Banner = 1,
    Interstitial = 2,
}

impl TryFrom<u8> for AdType {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(AdType::Banner),
            2 => Ok(AdType::Interstitial),
            _ => Err(format!("Invalid value for AdType: {}", value)),
        }
    }
}

impl From<AdType> for u8 {
    fn from(ad: AdType) -> Self {
        ad as u8
    }
}

pub const PLACEMENT_ENABLED: u8 = 1;
pub const PLACEMENT_DISABLED: u8 = 2;

fn default_status() -> u8 {
    PLACEMENT_ENABLED
}

/// 广告位配置
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PlacementConfig {
    pub placement_id: String,              // 广告位 ID
    pub ad_type: AdType,                   // 广告位类型
    #[serde(default)]
    pub width: f64,                        // 宽，0 表示 sizeless
    #[serde(default)]
    pub height: f64,                       // 高，0 表示 sizeless
    #[serde(default)]
    pub auto_refresh_interval: Option<f64>, // 自动刷新间隔（秒），None 使用默认值 30
    #[serde(default)]
    pub reserve: Option<f64>,              // 底价
    #[serde(default)]
    pub should_serve_psa: bool,            // 无广告时是否展示公益广告
    #[serde(default)]
    pub opens_in_native_browser: bool,     // 点击时是否跳转系统浏览器
    #[serde(default = "default_status")]
    pub status: u8,                        // 状态：1 = 开启, 2 = 禁用
}

impl PlacementConfig {
    pub fn is_enabled(&self) -> bool {
        self.status == PLACEMENT_ENABLED
    }
}
