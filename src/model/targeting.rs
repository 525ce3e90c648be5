// src/model/targeting.rs

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{AdError, AdResult};

/// 用户性别
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    Unknown,
    Male,
    Female,
}

/// 用户位置。四个字段必须一起设置，外部无法看到只设置了一部分的位置
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Location {
    latitude: f64,
    longitude: f64,
    timestamp: DateTime<Utc>,
    horizontal_accuracy: f64,
}

impl Location {
    pub fn new(
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        horizontal_accuracy: f64,
    ) -> AdResult<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(AdError::InvalidLocation(format!("latitude {} out of range", latitude)));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(AdError::InvalidLocation(format!("longitude {} out of range", longitude)));
        }
        if !horizontal_accuracy.is_finite() || horizontal_accuracy < 0.0 {
            return Err(AdError::InvalidLocation(format!(
                "horizontal accuracy {} must be non-negative",
                horizontal_accuracy
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            timestamp,
            horizontal_accuracy,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn horizontal_accuracy(&self) -> f64 {
        self.horizontal_accuracy
    }
}

/// **广告定向上下文**
///
/// 在发起请求之前可以随意修改；每次请求都会通过 [`TargetingContext::snapshot`]
/// 拿走一份不可变快照，之后的修改不会影响正在进行中的请求。
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct TargetingContext {
    placement_id: String,
    /// 年龄：可以是数字年龄、出生年份或者区间，例如 "56"、"1974"、"25-35"，不做校验
    age: Option<String>,
    gender: Gender,
    location: Option<Location>,
    /// 底价，0 表示不设底价
    reserve: f64,
    custom_keywords: HashMap<String, String>,
    should_serve_psa: bool,
    opens_in_native_browser: bool,
}

impl TargetingContext {
    pub fn new(placement_id: &str) -> Self {
        Self {
            placement_id: placement_id.to_string(),
            ..Self::default()
        }
    }

    pub fn placement_id(&self) -> &str {
        &self.placement_id
    }

    pub fn set_placement_id(&mut self, placement_id: &str) {
        self.placement_id = placement_id.to_string();
    }

    pub fn age(&self) -> Option<&str> {
        self.age.as_deref()
    }

    pub fn set_age(&mut self, age: &str) {
        self.age = if age.is_empty() { None } else { Some(age.to_string()) };
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn set_gender(&mut self, gender: Gender) {
        self.gender = gender;
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    /// 原子地设置位置：校验失败时保留原来的位置
    pub fn set_location(
        &mut self,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        horizontal_accuracy: f64,
    ) -> AdResult<()> {
        let location = Location::new(latitude, longitude, timestamp, horizontal_accuracy)?;
        self.location = Some(location);
        Ok(())
    }

    pub fn clear_location(&mut self) {
        self.location = None;
    }

    pub fn reserve(&self) -> f64 {
        self.reserve
    }

    pub fn set_reserve(&mut self, reserve: f64) -> AdResult<()> {
        if !reserve.is_finite() || reserve < 0.0 {
            return Err(AdError::InvalidReserve(reserve));
        }
        self.reserve = reserve;
        Ok(())
    }

    pub fn custom_keywords(&self) -> &HashMap<String, String> {
        &self.custom_keywords
    }

    /// 插入或覆盖
    pub fn add_custom_keyword(&mut self, key: &str, value: &str) {
        self.custom_keywords.insert(key.to_string(), value.to_string());
    }

    pub fn remove_custom_keyword(&mut self, key: &str) {
        self.custom_keywords.remove(key);
    }

    pub fn should_serve_psa(&self) -> bool {
        self.should_serve_psa
    }

    pub fn set_should_serve_psa(&mut self, should_serve_psa: bool) {
        self.should_serve_psa = should_serve_psa;
    }

    pub fn opens_in_native_browser(&self) -> bool {
        self.opens_in_native_browser
    }

    pub fn set_opens_in_native_browser(&mut self, opens_in_native_browser: bool) {
        self.opens_in_native_browser = opens_in_native_browser;
    }

    /// 请求前检查：placement id 不能为空
    pub fn ensure_fetchable(&self) -> AdResult<()> {
        if self.placement_id.trim().is_empty() {
            return Err(AdError::MissingPlacementId);
        }
        Ok(())
    }

    /// 拍一份不可变快照交给请求使用
    pub fn snapshot(&self) -> Arc<TargetingContext> {
        Arc::new(self.clone())
    }
}
