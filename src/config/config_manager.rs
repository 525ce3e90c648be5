// src/config/config_manager.rs

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::ad::banner::BannerAdView;
use crate::ad::interstitial::InterstitialAd;
use crate::ad::protocol::AdProtocol;
use crate::error::{AdError, AdResult};
use crate::model::payload::{AdSize, Rect};
use crate::model::placements::{AdType, PlacementConfig};
use crate::transport::http::DEFAULT_REQUEST_TIMEOUT_MS;

/// SDK 全局设置
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SdkSettings {
    pub ad_server_url: String,
    pub request_timeout_ms: u64,
    pub log_dir: String,
}

impl Default for SdkSettings {
    fn default() -> Self {
        Self {
            ad_server_url: "http://localhost:9001/ad".to_string(),
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            log_dir: "logs".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigManager {
    pub settings: SdkSettings,
    placements: HashMap<String, PlacementConfig>,
}

impl ConfigManager {
    pub fn new(settings: SdkSettings) -> Self {
        ConfigManager {
            settings,
            placements: HashMap::new(),
        }
    }

    /// 整体替换广告位配置
    pub fn update_placements(&mut self, placements: Vec<PlacementConfig>) {
        self.placements = placements
            .into_iter()
            .map(|p| (p.placement_id.clone(), p))
            .collect();
        info!("Loaded {} placements", self.placements.len());
    }

    pub fn get_placement(&self, placement_id: &str) -> Option<&PlacementConfig> {
        self.placements.get(placement_id)
    }

    pub fn active_placements(&self) -> Vec<PlacementConfig> {
        self.placements.values().filter(|p| p.is_enabled()).cloned().collect()
    }

    fn enabled_placement(&self, placement_id: &str, ad_type: AdType) -> AdResult<&PlacementConfig> {
        let placement = self
            .get_placement(placement_id)
            .ok_or_else(|| AdError::Config(format!("unknown placement {}", placement_id)))?;
        if !placement.is_enabled() {
            return Err(AdError::Config(format!("placement {} is disabled", placement_id)));
        }
        if placement.ad_type != ad_type {
            return Err(AdError::Config(format!(
                "placement {} is configured as {:?}, not {:?}",
                placement_id, placement.ad_type, ad_type
            )));
        }
        Ok(placement)
    }

    /// 按广告位配置创建 Banner。配置里的尺寸为 0 时视图是 sizeless 的
    pub fn banner_view(&self, placement_id: &str, frame: Rect) -> AdResult<BannerAdView> {
        let placement = self.enabled_placement(placement_id, AdType::Banner)?;
        let ad_size = AdSize::new(placement.width, placement.height);
        let mut view = BannerAdView::with_ad_size(frame, placement_id, ad_size);
        if let Some(interval) = placement.auto_refresh_interval {
            view.set_auto_refresh_interval(interval)?;
        }
        apply_common(&mut view, placement)?;
        Ok(view)
    }

    pub fn interstitial(&self, placement_id: &str) -> AdResult<InterstitialAd> {
        let placement = self.enabled_placement(placement_id, AdType::Interstitial)?;
        let mut ad = InterstitialAd::new(placement_id);
        apply_common(&mut ad, placement)?;
        Ok(ad)
    }
}

fn apply_common(ad: &mut dyn AdProtocol, placement: &PlacementConfig) -> AdResult<()> {
    if let Some(reserve) = placement.reserve {
        if let Err(e) = ad.set_reserve(reserve) {
            warn!(placement_id = %placement.placement_id, "invalid reserve in placement config: {}", e);
            return Err(e);
        }
    }
    ad.set_should_serve_public_service_announcements(placement.should_serve_psa);
    ad.set_opens_in_native_browser(placement.opens_in_native_browser);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::placements::PLACEMENT_DISABLED;

    fn placement(id: &str, ad_type: AdType) -> PlacementConfig {
        PlacementConfig {
            placement_id: id.to_string(),
            ad_type,
            width: 320.0,
            height: 50.0,
            auto_refresh_interval: Some(10.0),
            reserve: Some(0.25),
            should_serve_psa: true,
            opens_in_native_browser: true,
            status: 1,
        }
    }

    fn manager() -> ConfigManager {
        let mut disabled = placement("off", AdType::Banner);
        disabled.status = PLACEMENT_DISABLED;
        let mut config = ConfigManager::new(SdkSettings::default());
        config.update_placements(vec![
            placement("1326299", AdType::Banner),
            placement("778", AdType::Interstitial),
            disabled,
        ]);
        config
    }

    #[test]
    fn banner_applies_placement_settings() {
        let view = manager()
            .banner_view("1326299", Rect::new(0.0, 0.0, 320.0, 50.0))
            .unwrap();
        assert_eq!(view.auto_refresh_interval(), 15.0);
        assert_eq!(view.reserve(), 0.25);
        assert!(view.should_serve_public_service_announcements());
        assert!(view.opens_in_native_browser());
        assert_eq!(view.ad_size(), AdSize::new(320.0, 50.0));
    }

    #[test]
    fn unknown_disabled_and_mismatched_placements_are_rejected() {
        let config = manager();
        let frame = Rect::new(0.0, 0.0, 320.0, 50.0);
        assert!(matches!(config.banner_view("nope", frame), Err(AdError::Config(_))));
        assert!(matches!(config.banner_view("off", frame), Err(AdError::Config(_))));
        assert!(matches!(config.banner_view("778", frame), Err(AdError::Config(_))));
        assert!(config.interstitial("778").is_ok());
        assert_eq!(config.active_placements().len(), 2);
    }

    #[test]
    fn invalid_reserve_in_config_is_an_error() {
        let mut bad = placement("bad", AdType::Banner);
        bad.reserve = Some(-2.0);
        let mut config = ConfigManager::new(SdkSettings::default());
        config.update_placements(vec![bad]);
        assert_eq!(
            config.banner_view("bad", Rect::default()).unwrap_err(),
            AdError::InvalidReserve(-2.0)
        );
    }
}
