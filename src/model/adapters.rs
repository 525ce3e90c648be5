// src/model/adapters.rs

use crate::error::{AdError, AdResult};
use crate::model::placements::PlacementConfig;
use std::fs;

pub trait ConfigAdapter: Send + Sync {
    fn get_placements(&self) -> AdResult<Vec<PlacementConfig>>;
}

/// 从本地 JSON 文件读取广告位配置
pub struct FileConfigAdapter {
    pub placement_file: String,
}

impl FileConfigAdapter {
    pub fn new(placement_file: &str) -> Self {
        Self {
            placement_file: placement_file.to_string(),
        }
    }
}

impl ConfigAdapter for FileConfigAdapter {
    fn get_placements(&self) -> AdResult<Vec<PlacementConfig>> {
        let content = fs::read_to_string(&self.placement_file).map_err(|e| {
            AdError::Config(format!("unable to read {}: {}", self.placement_file, e))
        })?;
        serde_json::from_str(&content).map_err(|e| {
            AdError::Config(format!("unable to parse {}: {}", self.placement_file, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::placements::AdType;

    fn write_temp(content: &str) -> String {
        let path = std::env::temp_dir().join(format!("placements-{}.json", uuid::Uuid::new_v4()));
        fs::write(&path, content).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[test]
    fn reads_placements_from_file() {
        let path = write_temp(
            r#"[{"placement_id":"1326299","ad_type":1,"width":300,"height":50},
                {"placement_id":"778","ad_type":2,"status":2}]"#,
        );
        let placements = FileConfigAdapter::new(&path).get_placements().unwrap();
        assert_eq!(placements.len(), 2);
        assert_eq!(placements[1].ad_type, AdType::Interstitial);
        assert!(!placements[1].is_enabled());
        let _ = fs::remove_file(path);
    }

    #[test]
    fn missing_file_is_a_config_error() {
        let adapter = FileConfigAdapter::new("/nonexistent/placements.json");
        assert!(matches!(adapter.get_placements(), Err(AdError::Config(_))));
    }

    #[test]
    fn malformed_file_is_a_config_error() {
        let path = write_temp("{not json");
        assert!(matches!(FileConfigAdapter::new(&path).get_placements(), Err(AdError::Config(_))));
        let _ = fs::remove_file(path);
    }
}
