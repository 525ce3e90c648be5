// src/ad/protocol.rs

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::error::{AdResult, FetchError};
use crate::model::targeting::{Gender, Location, TargetingContext};

/// **所有广告类型共有的属性与方法**
///
/// 实现者只需要提供 `targeting` / `targeting_mut` / `lifecycle_state`，其余方法都有默认实现。
/// Banner 和 Interstitial 都是基于它实现的，也可以用它实现自定义的广告类型。
pub trait AdProtocol {
    fn targeting(&self) -> &TargetingContext;

    fn targeting_mut(&mut self) -> &mut TargetingContext;

    /// 当前生命周期状态的名字，例如 "loading"、"displayed"
    fn lifecycle_state(&self) -> &'static str;

    fn placement_id(&self) -> &str {
        self.targeting().placement_id()
    }

    fn set_placement_id(&mut self, placement_id: &str) {
        self.targeting_mut().set_placement_id(placement_id);
    }

    /// 点击广告时是否打开系统浏览器
    fn opens_in_native_browser(&self) -> bool {
        self.targeting().opens_in_native_browser()
    }

    fn set_opens_in_native_browser(&mut self, opens_in_native_browser: bool) {
        self.targeting_mut().set_opens_in_native_browser(opens_in_native_browser);
    }

    /// 没有广告时是否展示公益广告（PSA）
    fn should_serve_public_service_announcements(&self) -> bool {
        self.targeting().should_serve_psa()
    }

    fn set_should_serve_public_service_announcements(&mut self, should_serve: bool) {
        self.targeting_mut().set_should_serve_psa(should_serve);
    }

    fn location(&self) -> Option<&Location> {
        self.targeting().location()
    }

    fn set_location(
        &mut self,
        latitude: f64,
        longitude: f64,
        timestamp: DateTime<Utc>,
        horizontal_accuracy: f64,
    ) -> AdResult<()> {
        self.targeting_mut()
            .set_location(latitude, longitude, timestamp, horizontal_accuracy)
    }

    fn reserve(&self) -> f64 {
        self.targeting().reserve()
    }

    fn set_reserve(&mut self, reserve: f64) -> AdResult<()> {
        self.targeting_mut().set_reserve(reserve)
    }

    fn age(&self) -> Option<&str> {
        self.targeting().age()
    }

    fn set_age(&mut self, age: &str) {
        self.targeting_mut().set_age(age);
    }

    fn gender(&self) -> Gender {
        self.targeting().gender()
    }

    fn set_gender(&mut self, gender: Gender) {
        self.targeting_mut().set_gender(gender);
    }

    fn custom_keywords(&self) -> &HashMap<String, String> {
        self.targeting().custom_keywords()
    }

    fn add_custom_keyword(&mut self, key: &str, value: &str) {
        self.targeting_mut().add_custom_keyword(key, value);
    }

    fn remove_custom_keyword(&mut self, key: &str) {
        self.targeting_mut().remove_custom_keyword(key);
    }

    #[deprecated(note = "use `opens_in_native_browser` instead")]
    fn click_should_open_in_browser(&self) -> bool {
        self.opens_in_native_browser()
    }

    #[deprecated(note = "use `set_opens_in_native_browser` instead")]
    fn set_click_should_open_in_browser(&mut self, value: bool) {
        self.set_opens_in_native_browser(value);
    }
}

/// 所有广告类型共用的回调，全部可选
pub trait AdDelegate: Send + Sync {
    /// 广告内容已经成功取回
    fn ad_did_receive_ad(&self, _ad: &dyn AdProtocol) {}

    fn ad_request_failed(&self, _ad: &dyn AdProtocol, _error: &FetchError) {}

    fn ad_was_clicked(&self, _ad: &dyn AdProtocol) {}

    fn ad_will_close(&self, _ad: &dyn AdProtocol) {}

    fn ad_did_close(&self, _ad: &dyn AdProtocol) {}

    /// 点击后即将在 SDK 内置浏览器中打开
    fn ad_will_present(&self, _ad: &dyn AdProtocol) {}

    fn ad_did_present(&self, _ad: &dyn AdProtocol) {}

    /// 即将离开应用（例如 `opens_in_native_browser` 为 true）
    fn ad_will_leave_application(&self, _ad: &dyn AdProtocol) {}
}

/// 宿主的根视图控制器，SDK 只持有弱引用
pub trait RootViewController: Send + Sync {
    fn present_browser(&self, _click_url: Option<&str>) {}

    fn open_native_browser(&self, _click_url: Option<&str>) {}

    fn present_interstitial(&self, _creative: &str) {}
}
