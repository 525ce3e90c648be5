// src/test_support.rs

use std::sync::Mutex;

use crate::ad::banner::{BannerAdView, BannerAdViewDelegate};
use crate::ad::protocol::{AdDelegate, AdProtocol, RootViewController};
use crate::error::FetchError;
use crate::model::payload::Rect;

/// 记录所有回调的代理
#[derive(Default)]
pub struct RecordingDelegate {
    events: Mutex<Vec<String>>,
    states: Mutex<Vec<&'static str>>,
}

impl RecordingDelegate {
    fn push(&self, event: String) {
        self.events.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }

    pub fn count(&self, event: &str) -> usize {
        self.events.lock().unwrap().iter().filter(|e| e.as_str() == event).count()
    }

    /// 失败回调触发时广告所处的状态
    pub fn states_seen(&self) -> Vec<&'static str> {
        self.states.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
        self.states.lock().unwrap().clear();
    }
}

impl AdDelegate for RecordingDelegate {
    fn ad_did_receive_ad(&self, _ad: &dyn AdProtocol) {
        self.push("did_receive_ad".to_string());
    }

    fn ad_request_failed(&self, ad: &dyn AdProtocol, error: &FetchError) {
        self.states.lock().unwrap().push(ad.lifecycle_state());
        self.push(format!("request_failed:{}", error));
    }

    fn ad_was_clicked(&self, _ad: &dyn AdProtocol) {
        self.push("was_clicked".to_string());
    }

    fn ad_will_close(&self, _ad: &dyn AdProtocol) {
        self.push("will_close".to_string());
    }

    fn ad_did_close(&self, _ad: &dyn AdProtocol) {
        self.push("did_close".to_string());
    }

    fn ad_will_present(&self, _ad: &dyn AdProtocol) {
        self.push("will_present".to_string());
    }

    fn ad_did_present(&self, _ad: &dyn AdProtocol) {
        self.push("did_present".to_string());
    }

    fn ad_will_leave_application(&self, _ad: &dyn AdProtocol) {
        self.push("will_leave_application".to_string());
    }
}

impl BannerAdViewDelegate for RecordingDelegate {
    fn banner_will_resize_to_frame(&self, view: &BannerAdView, frame: Rect) {
        self.push(format!("will_resize:{}->{}", view.frame().height, frame.height));
    }

    fn banner_did_resize(&self, view: &BannerAdView) {
        self.push(format!("did_resize:{}", view.frame().height));
    }
}

#[derive(Default)]
pub struct RecordingController {
    calls: Mutex<Vec<&'static str>>,
}

impl RecordingController {
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }
}

impl RootViewController for RecordingController {
    fn present_browser(&self, _click_url: Option<&str>) {
        self.calls.lock().unwrap().push("present_browser");
    }

    fn open_native_browser(&self, _click_url: Option<&str>) {
        self.calls.lock().unwrap().push("open_native_browser");
    }

    fn present_interstitial(&self, _creative: &str) {
        self.calls.lock().unwrap().push("present_interstitial");
    }
}
