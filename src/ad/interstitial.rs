// src/ad/interstitial.rs

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::{info, warn};

use crate::ad::dispatcher::{DelegateDispatcher, PairedEvent};
use crate::ad::fetcher::{AdFetcher, FetchOutcome, FetchRequest};
use crate::ad::protocol::{AdDelegate, AdProtocol, RootViewController};
use crate::error::{AdError, AdResult};
use crate::model::payload::{AdPayload, AdSize};
use crate::model::targeting::TargetingContext;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterstitialState {
    Idle,
    Loading,
    Ready,
    Presented,
    Closed,
}

impl InterstitialState {
    pub fn as_str(&self) -> &'static str {
        match self {
            InterstitialState::Idle => "idle",
            InterstitialState::Loading => "loading",
            InterstitialState::Ready => "ready",
            InterstitialState::Presented => "presented",
            InterstitialState::Closed => "closed",
        }
    }
}

impl fmt::Display for InterstitialState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// **插屏广告**
///
/// 与 Banner 共用请求管理和回调分发，没有自动刷新。
/// 插屏广告的宿主必须实现 `ad_did_receive_ad`，否则无法知道何时可以展示。
#[derive(Debug)]
pub struct InterstitialAd {
    targeting: TargetingContext,
    state: InterstitialState,
    payload: Option<AdPayload>,
    fetcher: AdFetcher,
    dispatcher: DelegateDispatcher<dyn AdDelegate>,
    root_view_controller: Option<Weak<dyn RootViewController>>,
}

impl InterstitialAd {
    pub fn new(placement_id: &str) -> Self {
        Self {
            targeting: TargetingContext::new(placement_id),
            state: InterstitialState::Idle,
            payload: None,
            fetcher: AdFetcher::new(),
            dispatcher: DelegateDispatcher::new(),
            root_view_controller: None,
        }
    }

    pub fn state(&self) -> InterstitialState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == InterstitialState::Ready
    }

    pub fn payload(&self) -> Option<&AdPayload> {
        self.payload.as_ref()
    }

    pub fn set_delegate(&mut self, delegate: Option<&Arc<dyn AdDelegate>>) {
        self.dispatcher.set_delegate(delegate);
    }

    pub fn set_root_view_controller(&mut self, controller: Option<&Arc<dyn RootViewController>>) {
        self.root_view_controller = controller.map(Arc::downgrade);
    }

    fn root_view_controller(&self) -> Option<Arc<dyn RootViewController>> {
        self.root_view_controller.as_ref().and_then(Weak::upgrade)
    }

    fn invalid(&self, operation: &'static str) -> AdError {
        AdError::InvalidState {
            operation,
            state: self.state.as_str(),
        }
    }

    pub fn load_ad(&mut self) -> AdResult<FetchRequest> {
        match self.state {
            InterstitialState::Idle | InterstitialState::Loading | InterstitialState::Ready => {}
            InterstitialState::Presented | InterstitialState::Closed => {
                return Err(self.invalid("load_ad"))
            }
        }
        self.targeting.ensure_fetchable()?;

        let request = self.fetcher.fetch(self.targeting.snapshot(), AdSize::ZERO);
        info!(
            placement_id = %self.targeting.placement_id(),
            generation = request.generation,
            "loading interstitial ad"
        );
        self.state = InterstitialState::Loading;
        Ok(request)
    }

    /// 返回结果是否被接受（过期结果返回 false）
    pub fn complete_fetch(&mut self, generation: u64, outcome: FetchOutcome) -> bool {
        if !self.fetcher.accept(generation) {
            return false;
        }
        let payload = match outcome {
            Ok(payload) => payload,
            Err(_) if self.targeting.should_serve_psa() => AdPayload::public_service_announcement(),
            Err(error) => {
                warn!(placement_id = %self.targeting.placement_id(), %error, "interstitial request failed");
                self.state = InterstitialState::Idle;
                if let Some(delegate) = self.dispatcher.delegate() {
                    delegate.ad_request_failed(self, &error);
                }
                return true;
            }
        };

        self.payload = Some(payload);
        self.state = InterstitialState::Ready;
        if let Some(delegate) = self.dispatcher.delegate() {
            delegate.ad_did_receive_ad(self);
        }
        true
    }

    /// 全屏展示已经准备好的广告
    pub fn show(&mut self) -> AdResult<()> {
        if self.state != InterstitialState::Ready {
            return Err(self.invalid("show"));
        }
        let controller = match self.root_view_controller() {
            Some(controller) => controller,
            None => return Err(AdError::Config("interstitial requires a root view controller".to_string())),
        };

        if let Some(delegate) = self.dispatcher.begin_pair(PairedEvent::Present) {
            delegate.ad_will_present(self);
        }
        if let Some(payload) = self.payload.as_ref() {
            controller.present_interstitial(&payload.creative);
        }
        self.state = InterstitialState::Presented;
        if let Some(delegate) = self.dispatcher.end_pair(PairedEvent::Present) {
            delegate.ad_did_present(self);
        }
        Ok(())
    }

    pub fn handle_click(&mut self) -> AdResult<()> {
        if self.state != InterstitialState::Presented {
            return Err(self.invalid("handle_click"));
        }
        let click_url = self.payload.as_ref().and_then(|p| p.click_url.clone());
        if let Some(delegate) = self.dispatcher.delegate() {
            delegate.ad_was_clicked(self);
        }
        if self.targeting.opens_in_native_browser() {
            if let Some(delegate) = self.dispatcher.delegate() {
                delegate.ad_will_leave_application(self);
            }
            if let Some(controller) = self.root_view_controller() {
                controller.open_native_browser(click_url.as_deref());
            }
        } else {
            if let Some(delegate) = self.dispatcher.begin_pair(PairedEvent::Present) {
                delegate.ad_will_present(self);
            }
            match self.root_view_controller() {
                Some(controller) => controller.present_browser(click_url.as_deref()),
                None => warn!("no root view controller set, cannot present in-app browser"),
            }
            if let Some(delegate) = self.dispatcher.end_pair(PairedEvent::Present) {
                delegate.ad_did_present(self);
            }
        }
        Ok(())
    }

    /// 幂等关闭
    pub fn close(&mut self) -> bool {
        if self.state == InterstitialState::Closed {
            return false;
        }
        self.fetcher.cancel();
        if let Some(delegate) = self.dispatcher.begin_pair(PairedEvent::Close) {
            delegate.ad_will_close(self);
        }
        self.state = InterstitialState::Closed;
        self.payload = None;
        if let Some(delegate) = self.dispatcher.end_pair(PairedEvent::Close) {
            delegate.ad_did_close(self);
        }
        true
    }

    pub fn reset(&mut self) {
        self.fetcher.cancel();
        self.payload = None;
        self.state = InterstitialState::Idle;
    }
}

impl AdProtocol for InterstitialAd {
    fn targeting(&self) -> &TargetingContext {
        &self.targeting
    }

    fn targeting_mut(&mut self) -> &mut TargetingContext {
        &mut self.targeting
    }

    fn lifecycle_state(&self) -> &'static str {
        self.state.as_str()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::test_support::{RecordingController, RecordingDelegate};

    fn interstitial() -> (InterstitialAd, Arc<RecordingDelegate>, Arc<RecordingController>) {
        let mut ad = InterstitialAd::new("778");
        let recorder = Arc::new(RecordingDelegate::default());
        let delegate: Arc<dyn AdDelegate> = recorder.clone();
        ad.set_delegate(Some(&delegate));
        let controller = Arc::new(RecordingController::default());
        let root: Arc<dyn RootViewController> = controller.clone();
        ad.set_root_view_controller(Some(&root));
        (ad, recorder, controller)
    }

    #[test]
    fn load_then_show_presents_once() {
        let (mut ad, recorder, controller) = interstitial();
        let request = ad.load_ad().unwrap();
        assert!(ad.complete_fetch(request.generation, Ok(AdPayload::new("<html/>"))));
        assert!(ad.is_ready());

        ad.show().unwrap();
        assert_eq!(ad.state(), InterstitialState::Presented);
        assert!(ad.show().is_err());
        assert_eq!(recorder.events(), vec!["did_receive_ad", "will_present", "did_present"]);
        assert_eq!(controller.calls(), vec!["present_interstitial"]);
    }

    #[test]
    fn click_brackets_in_app_browser_presentation() {
        let (mut ad, recorder, controller) = interstitial();
        let request = ad.load_ad().unwrap();
        ad.complete_fetch(request.generation, Ok(AdPayload::new("<html/>")));
        ad.show().unwrap();
        recorder.clear();

        ad.handle_click().unwrap();
        assert_eq!(recorder.events(), vec!["was_clicked", "will_present", "did_present"]);
        assert_eq!(controller.calls(), vec!["present_interstitial", "present_browser"]);
    }

    #[test]
    fn click_with_native_browser_leaves_application() {
        let (mut ad, recorder, controller) = interstitial();
        ad.set_opens_in_native_browser(true);
        let request = ad.load_ad().unwrap();
        ad.complete_fetch(request.generation, Ok(AdPayload::new("<html/>")));
        ad.show().unwrap();
        recorder.clear();

        ad.handle_click().unwrap();
        assert_eq!(recorder.events(), vec!["was_clicked", "will_leave_application"]);
        assert_eq!(controller.calls(), vec!["present_interstitial", "open_native_browser"]);
    }

    #[test]
    fn stale_result_is_discarded() {
        let (mut ad, recorder, _controller) = interstitial();
        let first = ad.load_ad().unwrap();
        let second = ad.load_ad().unwrap();
        assert!(!ad.complete_fetch(first.generation, Ok(AdPayload::new("first"))));
        assert!(ad.complete_fetch(second.generation, Err(FetchError::NoFill)));
        assert_eq!(ad.state(), InterstitialState::Idle);
        assert_eq!(recorder.events(), vec!["request_failed:no ad available for this placement"]);
    }

    #[test]
    fn psa_makes_interstitial_ready() {
        let (mut ad, _recorder, _controller) = interstitial();
        ad.set_should_serve_public_service_announcements(true);
        let request = ad.load_ad().unwrap();
        ad.complete_fetch(request.generation, Err(FetchError::NoFill));
        assert!(ad.is_ready());
        assert!(ad.payload().unwrap().is_psa);
    }

    #[test]
    fn show_before_ready_is_invalid() {
        let (mut ad, _recorder, _controller) = interstitial();
        assert_eq!(
            ad.show().unwrap_err(),
            AdError::InvalidState { operation: "show", state: "idle" }
        );
    }

    #[test]
    fn close_fires_pair_once() {
        let (mut ad, recorder, _controller) = interstitial();
        let request = ad.load_ad().unwrap();
        ad.complete_fetch(request.generation, Ok(AdPayload::new("<html/>")));
        ad.show().unwrap();
        ad.handle_click().unwrap();
        recorder.clear();

        assert!(ad.close());
        assert!(!ad.close());
        assert_eq!(recorder.events(), vec!["will_close", "did_close"]);
        assert!(ad.load_ad().is_err());
    }
}
