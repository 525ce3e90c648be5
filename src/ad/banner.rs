// src/ad/banner.rs

use std::fmt;
use std::sync::{Arc, Weak};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::ad::dispatcher::{DelegateDispatcher, PairedEvent};
use crate::ad::fetcher::{AdFetcher, FetchOutcome, FetchRequest};
use crate::ad::protocol::{AdDelegate, AdProtocol, RootViewController};
use crate::ad::scheduler::{RefreshScheduler, RefreshTimer};
use crate::error::{AdError, AdResult};
use crate::model::payload::{AdPayload, AdSize, Rect};
use crate::model::targeting::TargetingContext;

/// Banner 视图的生命周期状态
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AdViewState {
    Idle,
    Loading,
    Displayed,
    Resizing,
    /// 短暂状态，回调结束后立即回到 Idle
    Failed,
    Closed,
}

impl AdViewState {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdViewState::Idle => "idle",
            AdViewState::Loading => "loading",
            AdViewState::Displayed => "displayed",
            AdViewState::Resizing => "resizing",
            AdViewState::Failed => "failed",
            AdViewState::Closed => "closed",
        }
    }
}

impl fmt::Display for AdViewState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Banner 专有的回调，通用回调见 [`AdDelegate`]
pub trait BannerAdViewDelegate: AdDelegate {
    /// 可展开广告即将改变视图大小，此时 frame 还没有变化
    fn banner_will_resize_to_frame(&self, _view: &BannerAdView, _frame: Rect) {}

    fn banner_did_resize(&self, _view: &BannerAdView) {}
}

/// **Banner 广告视图**
///
/// 纯状态机，不做任何 IO：`load_ad` 返回需要交给传输层的请求，
/// `complete_fetch` 返回需要布置的刷新定时器，计时和网络都由运行时驱动
/// （见 `runtime::banner_runtime`）。
#[derive(Debug)]
pub struct BannerAdView {
    targeting: TargetingContext,
    frame: Rect,
    ad_size: AdSize,
    content_size: Option<AdSize>,
    state: AdViewState,
    payload: Option<AdPayload>,
    pending_frame: Option<Rect>,
    /// resize 期间触发过刷新，resize 结束后重新布置
    refresh_deferred: bool,
    fetcher: AdFetcher,
    scheduler: RefreshScheduler,
    dispatcher: DelegateDispatcher<dyn BannerAdViewDelegate>,
    root_view_controller: Option<Weak<dyn RootViewController>>,
}

impl BannerAdView {
    /// 广告尺寸取 frame 的大小
    pub fn new(frame: Rect, placement_id: &str) -> Self {
        Self::with_ad_size(frame, placement_id, frame.size())
    }

    /// `ad_size` 为 {0, 0} 时视图是 sizeless 的，由服务端决定内容尺寸
    pub fn with_ad_size(frame: Rect, placement_id: &str, ad_size: AdSize) -> Self {
        Self {
            targeting: TargetingContext::new(placement_id),
            frame,
            ad_size,
            content_size: None,
            state: AdViewState::Idle,
            payload: None,
            pending_frame: None,
            refresh_deferred: false,
            fetcher: AdFetcher::new(),
            scheduler: RefreshScheduler::default(),
            dispatcher: DelegateDispatcher::new(),
            root_view_controller: None,
        }
    }

    pub fn state(&self) -> AdViewState {
        self.state
    }

    pub fn frame(&self) -> Rect {
        self.frame
    }

    pub fn ad_size(&self) -> AdSize {
        self.ad_size
    }

    /// sizeless 视图展示广告后由服务端给出的尺寸
    pub fn content_size(&self) -> Option<AdSize> {
        self.content_size
    }

    pub fn payload(&self) -> Option<&AdPayload> {
        self.payload.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.fetcher.generation()
    }

    pub fn is_fetch_in_flight(&self) -> bool {
        self.fetcher.is_in_flight()
    }

    pub fn is_refresh_armed(&self) -> bool {
        self.scheduler.is_armed()
    }

    pub fn auto_refresh_interval(&self) -> f64 {
        self.scheduler.interval().as_secs_f64()
    }

    /// 不会重新安排已经布置的定时器，下一次布置时生效
    pub fn set_auto_refresh_interval(&mut self, seconds: f64) -> AdResult<()> {
        self.scheduler.set_interval(seconds).map(|_| ())
    }

    pub fn set_delegate(&mut self, delegate: Option<&Arc<dyn BannerAdViewDelegate>>) {
        self.dispatcher.set_delegate(delegate);
    }

    pub fn delegate(&self) -> Option<Arc<dyn BannerAdViewDelegate>> {
        self.dispatcher.delegate()
    }

    pub fn set_root_view_controller(&mut self, controller: Option<&Arc<dyn RootViewController>>) {
        self.root_view_controller = controller.map(Arc::downgrade);
    }

    pub fn root_view_controller(&self) -> Option<Arc<dyn RootViewController>> {
        self.root_view_controller.as_ref().and_then(Weak::upgrade)
    }

    fn invalid(&self, operation: &'static str) -> AdError {
        AdError::InvalidState {
            operation,
            state: self.state.as_str(),
        }
    }

    /// **加载一条广告**
    ///
    /// Loading 状态下再次调用会让之前的请求过期。任何宿主主动加载都会取消待触发的刷新。
    pub fn load_ad(&mut self) -> AdResult<FetchRequest> {
        match self.state {
            AdViewState::Idle
            | AdViewState::Loading
            | AdViewState::Displayed
            | AdViewState::Failed => {}
            AdViewState::Resizing | AdViewState::Closed => return Err(self.invalid("load_ad")),
        }
        self.targeting.ensure_fetchable()?;

        self.scheduler.cancel();
        self.refresh_deferred = false;
        let request = self.fetcher.fetch(self.targeting.snapshot(), self.ad_size);
        info!(
            placement_id = %self.targeting.placement_id(),
            generation = request.generation,
            request_id = %request.id,
            from = %self.state,
            "loading banner ad"
        );
        self.state = AdViewState::Loading;
        Ok(request)
    }

    /// **请求完成**
    ///
    /// 过期的结果直接丢弃，不会触发任何回调。成功（或 PSA 兜底）后返回需要布置的刷新定时器。
    pub fn complete_fetch(&mut self, generation: u64, outcome: FetchOutcome) -> Option<RefreshTimer> {
        if !self.fetcher.accept(generation) {
            return None;
        }

        match outcome {
            Ok(payload) => self.display(payload),
            Err(error) if self.targeting.should_serve_psa() => {
                info!(
                    placement_id = %self.targeting.placement_id(),
                    %error,
                    "ad request failed, serving public service announcement"
                );
                self.display(AdPayload::public_service_announcement())
            }
            Err(error) => {
                warn!(placement_id = %self.targeting.placement_id(), %error, "ad request failed");
                self.state = AdViewState::Failed;
                if let Some(delegate) = self.dispatcher.delegate() {
                    delegate.ad_request_failed(self, &error);
                }
                self.state = AdViewState::Idle;
                None
            }
        }
    }

    fn display(&mut self, payload: AdPayload) -> Option<RefreshTimer> {
        if self.ad_size.is_sizeless() {
            self.content_size = payload.size;
        }
        self.payload = Some(payload);
        self.state = AdViewState::Displayed;
        info!(placement_id = %self.targeting.placement_id(), "banner ad displayed");

        if let Some(delegate) = self.dispatcher.delegate() {
            delegate.ad_did_receive_ad(self);
        }
        self.scheduler.arm()
    }

    /// 刷新定时器触发：只有仍处于 Displayed 时才会重新加载。
    /// Resizing 期间触发的刷新会推迟到 resize 结束后重新布置
    pub fn refresh_fired(&mut self, token: u64) -> Option<FetchRequest> {
        if !self.scheduler.take_fired(token) {
            return None;
        }
        if self.state == AdViewState::Resizing {
            debug!("auto refresh fired while resizing, deferring");
            self.refresh_deferred = true;
            return None;
        }
        if self.state != AdViewState::Displayed {
            debug!(state = %self.state, "skipping auto refresh");
            return None;
        }
        match self.load_ad() {
            Ok(request) => Some(request),
            Err(error) => {
                warn!(%error, "auto refresh could not load an ad");
                None
            }
        }
    }

    /// `animated` 为 false 时直接改变 frame，不触发回调；
    /// 为 true 时进入 Resizing，等渲染端调用 [`BannerAdView::finish_resize`]
    pub fn set_frame(&mut self, frame: Rect, animated: bool) -> AdResult<()> {
        if !animated {
            self.frame = frame;
            return Ok(());
        }
        if self.state != AdViewState::Displayed {
            return Err(self.invalid("set_frame"));
        }

        self.state = AdViewState::Resizing;
        self.pending_frame = Some(frame);
        if let Some(delegate) = self.dispatcher.begin_pair(PairedEvent::Resize) {
            delegate.banner_will_resize_to_frame(self, frame);
        }
        Ok(())
    }

    /// 结束 resize。resize 期间错过的刷新会在这里重新布置，返回对应的定时器
    pub fn finish_resize(&mut self) -> AdResult<Option<RefreshTimer>> {
        let frame = match self.pending_frame.take() {
            Some(frame) => frame,
            None => return Err(self.invalid("finish_resize")),
        };
        self.complete_resize(frame);
        if std::mem::take(&mut self.refresh_deferred) {
            return Ok(self.scheduler.arm());
        }
        Ok(None)
    }

    fn complete_resize(&mut self, frame: Rect) {
        self.frame = frame;
        self.state = AdViewState::Displayed;
        if let Some(delegate) = self.dispatcher.end_pair(PairedEvent::Resize) {
            delegate.banner_did_resize(self);
        }
    }

    /// 处理一次点击
    pub fn handle_click(&mut self) -> AdResult<()> {
        if self.state != AdViewState::Displayed {
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

    /// **关闭视图**
    ///
    /// 幂等：只有第一次调用会触发 adWillClose / adDidClose。返回是否真的关闭了。
    pub fn close(&mut self) -> bool {
        if self.state == AdViewState::Closed {
            return false;
        }
        // 先收尾正在进行的 resize，保证回调不交错
        if let Some(frame) = self.pending_frame.take() {
            self.complete_resize(frame);
        }

        if self.fetcher.cancel() {
            debug!("cancelled in-flight ad request on close");
        }
        self.scheduler.cancel();
        self.refresh_deferred = false;

        if let Some(delegate) = self.dispatcher.begin_pair(PairedEvent::Close) {
            delegate.ad_will_close(self);
        }
        self.state = AdViewState::Closed;
        info!(placement_id = %self.targeting.placement_id(), "banner ad closed");
        if let Some(delegate) = self.dispatcher.end_pair(PairedEvent::Close) {
            delegate.ad_did_close(self);
        }
        true
    }

    /// 回到 Idle，丢弃在途请求、刷新定时器和已展示的内容。除了收尾 resize 之外不触发回调
    pub fn reset(&mut self) {
        if let Some(frame) = self.pending_frame.take() {
            self.complete_resize(frame);
        }
        self.fetcher.cancel();
        self.scheduler.cancel();
        self.refresh_deferred = false;
        self.payload = None;
        self.content_size = None;
        self.state = AdViewState::Idle;
    }
}

impl AdProtocol for BannerAdView {
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
