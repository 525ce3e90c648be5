// src/ad/dispatcher.rs

use std::fmt;
use std::sync::{Arc, Weak};

use tracing::warn;

/// 成对出现的回调：will/did 之间不能插入另一对
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairedEvent {
    Close,
    Present,
    Resize,
}

/// **回调分发器**
///
/// 只持有一个代理的弱引用，代理被释放后回调静默跳过。
pub struct DelegateDispatcher<D: ?Sized> {
    delegate: Option<Weak<D>>,
    open_pair: Option<PairedEvent>,
}

impl<D: ?Sized> DelegateDispatcher<D> {
    pub fn new() -> Self {
        Self {
            delegate: None,
            open_pair: None,
        }
    }

    pub fn set_delegate(&mut self, delegate: Option<&Arc<D>>) {
        self.delegate = delegate.map(Arc::downgrade);
    }

    /// 代理仍然存活时返回强引用
    pub fn delegate(&self) -> Option<Arc<D>> {
        self.delegate.as_ref().and_then(Weak::upgrade)
    }

    pub fn has_delegate(&self) -> bool {
        self.delegate().is_some()
    }

    pub fn begin_pair(&mut self, event: PairedEvent) -> Option<Arc<D>> {
        if let Some(open) = self.open_pair {
            warn!(?open, ?event, "paired delegate events interleaved");
        }
        self.open_pair = Some(event);
        self.delegate()
    }

    pub fn end_pair(&mut self, event: PairedEvent) -> Option<Arc<D>> {
        if self.open_pair != Some(event) {
            warn!(open = ?self.open_pair, ?event, "closing a delegate pair that was not opened");
        }
        self.open_pair = None;
        self.delegate()
    }

    pub fn open_pair(&self) -> Option<PairedEvent> {
        self.open_pair
    }
}

impl<D: ?Sized> Default for DelegateDispatcher<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: ?Sized> fmt::Debug for DelegateDispatcher<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DelegateDispatcher")
            .field("has_delegate", &self.has_delegate())
            .field("open_pair", &self.open_pair)
            .finish()
    }
}
