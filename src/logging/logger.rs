// src/logging/logger.rs

use std::io::Write;
use std::sync::Arc;

use tokio::sync::mpsc::{self, error::TrySendError, Receiver, Sender};
use tokio::sync::oneshot;
use tokio::task;
use tokio::time::{self, Duration};
use tracing::{error, warn};
use tracing_appender::rolling;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::fmt::MakeWriter;

use crate::ad::banner::{BannerAdView, BannerAdViewDelegate};
use crate::ad::protocol::{AdDelegate, AdProtocol};
use crate::error::FetchError;
use crate::logging::lifecycle_log::{LifecycleEvent, LifecycleRecord};
use crate::model::payload::Rect;

pub const JOURNAL_FILE_NAME: &str = "ad_lifecycle.json";

enum JournalMessage {
    Record(LifecycleRecord),
    Flush(oneshot::Sender<()>),
}

/// **广告生命周期日志**
///
/// 回调是同步触发的，这里只把记录放进通道，由后台任务批量写入按小时滚动的文件。
/// 实现了 `BannerAdViewDelegate`，可以直接挂到广告视图上。
pub struct LifecycleJournal {
    sender: Sender<JournalMessage>,
}

impl LifecycleJournal {
    /// - `log_dir`: 日志文件存放目录
    /// - `buffer_size`: mpsc 通道缓冲区大小
    /// - `batch_size`: 批量写入的日志条数
    /// - `flush_interval`: 定时刷新日志的时间间隔（毫秒）
    pub fn new(log_dir: &str, buffer_size: usize, batch_size: usize, flush_interval: u64) -> Arc<Self> {
        let (sender, receiver) = mpsc::channel(buffer_size);
        let log_file = Arc::new(rolling::hourly(log_dir, JOURNAL_FILE_NAME));

        tokio::spawn(Self::background_log_writer(log_file, receiver, batch_size, flush_interval));

        Arc::new(Self { sender })
    }

    /// 通道满时丢弃并告警，不阻塞回调
    pub fn record(&self, record: LifecycleRecord) {
        match self.sender.try_send(JournalMessage::Record(record)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => warn!("lifecycle journal is full, dropping record"),
            Err(TrySendError::Closed(_)) => warn!("lifecycle journal writer has stopped"),
        }
    }

    /// 等待目前为止的记录全部写入磁盘
    pub async fn flush(&self) {
        let (done, wait) = oneshot::channel();
        if self.sender.send(JournalMessage::Flush(done)).await.is_ok() {
            let _ = wait.await;
        }
    }

    fn log_event(&self, ad: &dyn AdProtocol, event: LifecycleEvent, detail: Option<String>) {
        let mut record = LifecycleRecord::new(ad.placement_id(), event, ad.lifecycle_state());
        if let Some(detail) = detail {
            record = record.with_detail(detail);
        }
        self.record(record);
    }

    async fn background_log_writer(
        log_file: Arc<RollingFileAppender>,
        mut receiver: Receiver<JournalMessage>,
        batch_size: usize,
        flush_interval: u64,
    ) {
        let mut buffer = Vec::new();
        let mut interval = time::interval(Duration::from_millis(flush_interval));

        loop {
            tokio::select! {
                message = receiver.recv() => match message {
                    Some(JournalMessage::Record(record)) => {
                        match serde_json::to_string(&record) {
                            Ok(line) => buffer.push(line),
                            Err(e) => error!("Failed to serialize lifecycle record: {}", e),
                        }
                        if buffer.len() >= batch_size {
                            Self::write_logs_to_disk(log_file.clone(), &mut buffer).await;
                        }
                    }
                    Some(JournalMessage::Flush(done)) => {
                        Self::write_logs_to_disk(log_file.clone(), &mut buffer).await;
                        let _ = done.send(());
                    }
                    None => {
                        Self::write_logs_to_disk(log_file.clone(), &mut buffer).await;
                        break;
                    }
                },
                _ = interval.tick() => {
                    Self::write_logs_to_disk(log_file.clone(), &mut buffer).await;
                }
            }
        }
    }

    async fn write_logs_to_disk(file: Arc<RollingFileAppender>, buffer: &mut Vec<String>) {
        if buffer.is_empty() {
            return;
        }
        let content = buffer.join("\n") + "\n";
        buffer.clear();

        let written = task::spawn_blocking(move || {
            let mut writer = file.make_writer();
            writer.write_all(content.as_bytes())
        })
        .await;

        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!("Failed to write lifecycle logs: {}", e),
            Err(e) => error!("Lifecycle log writer task failed: {}", e),
        }
    }
}

impl AdDelegate for LifecycleJournal {
    fn ad_did_receive_ad(&self, ad: &dyn AdProtocol) {
        self.log_event(ad, LifecycleEvent::AdDidReceiveAd, None);
    }

    fn ad_request_failed(&self, ad: &dyn AdProtocol, error: &FetchError) {
        self.log_event(ad, LifecycleEvent::RequestFailed, Some(error.to_string()));
    }

    fn ad_was_clicked(&self, ad: &dyn AdProtocol) {
        self.log_event(ad, LifecycleEvent::AdWasClicked, None);
    }

    fn ad_will_close(&self, ad: &dyn AdProtocol) {
        self.log_event(ad, LifecycleEvent::AdWillClose, None);
    }

    fn ad_did_close(&self, ad: &dyn AdProtocol) {
        self.log_event(ad, LifecycleEvent::AdDidClose, None);
    }

    fn ad_will_present(&self, ad: &dyn AdProtocol) {
        self.log_event(ad, LifecycleEvent::AdWillPresent, None);
    }

    fn ad_did_present(&self, ad: &dyn AdProtocol) {
        self.log_event(ad, LifecycleEvent::AdDidPresent, None);
    }

    fn ad_will_leave_application(&self, ad: &dyn AdProtocol) {
        self.log_event(ad, LifecycleEvent::AdWillLeaveApplication, None);
    }
}

impl BannerAdViewDelegate for LifecycleJournal {
    fn banner_will_resize_to_frame(&self, view: &BannerAdView, frame: Rect) {
        let detail = format!("{}x{}", frame.width, frame.height);
        self.log_event(view, LifecycleEvent::WillResize, Some(detail));
    }

    fn banner_did_resize(&self, view: &BannerAdView) {
        self.log_event(view, LifecycleEvent::DidResize, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payload::AdPayload;
    use std::fs;
    use std::path::Path;

    fn read_journal(dir: &Path) -> Vec<LifecycleRecord> {
        let mut records = Vec::new();
        for entry in fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if name.starts_with(JOURNAL_FILE_NAME) {
                for line in fs::read_to_string(&path).unwrap().lines() {
                    records.push(serde_json::from_str(line).unwrap());
                }
            }
        }
        records
    }

    #[tokio::test]
    async fn journal_records_banner_lifecycle() {
        let dir = std::env::temp_dir().join(format!("journal-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let journal = LifecycleJournal::new(dir.to_str().unwrap(), 100, 100, 60_000);

        let mut view = BannerAdView::new(Rect::new(0.0, 0.0, 320.0, 50.0), "1326299");
        let delegate: Arc<dyn BannerAdViewDelegate> = journal.clone();
        view.set_delegate(Some(&delegate));
        let request = view.load_ad().unwrap();
        view.complete_fetch(request.generation, Ok(AdPayload::new("<html/>")));
        view.close();

        journal.flush().await;
        let events: Vec<LifecycleEvent> = read_journal(&dir).into_iter().map(|r| r.event).collect();
        assert_eq!(
            events,
            vec![
                LifecycleEvent::AdDidReceiveAd,
                LifecycleEvent::AdWillClose,
                LifecycleEvent::AdDidClose
            ]
        );
        let _ = fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn failure_detail_is_recorded() {
        let dir = std::env::temp_dir().join(format!("journal-{}", uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        let journal = LifecycleJournal::new(dir.to_str().unwrap(), 100, 100, 60_000);

        let view = BannerAdView::new(Rect::new(0.0, 0.0, 320.0, 50.0), "1326299");
        journal.ad_request_failed(&view, &FetchError::Server(503));
        journal.flush().await;

        let records = read_journal(&dir);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].placement_id, "1326299");
        assert_eq!(records[0].detail.as_deref(), Some("ad server returned status 503"));
        let _ = fs::remove_dir_all(dir);
    }
}
