// src/runtime/banner_runtime.rs

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::ad::banner::{AdViewState, BannerAdView};
use crate::ad::fetcher::{FetchOutcome, FetchRequest};
use crate::ad::protocol::AdProtocol;
use crate::ad::scheduler::RefreshTimer;
use crate::error::{AdError, AdResult};
use crate::model::payload::{AdPayload, Rect};
use crate::transport::AdTransport;

const COMMAND_BUFFER: usize = 64;

type Reply<T> = oneshot::Sender<T>;
type Configure = Box<dyn FnOnce(&mut BannerAdView) + Send>;

/// 宿主发给运行时的命令
enum Command {
    LoadAd(Reply<AdResult<()>>),
    SetFrame {
        frame: Rect,
        animated: bool,
        reply: Reply<AdResult<()>>,
    },
    BeginResize(Rect, Reply<AdResult<()>>),
    FinishResize(Reply<AdResult<()>>),
    Click(Reply<AdResult<()>>),
    Close(Reply<bool>),
    Reset(Reply<()>),
    SetAutoRefreshInterval(f64, Reply<AdResult<()>>),
    Configure(Configure, Reply<()>),
    Status(Reply<BannerStatus>),
}

/// 运行时内部事件：请求完成、定时器触发、resize 动画结束
enum Event {
    FetchCompleted { generation: u64, outcome: FetchOutcome },
    RefreshFired { token: u64 },
    ResizeFinished,
}

/// 某一时刻 Banner 的状态快照
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BannerStatus {
    pub placement_id: String,
    pub state: AdViewState,
    pub frame: Rect,
    pub generation: u64,
    pub fetch_in_flight: bool,
    pub refresh_armed: bool,
    pub auto_refresh_interval: f64,
    pub payload: Option<AdPayload>,
}

impl BannerStatus {
    fn of(view: &BannerAdView) -> Self {
        Self {
            placement_id: view.placement_id().to_string(),
            state: view.state(),
            frame: view.frame(),
            generation: view.generation(),
            fetch_in_flight: view.is_fetch_in_flight(),
            refresh_armed: view.is_refresh_armed(),
            auto_refresh_interval: view.auto_refresh_interval(),
            payload: view.payload().cloned(),
        }
    }
}

/// **Banner 运行时的句柄**
///
/// 所有操作都被发送到同一个任务里串行执行，状态转换、定时器和回调都在这个任务上发生。
#[derive(Clone)]
pub struct BannerHandle {
    sender: mpsc::Sender<Command>,
}

impl BannerHandle {
    async fn request<T>(&self, build: impl FnOnce(Reply<T>) -> Command) -> AdResult<T> {
        let (reply, receiver) = oneshot::channel();
        self.sender
            .send(build(reply))
            .await
            .map_err(|_| AdError::RuntimeClosed)?;
        receiver.await.map_err(|_| AdError::RuntimeClosed)
    }

    pub async fn load_ad(&self) -> AdResult<()> {
        self.request(Command::LoadAd).await?
    }

    pub async fn set_frame(&self, frame: Rect, animated: bool) -> AdResult<()> {
        self.request(|reply| Command::SetFrame { frame, animated, reply })
            .await?
    }

    /// 开始一次由宿主控制时长的 resize 动画，视图保持 Resizing 直到 [`BannerHandle::finish_resize`]
    pub async fn begin_resize(&self, frame: Rect) -> AdResult<()> {
        self.request(|reply| Command::BeginResize(frame, reply)).await?
    }

    pub async fn finish_resize(&self) -> AdResult<()> {
        self.request(Command::FinishResize).await?
    }

    pub async fn click(&self) -> AdResult<()> {
        self.request(Command::Click).await?
    }

    /// 返回是否真的关闭了（重复关闭返回 false）
    pub async fn close(&self) -> AdResult<bool> {
        self.request(Command::Close).await
    }

    pub async fn reset(&self) -> AdResult<()> {
        self.request(Command::Reset).await
    }

    pub async fn set_auto_refresh_interval(&self, seconds: f64) -> AdResult<()> {
        self.request(|reply| Command::SetAutoRefreshInterval(seconds, reply))
            .await?
    }

    /// 在运行时任务里修改视图（定向、代理等）
    pub async fn configure<F>(&self, configure: F) -> AdResult<()>
    where
        F: FnOnce(&mut BannerAdView) + Send + 'static,
    {
        self.request(|reply| Command::Configure(Box::new(configure), reply))
            .await
    }

    pub async fn status(&self) -> AdResult<BannerStatus> {
        self.request(Command::Status).await
    }
}

/// **Banner 运行时**
///
/// 独占一个 `BannerAdView`，把纯状态机和传输层、计时器连接起来。
pub struct BannerRuntime {
    view: BannerAdView,
    transport: Arc<dyn AdTransport>,
    events: mpsc::UnboundedSender<Event>,
    refresh_task: Option<JoinHandle<()>>,
}

impl BannerRuntime {
    /// 启动运行时任务。所有句柄被释放后任务退出
    pub fn spawn(view: BannerAdView, transport: Arc<dyn AdTransport>) -> (BannerHandle, JoinHandle<()>) {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let runtime = Self {
            view,
            transport,
            events: event_tx,
            refresh_task: None,
        };
        let task = tokio::spawn(runtime.run(command_rx, event_rx));
        (BannerHandle { sender: command_tx }, task)
    }

    async fn run(
        mut self,
        mut commands: mpsc::Receiver<Command>,
        mut events: mpsc::UnboundedReceiver<Event>,
    ) {
        loop {
            // 内部事件优先，保证宿主的下一条命令看到的是已经处理完的状态
            tokio::select! {
                biased;
                Some(event) = events.recv() => self.handle_event(event),
                command = commands.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
            self.sync_refresh_task();
        }

        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        info!("banner runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::LoadAd(reply) => {
                let result = self.view.load_ad().map(|request| self.start_fetch(request));
                let _ = reply.send(result);
            }
            Command::SetFrame { frame, animated, reply } => {
                let result = self.view.set_frame(frame, animated);
                if result.is_ok() && self.view.state() == AdViewState::Resizing {
                    // 动画由外部渲染端负责，这里在下一轮事件循环里结束 resize
                    let _ = self.events.send(Event::ResizeFinished);
                }
                let _ = reply.send(result);
            }
            Command::BeginResize(frame, reply) => {
                let _ = reply.send(self.view.set_frame(frame, true));
            }
            Command::FinishResize(reply) => {
                let _ = reply.send(self.finish_resize());
            }
            Command::Click(reply) => {
                let _ = reply.send(self.view.handle_click());
            }
            Command::Close(reply) => {
                let _ = reply.send(self.view.close());
            }
            Command::Reset(reply) => {
                self.view.reset();
                let _ = reply.send(());
            }
            Command::SetAutoRefreshInterval(seconds, reply) => {
                let _ = reply.send(self.view.set_auto_refresh_interval(seconds));
            }
            Command::Configure(configure, reply) => {
                configure(&mut self.view);
                let _ = reply.send(());
            }
            Command::Status(reply) => {
                let _ = reply.send(BannerStatus::of(&self.view));
            }
        }
    }

    fn handle_event(&mut self, event: Event) {
        match event {
            Event::FetchCompleted { generation, outcome } => {
                if let Some(timer) = self.view.complete_fetch(generation, outcome) {
                    self.arm_refresh(timer);
                }
            }
            Event::RefreshFired { token } => {
                if let Some(request) = self.view.refresh_fired(token) {
                    debug!(generation = request.generation, "auto refresh fired");
                    self.start_fetch(request);
                }
            }
            Event::ResizeFinished => {
                if let Err(e) = self.finish_resize() {
                    debug!(error = %e, "resize already finished");
                }
            }
        }
    }

    fn finish_resize(&mut self) -> AdResult<()> {
        if let Some(timer) = self.view.finish_resize()? {
            self.arm_refresh(timer);
        }
        Ok(())
    }

    fn start_fetch(&self, request: FetchRequest) {
        let future = self.transport.perform_fetch(&request);
        let events = self.events.clone();
        let generation = request.generation;
        tokio::spawn(async move {
            let outcome = future.await;
            if events.send(Event::FetchCompleted { generation, outcome }).is_err() {
                debug!(generation, "runtime gone before ad response arrived");
            }
        });
    }

    fn arm_refresh(&mut self, timer: RefreshTimer) {
        if let Some(task) = self.refresh_task.take() {
            task.abort();
        }
        let events = self.events.clone();
        self.refresh_task = Some(tokio::spawn(async move {
            sleep(timer.delay).await;
            let _ = events.send(Event::RefreshFired { token: timer.token });
        }));
    }

    /// 调度器里已经没有待触发的定时器时，把对应的任务也停掉
    fn sync_refresh_task(&mut self) {
        if !self.view.is_refresh_armed() {
            if let Some(task) = self.refresh_task.take() {
                if !task.is_finished() {
                    debug!("aborting cancelled refresh timer");
                }
                task.abort();
            }
        }
    }
}
