// src/main.rs

use std::future::pending;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use tokio::signal;
use tokio::time::{interval, sleep, Duration};
use tracing::{info, warn};

use rust_adsdk::ad::BannerAdViewDelegate;
use rust_adsdk::config::{ConfigManager, SdkSettings};
use rust_adsdk::logging::{init_tracing, LifecycleJournal};
use rust_adsdk::model::adapters::{ConfigAdapter, FileConfigAdapter};
use rust_adsdk::model::payload::Rect;
use rust_adsdk::model::placements::AdType;
use rust_adsdk::runtime::BannerRuntime;
use rust_adsdk::transport::http::DEFAULT_REQUEST_TIMEOUT_MS;
use rust_adsdk::transport::mock_server::{spawn_mock_ad_server, MockAdServerConfig};
use rust_adsdk::transport::HttpTransport;

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "Banner ad SDK demo against a mock ad server")]
struct CliArgs {
    /// Mock 广告服务端口，指定 --ad-server 时不启动
    #[arg(short, long, default_value_t = 9001)]
    port: u16,
    /// 外部广告服务地址，例如 http://127.0.0.1:9001/ad
    #[arg(long)]
    ad_server: Option<String>,
    #[arg(long, default_value = "static/placements.json")]
    placements: String,
    /// 不指定时使用第一个启用的 Banner 广告位
    #[arg(long)]
    placement_id: Option<String>,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    #[arg(long, default_value_t = DEFAULT_REQUEST_TIMEOUT_MS)]
    request_timeout_ms: u64,
    /// 运行时长（秒），不指定时等待 Ctrl-C
    #[arg(long)]
    duration_secs: Option<u64>,
    #[arg(long, default_value_t = 0.8)]
    fill_rate: f64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    if !(0.0..=1.0).contains(&args.fill_rate) {
        bail!("--fill-rate must be between 0 and 1, got {}", args.fill_rate);
    }

    let _guard = init_tracing(&args.log_dir).context("unable to set global tracing subscriber")?;

    let adapter = FileConfigAdapter::new(&args.placements);
    let mut config = ConfigManager::new(SdkSettings {
        ad_server_url: args.ad_server.clone().unwrap_or_default(),
        request_timeout_ms: args.request_timeout_ms,
        log_dir: args.log_dir.clone(),
    });
    config.update_placements(adapter.get_placements()?);

    // 未指定外部服务时启动本地 Mock 广告服务
    let mock_server = match &args.ad_server {
        Some(_) => None,
        None => {
            let mock_config = MockAdServerConfig {
                fill_rate: args.fill_rate,
                ..MockAdServerConfig::default()
            };
            let (addr, handle) = spawn_mock_ad_server(args.port, mock_config).await?;
            config.settings.ad_server_url = format!("http://{}/ad", addr);
            Some(handle)
        }
    };
    info!("Using ad server {}", config.settings.ad_server_url);

    let placement = match &args.placement_id {
        Some(id) => config
            .get_placement(id)
            .cloned()
            .ok_or_else(|| anyhow!("unknown placement {}", id))?,
        None => config
            .active_placements()
            .into_iter()
            .find(|p| p.ad_type == AdType::Banner)
            .ok_or_else(|| anyhow!("no enabled banner placement in {}", args.placements))?,
    };

    let frame = Rect::new(0.0, 0.0, placement.width, placement.height);
    let mut view = config.banner_view(&placement.placement_id, frame)?;

    let journal = LifecycleJournal::new(&config.settings.log_dir, 1000, 100, 1000);
    let delegate: Arc<dyn BannerAdViewDelegate> = journal.clone();
    view.set_delegate(Some(&delegate));

    let transport = Arc::new(HttpTransport::new(
        &config.settings.ad_server_url,
        config.settings.request_timeout_ms,
    ));
    let (handle, runtime_task) = BannerRuntime::spawn(view, transport);
    handle.load_ad().await?;
    info!("Banner {} is loading", placement.placement_id);

    let deadline = async {
        match args.duration_secs {
            Some(secs) => sleep(Duration::from_secs(secs)).await,
            None => pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut ticker = interval(Duration::from_secs(5));
    loop {
        tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Shutting down gracefully...");
                break;
            }
            _ = &mut deadline => {
                info!("Demo finished after {:?} seconds", args.duration_secs);
                break;
            }
            _ = ticker.tick() => {
                let status = handle.status().await?;
                info!(
                    state = %status.state,
                    generation = status.generation,
                    refresh_armed = status.refresh_armed,
                    "banner status"
                );
            }
        }
    }

    if !handle.close().await? {
        warn!("Banner was already closed");
    }
    drop(handle);
    runtime_task.await?;
    journal.flush().await;

    if let Some(server) = mock_server {
        server.abort();
    }
    info!("Banner demo shut down.");
    Ok(())
}
