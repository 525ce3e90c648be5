// src/transport/mock_server.rs

use std::net::SocketAddr;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{routing::post, serve, Json, Router};
use rand::Rng;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{error, info};

use crate::model::payload::{AdPayload, AdSize};
use crate::transport::AdRequestBody;

/// sizeless 请求时随机挑一个常见尺寸
const STANDARD_SIZES: [(f64, f64); 3] = [(320.0, 50.0), (300.0, 250.0), (728.0, 90.0)];

/// 模拟广告服务端的行为
#[derive(Debug, Clone, Copy)]
pub struct MockAdServerConfig {
    /// 填充率 [0, 1]
    pub fill_rate: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for MockAdServerConfig {
    fn default() -> Self {
        Self {
            fill_rate: 0.8,
            min_latency_ms: 100,
            max_latency_ms: 300,
        }
    }
}

struct Roll {
    delay_ms: u64,
    filled: bool,
    price: f64,
    size: (f64, f64),
}

/// NaN 视为从不填充
fn fill_probability(fill_rate: f64) -> f64 {
    if fill_rate.is_nan() {
        0.0
    } else {
        fill_rate.clamp(0.0, 1.0)
    }
}

fn roll(config: &MockAdServerConfig) -> Roll {
    let mut rng = rand::thread_rng();
    let low = config.min_latency_ms.min(config.max_latency_ms);
    let high = config.min_latency_ms.max(config.max_latency_ms);
    Roll {
        delay_ms: rng.gen_range(low..=high),
        filled: rng.gen_bool(fill_probability(config.fill_rate)),
        price: rng.gen_range(0.5..3.0),
        size: STANDARD_SIZES[rng.gen_range(0..STANDARD_SIZES.len())],
    }
}

/// 模拟广告响应：随机延迟、按填充率返回创意，出价低于底价时不填充
async fn handle_ad_request(
    State(config): State<MockAdServerConfig>,
    Json(request): Json<AdRequestBody>,
) -> Response {
    info!(
        "Mock ad server received request: id={}, placement={}",
        request.request_id, request.placement_id
    );

    let roll = roll(&config);
    sleep(Duration::from_millis(roll.delay_ms)).await;

    if !roll.filled || roll.price < request.targeting.reserve() {
        return StatusCode::NO_CONTENT.into_response();
    }

    let size = if request.ad_size.is_sizeless() {
        AdSize::new(roll.size.0, roll.size.1)
    } else {
        request.ad_size
    };
    let request_id = request.request_id;
    let payload = AdPayload {
        creative: format!(
            "<html><body>Mock Banner Ad {w}x{h}<br/><a href=\"http://ad-tracker.local/click?req={request_id}\" target=\"_blank\">Click Here</a><img src=\"http://ad-tracker.local/impression?req={request_id}\" style=\"display:none;\" /></body></html>",
            w = size.width,
            h = size.height,
            request_id = request_id
        ),
        size: Some(size),
        click_url: Some(format!("http://ad-tracker.local/click?req={}", request_id)),
        is_psa: false,
    };
    (StatusCode::OK, Json(payload)).into_response()
}

pub fn router(config: MockAdServerConfig) -> Router {
    Router::new()
        .route("/ad", post(handle_ad_request))
        .with_state(config)
}

/// 启动 Mock 广告服务，路由为 `/ad`。端口传 0 时由系统分配
pub async fn spawn_mock_ad_server(
    port: u16,
    config: MockAdServerConfig,
) -> std::io::Result<(SocketAddr, JoinHandle<()>)> {
    let listener = TcpListener::bind(("127.0.0.1", port)).await?;
    let addr = listener.local_addr()?;
    info!("Mock ad server running at http://{}", addr);

    let handle = tokio::spawn(async move {
        if let Err(e) = serve(listener, router(config)).await {
            error!("Mock ad server stopped: {}", e);
        }
    });
    Ok((addr, handle))
}
