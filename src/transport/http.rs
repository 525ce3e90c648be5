// src/transport/http.rs

use std::time::Instant;

use futures::future::{BoxFuture, FutureExt};
use reqwest::{Client, Response, StatusCode};
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::ad::fetcher::{FetchOutcome, FetchRequest};
use crate::error::FetchError;
use crate::model::payload::AdPayload;
use crate::transport::{AdRequestBody, AdTransport};

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 3000;

/// 基于 reqwest 的广告请求客户端
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(endpoint: &str, timeout_ms: u64) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.to_string(),
            timeout: Duration::from_millis(timeout_ms),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// 204 表示无广告，其他非 2xx 状态码视为服务端错误
async fn read_response(response: Response) -> FetchOutcome {
    let status = response.status();
    if status == StatusCode::NO_CONTENT {
        return Err(FetchError::NoFill);
    }
    if !status.is_success() {
        return Err(FetchError::Server(status.as_u16()));
    }
    response
        .json::<AdPayload>()
        .await
        .map_err(|e| FetchError::InvalidResponse(e.to_string()))
}

impl AdTransport for HttpTransport {
    fn perform_fetch(&self, request: &FetchRequest) -> BoxFuture<'static, FetchOutcome> {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        let timeout_duration = self.timeout;
        let body = AdRequestBody::from(request);

        async move {
            let start = Instant::now();
            let exchange = async {
                let response = client
                    .post(&endpoint)
                    .header("Content-Type", "application/json")
                    .json(&body)
                    .send()
                    .await
                    .map_err(|e| FetchError::Network(e.to_string()))?;
                read_response(response).await
            };
            let outcome = match timeout(timeout_duration, exchange).await {
                Ok(outcome) => outcome,
                Err(_) => Err(FetchError::Timeout(timeout_duration.as_millis() as u64)),
            };
            debug!(
                request_id = %body.request_id,
                placement_id = %body.placement_id,
                elapsed_ms = start.elapsed().as_millis() as u64,
                filled = outcome.is_ok(),
                "ad server exchange finished"
            );
            outcome
        }
        .boxed()
    }
}
