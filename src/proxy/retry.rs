use std::time::Duration;

use reqwest::{Client, Request, Response, StatusCode};

use super::upstream::FetchError;

/// 上游返回 429 时等待固定时长后重发原请求
///
/// 等待时长固定，不读取上游的 Retry-After。默认不限制重试次数，
/// 每次 429 都会再等待并重发；设置 `max_retries` 后，重试用尽仍是 429 时
/// 返回 `FetchError::RetriesExhausted`。
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    delay: Duration,
    max_retries: Option<u32>,
}

impl RetryPolicy {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            max_retries: None,
        }
    }

    pub fn with_max_retries(mut self, max_retries: Option<u32>) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    fn is_retryable(response: &Response) -> bool {
        tracing::debug!(
            status = response.status().as_u16(),
            headers = ?response.headers(),
            "checking retryable"
        );
        response.status() == StatusCode::TOO_MANY_REQUESTS
    }

    fn exhausted(&self, retries: u32) -> bool {
        self.max_retries.is_some_and(|max| retries >= max)
    }

    /// 发送请求，遇到 429 时按策略重发；传输错误原样返回
    pub async fn execute(
        &self,
        client: &Client,
        mut request: Request,
        req_id: &str,
    ) -> Result<Response, FetchError> {
        let mut retries = 0u32;
        loop {
            let retry_copy = request.try_clone();
            let response = client.execute(request).await?;

            if !Self::is_retryable(&response) {
                return Ok(response);
            }
            if self.exhausted(retries) {
                tracing::debug!(req_id, retries, "giving up on rate-limited request");
                return Err(FetchError::RetriesExhausted(retries));
            }
            let Some(copy) = retry_copy else {
                return Ok(response);
            };

            tracing::debug!(
                req_id,
                retries,
                delay_ms = self.delay.as_millis() as u64,
                "waiting for retry"
            );
            tokio::time::sleep(self.delay).await;
            retries += 1;
            request = copy;
        }
    }
}

/// 有重试策略时经由策略发送，否则直接发送
pub async fn send(
    client: &Client,
    request: Request,
    policy: Option<&RetryPolicy>,
    req_id: &str,
) -> Result<Response, FetchError> {
    match policy {
        Some(policy) => policy.execute(client, request, req_id).await,
        None => Ok(client.execute(request).await?),
    }
}
