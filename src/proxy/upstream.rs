use std::fmt;
use std::time::Duration;

use reqwest::{Client, Url, header::CONTENT_TYPE};

use super::job::{Job, JobResult};
use super::retry::{self, RetryPolicy};

/// 上游调用失败的分类
#[derive(Debug)]
pub enum FetchError {
    /// 网络或客户端库层面的失败，原因不明确
    Transport(reqwest::Error),
    /// 重试策略放弃，上游持续返回 429
    RetriesExhausted(u32),
    /// 其他未归类失败
    Unexpected(String),
}

impl FetchError {
    /// 原因不明确的失败按上游过载处理
    pub fn trips_quota(&self) -> bool {
        matches!(self, FetchError::Transport(_) | FetchError::RetriesExhausted(_))
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchError::Transport(err) => write!(f, "transport error: {}", err),
            FetchError::RetriesExhausted(retries) => {
                write!(f, "still rate limited after {} retries", retries)
            }
            FetchError::Unexpected(msg) => write!(f, "unexpected error: {}", msg),
        }
    }
}

impl std::error::Error for FetchError {}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        // 构造请求失败属于本地问题，不代表上游过载
        if err.is_builder() {
            FetchError::Unexpected(err.to_string())
        } else {
            FetchError::Transport(err)
        }
    }
}

/// 上游 HTTP 客户端
pub struct UpstreamClient {
    client: Client,
    base_url: Url,
    retry: Option<RetryPolicy>,
}

impl UpstreamClient {
    pub fn new(
        base_url: &str,
        timeout: Option<Duration>,
        retry: Option<RetryPolicy>,
    ) -> Result<Self, FetchError> {
        let base_url =
            Url::parse(base_url).map_err(|e| FetchError::Unexpected(format!("invalid base url: {}", e)))?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(FetchError::from)?;

        Ok(Self {
            client,
            base_url,
            retry,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// 拼接在基础地址已有路径之后
    fn url_for(&self, path: &str) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!("{}{}", url.path().trim_end_matches('/'), path);
        url.set_path(&joined);
        url
    }

    /// 执行一次任务对应的上游 GET 请求，任何 HTTP 状态码都视为成功返回，响应体原样保留
    pub async fn fetch(&self, job: &Job) -> Result<JobResult, FetchError> {
        let url = self.url_for(&job.path);
        let request = self.client.get(url).query(&job.params).build()?;

        tracing::trace!(
            req_id = %job.req_id,
            url = %request.url(),
            "sending request to upstream"
        );

        let response = retry::send(&self.client, request, self.retry.as_ref(), &job.req_id).await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?;

        tracing::trace!(
            req_id = %job.req_id,
            status,
            content_type = ?content_type,
            data = %String::from_utf8_lossy(&body),
            "upstream response"
        );

        Ok(JobResult::new(status, content_type, Some(body)))
    }
}
