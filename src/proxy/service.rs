use std::num::NonZeroUsize;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::ResponseCache;
use crate::cache::keys::{tweet_key, user_tweets_key, username_key};
use crate::config::{Config, TtlConfig};

use super::dispatcher::Dispatcher;
use super::job::{Job, JobResult};
use super::quota::QuotaGuard;
use super::retry::RetryPolicy;
use super::upstream::{FetchError, UpstreamClient};

/// 单个接口的正向 / 负向缓存时间
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CachePolicy {
    pub positive: Duration,
    pub negative: Duration,
}

impl CachePolicy {
    pub fn new(positive: Duration, negative: Duration) -> Self {
        Self { positive, negative }
    }

    /// 200 与 404 可缓存，其他状态码不缓存
    fn ttl_for(&self, status: u16) -> Option<Duration> {
        match status {
            200 => Some(self.positive),
            404 => Some(self.negative),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheTtls {
    pub user: CachePolicy,
    pub user_tweets: CachePolicy,
    pub tweet: CachePolicy,
}

impl From<&TtlConfig> for CacheTtls {
    fn from(ttl: &TtlConfig) -> Self {
        let secs = Duration::from_secs;
        Self {
            user: CachePolicy::new(secs(ttl.user_positive_secs), secs(ttl.user_negative_secs)),
            user_tweets: CachePolicy::new(
                secs(ttl.tweets_positive_secs),
                secs(ttl.tweets_negative_secs),
            ),
            tweet: CachePolicy::new(secs(ttl.tweet_positive_secs), secs(ttl.tweet_negative_secs)),
        }
    }
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self::from(&TtlConfig::default())
    }
}

/// 代理核心：缓存查询、任务调度与结果缓存
pub struct Proxy {
    cache: Mutex<ResponseCache<JobResult>>,
    dispatcher: Dispatcher,
    ttls: CacheTtls,
}

impl Proxy {
    pub fn new(
        upstream: UpstreamClient,
        concurrency: usize,
        quota_window: Duration,
        cache_capacity: NonZeroUsize,
        ttls: CacheTtls,
    ) -> Self {
        Self {
            cache: Mutex::new(ResponseCache::new(cache_capacity)),
            dispatcher: Dispatcher::new(upstream, concurrency, quota_window),
            ttls,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self, FetchError> {
        let retry = config
            .retry_after()
            .map(|delay| RetryPolicy::new(delay).with_max_retries(config.retry_max_attempts));
        let upstream =
            UpstreamClient::new(&config.nitter_base_url, config.upstream_timeout(), retry)?;
        let capacity = NonZeroUsize::new(config.max_cache_size).unwrap_or(NonZeroUsize::MIN);

        Ok(Self::new(
            upstream,
            config.concurrency,
            config.quota_window(),
            capacity,
            CacheTtls::from(&config.ttl),
        ))
    }

    /// 按用户名查询用户
    pub async fn lookup_user(&self, username: &str, req_id: &str) -> JobResult {
        let key = username_key(username);
        let job = Job::for_segments(req_id, &["api", "user", username]);
        self.cached_dispatch(key, job, self.ttls.user).await
    }

    /// 查询用户时间线，`cursor` 为分页游标
    pub async fn lookup_user_timeline(
        &self,
        user_id: &str,
        cursor: Option<&str>,
        req_id: &str,
    ) -> JobResult {
        let key = user_tweets_key(user_id, cursor);
        let job = Job::for_segments(req_id, &["api", "user", user_id, "tweets"])
            .with_param("cursor", cursor);
        self.cached_dispatch(key, job, self.ttls.user_tweets).await
    }

    /// 按 ID 查询单条推文
    pub async fn lookup_post(&self, tweet_id: &str, req_id: &str) -> JobResult {
        let key = tweet_key(tweet_id);
        let job = Job::for_segments(req_id, &["api", "tweet", tweet_id]);
        self.cached_dispatch(key, job, self.ttls.tweet).await
    }

    async fn cached_dispatch(&self, key: String, job: Job, policy: CachePolicy) -> JobResult {
        // 锁不跨越 await
        let cached = self.cache.lock().get(&key);
        if let Some(hit) = cached {
            tracing::debug!(req_id = %job.req_id, key = %key, status = hit.status, "cache hit");
            return hit;
        }

        let result = self.dispatcher.submit(job).await;

        if let Some(ttl) = policy.ttl_for(result.status) {
            self.cache.lock().set(key, result.clone(), ttl);
        }
        result
    }

    pub fn quota(&self) -> &QuotaGuard {
        self.dispatcher.quota()
    }

    pub fn cached_entries(&self) -> usize {
        self.cache.lock().len()
    }

    pub async fn shutdown(&self) {
        self.dispatcher.shutdown().await;
    }
}
