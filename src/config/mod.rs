use std::env;
use std::str::FromStr;
use std::time::Duration;

const DAY_SECS: u64 = 24 * 3600;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub nitter_base_url: String,
    pub concurrency: usize,
    pub retry_after_millis: Option<u64>,
    pub retry_max_attempts: Option<u32>,
    pub max_cache_size: usize,
    pub upstream_timeout_secs: Option<u64>,
    pub quota_window_secs: u64,
    pub ttl: TtlConfig,
}

/// 各接口缓存时间（秒）
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TtlConfig {
    pub user_positive_secs: u64,
    pub user_negative_secs: u64,
    pub tweets_positive_secs: u64,
    pub tweets_negative_secs: u64,
    pub tweet_positive_secs: u64,
    pub tweet_negative_secs: u64,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            user_positive_secs: 30 * DAY_SECS,
            user_negative_secs: 3600,
            tweets_positive_secs: 60,
            tweets_negative_secs: 60,
            tweet_positive_secs: 60,
            tweet_negative_secs: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, env::VarError> {
        dotenv::dotenv().ok();

        Self::from_lookup(|name| env::var(name).ok())
    }

    /// 从任意变量来源构建配置，缺少必填项时返回 `VarError::NotPresent`
    pub fn from_lookup<F>(lookup: F) -> Result<Self, env::VarError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = TtlConfig::default();
        let ttl = TtlConfig {
            user_positive_secs: parse_or(&lookup, "GET_USER_POSITIVE_TTL", defaults.user_positive_secs),
            user_negative_secs: parse_or(&lookup, "GET_USER_NEGATIVE_TTL", defaults.user_negative_secs),
            tweets_positive_secs: parse_or(&lookup, "GET_TWEETS_POSITIVE_TTL", defaults.tweets_positive_secs),
            tweets_negative_secs: parse_or(&lookup, "GET_TWEETS_NEGATIVE_TTL", defaults.tweets_negative_secs),
            tweet_positive_secs: parse_or(&lookup, "GET_TWEET_POSITIVE_TTL", defaults.tweet_positive_secs),
            tweet_negative_secs: parse_or(&lookup, "GET_TWEET_NEGATIVE_TTL", defaults.tweet_negative_secs),
        };

        Ok(Config {
            server_host: lookup("HOST").unwrap_or_else(|| "0.0.0.0".into()),
            server_port: parse_or(&lookup, "PORT", 8080),
            nitter_base_url: lookup("NITTER_BASE_URL").ok_or(env::VarError::NotPresent)?,
            concurrency: parse_or(&lookup, "CONCURRENCY", 1usize).max(1),
            retry_after_millis: parse_opt(&lookup, "RETRY_AFTER_MILLIS"),
            retry_max_attempts: parse_opt(&lookup, "RETRY_MAX_ATTEMPTS"),
            max_cache_size: parse_or(&lookup, "MAX_CACHE_SIZE", 100_000usize).max(1),
            upstream_timeout_secs: parse_opt(&lookup, "UPSTREAM_TIMEOUT_SECS"),
            quota_window_secs: parse_or(&lookup, "QUOTA_WINDOW_SECS", 15 * 60u64).max(1),
            ttl,
        })
    }

    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after_millis
            .filter(|millis| *millis > 0)
            .map(Duration::from_millis)
    }

    pub fn upstream_timeout(&self) -> Option<Duration> {
        self.upstream_timeout_secs.map(Duration::from_secs)
    }

    pub fn quota_window(&self) -> Duration {
        Duration::from_secs(self.quota_window_secs)
    }
}

fn parse_or<F, T>(lookup: &F, name: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    parse_opt(lookup, name).unwrap_or(default)
}

fn parse_opt<F, T>(lookup: &F, name: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    let raw = lookup(name)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!("Invalid value for {}: {:?}, using default", name, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn base_url_is_required() {
        let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
        assert_eq!(err, env::VarError::NotPresent);
    }

    #[test]
    fn defaults_match_documented_values() {
        let config =
            Config::from_lookup(lookup_from(&[("NITTER_BASE_URL", "http://nitter:8080")])).unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.max_cache_size, 100_000);
        assert_eq!(config.retry_after(), None);
        assert_eq!(config.quota_window(), Duration::from_secs(900));
        assert_eq!(config.ttl.user_positive_secs, 30 * 24 * 3600);
        assert_eq!(config.ttl.user_negative_secs, 3600);
        assert_eq!(config.ttl.tweets_positive_secs, 60);
        assert_eq!(config.ttl.tweet_negative_secs, 60);
    }

    #[test]
    fn overrides_and_bad_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("NITTER_BASE_URL", "http://nitter:8080"),
            ("CONCURRENCY", "4"),
            ("RETRY_AFTER_MILLIS", "1500"),
            ("MAX_CACHE_SIZE", "not-a-number"),
            ("GET_TWEET_POSITIVE_TTL", "5"),
            ("PORT", "0"),
        ]))
        .unwrap();

        assert_eq!(config.concurrency, 4);
        assert_eq!(config.retry_after(), Some(Duration::from_millis(1500)));
        assert_eq!(config.max_cache_size, 100_000);
        assert_eq!(config.ttl.tweet_positive_secs, 5);
        assert_eq!(config.server_port, 0);
    }

    #[test]
    fn zero_concurrency_is_clamped() {
        let config = Config::from_lookup(lookup_from(&[
            ("NITTER_BASE_URL", "http://nitter:8080"),
            ("CONCURRENCY", "0"),
        ]))
        .unwrap();
        assert_eq!(config.concurrency, 1);
    }
}
