use super::escape_segment;

/// 单条推文缓存键前缀
const TWEET_PREFIX: &str = "tweets:";

/// 生成单条推文缓存键
pub fn tweet_key(tweet_id: &str) -> String {
    format!("{}{}", TWEET_PREFIX, escape_segment(tweet_id))
}
