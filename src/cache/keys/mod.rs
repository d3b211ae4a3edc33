/// 缓存键模块
/// 提供各种缓存键生成函数

// 用户缓存键模块
pub mod user_keys;

// 推文缓存键模块
pub mod tweet_keys;

// 重新导出常用的键生成函数
pub use tweet_keys::tweet_key;
pub use user_keys::{LAST_CURSOR, user_tweets_key, username_key};

/// 转义键片段中的分隔符，保证不同请求不会映射到同一个键
pub(crate) fn escape_segment(segment: &str) -> String {
    segment.replace('%', "%25").replace(':', "%3A")
}
