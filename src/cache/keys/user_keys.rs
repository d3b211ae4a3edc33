use super::escape_segment;

/// 用户名查询缓存键前缀
const USERNAME_PREFIX: &str = "usernames:";

/// 用户时间线缓存键前缀
const USER_TWEETS_PREFIX: &str = "users:";

/// 未携带分页游标时使用的保留值
pub const LAST_CURSOR: &str = "last";

/// 生成用户名查询缓存键
pub fn username_key(username: &str) -> String {
    format!("{}{}", USERNAME_PREFIX, escape_segment(username))
}

/// 生成用户时间线缓存键，游标为空时使用 `last`
pub fn user_tweets_key(user_id: &str, cursor: Option<&str>) -> String {
    match cursor {
        Some(cursor) => format!(
            "{}{}:tweets:cursor:{}",
            USER_TWEETS_PREFIX,
            escape_segment(user_id),
            escape_segment(cursor)
        ),
        None => format!(
            "{}{}:tweets:{}",
            USER_TWEETS_PREFIX,
            escape_segment(user_id),
            LAST_CURSOR
        ),
    }
}
