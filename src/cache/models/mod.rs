/// 缓存数据模型
/// 定义缓存数据的结构体
pub mod response;

pub use response::CacheEntry;
