/// 缓存操作
/// 提供缓存操作的功能实现
pub mod response;

pub use response::ResponseCache;
