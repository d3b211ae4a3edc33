// 代理核心模块
// 包含任务调度、额度保护、重试策略与上游客户端

pub mod dispatcher;
pub mod job;
pub mod quota;
pub mod retry;
pub mod service;
pub mod upstream;

pub use dispatcher::Dispatcher;
pub use job::{Job, JobResult};
pub use quota::QuotaGuard;
pub use retry::RetryPolicy;
pub use service::{CachePolicy, CacheTtls, Proxy};
pub use upstream::{FetchError, UpstreamClient};
