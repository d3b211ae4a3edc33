use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// 每个并发槽位平均每秒一个请求
const REQUESTS_PER_SECOND_PER_WORKER: u64 = 1;

/// 账号级上游请求额度估算
///
/// 用固定窗口整体清零近似滑动窗口。计数超过额度后所有检查失败，
/// 直到下一次清零。
pub struct QuotaGuard {
    requests: AtomicU64,
    max_per_window: u64,
}

impl QuotaGuard {
    pub fn new(max_per_window: u64) -> Self {
        Self {
            requests: AtomicU64::new(0),
            max_per_window,
        }
    }

    /// 额度 = 并发数 × 每槽位每秒请求数 × 窗口秒数
    pub fn for_window(concurrency: usize, window: Duration) -> Self {
        let max = (concurrency as u64)
            .saturating_mul(REQUESTS_PER_SECOND_PER_WORKER)
            .saturating_mul(window.as_secs());
        Self::new(max)
    }

    /// 计数未超过额度时返回 true
    pub fn check(&self) -> bool {
        self.requests.load(Ordering::SeqCst) <= self.max_per_window
    }

    pub fn record(&self) {
        // 已熔断时保持饱和，不回绕
        let _ = self
            .requests
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                Some(n.saturating_add(1))
            });
    }

    /// 检查并计数合为一次原子操作，多个 worker 同时准入也不会超出额度
    pub fn try_acquire(&self) -> bool {
        self.requests
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
                (n <= self.max_per_window).then(|| n.saturating_add(1))
            })
            .is_ok()
    }

    /// 无法判断原因的传输失败后直接打满计数
    pub fn trip(&self) {
        tracing::warn!("Quota guard tripped until next window reset");
        self.requests.store(u64::MAX, Ordering::SeqCst);
    }

    pub fn reset(&self) {
        let previous = self.requests.swap(0, Ordering::SeqCst);
        tracing::debug!("Quota window reset, previous count: {}", previous);
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    pub fn max_per_window(&self) -> u64 {
        self.max_per_window
    }

    /// 启动周期清零任务，调用方负责在关闭时 abort
    pub fn spawn_reset(self: &Arc<Self>, window: Duration) -> JoinHandle<()> {
        let guard = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + window, window);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                guard.reset();
            }
        })
    }
}
