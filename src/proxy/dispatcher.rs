use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures_util::FutureExt;
use futures_util::future::join_all;
use parking_lot::Mutex;
use tokio::sync::{Mutex as AsyncMutex, mpsc, oneshot};
use tokio::task::JoinHandle;

use super::job::{Job, JobResult};
use super::quota::QuotaGuard;
use super::upstream::UpstreamClient;

type Envelope = (Job, oneshot::Sender<JobResult>);
type Queue = Arc<AsyncMutex<mpsc::UnboundedReceiver<Envelope>>>;

/// 单队列、固定数量 worker 的上游请求调度器
///
/// 任务按提交顺序进入执行，最多 `concurrency` 个同时在途，完成顺序不保证。
/// 每次提交恰好得到一个结果。
pub struct Dispatcher {
    sender: Mutex<Option<mpsc::UnboundedSender<Envelope>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    reset_task: JoinHandle<()>,
    quota: Arc<QuotaGuard>,
}

impl Dispatcher {
    /// 启动 worker 和额度清零任务，需在 tokio 运行时内调用
    pub fn new(upstream: UpstreamClient, concurrency: usize, quota_window: Duration) -> Self {
        let concurrency = concurrency.max(1);
        let quota = Arc::new(QuotaGuard::for_window(concurrency, quota_window));
        let upstream = Arc::new(upstream);
        let (sender, receiver) = mpsc::unbounded_channel();
        let queue: Queue = Arc::new(AsyncMutex::new(receiver));

        let workers: Vec<_> = (0..concurrency)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&upstream),
                    Arc::clone(&quota),
                ))
            })
            .collect();
        let reset_task = quota.spawn_reset(quota_window);

        tracing::info!(
            "Dispatcher started with {} workers, quota {} requests per {:?}",
            concurrency,
            quota.max_per_window(),
            quota_window
        );

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(workers),
            reset_task,
            quota,
        }
    }

    /// 提交任务并等待其结果
    pub async fn submit(&self, job: Job) -> JobResult {
        let (reply, result) = oneshot::channel();
        let req_id = job.req_id.clone();

        let queued = match self.sender.lock().as_ref() {
            Some(sender) => sender.send((job, reply)).is_ok(),
            None => false,
        };
        if !queued {
            tracing::warn!(req_id = %req_id, "dispatcher is shut down, rejecting job");
            return JobResult::internal_error();
        }

        result.await.unwrap_or_else(|_| {
            tracing::warn!(req_id = %req_id, "worker dropped job without a result");
            JobResult::internal_error()
        })
    }

    pub fn quota(&self) -> &QuotaGuard {
        &self.quota
    }

    /// 停止清零任务，关闭队列并等待已入队任务处理完
    pub async fn shutdown(&self) {
        self.reset_task.abort();
        self.sender.lock().take();

        let workers: Vec<_> = self.workers.lock().drain(..).collect();
        for outcome in join_all(workers).await {
            if let Err(e) = outcome {
                tracing::error!("Dispatcher worker failed: {}", e);
            }
        }
        tracing::info!("Dispatcher stopped");
    }
}

impl Drop for Dispatcher {
    fn drop(&mut self) {
        self.reset_task.abort();
    }
}

async fn run_worker(
    worker_id: usize,
    queue: Queue,
    upstream: Arc<UpstreamClient>,
    quota: Arc<QuotaGuard>,
) {
    loop {
        // 只在取任务时持有队列锁
        let next = queue.lock().await.recv().await;
        let Some((job, reply)) = next else {
            break;
        };

        let result = AssertUnwindSafe(process(&job, &upstream, &quota))
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                tracing::error!(req_id = %job.req_id, worker_id, "worker panicked while processing job");
                JobResult::internal_error()
            });

        if reply.send(result).is_err() {
            tracing::debug!(req_id = %job.req_id, "caller went away before result was ready");
        }
    }
    tracing::debug!(worker_id, "worker exiting");
}

async fn process(job: &Job, upstream: &UpstreamClient, quota: &QuotaGuard) -> JobResult {
    if !quota.try_acquire() {
        tracing::debug!(
            req_id = %job.req_id,
            requests = quota.requests(),
            "quota exhausted, rejecting without upstream call"
        );
        return JobResult::too_many_requests();
    }

    match upstream.fetch(job).await {
        Ok(result) => result,
        Err(err) if err.trips_quota() => {
            tracing::warn!(req_id = %job.req_id, error = %err, "upstream error");
            quota.trip();
            JobResult::too_many_requests()
        }
        Err(err) => {
            tracing::warn!(req_id = %job.req_id, error = %err, "upstream error");
            JobResult::internal_error()
        }
    }
}
