//! ### English
//! Job queue that spawns and owns the dedicated worker thread.
//!
//! ### 中文
//! 创建并持有独立 worker 线程的任务队列。

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel as channel;
use parking_lot::{Mutex, MutexGuard};

use crate::engine::error::{JobQueueError, SubmitError};
use crate::engine::fence::Fence;

use super::config::JobQueueConfig;
use super::ring::Job;
use super::shared::{QueueCounters, QueueShared, QueueState, QueueStats};
use super::worker_thread;

/// ### English
/// How long construction waits for the worker thread to report ready.
///
/// ### 中文
/// 构造时等待 worker 线程报告就绪的最长时间。
const WORKER_INIT_TIMEOUT: Duration = Duration::from_secs(30);

/// ### English
/// Bounded FIFO job queue serviced by one dedicated worker thread.
///
/// Any number of producer threads may call the `submit*` methods concurrently (share the queue via
/// `Arc<JobQueue<J>>`). Jobs run on the worker strictly in submission order, one at a time, via the
/// execute callback registered at construction. Each job carries an `Arc<Fence>` that the worker
/// signals once the callback returns.
///
/// Calling a blocking `submit` from inside the execute callback of the same queue deadlocks when
/// the queue is full.
///
/// ### 中文
/// 由一个独立 worker 线程服务的有界 FIFO 任务队列。
///
/// 任意数量的生产者线程可并发调用 `submit*` 方法（通过 `Arc<JobQueue<J>>` 共享队列）。
/// 任务按提交顺序在 worker 上逐个执行，使用构造时注册的 execute 回调。
/// 每个任务携带一个 `Arc<Fence>`，回调返回后由 worker signal。
///
/// 在同一队列的 execute 回调内部调用阻塞式 `submit`，当队列已满时会死锁。
pub struct JobQueue<J: Send + 'static> {
    /// ### English
    /// Ring, shutdown flag, and wake signals shared with the worker.
    ///
    /// ### 中文
    /// 与 worker 共享的 ring、shutdown 标记与唤醒信号。
    shared: Arc<QueueShared<J>>,
    /// ### English
    /// Join handle for the worker thread (taken by the first `shutdown`).
    ///
    /// ### 中文
    /// worker 线程的 join handle（由第一次 `shutdown` 取走）。
    thread: Mutex<Option<thread::JoinHandle<()>>>,
    capacity: usize,
}

impl<J: Send + 'static> JobQueue<J> {
    /// ### English
    /// Creates a queue with `capacity` slots and default options.
    ///
    /// #### Parameters
    /// - `capacity`: Maximum number of submitted-but-not-completed jobs (must be > 0).
    /// - `execute`: Callback invoked on the worker thread once per job.
    ///
    /// ### 中文
    /// 以 `capacity` 个槽位和默认选项创建队列。
    ///
    /// #### 参数
    /// - `capacity`：已提交但未完成任务的最大数量（必须 > 0）。
    /// - `execute`：在 worker 线程上对每个任务调用一次的回调。
    pub fn new<F>(capacity: usize, execute: F) -> Result<Self, JobQueueError>
    where
        F: FnMut(J) + Send + 'static,
    {
        Self::with_config(JobQueueConfig::new(capacity), execute)
    }

    /// ### English
    /// Creates a queue from an explicit configuration and starts its worker thread.
    ///
    /// Blocks until the worker reports ready. On any failure the worker (if it started) is joined
    /// before the error is returned, so nothing is left running.
    ///
    /// ### 中文
    /// 根据显式配置创建队列并启动 worker 线程。
    ///
    /// 会阻塞直到 worker 报告就绪。任何失败都会先 join 已启动的 worker 再返回错误，不留下任何运行中的线程。
    pub fn with_config<F>(config: JobQueueConfig, execute: F) -> Result<Self, JobQueueError>
    where
        F: FnMut(J) + Send + 'static,
    {
        config.validate()?;

        let shared = Arc::new(QueueShared::new(config.capacity, config.execute_on_drain())?);
        let shared_for_thread = shared.clone();

        let (init_tx, init_rx) = channel::bounded(1);

        let mut builder = thread::Builder::new().name(config.thread_name.clone());
        if let Some(stack_size) = config.stack_size {
            builder = builder.stack_size(stack_size);
        }
        let thread = builder.spawn(move || {
            worker_thread::run_worker_thread(shared_for_thread, execute, init_tx);
        })?;

        match init_rx.recv_timeout(WORKER_INIT_TIMEOUT) {
            Ok(()) => {
                log::debug!(
                    "job queue created (capacity={}, thread={:?})",
                    config.capacity,
                    config.thread_name
                );
                Ok(Self {
                    shared,
                    thread: Mutex::new(Some(thread)),
                    capacity: config.capacity,
                })
            }
            Err(channel::RecvTimeoutError::Disconnected) => {
                let _ = thread.join();
                Err(JobQueueError::WorkerInit(
                    "worker exited before reporting ready".to_string(),
                ))
            }
            Err(channel::RecvTimeoutError::Timeout) => {
                shared.request_shutdown();
                let _ = thread.join();
                Err(JobQueueError::WorkerInit(
                    "timed out waiting for worker thread".to_string(),
                ))
            }
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// ### English
    /// Number of jobs submitted but not yet completed (queued + executing).
    ///
    /// ### 中文
    /// 已提交但尚未完成的任务数（排队中 + 执行中）。
    pub fn outstanding(&self) -> usize {
        self.shared.state.lock().ring.outstanding()
    }

    pub fn is_shutdown(&self) -> bool {
        self.shared.state.lock().shutdown_requested
    }

    pub fn stats(&self) -> QueueStats {
        self.shared.counters.snapshot()
    }

    /// ### English
    /// Submits one job, blocking as needed.
    ///
    /// First marks `fence` busy (waiting for any previous use of it to finish), then waits for a
    /// free slot, then enqueues `(job, fence)` and wakes the worker.
    ///
    /// Fails only if the queue is shutting down; the payload is handed back and `fence` is left
    /// idle.
    ///
    /// #### Parameters
    /// - `job`: Opaque payload passed to the execute callback.
    /// - `fence`: Fence signaled once the job has finished (must not be in use by another queue).
    ///
    /// ### 中文
    /// 提交一个任务，必要时阻塞。
    ///
    /// 先将 `fence` 置为 busy（等待其上一次使用结束），再等待空闲槽位，然后入队 `(job, fence)` 并唤醒 worker。
    ///
    /// 仅在队列正在关闭时失败；载荷会被交还，`fence` 保持 idle。
    ///
    /// #### 参数
    /// - `job`：传给 execute 回调的不透明载荷。
    /// - `fence`：任务完成后被 signal 的 fence（不得同时被其它队列使用）。
    pub fn submit(&self, job: J, fence: &Arc<Fence>) -> Result<(), SubmitError<J>> {
        if self.is_shutdown() {
            log::warn!("job rejected: queue is shutting down");
            return Err(SubmitError::ShuttingDown(job));
        }

        fence.acquire();

        let mut state = self.shared.state.lock();
        while !state.shutdown_requested && !state.ring.has_free_slot() {
            self.shared.slot_available.wait(&mut state);
        }
        self.admit(state, job, fence)
    }

    /// ### English
    /// Submits one job without blocking.
    ///
    /// Returns the payload back if the queue is shutting down, full, or `fence` is still busy.
    /// `fence` is only marked busy when the job is accepted.
    ///
    /// ### 中文
    /// 非阻塞地提交一个任务。
    ///
    /// 若队列正在关闭、已满或 `fence` 仍为 busy，则交还载荷。只有任务被接受时才会将 `fence` 置为 busy。
    pub fn try_submit(&self, job: J, fence: &Arc<Fence>) -> Result<(), SubmitError<J>> {
        let mut state = self.shared.state.lock();
        if state.shutdown_requested {
            return Err(SubmitError::ShuttingDown(job));
        }
        if !state.ring.has_free_slot() {
            return Err(SubmitError::Full(job));
        }
        if !fence.try_acquire() {
            return Err(SubmitError::FenceBusy(job));
        }
        state.ring.push(Job {
            payload: job,
            fence: fence.clone(),
        });
        self.enqueued(state);
        Ok(())
    }

    /// ### English
    /// Like [`Self::submit`], but gives up after `timeout`.
    ///
    /// The timeout covers both waiting for `fence` to become idle and waiting for a free slot.
    ///
    /// #### Parameters
    /// - `job`: Opaque payload passed to the execute callback.
    /// - `fence`: Fence signaled once the job has finished.
    /// - `timeout`: Total time budget for the call.
    ///
    /// ### 中文
    /// 与 [`Self::submit`] 相同，但在 `timeout` 后放弃。
    ///
    /// 超时时间同时覆盖等待 `fence` 变为 idle 与等待空闲槽位两个阶段。
    ///
    /// #### 参数
    /// - `job`：传给 execute 回调的不透明载荷。
    /// - `fence`：任务完成后被 signal 的 fence。
    /// - `timeout`：本次调用的总时间预算。
    pub fn submit_timeout(
        &self,
        job: J,
        fence: &Arc<Fence>,
        timeout: Duration,
    ) -> Result<(), SubmitError<J>> {
        let deadline = Instant::now() + timeout;

        if self.is_shutdown() {
            return Err(SubmitError::ShuttingDown(job));
        }
        if !fence.acquire_until(deadline) {
            return Err(SubmitError::Timeout(job));
        }

        let mut state = self.shared.state.lock();
        while !state.shutdown_requested && !state.ring.has_free_slot() {
            if self
                .shared
                .slot_available
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }

        if !state.shutdown_requested && !state.ring.has_free_slot() {
            drop(state);
            fence.signal();
            return Err(SubmitError::Timeout(job));
        }
        self.admit(state, job, fence)
    }

    /// ### English
    /// Enqueues a job whose fence is already busy, or rolls the fence back if shutdown won the
    /// race. The caller has already waited for a free slot (or shutdown).
    ///
    /// ### 中文
    /// 入队一个 fence 已置为 busy 的任务；若 shutdown 抢先发生则回滚 fence。调用方已等待到空闲槽位（或 shutdown）。
    fn admit(
        &self,
        mut state: MutexGuard<'_, QueueState<J>>,
        job: J,
        fence: &Arc<Fence>,
    ) -> Result<(), SubmitError<J>> {
        if state.shutdown_requested {
            drop(state);
            fence.signal();
            log::warn!("job rejected: queue is shutting down");
            return Err(SubmitError::ShuttingDown(job));
        }

        state.ring.push(Job {
            payload: job,
            fence: fence.clone(),
        });
        self.enqueued(state);
        Ok(())
    }

    #[inline]
    fn enqueued(&self, state: MutexGuard<'_, QueueState<J>>) {
        drop(state);
        QueueCounters::bump(&self.shared.counters.submitted);
        self.shared.job_available.notify_one();
    }

    /// ### English
    /// Requests shutdown, joins the worker, then drains the ring.
    ///
    /// Jobs still queued after the worker exits are dropped unexecuted and their fences are
    /// signaled, so every waiter is released before this returns. With
    /// `XIAN_JOB_QUEUE_FLAG_EXECUTE_ON_DRAIN` the worker executes them instead and the ring is
    /// already empty here.
    ///
    /// Later calls are no-ops; concurrent calls block until the first one finishes.
    ///
    /// ### 中文
    /// 请求 shutdown、join worker，然后 drain ring。
    ///
    /// worker 退出后仍在排队的任务不会被执行而是直接丢弃，并 signal 其 fence，保证返回前所有等待者都被释放。
    /// 设置 `XIAN_JOB_QUEUE_FLAG_EXECUTE_ON_DRAIN` 时这些任务会由 worker 执行，此处 ring 已为空。
    ///
    /// 之后的调用为空操作；并发调用会阻塞直到第一次调用完成。
    pub fn shutdown(&self) {
        let mut thread_slot = self.thread.lock();
        let Some(thread) = thread_slot.take() else {
            return;
        };

        self.shared.request_shutdown();
        if thread.join().is_err() {
            log::error!("job worker thread panicked");
        }

        let residual = self.shared.state.lock().ring.drain();
        if !residual.is_empty() {
            log::warn!(
                "discarding {} queued job(s) at shutdown; signaling their fences",
                residual.len()
            );
        }
        for Job { payload, fence } in residual {
            drop(payload);
            fence.signal();
            QueueCounters::bump(&self.shared.counters.discarded);
        }

        /*
        ### English
        Producers that raced the drain may have been waiting on a fence we just signaled.

        ### 中文
        与 drain 竞争的生产者可能正在等待刚被 signal 的 fence。
        */
        self.shared.slot_available.notify_all();
        log::debug!("job queue shut down");
    }
}

impl<J: Send + 'static> Drop for JobQueue<J> {
    /// ### English
    /// Ensures the worker thread is shut down and the ring drained when the queue is dropped.
    ///
    /// ### 中文
    /// 确保在队列 drop 时关闭 worker 线程并 drain ring。
    fn drop(&mut self) {
        self.shutdown();
    }
}
