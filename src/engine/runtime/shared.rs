//! ### English
//! State shared between producer threads and the worker thread.
//!
//! ### 中文
//! 生产者线程与 worker 线程之间共享的状态。

use std::collections::TryReserveError;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Condvar, Mutex};

use super::ring::JobRing;

/// ### English
/// Everything guarded by the queue mutex.
///
/// ### 中文
/// 由队列互斥锁保护的全部数据。
pub(super) struct QueueState<J> {
    pub(super) ring: JobRing<J>,
    /// ### English
    /// Set exactly once by `shutdown`; never reset.
    ///
    /// ### 中文
    /// 仅由 `shutdown` 设置一次；永不复位。
    pub(super) shutdown_requested: bool,
}

/// ### English
/// Queue shared state: one mutex over the ring plus two wake signals.
///
/// - `job_available`: producers -> worker (a job was queued, or shutdown).
/// - `slot_available`: worker -> producers (a job completed, or shutdown).
///
/// ### 中文
/// 队列共享状态：ring 上的单个互斥锁 + 两个唤醒信号。
///
/// - `job_available`：生产者 -> worker（有任务入队，或 shutdown）。
/// - `slot_available`：worker -> 生产者（有任务完成，或 shutdown）。
pub(super) struct QueueShared<J> {
    pub(super) state: Mutex<QueueState<J>>,
    pub(super) job_available: Condvar,
    pub(super) slot_available: Condvar,
    pub(super) counters: QueueCounters,
    pub(super) execute_on_drain: bool,
}

impl<J> QueueShared<J> {
    pub(super) fn new(capacity: usize, execute_on_drain: bool) -> Result<Self, TryReserveError> {
        Ok(Self {
            state: Mutex::new(QueueState {
                ring: JobRing::with_capacity(capacity)?,
                shutdown_requested: false,
            }),
            job_available: Condvar::new(),
            slot_available: Condvar::new(),
            counters: QueueCounters::default(),
            execute_on_drain,
        })
    }

    /// ### English
    /// Sets the shutdown flag and wakes everyone blocked on the queue.
    ///
    /// ### 中文
    /// 设置 shutdown 标记并唤醒所有阻塞在队列上的线程。
    pub(super) fn request_shutdown(&self) {
        self.state.lock().shutdown_requested = true;
        self.job_available.notify_all();
        self.slot_available.notify_all();
    }
}

/// ### English
/// Monotonic job counters (Relaxed; observational only).
///
/// ### 中文
/// 单调递增的任务计数器（Relaxed；仅用于观测）。
#[derive(Default)]
pub(super) struct QueueCounters {
    pub(super) submitted: AtomicU64,
    pub(super) executed: AtomicU64,
    pub(super) discarded: AtomicU64,
    pub(super) panicked: AtomicU64,
}

impl QueueCounters {
    #[inline]
    pub(super) fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub(super) fn snapshot(&self) -> QueueStats {
        QueueStats {
            submitted: self.submitted.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
            discarded: self.discarded.load(Ordering::Relaxed),
            panicked: self.panicked.load(Ordering::Relaxed),
        }
    }
}

/// ### English
/// Snapshot of a queue's job counters.
///
/// ### 中文
/// 队列任务计数器的快照。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// ### English
    /// Jobs accepted by `submit` / `try_submit` / `submit_timeout`.
    ///
    /// ### 中文
    /// 被 `submit` / `try_submit` / `submit_timeout` 接受的任务数。
    pub submitted: u64,
    /// ### English
    /// Jobs whose execute callback returned normally.
    ///
    /// ### 中文
    /// execute 回调正常返回的任务数。
    pub executed: u64,
    /// ### English
    /// Jobs dropped unexecuted by the shutdown drain.
    ///
    /// ### 中文
    /// 被 shutdown drain 丢弃、未执行的任务数。
    pub discarded: u64,
    /// ### English
    /// Jobs whose execute callback panicked.
    ///
    /// ### 中文
    /// execute 回调 panic 的任务数。
    pub panicked: u64,
}
