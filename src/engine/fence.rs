//! ### English
//! Per-job completion fence.
//!
//! A fence is a two-state latch: `Idle` (available / last job finished) and `Busy` (a job using it
//! is outstanding). Submission flips it to `Busy`; only the worker (or the shutdown drain path)
//! flips it back to `Idle`.
//!
//! ### 中文
//! 每个任务的完成 fence。
//!
//! fence 是一个二态闩锁：`Idle`（可复用 / 上一个任务已完成）与 `Busy`（使用它的任务尚未完成）。
//! 提交时置为 `Busy`；只有 worker（或 shutdown 的 drain 路径）会将其置回 `Idle`。

use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// ### English
/// Observable fence state.
///
/// ### 中文
/// 可观察的 fence 状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FenceState {
    /// ### English
    /// No outstanding job references this fence.
    ///
    /// ### 中文
    /// 没有未完成任务引用该 fence。
    Idle,
    /// ### English
    /// A submitted job has not finished yet.
    ///
    /// ### 中文
    /// 已提交的任务尚未完成。
    Busy,
}

/// ### English
/// Completion fence shared between a submitter and the worker.
///
/// Share it as `Arc<Fence>`: the queue keeps a clone of the `Arc` while the job is outstanding, so
/// the state itself is never copied. Waiting does not consume the `Idle` state; any number of
/// threads may wait, any number of times.
///
/// ### 中文
/// 提交方与 worker 之间共享的完成 fence。
///
/// 以 `Arc<Fence>` 形式共享：任务未完成期间队列持有一个 `Arc` 克隆，状态本身从不被复制。
/// 等待不会消耗 `Idle` 状态；任意数量的线程可以任意多次等待。
#[derive(Debug)]
pub struct Fence {
    state: Mutex<FenceState>,
    /// ### English
    /// Notified on every busy -> idle transition.
    ///
    /// ### 中文
    /// 每次 busy -> idle 转换时通知。
    idle: Condvar,
}

impl Default for Fence {
    fn default() -> Self {
        Self::new()
    }
}

impl Fence {
    /// ### English
    /// Creates a fence in the `Idle` state.
    ///
    /// ### 中文
    /// 创建一个处于 `Idle` 状态的 fence。
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FenceState::Idle),
            idle: Condvar::new(),
        }
    }

    /// ### English
    /// Returns the current state (snapshot).
    ///
    /// ### 中文
    /// 返回当前状态（快照）。
    pub fn state(&self) -> FenceState {
        *self.state.lock()
    }

    /// ### English
    /// Non-blocking poll: `true` if no job using this fence is outstanding.
    ///
    /// ### 中文
    /// 非阻塞轮询：若没有使用该 fence 的未完成任务则返回 `true`。
    #[inline]
    pub fn is_idle(&self) -> bool {
        self.state() == FenceState::Idle
    }

    /// ### English
    /// Blocks until the fence is `Idle`. Returns immediately if it already is.
    ///
    /// ### 中文
    /// 阻塞直到 fence 为 `Idle`；若已是 `Idle` 则立即返回。
    pub fn wait(&self) {
        let mut state = self.state.lock();
        while *state == FenceState::Busy {
            self.idle.wait(&mut state);
        }
    }

    /// ### English
    /// Blocks until the fence is `Idle` or `timeout` elapses.
    ///
    /// Returns `true` if the fence was observed `Idle`.
    ///
    /// #### Parameters
    /// - `timeout`: Maximum time to block.
    ///
    /// ### 中文
    /// 阻塞直到 fence 为 `Idle` 或超时。
    ///
    /// 若观察到 `Idle` 则返回 `true`。
    ///
    /// #### 参数
    /// - `timeout`：最长阻塞时间。
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        self.wait_until(Instant::now() + timeout)
    }

    fn wait_until(&self, deadline: Instant) -> bool {
        let mut state = self.state.lock();
        while *state == FenceState::Busy {
            if self.idle.wait_until(&mut state, deadline).timed_out() {
                return *state == FenceState::Idle;
            }
        }
        true
    }

    /// ### English
    /// Marks the fence `Busy`, first blocking until any previous use has finished.
    ///
    /// ### 中文
    /// 将 fence 置为 `Busy`；若上一次使用尚未结束则先阻塞等待。
    pub(crate) fn acquire(&self) {
        let mut state = self.state.lock();
        while *state == FenceState::Busy {
            self.idle.wait(&mut state);
        }
        *state = FenceState::Busy;
    }

    /// ### English
    /// Marks the fence `Busy` only if it is currently `Idle`.
    ///
    /// ### 中文
    /// 仅当 fence 当前为 `Idle` 时将其置为 `Busy`。
    pub(crate) fn try_acquire(&self) -> bool {
        let mut state = self.state.lock();
        if *state == FenceState::Busy {
            return false;
        }
        *state = FenceState::Busy;
        true
    }

    /// ### English
    /// Like [`Self::acquire`], but gives up at `deadline`.
    ///
    /// ### 中文
    /// 与 [`Self::acquire`] 相同，但在 `deadline` 时放弃。
    pub(crate) fn acquire_until(&self, deadline: Instant) -> bool {
        let mut state = self.state.lock();
        while *state == FenceState::Busy {
            if self.idle.wait_until(&mut state, deadline).timed_out()
                && *state == FenceState::Busy
            {
                return false;
            }
        }
        *state = FenceState::Busy;
        true
    }

    /// ### English
    /// Transitions `Busy` -> `Idle` and wakes every waiter.
    ///
    /// ### 中文
    /// 将 `Busy` 转为 `Idle` 并唤醒所有等待者。
    pub(crate) fn signal(&self) {
        let mut state = self.state.lock();
        debug_assert_eq!(*state, FenceState::Busy, "signaling a fence that is not busy");
        *state = FenceState::Idle;
        drop(state);
        self.idle.notify_all();
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        debug_assert_eq!(
            *self.state.get_mut(),
            FenceState::Idle,
            "fence dropped while a job using it is outstanding"
        );
    }
}
