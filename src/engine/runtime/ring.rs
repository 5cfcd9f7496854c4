//! ### English
//! Fixed-size job ring shared between producers and the worker.
//!
//! The ring itself is not synchronized; `JobQueue` keeps it behind a single mutex.
//!
//! ### 中文
//! 生产者与 worker 之间共享的定长任务 ring。
//!
//! ring 本身不做同步；`JobQueue` 用单个互斥锁保护它。

use std::collections::TryReserveError;
use std::sync::Arc;

use crate::engine::fence::Fence;

/// ### English
/// One submitted job: opaque payload plus the fence to signal once it is done.
///
/// ### 中文
/// 一个已提交的任务：不透明载荷 + 完成后需要 signal 的 fence。
pub(super) struct Job<J> {
    pub(super) payload: J,
    pub(super) fence: Arc<Fence>,
}

/// ### English
/// Arena-style ring of job slots with wrap-around cursors.
///
/// Two counts are tracked:
/// - `queued`: jobs written but not yet dequeued by the worker.
/// - `outstanding`: jobs submitted but not yet completed (`queued` + the one executing).
///
/// Producers are admitted only while `outstanding < capacity`, which also guarantees the slot at
/// `write` is empty.
///
/// ### 中文
/// 采用回绕游标的 arena 式任务槽 ring。
///
/// 跟踪两个计数：
/// - `queued`：已写入但尚未被 worker 取出的任务数。
/// - `outstanding`：已提交但尚未完成的任务数（`queued` + 正在执行的那个）。
///
/// 仅当 `outstanding < capacity` 时才接纳生产者，这同时保证 `write` 处槽位为空。
pub(super) struct JobRing<J> {
    slots: Box<[Option<Job<J>>]>,
    write: usize,
    read: usize,
    queued: usize,
    outstanding: usize,
}

impl<J> JobRing<J> {
    /// ### English
    /// Creates an empty ring with exactly `capacity` slots (`capacity > 0`).
    ///
    /// The slot array is reserved up front; an oversized capacity is reported instead of
    /// aborting the process.
    ///
    /// ### 中文
    /// 创建一个恰好包含 `capacity` 个槽位的空 ring（`capacity > 0`）。
    ///
    /// 槽位数组预先分配；容量过大时返回错误而不是中止进程。
    pub(super) fn with_capacity(capacity: usize) -> Result<Self, TryReserveError> {
        debug_assert!(capacity > 0);
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize_with(capacity, || None);
        Ok(Self {
            slots: slots.into_boxed_slice(),
            write: 0,
            read: 0,
            queued: 0,
            outstanding: 0,
        })
    }

    #[inline]
    pub(super) fn capacity(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub(super) fn outstanding(&self) -> usize {
        self.outstanding
    }

    #[inline]
    pub(super) fn is_empty(&self) -> bool {
        self.queued == 0
    }

    /// ### English
    /// Returns `true` if one more job may be admitted.
    ///
    /// ### 中文
    /// 若还能接纳一个任务则返回 `true`。
    #[inline]
    pub(super) fn has_free_slot(&self) -> bool {
        self.outstanding < self.capacity()
    }

    /// ### English
    /// Writes `job` at the write cursor and advances it.
    ///
    /// Callers must check [`Self::has_free_slot`] first.
    ///
    /// ### 中文
    /// 在写游标处写入 `job` 并推进游标。
    ///
    /// 调用方必须先检查 [`Self::has_free_slot`]。
    pub(super) fn push(&mut self, job: Job<J>) {
        debug_assert!(self.has_free_slot());
        let slot = &mut self.slots[self.write];
        debug_assert!(slot.is_none());
        *slot = Some(job);
        self.write = (self.write + 1) % self.capacity();
        self.queued += 1;
        self.outstanding += 1;
    }

    /// ### English
    /// Takes the oldest queued job. The job stays counted as outstanding until
    /// [`Self::complete`] is called.
    ///
    /// ### 中文
    /// 取出最早排队的任务。该任务在调用 [`Self::complete`] 之前仍计入 outstanding。
    pub(super) fn pop(&mut self) -> Option<Job<J>> {
        if self.queued == 0 {
            return None;
        }
        let job = self.slots[self.read].take();
        debug_assert!(job.is_some());
        self.read = (self.read + 1) % self.capacity();
        self.queued -= 1;
        job
    }

    /// ### English
    /// Releases the outstanding count held by one popped job.
    ///
    /// ### 中文
    /// 释放一个已取出任务占用的 outstanding 计数。
    pub(super) fn complete(&mut self) {
        debug_assert!(self.outstanding > self.queued);
        self.outstanding -= 1;
    }

    /// ### English
    /// Removes every queued job in FIFO order and releases their outstanding counts.
    ///
    /// ### 中文
    /// 按 FIFO 顺序移除所有排队任务，并释放其 outstanding 计数。
    pub(super) fn drain(&mut self) -> Vec<Job<J>> {
        let mut jobs = Vec::with_capacity(self.queued);
        while let Some(job) = self.pop() {
            self.complete();
            jobs.push(job);
        }
        jobs
    }
}
