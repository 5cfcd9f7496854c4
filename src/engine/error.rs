//! ### English
//! Error types returned by queue construction and submission.
//!
//! ### 中文
//! 队列构造与提交返回的错误类型。

use std::collections::TryReserveError;
use std::io;

use thiserror::Error;

/// ### English
/// Errors reported by [`JobQueue`](crate::JobQueue) construction.
///
/// ### 中文
/// [`JobQueue`](crate::JobQueue) 构造时报告的错误。
#[derive(Error, Debug)]
pub enum JobQueueError {
    /// ### English
    /// Capacity must be at least one slot.
    ///
    /// ### 中文
    /// 容量至少为一个槽位。
    #[error("Queue capacity must be greater than zero")]
    ZeroCapacity,

    /// ### English
    /// Flag bits not understood by this version.
    ///
    /// ### 中文
    /// 当前版本无法识别的标志位。
    #[error("Unknown queue flags: {0:#x}")]
    InvalidFlags(u32),

    /// ### English
    /// The slot array for the requested capacity could not be allocated.
    ///
    /// ### 中文
    /// 无法为请求的容量分配槽位数组。
    #[error("Failed to allocate queue slots: {0}")]
    Alloc(#[from] TryReserveError),

    /// ### English
    /// The worker thread could not be spawned.
    ///
    /// ### 中文
    /// 无法创建 worker 线程。
    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),

    /// ### English
    /// The worker thread started but never reported ready.
    ///
    /// ### 中文
    /// worker 线程已启动但未报告就绪。
    #[error("Worker thread failed to initialize: {0}")]
    WorkerInit(String),
}

/// ### English
/// Errors reported by the submission paths.
///
/// The blocking `submit` only ever returns `ShuttingDown`. Every variant hands the rejected payload
/// back to the caller.
///
/// ### 中文
/// 提交路径报告的错误。
///
/// 阻塞式 `submit` 只会返回 `ShuttingDown`。
///
/// 每个变体都会把被拒绝的载荷交还给调用方。
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError<J> {
    /// ### English
    /// Every slot is occupied by an outstanding job.
    ///
    /// ### 中文
    /// 所有槽位都被未完成任务占用。
    #[error("Queue is full")]
    Full(J),

    /// ### English
    /// The fence is still busy from a previous submission.
    ///
    /// ### 中文
    /// fence 仍被上一次提交占用。
    #[error("Fence is still busy")]
    FenceBusy(J),

    /// ### English
    /// The queue is shutting down.
    ///
    /// ### 中文
    /// 队列正在关闭。
    #[error("Queue is shutting down")]
    ShuttingDown(J),

    /// ### English
    /// The deadline passed before the fence became idle or a slot became free.
    ///
    /// ### 中文
    /// 在 fence 变为 idle 或出现空闲槽位之前已超时。
    #[error("Timed out waiting to submit")]
    Timeout(J),
}

impl<J> SubmitError<J> {
    /// ### English
    /// Returns the rejected payload.
    ///
    /// ### 中文
    /// 取回被拒绝的载荷。
    pub fn into_inner(self) -> J {
        match self {
            Self::Full(job)
            | Self::FenceBusy(job)
            | Self::ShuttingDown(job)
            | Self::Timeout(job) => job,
        }
    }
}
