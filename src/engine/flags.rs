//! ### English
//! Bitflags controlling optional queue behaviors.
//!
//! These are passed through the C ABI as a `u32` bitmask.
//!
//! ### 中文
//! 控制队列可选行为的位标志（bitflags）。
//!
//! 通过 C ABI 以 `u32` 位掩码传入。

/// ### English
/// Drain policy: on shutdown the worker keeps executing every job already in the ring before it
/// exits, instead of discarding them.
///
/// Without this flag, jobs still queued when shutdown is observed are dropped unexecuted and only
/// their fences are signaled.
///
/// ### 中文
/// drain 策略：shutdown 时 worker 会先执行完 ring 中已排队的全部任务再退出，而不是丢弃它们。
///
/// 未设置该标志时，观察到 shutdown 时仍在排队的任务不会被执行，仅 signal 其 fence。
pub const XIAN_JOB_QUEUE_FLAG_EXECUTE_ON_DRAIN: u32 = 1 << 0;

/// ### English
/// Mask of every flag bit understood by this version.
///
/// ### 中文
/// 当前版本可识别的全部标志位掩码。
pub const XIAN_JOB_QUEUE_FLAGS_ALL: u32 = XIAN_JOB_QUEUE_FLAG_EXECUTE_ON_DRAIN;
