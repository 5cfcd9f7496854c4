//! ### English
//! Construction-time configuration for a job queue.
//!
//! ### 中文
//! 任务队列的构造期配置。

use crate::engine::error::JobQueueError;
use crate::engine::flags;

/// ### English
/// Default worker thread name.
///
/// ### 中文
/// 默认的 worker 线程名。
const DEFAULT_THREAD_NAME: &str = "xian-job-worker";

/// ### English
/// Queue configuration (capacity, worker thread options, and behavior flags).
///
/// ### 中文
/// 队列配置（容量、worker 线程选项、行为标志）。
#[derive(Debug, Clone)]
pub struct JobQueueConfig {
    /// ### English
    /// Maximum number of submitted-but-not-completed jobs.
    ///
    /// ### 中文
    /// 已提交但未完成任务的最大数量。
    pub(super) capacity: usize,
    pub(super) thread_name: String,
    /// ### English
    /// Worker stack size in bytes (`None` = platform default).
    ///
    /// ### 中文
    /// worker 栈大小（字节；`None` = 平台默认值）。
    pub(super) stack_size: Option<usize>,
    /// ### English
    /// Bitmask of `XIAN_JOB_QUEUE_FLAG_*`.
    ///
    /// ### 中文
    /// `XIAN_JOB_QUEUE_FLAG_*` 位掩码。
    pub(super) flags: u32,
}

impl JobQueueConfig {
    /// ### English
    /// Creates a configuration with the given capacity and default options.
    ///
    /// ### 中文
    /// 以给定容量与默认选项创建配置。
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            thread_name: DEFAULT_THREAD_NAME.to_string(),
            stack_size: None,
            flags: 0,
        }
    }

    pub fn thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }

    pub fn stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    pub fn flags(mut self, flags: u32) -> Self {
        self.flags = flags;
        self
    }

    /// ### English
    /// Whether the worker keeps executing queued jobs after shutdown is requested.
    ///
    /// ### 中文
    /// shutdown 请求后 worker 是否继续执行已排队任务。
    #[inline]
    pub(super) fn execute_on_drain(&self) -> bool {
        (self.flags & flags::XIAN_JOB_QUEUE_FLAG_EXECUTE_ON_DRAIN) != 0
    }

    pub(super) fn validate(&self) -> Result<(), JobQueueError> {
        if self.capacity == 0 {
            return Err(JobQueueError::ZeroCapacity);
        }
        let unknown = self.flags & !flags::XIAN_JOB_QUEUE_FLAGS_ALL;
        if unknown != 0 {
            return Err(JobQueueError::InvalidFlags(unknown));
        }
        Ok(())
    }
}
