/// ### English
/// `xian_job_queue` crate root.
/// Exposes the C ABI via `ffi`; core implementation lives under `engine`.
///
/// ### 中文
/// `xian_job_queue` 的 crate 根。
/// 通过 `ffi` 导出 C ABI；核心实现位于 `engine` 模块。
mod engine;
pub mod ffi;

pub use engine::error::{JobQueueError, SubmitError};
pub use engine::fence::{Fence, FenceState};
pub use engine::flags;
pub use engine::runtime::{JobQueue, JobQueueConfig, QueueStats};
