//! ### English
//! Job queue runtime (public API).
//!
//! ### 中文
//! 任务队列运行时（对外公开 API）。

mod config;
mod job_queue;
mod ring;
mod shared;
mod worker_thread;

pub use config::JobQueueConfig;
pub use job_queue::JobQueue;
pub use shared::QueueStats;
