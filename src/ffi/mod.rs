//! ### English
//! C ABI surface for `xian_job_queue`.
//!
//! All exported symbols are `extern "C"` functions; handles are opaque pointers.
//! Job payloads are opaque `void*` values owned by the embedder: the queue never dereferences
//! them, it only hands them to the execute callback on the worker thread.
//!
//! ### 中文
//! `xian_job_queue` 的 C ABI 接口层。
//!
//! 所有导出符号均为 `extern "C"` 函数；句柄为不透明指针。
//! 任务载荷是宿主持有的不透明 `void*`：队列从不解引用它们，只会在 worker 线程上把它们交给 execute 回调。
mod abi;
mod fence;
mod queue;

pub use abi::xian_job_queue_abi_version;
pub use fence::{
    xian_job_fence_create, xian_job_fence_destroy, xian_job_fence_is_idle, xian_job_fence_wait,
    xian_job_fence_wait_timeout,
};
pub use queue::{
    xian_job_queue_create, xian_job_queue_destroy, xian_job_queue_outstanding,
    xian_job_queue_submit,
};

use std::ffi::c_void;
use std::sync::Arc;

use crate::engine::fence::Fence;
use crate::engine::runtime::JobQueue;

#[repr(C)]
/// ### English
/// Opaque queue handle owning the dedicated worker thread.
///
/// ### 中文
/// 不透明队列句柄，持有独立的 worker 线程。
pub struct XianJobQueue {
    /// ### English
    /// Queue whose payloads are embedder-owned `void*` values.
    ///
    /// Producers inside `xian_job_queue_submit` hold their own reference, so a producer woken by
    /// destroy never touches freed queue state.
    ///
    /// ### 中文
    /// 载荷为宿主持有的 `void*` 的队列。
    ///
    /// 位于 `xian_job_queue_submit` 内的生产者持有自己的引用，因此被 destroy 唤醒的生产者
    /// 不会访问已释放的队列状态。
    queue: Arc<JobQueue<RawJob>>,
}

#[repr(C)]
/// ### English
/// Opaque completion fence handle.
///
/// The handle owns one reference; a queue holds its own reference while a job using the fence is
/// outstanding, so destroying the handle early never frees a fence the worker still signals.
///
/// ### 中文
/// 不透明的完成 fence 句柄。
///
/// 句柄持有一个引用；使用该 fence 的任务未完成期间，队列持有自己的引用，
/// 因此提前销毁句柄不会释放 worker 仍需 signal 的 fence。
pub struct XianJobFence {
    fence: Arc<Fence>,
}

/// ### English
/// Execute callback invoked on the worker thread once per job.
///
/// #### Parameters
/// - `payload`: The pointer passed to `xian_job_queue_submit`.
/// - `user_data`: The pointer passed to `xian_job_queue_create`.
///
/// ### 中文
/// 在 worker 线程上对每个任务调用一次的 execute 回调。
///
/// #### 参数
/// - `payload`：传给 `xian_job_queue_submit` 的指针。
/// - `user_data`：传给 `xian_job_queue_create` 的指针。
pub type XianJobExecuteFn = unsafe extern "C" fn(payload: *mut c_void, user_data: *mut c_void);

/// ### English
/// C ABI version for `xian_job_queue`.
///
/// ### 中文
/// `xian_job_queue` 的 C ABI 版本号。
const XIAN_JOB_QUEUE_ABI_VERSION: u32 = 1;

/// ### English
/// Embedder payload pointer moved to the worker thread.
///
/// ### 中文
/// 被移交到 worker 线程的宿主载荷指针。
struct RawJob(*mut c_void);

// The embedder guarantees payloads may be used from the worker thread.
unsafe impl Send for RawJob {}

/// ### English
/// Embedder `user_data` pointer captured by the execute closure.
///
/// ### 中文
/// 被 execute 闭包捕获的宿主 `user_data` 指针。
struct RawUserData(*mut c_void);

unsafe impl Send for RawUserData {}

impl RawUserData {
    #[inline]
    fn as_ptr(&self) -> *mut c_void {
        self.0
    }
}
