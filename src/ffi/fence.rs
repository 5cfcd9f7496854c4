//! ### English
//! C ABI bindings for completion fences. Usable without referencing any queue.
//!
//! ### 中文
//! 完成 fence 的 C ABI 绑定；无需引用任何队列即可使用。

use std::sync::Arc;
use std::time::Duration;

use super::XianJobFence;
use crate::engine::fence::Fence;

#[unsafe(no_mangle)]
/// ### English
/// Creates an idle fence.
///
/// ### 中文
/// 创建一个 idle 状态的 fence。
pub extern "C" fn xian_job_fence_create() -> *mut XianJobFence {
    Box::into_raw(Box::new(XianJobFence {
        fence: Arc::new(Fence::new()),
    }))
}

#[unsafe(no_mangle)]
/// ### English
/// Blocks until the fence is idle (returns immediately if it already is).
///
/// ### 中文
/// 阻塞直到 fence 为 idle（若已是 idle 则立即返回）。
pub unsafe extern "C" fn xian_job_fence_wait(fence: *mut XianJobFence) {
    if fence.is_null() {
        return;
    }

    unsafe { (*fence).fence.wait() };
}

#[unsafe(no_mangle)]
/// ### English
/// Blocks until the fence is idle or `timeout_ns` nanoseconds elapse.
/// Returns `true` if the fence is idle.
///
/// ### 中文
/// 阻塞直到 fence 为 idle 或经过 `timeout_ns` 纳秒；若 fence 为 idle 则返回 `true`。
pub unsafe extern "C" fn xian_job_fence_wait_timeout(
    fence: *mut XianJobFence,
    timeout_ns: u64,
) -> bool {
    if fence.is_null() {
        return false;
    }

    unsafe { (*fence).fence.wait_timeout(Duration::from_nanos(timeout_ns)) }
}

#[unsafe(no_mangle)]
/// ### English
/// Non-blocking poll. Returns `false` for NULL.
///
/// ### 中文
/// 非阻塞轮询；NULL 返回 `false`。
pub unsafe extern "C" fn xian_job_fence_is_idle(fence: *mut XianJobFence) -> bool {
    if fence.is_null() {
        return false;
    }

    unsafe { (*fence).fence.is_idle() }
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a fence created by `xian_job_fence_create`.
///
/// The fence must be idle (wait on it first).
///
/// ### 中文
/// 销毁由 `xian_job_fence_create` 创建的 fence。
///
/// fence 必须为 idle（请先等待）。
pub unsafe extern "C" fn xian_job_fence_destroy(fence: *mut XianJobFence) {
    if fence.is_null() {
        return;
    }
    unsafe {
        drop(Box::from_raw(fence));
    }
}
