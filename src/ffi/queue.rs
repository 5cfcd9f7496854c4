//! ### English
//! C ABI bindings for queue lifecycle (create/submit/destroy).
//!
//! ### 中文
//! 队列生命周期相关的 C ABI 绑定（create/submit/destroy）。

use std::ffi::c_void;
use std::sync::Arc;

use super::{RawJob, RawUserData, XianJobExecuteFn, XianJobFence, XianJobQueue};
use crate::engine::runtime::{JobQueue, JobQueueConfig};

#[unsafe(no_mangle)]
/// ### English
/// Creates a queue with `capacity` slots and starts its worker thread.
///
/// `execute` is called on the worker thread as `execute(payload, user_data)` once per job, in
/// submission order. `flags` is a bitmask of `XIAN_JOB_QUEUE_FLAG_*`.
///
/// Returns NULL if `execute` is NULL, `capacity` is 0, `flags` has unknown bits, or the worker
/// thread cannot be started.
///
/// ### 中文
/// 创建一个拥有 `capacity` 个槽位的队列并启动 worker 线程。
///
/// `execute` 会在 worker 线程上按提交顺序对每个任务调用一次：`execute(payload, user_data)`。
/// `flags` 为 `XIAN_JOB_QUEUE_FLAG_*` 位掩码。
///
/// 若 `execute` 为 NULL、`capacity` 为 0、`flags` 含未知位或无法启动 worker 线程，则返回 NULL。
pub extern "C" fn xian_job_queue_create(
    capacity: u32,
    execute: Option<XianJobExecuteFn>,
    user_data: *mut c_void,
    flags: u32,
) -> *mut XianJobQueue {
    let Some(execute) = execute else {
        return std::ptr::null_mut();
    };

    let user_data = RawUserData(user_data);
    let config = JobQueueConfig::new(capacity as usize).flags(flags);

    let queue = match JobQueue::with_config(config, move |job: RawJob| unsafe {
        execute(job.0, user_data.as_ptr())
    }) {
        Ok(queue) => queue,
        Err(err) => {
            log::warn!("xian_job_queue_create failed: {err}");
            return std::ptr::null_mut();
        }
    };

    Box::into_raw(Box::new(XianJobQueue {
        queue: Arc::new(queue),
    }))
}

#[unsafe(no_mangle)]
/// ### English
/// Submits `payload` for execution, blocking while `fence` is busy or the queue is full.
///
/// `fence` is marked busy and signaled once the job has run (or been discarded at destroy).
/// Returns `false` if a handle is NULL or the queue is shutting down; in that case the job was
/// not queued and `fence` is left idle. A producer already blocked here when
/// `xian_job_queue_destroy` starts is woken and returns `false`.
///
/// ### 中文
/// 提交 `payload` 等待执行；当 `fence` 为 busy 或队列已满时阻塞。
///
/// `fence` 会被置为 busy，并在任务执行完毕（或在 destroy 时被丢弃）后 signal。
/// 若句柄为 NULL 或队列正在关闭则返回 `false`；此时任务未入队，`fence` 保持 idle。
/// `xian_job_queue_destroy` 开始时已阻塞于此的生产者会被唤醒并返回 `false`。
pub unsafe extern "C" fn xian_job_queue_submit(
    queue: *mut XianJobQueue,
    payload: *mut c_void,
    fence: *mut XianJobFence,
) -> bool {
    if queue.is_null() || fence.is_null() {
        return false;
    }

    /*
    ### English
    Clone both references before blocking; destroy may run while this producer waits.

    ### 中文
    阻塞前先克隆两个引用；本生产者等待期间可能发生 destroy。
    */
    let (queue, fence) = unsafe { ((*queue).queue.clone(), (*fence).fence.clone()) };
    queue.submit(RawJob(payload), &fence).is_ok()
}

#[unsafe(no_mangle)]
/// ### English
/// Returns the number of jobs submitted but not yet completed (0 for NULL).
///
/// ### 中文
/// 返回已提交但尚未完成的任务数（NULL 返回 0）。
pub unsafe extern "C" fn xian_job_queue_outstanding(queue: *mut XianJobQueue) -> u32 {
    if queue.is_null() {
        return 0;
    }

    unsafe { (*queue).queue.outstanding() as u32 }
}

#[unsafe(no_mangle)]
/// ### English
/// Destroys a queue created by `xian_job_queue_create`.
///
/// Stops the worker thread, then signals the fences of any jobs still queued (those jobs are not
/// executed unless the queue was created with `XIAN_JOB_QUEUE_FLAG_EXECUTE_ON_DRAIN`). Producers
/// blocked in `xian_job_queue_submit` are woken and rejected. No thread may start a new submit
/// once this call begins.
///
/// ### 中文
/// 销毁由 `xian_job_queue_create` 创建的队列。
///
/// 先停止 worker 线程，再 signal 仍在排队任务的 fence（除非创建时设置了
/// `XIAN_JOB_QUEUE_FLAG_EXECUTE_ON_DRAIN`，否则这些任务不会被执行）。
/// 阻塞在 `xian_job_queue_submit` 中的生产者会被唤醒并被拒绝。调用开始后任何线程不得再发起新的提交。
pub unsafe extern "C" fn xian_job_queue_destroy(queue: *mut XianJobQueue) {
    if queue.is_null() {
        return;
    }
    let handle = unsafe { Box::from_raw(queue) };
    /*
    ### English
    A blocked producer may still hold a reference, so dropping the handle alone would not stop
    the worker.

    ### 中文
    阻塞的生产者可能仍持有引用，仅释放句柄无法停止 worker。
    */
    handle.queue.shutdown();
    drop(handle);
}
