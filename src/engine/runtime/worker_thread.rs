//! ### English
//! Dedicated worker thread: dequeues jobs in FIFO order and runs the execute callback.
//!
//! ### 中文
//! 独立 worker 线程：按 FIFO 顺序取出任务并执行 execute 回调。

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use crossbeam_channel as channel;

use super::ring::Job;
use super::shared::{QueueCounters, QueueShared};

/// ### English
/// Worker thread entry function.
/// Returns once shutdown has been requested and the drain policy allows it to stop.
///
/// Shutdown is only observed between jobs: a job that has been dequeued always runs to completion
/// and has its fence signaled.
///
/// ### 中文
/// worker 线程入口函数。
/// 在收到 shutdown 请求且 drain 策略允许停止时返回。
///
/// 只在任务之间检查 shutdown：已取出的任务总会执行完毕并 signal 其 fence。
pub(super) fn run_worker_thread<J, F>(
    shared: Arc<QueueShared<J>>,
    mut execute: F,
    init_tx: channel::Sender<()>,
) where
    F: FnMut(J),
{
    let _ = init_tx.send(());
    drop(init_tx);
    log::debug!("job worker started");

    while let Some(Job { payload, fence }) = next_job(&shared) {
        log::trace!("job worker executing one job");

        /*
        ### English
        A panicking job must not take the worker down with it, or every later fence would hang.

        ### 中文
        单个任务 panic 不能拖垮 worker，否则之后的所有 fence 都会永远挂起。
        */
        match panic::catch_unwind(AssertUnwindSafe(|| execute(payload))) {
            Ok(()) => QueueCounters::bump(&shared.counters.executed),
            Err(_) => {
                log::error!("job execute callback panicked; signaling its fence and continuing");
                QueueCounters::bump(&shared.counters.panicked);
            }
        }

        fence.signal();
        drop(fence);

        shared.state.lock().ring.complete();
        shared.slot_available.notify_one();
    }

    log::debug!("job worker stopped");
}

/// ### English
/// Blocks until a job is available (`Some`) or the worker should exit (`None`).
///
/// ### 中文
/// 阻塞直到有任务可取（`Some`）或 worker 应当退出（`None`）。
fn next_job<J>(shared: &QueueShared<J>) -> Option<Job<J>> {
    let mut state = shared.state.lock();
    loop {
        if state.shutdown_requested && !(shared.execute_on_drain && !state.ring.is_empty()) {
            return None;
        }
        if let Some(job) = state.ring.pop() {
            return Some(job);
        }
        shared.job_available.wait(&mut state);
    }
}
