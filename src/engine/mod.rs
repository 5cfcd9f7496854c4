/// ### English
/// Engine internal modules (completion fences, the job ring, and the worker-owning runtime).
///
/// ### 中文
/// 引擎内部模块（完成 fence、任务 ring、以及持有 worker 线程的运行时）。
pub mod error;
pub mod fence;
pub mod flags;
pub mod runtime;
