#[unsafe(no_mangle)]
/// ### English
/// Returns the C ABI version.
///
/// ### 中文
/// 返回 C ABI 版本号。
pub extern "C" fn xian_job_queue_abi_version() -> u32 {
    super::XIAN_JOB_QUEUE_ABI_VERSION
}
