//! 日志初始化
//!
//! 使用 `tracing-subscriber` 输出到终端，日志级别由 `RUST_LOG` 控制

use tracing_subscriber::EnvFilter;

/// 初始化日志（默认 info 级别）
pub fn init() {
    init_with(false);
}

/// 初始化日志，`verbose` 为 true 时默认 debug 级别
///
/// 可重复调用，已经初始化过时直接忽略
pub fn init_with(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
