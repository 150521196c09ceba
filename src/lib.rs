pub mod api;
pub mod config;
pub mod core;

/// 初始化日志，可重复调用；级别由 `RUST_LOG` 控制，默认 info
pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
