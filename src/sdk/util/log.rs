use env_logger::{Builder, Env};

/// Initializes `env_logger`, honouring `RUST_LOG` and falling back to `default_level`.
pub fn init_logging(default_level: &str) {
    Builder::from_env(Env::default().default_filter_or(default_level))
        .format_timestamp_secs()
        .format_module_path(false)
        .init();
}
