//! Logging setup for binaries and examples embedding the engine

/// Initialize the logger with defaults that work in raw terminal mode.
/// INFO level unless the `RUST_LOG` environment variable overrides it.
pub fn init_logger() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "\r[{} {:5} {}] {}",
                buf.timestamp(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        })
        .init();
}
