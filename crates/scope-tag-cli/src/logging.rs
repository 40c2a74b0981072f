use std::io::Write;

/// Timestamped `env_logger` setup; `RUST_LOG` still wins when set.
pub fn init_logging(debug: bool, level: Option<&str>) {
    let default_filter = match level {
        Some(level) => level,
        None if debug => "debug",
        None => "info",
    };

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {} [{}] {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .init();
}
