use hoopsync::config::LoggingConfig;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Console logging plus, when `log_dir` is set and writable, a daily file.
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the
/// file writer on drop and must be held for the life of the process.
pub fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hoopsync=debug,sqlx=warn", config.level)));

    // `tracing_appender::rolling::daily` panics if it cannot create the first
    // file, so writability is checked up front.
    let (file_layer, guard) = match config.log_dir.as_deref() {
        Some(log_dir) if writable_dir(log_dir) => {
            let file_appender = tracing_appender::rolling::daily(log_dir, "hoopsync.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true);
            (Some(layer), Some(guard))
        }
        Some(log_dir) => {
            eprintln!(
                "Warning: Could not write to log directory {}, file logging disabled",
                log_dir
            );
            (None, None)
        }
        None => (None, None),
    };

    let (json_layer, text_layer) = if config.json {
        (
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            ),
            None,
        )
    } else {
        (
            None,
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            ),
        )
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .init();

    guard
}

fn writable_dir(log_dir: &str) -> bool {
    if std::fs::create_dir_all(log_dir).is_err() {
        return false;
    }
    let test_path = std::path::Path::new(log_dir).join(".hoopsync_write_test");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&test_path)
    {
        Ok(_) => {
            let _ = std::fs::remove_file(&test_path);
            true
        }
        Err(_) => false,
    }
}
