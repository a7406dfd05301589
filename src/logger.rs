use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::{EnvFilter, FmtSubscriber};

pub enum LogTarget<'a> {
    Stderr,
    File(&'a Path),
    /// The terminal UI owns the screen; events are dropped.
    Discard,
}

fn env_filter(verbose: bool) -> EnvFilter {
    std::env::var("SPEEDCAM_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .map_or_else(
            |_| {
                if verbose {
                    EnvFilter::new("debug")
                } else {
                    EnvFilter::new("info")
                }
            },
            |value| EnvFilter::try_new(value).unwrap_or_else(|_| EnvFilter::new("info")),
        )
}

pub fn init_logging(verbose: bool, target: LogTarget<'_>) {
    let builder = FmtSubscriber::builder().with_env_filter(env_filter(verbose));

    let result = match target {
        LogTarget::Stderr => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::stderr).finish())
        }
        LogTarget::File(path) => {
            match OpenOptions::new().create(true).append(true).open(path) {
                Ok(file) => tracing::subscriber::set_global_default(
                    builder
                        .with_ansi(false)
                        .with_writer(Mutex::new(file))
                        .finish(),
                ),
                Err(err) => {
                    eprintln!("Failed to open log file {}: {}", path.display(), err);
                    return;
                }
            }
        }
        LogTarget::Discard => {
            tracing::subscriber::set_global_default(builder.with_writer(std::io::sink).finish())
        }
    };

    if let Err(err) = result {
        eprintln!("Failed to set global default subscriber: {}", err);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_logging_is_idempotent() {
        init_logging(false, LogTarget::Discard);
        init_logging(true, LogTarget::Discard);
    }
}
