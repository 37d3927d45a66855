//! Logging setup
//!
//! Diagnostics go through `tracing`. The binary installs two layers: a
//! human-readable stderr layer filtered by verbosity, and a file layer that
//! writes through a [`LogSession`] into hourly files under `<output>/log/`.

mod session;

pub use session::{Clock, LogSession, LogSessionWriter};

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Installs the global subscriber
///
/// `verbose` counts `-v` flags; `quiet` limits stderr to errors. The file
/// layer always records `info` and above for this crate.
pub fn setup_logging(verbose: u8, quiet: bool, session: Option<LogSession>) {
    let stderr_filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("wiki_outline=info,warn"),
            1 => EnvFilter::new("wiki_outline=debug,info"),
            2 => EnvFilter::new("wiki_outline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(stderr_filter);

    let file_layer = session.map(|session| {
        fmt::layer()
            .with_writer(session)
            .with_ansi(false)
            .with_target(true)
            .with_filter(EnvFilter::new("wiki_outline=info"))
    });

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
}
