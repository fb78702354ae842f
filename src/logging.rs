//! Log setup for the CLI.
//!
//! Diagnostics go to stderr through `tracing`; progress output for the user
//! goes to stdout through [`crate::output`], so piping the build report stays
//! clean.

use std::io::{self, IsTerminal};
use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Default filter directive for a verbosity level.
///
/// `quiet` wins over `verbose`: 0 = info, 1 = debug, 2+ = trace.
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "gallery_build=error";
    }
    match verbose {
        0 => "gallery_build=info",
        1 => "gallery_build=debug",
        _ => "gallery_build=trace",
    }
}

/// Install the global subscriber. `RUST_LOG` overrides the verbosity flags.
///
/// | TTY | Output |
/// |-----|--------|
/// | yes | Colored output to stderr |
/// | no | Compact plain output to stderr |
pub fn init_logging(verbose: u8, quiet: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    if io::stderr().is_terminal() {
        let fmt_layer = fmt::layer()
            .with_target(false)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .with_writer(io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    } else {
        let fmt_layer = fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_thread_ids(false)
            .with_span_events(FmtSpan::NONE)
            .compact()
            .with_writer(io::stderr);

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .init();
    }
}
