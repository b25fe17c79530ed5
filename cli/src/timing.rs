//! Logging setup for the CLI.
//!
//! The engine crates log through the `log` facade with `imgdrop_*` targets;
//! the subscriber installed here forwards those records too. With `--timing`
//! every `#[instrument]`ed command span reports its duration when it closes.

use tracing_subscriber::{
    EnvFilter,
    fmt::{self, format::FmtSpan},
    prelude::*,
};

/// Filter directives used when `RUST_LOG` is unset.
pub fn default_directives(verbose: bool, timing: bool) -> &'static str {
    if verbose {
        "warn,imgdrop=debug,imgdrop_business=debug,imgdrop_input=debug,imgdrop_storage=debug"
    } else if timing {
        // span close events are logged at INFO
        "warn,imgdrop=info"
    } else {
        "warn"
    }
}

/// Initialize the tracing subscriber on stderr.
///
/// # Arguments
/// * `verbose` - debug output from the imgdrop crates
/// * `timing` - log span close events with their duration
pub fn init_tracing(verbose: bool, timing: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(verbose, timing)));

    let span_events = if timing {
        FmtSpan::CLOSE
    } else {
        FmtSpan::NONE
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(verbose)
                .with_level(true)
                .with_span_events(span_events)
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}
